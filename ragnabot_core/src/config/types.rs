use std::{
	collections::VecDeque,
	future::Future,
	pin::Pin,
	sync::{
		Arc, LazyLock,
		atomic::{AtomicBool, Ordering},
	},
	time::Duration,
};

use anyhow::Error as AError;
use dashmap::DashMap;
use mini_moka::sync::Cache;
use reqwest::Client;
use serde::Serialize;
use tokio::{
	sync::{Mutex, RwLock},
	time::Instant,
};

use crate::{
	config::settings::Settings,
	handlers::Command,
	host::{ChatHost, ChatId, InboundMessage, MessageKey, OutgoingMessage, UserId},
	pending::{InteractionStore, InteractionTtls, MemoryInteractionStore},
	timers::TimerRegistry,
};

pub type Error = AError;
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type ChatContextMap = Cache<ChatId, Arc<Mutex<ChatbotContext>>>;
pub type CooldownMap = Cache<UserId, Instant>;

pub const TOD_COOLDOWN: Duration = Duration::from_secs(30);

pub static HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
	Client::builder()
		.timeout(Duration::from_secs(20))
		.user_agent(concat!("ragnabot/", env!("CARGO_PKG_VERSION")))
		.build()
		.unwrap_or_default()
});

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Model,
}

#[derive(Clone, Debug)]
pub struct ChatTurn {
	pub role: Role,
	pub text: String,
}

impl ChatTurn {
	#[must_use]
	pub const fn user(text: String) -> Self {
		Self {
			role: Role::User,
			text,
		}
	}

	#[must_use]
	pub const fn model(text: String) -> Self {
		Self {
			role: Role::Model,
			text,
		}
	}
}

#[derive(Default)]
pub struct ChatbotContext {
	pub turns: VecDeque<ChatTurn>,
	/// Position in the configured model fallback list
	pub model_level: usize,
}

impl ChatbotContext {
	pub fn push(&mut self, turn: ChatTurn, limit: usize) {
		self.turns.push_back(turn);
		while self.turns.len() > limit {
			self.turns.pop_front();
		}
	}

	#[must_use]
	pub fn recent(&self, window: usize) -> Vec<ChatTurn> {
		let skip = self.turns.len().saturating_sub(window);
		self.turns.iter().skip(skip).cloned().collect()
	}
}

pub struct ChatbotState {
	pub contexts: ChatContextMap,
	pub enabled_chats: DashMap<ChatId, bool>,
	pub groups: AtomicBool,
	pub dms: AtomicBool,
	pub system_prompt: RwLock<String>,
}

impl ChatbotState {
	#[must_use]
	pub fn new(settings: &Settings) -> Self {
		Self {
			contexts: Cache::builder()
				.max_capacity(1000)
				.time_to_idle(Duration::from_secs(6 * 60 * 60))
				.build(),
			enabled_chats: DashMap::new(),
			groups: AtomicBool::new(settings.chatbot.groups),
			dms: AtomicBool::new(settings.chatbot.dms),
			system_prompt: RwLock::new(settings.chatbot.system_prompt.clone()),
		}
	}

	/// A per-chat switch wins over the global group/DM switch
	#[must_use]
	pub fn is_enabled(&self, chat: &ChatId) -> bool {
		self.enabled_chats.get(chat).map_or_else(
			|| {
				if chat.is_group() {
					self.groups.load(Ordering::Relaxed)
				} else {
					self.dms.load(Ordering::Relaxed)
				}
			},
			|enabled| *enabled,
		)
	}

	#[must_use]
	pub fn context(&self, chat: &ChatId) -> Arc<Mutex<ChatbotContext>> {
		self.contexts.get(chat).unwrap_or_else(|| {
			let context = Arc::new(Mutex::new(ChatbotContext::default()));
			self.contexts.insert(chat.clone(), Arc::clone(&context));
			context
		})
	}
}

pub struct Data {
	pub settings: Arc<Settings>,
	pub interactions: Arc<dyn InteractionStore>,
	pub timers: TimerRegistry,
	pub chatbot: ChatbotState,
	pub cooldowns: CooldownMap,
}

impl Data {
	#[must_use]
	pub fn new(settings: Settings) -> Self {
		let store = MemoryInteractionStore::new(InteractionTtls::from(&settings.interactions));
		Self::with_store(settings, Arc::new(store))
	}

	#[must_use]
	pub fn with_store(settings: Settings, interactions: Arc<dyn InteractionStore>) -> Self {
		Self {
			chatbot: ChatbotState::new(&settings),
			settings: Arc::new(settings),
			interactions,
			timers: TimerRegistry::new(),
			cooldowns: Cache::builder()
				.max_capacity(10_000)
				.time_to_live(TOD_COOLDOWN)
				.build(),
		}
	}
}

/// Everything a command or listener needs; cheap to clone into spawned tasks
#[derive(Clone)]
pub struct Context {
	pub data: Arc<Data>,
	pub host: Arc<dyn ChatHost>,
	pub message: Arc<InboundMessage>,
	/// Registry the invocation came through, for `help`
	pub commands: Arc<Vec<Command>>,
	pub command: &'static str,
	pub args: String,
}

impl Context {
	#[must_use]
	pub fn data(&self) -> &Data {
		&self.data
	}

	#[must_use]
	pub fn settings(&self) -> &Settings {
		&self.data.settings
	}

	#[must_use]
	pub fn author(&self) -> &UserId {
		&self.message.sender
	}

	#[must_use]
	pub fn chat(&self) -> &ChatId {
		&self.message.chat
	}

	/// Owners are the configured numbers plus the bot's own account
	#[must_use]
	pub fn is_owner(&self) -> bool {
		is_owner(&self.data.settings, &self.message)
	}

	/// Sends text quoting the invoking message
	pub async fn reply(&self, text: impl Into<String> + Send) -> Result<MessageKey, Error> {
		Ok(self
			.host
			.send(
				&self.message.chat,
				OutgoingMessage::text(text),
				Some(self.message.as_ref()),
			)
			.await?)
	}

	/// Sends text without quoting
	pub async fn say(&self, text: impl Into<String> + Send) -> Result<MessageKey, Error> {
		self.send(OutgoingMessage::text(text)).await
	}

	pub async fn send(&self, message: OutgoingMessage) -> Result<MessageKey, Error> {
		Ok(self.host.send(&self.message.chat, message, None).await?)
	}

	pub async fn edit(&self, key: &MessageKey, text: &str) -> Result<(), Error> {
		Ok(self.host.edit(key, text).await?)
	}
}

#[must_use]
pub fn is_owner(settings: &Settings, message: &InboundMessage) -> bool {
	message.from_me
		|| settings
			.bot
			.owners
			.iter()
			.any(|owner| owner == message.sender.number())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn context_is_capped_and_window_takes_the_tail() {
		let mut context = ChatbotContext::default();
		for n in 0..25 {
			context.push(ChatTurn::user(n.to_string()), 20);
		}
		assert_eq!(context.turns.len(), 20);
		let recent = context.recent(10);
		assert_eq!(recent.len(), 10);
		assert_eq!(recent.first().map(|turn| turn.text.as_str()), Some("15"));
		assert_eq!(recent.last().map(|turn| turn.text.as_str()), Some("24"));
	}

	#[test]
	fn chat_switch_overrides_global_switch() {
		let state = ChatbotState::new(&Settings::default());
		let group = ChatId::new("12036302@g.us");
		assert!(!state.is_enabled(&group));
		state.groups.store(true, Ordering::Relaxed);
		assert!(state.is_enabled(&group));
		state.enabled_chats.insert(group.clone(), false);
		assert!(!state.is_enabled(&group));
	}

	#[test]
	fn owners_match_on_number() {
		let mut settings = Settings::default();
		settings.bot.owners.push("254700000001".to_owned());
		let mut message = InboundMessage {
			sender: UserId::new("254700000001@s.whatsapp.net"),
			..InboundMessage::default()
		};
		assert!(is_owner(&settings, &message));
		message.sender = UserId::new("254700000002@s.whatsapp.net");
		assert!(!is_owner(&settings, &message));
		message.from_me = true;
		assert!(is_owner(&settings, &message));
	}
}
