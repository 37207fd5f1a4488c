use std::{collections::HashMap, sync::Arc};

use tracing::{debug, error};

use crate::{
	config::{
		constants::GENERIC_FAILURE_MSG,
		types::{BoxFuture, Context, Data, Error},
	},
	host::{ChatHost, InboundMessage},
	utils::helpers::parse_invocation,
};

pub type CommandAction = fn(Context) -> BoxFuture<'static, Result<(), Error>>;
pub type ListenerAction = fn(Context) -> BoxFuture<'static, Result<Handled, Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
	Public,
	OwnerOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
	Fun,
	Games,
	Info,
	Media,
	Sports,
	Ai,
	Automation,
	Misc,
}

impl Category {
	#[must_use]
	pub const fn title(self) -> &'static str {
		match self {
			Self::Fun => "🎉 Fun",
			Self::Games => "🎮 Games",
			Self::Info => "📚 Info",
			Self::Media => "🎵 Media",
			Self::Sports => "⚽ Sports",
			Self::Ai => "🤖 AI",
			Self::Automation => "⚙️ Automation",
			Self::Misc => "🧰 Misc",
		}
	}
}

pub struct Command {
	pub name: &'static str,
	pub aliases: &'static [&'static str],
	pub description: &'static str,
	pub usage: &'static str,
	pub category: Category,
	pub access: Access,
	pub action: CommandAction,
}

impl Command {
	#[must_use]
	pub const fn new(name: &'static str, action: CommandAction) -> Self {
		Self {
			name,
			aliases: &[],
			description: "",
			usage: "",
			category: Category::Misc,
			access: Access::Public,
			action,
		}
	}

	#[must_use]
	pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
		self.aliases = aliases;
		self
	}

	#[must_use]
	pub const fn description(mut self, description: &'static str) -> Self {
		self.description = description;
		self
	}

	#[must_use]
	pub const fn usage(mut self, usage: &'static str) -> Self {
		self.usage = usage;
		self
	}

	#[must_use]
	pub const fn category(mut self, category: Category) -> Self {
		self.category = category;
		self
	}

	#[must_use]
	pub const fn owner_only(mut self) -> Self {
		self.access = Access::OwnerOnly;
		self
	}
}

/// Whether a listener took ownership of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
	Consumed,
	Ignored,
}

pub struct Listener {
	pub name: &'static str,
	pub action: ListenerAction,
}

impl Listener {
	#[must_use]
	pub const fn new(name: &'static str, action: ListenerAction) -> Self {
		Self { name, action }
	}
}

/// Routes inbound messages to commands or, for ordinary text, to the listeners
pub struct Framework {
	data: Arc<Data>,
	commands: Arc<Vec<Command>>,
	lookup: HashMap<&'static str, usize>,
	listeners: Vec<Listener>,
}

impl Framework {
	#[must_use]
	pub fn new(data: Arc<Data>, mut commands: Vec<Command>, listeners: Vec<Listener>) -> Self {
		for command in &mut commands {
			if data.settings.access.public.contains(command.name) {
				command.access = Access::Public;
			} else if data.settings.access.owner_only.contains(command.name) {
				command.access = Access::OwnerOnly;
			}
		}
		let mut lookup = HashMap::new();
		for (index, command) in commands.iter().enumerate() {
			lookup.insert(command.name, index);
			for alias in command.aliases {
				lookup.entry(*alias).or_insert(index);
			}
		}
		Self {
			data,
			commands: Arc::new(commands),
			lookup,
			listeners,
		}
	}

	#[must_use]
	pub fn data(&self) -> &Arc<Data> {
		&self.data
	}

	#[must_use]
	pub fn commands(&self) -> &[Command] {
		&self.commands
	}

	#[must_use]
	pub fn find(&self, name: &str) -> Option<&Command> {
		self.lookup
			.get(name)
			.and_then(|&index| self.commands.get(index))
	}

	pub async fn dispatch(&self, host: Arc<dyn ChatHost>, message: InboundMessage) {
		let message = Arc::new(message);
		let invocation = parse_invocation(&message.text, &self.data.settings.bot.prefixes);
		if let Some((name, args)) = invocation {
			let Some(command) = self.find(&name) else {
				debug!("Ignoring unknown command {name}");
				return;
			};
			let ctx = Context {
				data: Arc::clone(&self.data),
				host,
				commands: Arc::clone(&self.commands),
				command: command.name,
				args: args.to_owned(),
				message: Arc::clone(&message),
			};
			if command.access == Access::OwnerOnly && !ctx.is_owner() {
				debug!(
					"Ignoring owner-only command {} from {}",
					command.name, message.sender
				);
				return;
			}
			if let Err(err) = (command.action)(ctx.clone()).await {
				on_error(&ctx, command.name, &err).await;
			}
			return;
		}

		if message.from_me || (message.text.trim().is_empty() && message.media.is_none()) {
			return;
		}
		for listener in &self.listeners {
			let ctx = Context {
				data: Arc::clone(&self.data),
				host: Arc::clone(&host),
				commands: Arc::clone(&self.commands),
				command: listener.name,
				args: message.text.trim().to_owned(),
				message: Arc::clone(&message),
			};
			match (listener.action)(ctx.clone()).await {
				Ok(Handled::Consumed) => break,
				Ok(Handled::Ignored) => {}
				Err(err) => {
					on_error(&ctx, listener.name, &err).await;
					break;
				}
			}
		}
	}
}

pub async fn on_error(ctx: &Context, source: &str, error: &Error) {
	error!("Error in `{source}` for chat {}: {error:?}", ctx.chat());
	if let Err(err) = ctx.reply(GENERIC_FAILURE_MSG).await {
		error!("on_error: failed to report failure: {err:?}");
	}
}
