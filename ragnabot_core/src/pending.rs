//! Conversations that wait for a plain follow-up message.
//!
//! A command begins an interaction for a [`SessionKey`]; the text listener that owns the
//! interaction's kind peeks at it for every ordinary message and resolves it once the message has
//! the expected shape. Every operation is a short synchronous critical section, so callers must
//! never keep a store reference alive across an `.await`.

use std::time::Duration;

use dashmap::{DashMap, mapref::entry::Entry};
use thiserror::Error;
use tokio::time::Instant;

use crate::{
	config::settings::InteractionConfig,
	games::{drafts::Drafts, quiz::QuizKey, tictactoe::TicTacToe},
	host::{ChatId, MessageKey, UserId},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
	pub chat: ChatId,
	pub member: Option<UserId>,
}

impl SessionKey {
	/// Shared by everyone in the chat, used by board games
	#[must_use]
	pub const fn chat(chat: ChatId) -> Self {
		Self { chat, member: None }
	}

	/// Private to one sender within the chat
	#[must_use]
	pub const fn member(chat: ChatId, member: UserId) -> Self {
		Self {
			chat,
			member: Some(member),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
	pub id: String,
	pub title: String,
	pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
	/// The numbered list, edited in place once a choice is made
	pub message: MessageKey,
	pub candidates: Vec<Candidate>,
}

impl SelectionState {
	/// One-based lookup, matching the numbers shown to the user
	#[must_use]
	pub fn candidate(&self, number: usize) -> Option<&Candidate> {
		number
			.checked_sub(1)
			.and_then(|index| self.candidates.get(index))
	}
}

#[derive(Debug, Clone)]
pub enum Interaction {
	Selection(SelectionState),
	TicTacToe(TicTacToe),
	Drafts(Drafts),
	Quiz(QuizKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
	Selection,
	TicTacToe,
	Drafts,
	Quiz,
}

impl InteractionKind {
	#[must_use]
	pub const fn describe(self) -> &'static str {
		match self {
			Self::Selection => "a selection",
			Self::TicTacToe => "a Tic-Tac-Toe game",
			Self::Drafts => "a Drafts game",
			Self::Quiz => "a quiz",
		}
	}
}

impl Interaction {
	#[must_use]
	pub const fn kind(&self) -> InteractionKind {
		match self {
			Self::Selection(_) => InteractionKind::Selection,
			Self::TicTacToe(_) => InteractionKind::TicTacToe,
			Self::Drafts(_) => InteractionKind::Drafts,
			Self::Quiz(_) => InteractionKind::Quiz,
		}
	}
}

#[derive(Debug, Clone)]
pub struct PendingInteraction {
	pub key: SessionKey,
	pub interaction: Interaction,
	pub created_at: Instant,
	pub expires_at: Instant,
}

impl PendingInteraction {
	fn is_expired(&self, now: Instant) -> bool {
		now >= self.expires_at
	}
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{} is already in progress here", .kind.describe())]
pub struct AlreadyPending {
	pub kind: InteractionKind,
}

pub trait InteractionStore: Send + Sync {
	/// Fails while an unexpired interaction exists for `key`
	fn begin(&self, key: SessionKey, interaction: Interaction) -> Result<(), AlreadyPending>;

	fn peek(&self, key: &SessionKey) -> Option<PendingInteraction>;

	/// Removes and returns the interaction; only one caller can ever get it
	fn resolve(&self, key: &SessionKey) -> Option<PendingInteraction>;

	fn cancel(&self, key: &SessionKey) -> bool;

	/// Mutates a live interaction in place and pushes its expiry back
	fn update(&self, key: &SessionKey, apply: &mut dyn FnMut(&mut Interaction)) -> bool;

	/// Drops expired interactions, returning how many were removed
	fn sweep(&self) -> usize;
}

#[derive(Debug, Clone, Copy)]
pub struct InteractionTtls {
	pub selection: Duration,
	pub game: Duration,
	pub quiz: Duration,
}

impl InteractionTtls {
	#[must_use]
	pub const fn uniform(ttl: Duration) -> Self {
		Self {
			selection: ttl,
			game: ttl,
			quiz: ttl,
		}
	}

	#[must_use]
	pub const fn for_kind(&self, kind: InteractionKind) -> Duration {
		match kind {
			InteractionKind::Selection => self.selection,
			InteractionKind::TicTacToe | InteractionKind::Drafts => self.game,
			InteractionKind::Quiz => self.quiz,
		}
	}
}

impl From<&InteractionConfig> for InteractionTtls {
	fn from(config: &InteractionConfig) -> Self {
		Self {
			selection: Duration::from_secs(config.selection_ttl_secs),
			game: Duration::from_secs(config.game_ttl_secs),
			quiz: Duration::from_secs(config.quiz_ttl_secs),
		}
	}
}

pub struct MemoryInteractionStore {
	entries: DashMap<SessionKey, PendingInteraction>,
	ttls: InteractionTtls,
}

impl MemoryInteractionStore {
	#[must_use]
	pub fn new(ttls: InteractionTtls) -> Self {
		Self {
			entries: DashMap::new(),
			ttls,
		}
	}

	fn expiry(&self, kind: InteractionKind, now: Instant) -> Instant {
		let ttl = self.ttls.for_kind(kind);
		now.checked_add(ttl).unwrap_or(now)
	}

	fn record(&self, key: SessionKey, interaction: Interaction, now: Instant) -> PendingInteraction {
		PendingInteraction {
			expires_at: self.expiry(interaction.kind(), now),
			key,
			interaction,
			created_at: now,
		}
	}

	fn drop_expired(&self, key: &SessionKey, now: Instant) {
		self.entries
			.remove_if(key, |_, pending| pending.is_expired(now));
	}
}

impl InteractionStore for MemoryInteractionStore {
	fn begin(&self, key: SessionKey, interaction: Interaction) -> Result<(), AlreadyPending> {
		let now = Instant::now();
		match self.entries.entry(key) {
			Entry::Occupied(mut entry) => {
				if !entry.get().is_expired(now) {
					return Err(AlreadyPending {
						kind: entry.get().interaction.kind(),
					});
				}
				let record = self.record(entry.key().clone(), interaction, now);
				entry.insert(record);
			}
			Entry::Vacant(entry) => {
				let record = self.record(entry.key().clone(), interaction, now);
				entry.insert(record);
			}
		}
		Ok(())
	}

	fn peek(&self, key: &SessionKey) -> Option<PendingInteraction> {
		self.drop_expired(key, Instant::now());
		self.entries.get(key).map(|pending| pending.clone())
	}

	fn resolve(&self, key: &SessionKey) -> Option<PendingInteraction> {
		let now = Instant::now();
		self.entries
			.remove(key)
			.map(|(_, pending)| pending)
			.filter(|pending| !pending.is_expired(now))
	}

	fn cancel(&self, key: &SessionKey) -> bool {
		self.resolve(key).is_some()
	}

	fn update(&self, key: &SessionKey, apply: &mut dyn FnMut(&mut Interaction)) -> bool {
		let now = Instant::now();
		self.drop_expired(key, now);
		self.entries.get_mut(key).is_some_and(|mut pending| {
			apply(&mut pending.interaction);
			pending.expires_at = self.expiry(pending.interaction.kind(), now);
			true
		})
	}

	fn sweep(&self) -> usize {
		let now = Instant::now();
		let before = self.entries.len();
		self.entries.retain(|_, pending| !pending.is_expired(now));
		before.saturating_sub(self.entries.len())
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use tokio::time::advance;

	use super::*;

	fn key() -> SessionKey {
		SessionKey::member(
			ChatId::new("254700000001@s.whatsapp.net"),
			UserId::new("254700000001@s.whatsapp.net"),
		)
	}

	fn selection(count: usize) -> Interaction {
		Interaction::Selection(SelectionState {
			message: MessageKey::default(),
			candidates: (1..=count)
				.map(|n| Candidate {
					id: n.to_string(),
					title: format!("Track {n}"),
					detail: String::new(),
				})
				.collect(),
		})
	}

	fn store() -> MemoryInteractionStore {
		MemoryInteractionStore::new(InteractionTtls::uniform(Duration::from_secs(300)))
	}

	#[tokio::test]
	async fn second_begin_is_rejected() {
		let store = store();
		store.begin(key(), selection(3)).unwrap();
		assert_eq!(
			store.begin(key(), Interaction::Quiz(QuizKey { answers: vec![0] })),
			Err(AlreadyPending {
				kind: InteractionKind::Selection
			})
		);
		let pending = store.peek(&key()).unwrap();
		assert_eq!(pending.interaction.kind(), InteractionKind::Selection);
	}

	#[tokio::test]
	async fn resolve_hands_out_the_record_once() {
		let store = store();
		store.begin(key(), selection(2)).unwrap();
		assert!(store.resolve(&key()).is_some());
		assert!(store.resolve(&key()).is_none());
		assert!(store.peek(&key()).is_none());
	}

	#[tokio::test]
	async fn cancel_reports_whether_anything_was_removed() {
		let store = store();
		assert!(!store.cancel(&key()));
		store.begin(key(), selection(1)).unwrap();
		assert!(store.cancel(&key()));
		assert!(store.begin(key(), selection(1)).is_ok());
	}

	#[tokio::test]
	async fn chat_and_member_keys_do_not_collide() {
		let store = store();
		let chat_key = SessionKey::chat(key().chat);
		store.begin(key(), selection(1)).unwrap();
		assert!(store.begin(chat_key.clone(), selection(1)).is_ok());
		assert!(store.resolve(&chat_key).is_some());
		assert!(store.peek(&key()).is_some());
	}

	#[tokio::test(start_paused = true)]
	async fn expired_records_are_invisible_and_replaceable() {
		let store = store();
		store.begin(key(), selection(2)).unwrap();
		advance(Duration::from_secs(301)).await;
		assert!(store.peek(&key()).is_none());

		store.begin(key(), selection(2)).unwrap();
		advance(Duration::from_secs(301)).await;
		assert!(store.resolve(&key()).is_none());
		assert!(store.begin(key(), selection(4)).is_ok());
	}

	#[tokio::test(start_paused = true)]
	async fn sweep_removes_only_stale_records() {
		let store = store();
		store.begin(key(), selection(2)).unwrap();
		advance(Duration::from_secs(200)).await;
		let fresh = SessionKey::chat(ChatId::new("12036302@g.us"));
		store.begin(fresh.clone(), selection(1)).unwrap();
		advance(Duration::from_secs(150)).await;
		assert_eq!(store.sweep(), 1);
		assert!(store.peek(&fresh).is_some());
	}

	#[tokio::test(start_paused = true)]
	async fn update_mutates_in_place_and_extends_expiry() {
		let store = store();
		store.begin(key(), selection(3)).unwrap();
		advance(Duration::from_secs(250)).await;
		let touched = store.update(&key(), &mut |interaction| {
			if let Interaction::Selection(state) = interaction {
				state.candidates.truncate(1);
			}
		});
		assert!(touched);
		advance(Duration::from_secs(250)).await;
		let Some(PendingInteraction {
			interaction: Interaction::Selection(state),
			..
		}) = store.peek(&key())
		else {
			panic!("selection should still be pending");
		};
		assert_eq!(state.candidates.len(), 1);
		assert!(!store.update(&SessionKey::chat(ChatId::new("other")), &mut |_| {}));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn concurrent_resolvers_see_one_winner() {
		let store = Arc::new(store());
		store.begin(key(), selection(8)).unwrap();
		let handles: Vec<_> = (0..16)
			.map(|_| {
				let store = Arc::clone(&store);
				tokio::spawn(async move { store.resolve(&key()).is_some() })
			})
			.collect();
		let mut winners = 0;
		for handle in handles {
			if handle.await.unwrap() {
				winners += 1;
			}
		}
		assert_eq!(winners, 1);
	}

	#[test]
	fn selection_numbers_are_one_based() {
		let Interaction::Selection(state) = selection(3) else {
			unreachable!();
		};
		assert_eq!(state.candidate(1).map(|c| c.title.as_str()), Some("Track 1"));
		assert!(state.candidate(0).is_none());
		assert!(state.candidate(4).is_none());
	}
}
