use std::{
	future::Future,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry};
use thiserror::Error;
use tokio::{
	select, spawn,
	time::{MissedTickBehavior, interval, sleep},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::host::ChatId;

const MIN_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
	#[error("{0} is already running")]
	AlreadyRunning(String),
	#[error("{0} is not running")]
	NotRunning(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

struct SessionTask {
	chat: ChatId,
	tag: &'static str,
	token: CancellationToken,
}

/// Process-wide named intervals plus one-shot tasks scoped to a chat
pub struct TimerRegistry {
	root: CancellationToken,
	intervals: DashMap<String, CancellationToken>,
	sessions: Arc<DashMap<TaskId, SessionTask>>,
	next_id: AtomicU64,
}

impl Default for TimerRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl TimerRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self {
			root: CancellationToken::new(),
			intervals: DashMap::new(),
			sessions: Arc::new(DashMap::new()),
			next_id: AtomicU64::new(0),
		}
	}

	/// Runs `task` now and then every `period` until [`Self::stop`] is called for `name`
	pub fn start_interval<F, Fut>(&self, name: &str, period: Duration, task: F) -> Result<(), TimerError>
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let token = match self.intervals.entry(name.to_owned()) {
			Entry::Occupied(_) => return Err(TimerError::AlreadyRunning(name.to_owned())),
			Entry::Vacant(entry) => {
				let token = self.root.child_token();
				entry.insert(token.clone());
				token
			}
		};
		let label = name.to_owned();
		spawn(async move {
			let mut ticker = interval(period.max(MIN_PERIOD));
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				select! {
					() = token.cancelled() => break,
					_ = ticker.tick() => task().await,
				}
			}
			debug!("Interval {label} stopped");
		});
		info!("Started interval {name} every {}s", period.max(MIN_PERIOD).as_secs());
		Ok(())
	}

	pub fn stop(&self, name: &str) -> Result<(), TimerError> {
		let (_, token) = self
			.intervals
			.remove(name)
			.ok_or_else(|| TimerError::NotRunning(name.to_owned()))?;
		token.cancel();
		info!("Stopped interval {name}");
		Ok(())
	}

	#[must_use]
	pub fn is_running(&self, name: &str) -> bool {
		self.intervals.contains_key(name)
	}

	#[must_use]
	pub fn active_count(&self) -> usize {
		self.intervals.len()
	}

	/// Runs `task` after `delay` unless the chat's `tag` tasks are cancelled first
	pub fn schedule<Fut>(&self, chat: &ChatId, tag: &'static str, delay: Duration, task: Fut) -> TaskId
	where
		Fut: Future<Output = ()> + Send + 'static,
	{
		self.spawn_session(chat, tag, async move {
			sleep(delay).await;
			task.await;
		})
	}

	/// Runs `task` right away; cancelling the chat's `tag` tasks stops it at its next await
	pub fn spawn_session<Fut>(&self, chat: &ChatId, tag: &'static str, task: Fut) -> TaskId
	where
		Fut: Future<Output = ()> + Send + 'static,
	{
		let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
		let token = self.root.child_token();
		self.sessions.insert(
			id,
			SessionTask {
				chat: chat.clone(),
				tag,
				token: token.clone(),
			},
		);
		let sessions = Arc::clone(&self.sessions);
		spawn(async move {
			select! {
				() = token.cancelled() => {}
				() = task => {}
			}
			sessions.remove(&id);
		});
		id
	}

	#[must_use]
	pub fn has_session(&self, chat: &ChatId, tag: &str) -> bool {
		self.sessions
			.iter()
			.any(|task| task.chat == *chat && task.tag == tag)
	}

	/// Cancels every in-flight `tag` task of `chat`, returning how many were stopped
	pub fn cancel_session(&self, chat: &ChatId, tag: &str) -> usize {
		let ids: Vec<TaskId> = self
			.sessions
			.iter()
			.filter(|task| task.chat == *chat && task.tag == tag)
			.map(|task| *task.key())
			.collect();
		let mut cancelled = 0_usize;
		for id in ids {
			if let Some((_, task)) = self.sessions.remove(&id) {
				task.token.cancel();
				cancelled = cancelled.saturating_add(1);
			}
		}
		cancelled
	}

	pub fn shutdown(&self) {
		self.root.cancel();
		self.intervals.clear();
		self.sessions.clear();
	}
}
