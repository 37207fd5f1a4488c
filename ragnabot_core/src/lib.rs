pub mod config;
mod events;
pub mod games;
pub mod handlers;
pub mod host;
pub mod logger;
pub mod pending;
pub mod timers;
pub mod utils;

use std::{sync::Arc, time::Duration};

use anyhow::Result as AResult;
use tokio::{
	select,
	signal::unix::{SignalKind, signal},
	spawn,
	sync::mpsc::Receiver,
	time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{
	config::{settings::Settings, types::Data},
	events::message_sent::handle_inbound,
	handlers::{Command, Framework, Listener},
	host::{ChatHost, InboundMessage},
	pending::InteractionStore,
};

async fn wait_until_shutdown() -> AResult<()> {
	let [mut s1, mut s2, mut s3] = [
		signal(SignalKind::hangup())?,
		signal(SignalKind::interrupt())?,
		signal(SignalKind::terminate())?,
	];

	select!(
		_ = s1.recv() => {},
		_ = s2.recv() => {},
		_ = s3.recv() => {},
	);
	Ok(())
}

async fn periodic_sweep(store: Arc<dyn InteractionStore>, period: Duration) -> ! {
	let mut interval = interval(period);
	interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
	loop {
		interval.tick().await;
		let removed = store.sweep();
		if removed > 0 {
			debug!("Swept {removed} expired interaction(s)");
		}
	}
}

/// Runs the bot until the host closes `inbound` or the process is asked to stop
pub async fn bot_start(
	settings: Settings,
	host: Arc<dyn ChatHost>,
	inbound: Receiver<InboundMessage>,
	commands: Vec<Command>,
	listeners: Vec<Listener>,
) -> AResult<()> {
	let sweep_period = Duration::from_secs(settings.interactions.sweep_interval_secs.max(1));
	let data = Arc::new(Data::new(settings));
	let framework = Arc::new(Framework::new(Arc::clone(&data), commands, listeners));
	info!(
		"{} ready with {} commands as {}",
		data.settings.bot.name,
		framework.commands().len(),
		host.bot_id()
	);

	let store = Arc::clone(&data.interactions);
	let sweeper = spawn(async move {
		periodic_sweep(store, sweep_period).await;
	});

	let result = select! {
		() = handle_inbound(framework, host, inbound) => Ok(()),
		shutdown = wait_until_shutdown() => {
			warn!("Received shutdown signal, stopping...");
			shutdown
		}
	};

	sweeper.abort();
	data.timers.shutdown();
	info!("Cancelled all timers");
	result
}
