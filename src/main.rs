mod console;

use std::{env, path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result as AResult};
use ragnabot_commands::{commands, listeners};
use ragnabot_core::{bot_start, config::settings::Settings, logger};
use tokio::{spawn, sync::mpsc::channel};
use tracing::info;

use crate::console::{CONSOLE_NUMBER, ConsoleHost, read_stdin};

const DEFAULT_CONFIG: &str = "ragnabot.toml";
const INBOUND_CAPACITY: usize = 64;

/// `--config <path>` wins over `RAGNABOT_CONFIG`
fn config_path() -> PathBuf {
	let mut args = env::args().skip(1);
	while let Some(arg) = args.next() {
		if arg == "--config"
			&& let Some(path) = args.next()
		{
			return PathBuf::from(path);
		}
		if let Some(path) = arg.strip_prefix("--config=") {
			return PathBuf::from(path);
		}
	}
	env::var("RAGNABOT_CONFIG").map_or_else(|_| PathBuf::from(DEFAULT_CONFIG), PathBuf::from)
}

#[tokio::main]
async fn main() -> AResult<()> {
	let _ = dotenvy::dotenv();
	let path = config_path();
	let mut settings = Settings::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
	logger::init(&settings.bot.log_level)?;
	// Whoever sits at the console owns the bot
	settings.bot.owners.push(CONSOLE_NUMBER.to_owned());

	let (sender, inbound) = channel(INBOUND_CAPACITY);
	spawn(read_stdin(sender));
	info!("Console host ready, type commands such as .help");
	bot_start(
		settings,
		Arc::new(ConsoleHost::new()),
		inbound,
		commands(),
		listeners(),
	)
	.await
}
