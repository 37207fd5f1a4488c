use ragnabot_core::{
	config::types::{Context, Error},
	handlers::{Command, Listener},
	utils::upstream::UpstreamError,
};
use tracing::warn;

mod api_calls;
mod drafts;
mod games;
mod misc;
mod music;
mod settings;
mod sports;
mod tictactoe;

#[must_use]
pub fn commands() -> Vec<Command> {
	vec![
		api_calls::analyze(),
		api_calls::ask(),
		api_calls::currency(),
		api_calls::define(),
		api_calls::fact(),
		api_calls::forecast(),
		api_calls::image(),
		api_calls::insta(),
		api_calls::joke(),
		api_calls::lyrics(),
		api_calls::news(),
		api_calls::ocr(),
		api_calls::pimage(),
		api_calls::translate(),
		api_calls::tts(),
		api_calls::weather(),
		drafts::drafts(),
		drafts::move_piece(),
		drafts::stop_drafts(),
		games::answers(),
		games::eightball(),
		games::hack(),
		games::quiz(),
		games::rps(),
		games::truth_or_dare(),
		misc::help(),
		misc::ping(),
		misc::remind_me(),
		music::spotify(),
		settings::autobio(),
		settings::autodp(),
		settings::chatbot(),
		sports::epl(),
		tictactoe::tictactoe(),
	]
}

/// Generic text listeners in the order they get to see a message
#[must_use]
pub fn listeners() -> Vec<Listener> {
	vec![
		music::selection_listener(),
		tictactoe::move_listener(),
		drafts::destination_listener(),
		settings::chatbot_listener(),
	]
}

/// Logs an adapter failure and tells the chat in one line
async fn upstream_failed(ctx: &Context, service: &str, err: &UpstreamError) -> Result<(), Error> {
	warn!("{service} failed for {}: {err}", ctx.command);
	ctx.reply(err.user_message(service)).await?;
	Ok(())
}

/// Replies with the usage line of the running command
async fn usage(ctx: &Context) -> Result<(), Error> {
	let usage = ctx
		.commands
		.iter()
		.find(|command| command.name == ctx.command)
		.map_or("", |command| command.usage);
	ctx.reply(format!("_Usage: {usage}_")).await?;
	Ok(())
}
