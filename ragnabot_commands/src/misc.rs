use std::{collections::BTreeMap, fmt::Write as _};

use ragnabot_core::{
	config::types::{Context, Error},
	handlers::{Access, Category, Command},
	host::OutgoingMessage,
	utils::helpers::reminder,
};
use tokio::time::Instant;
use tracing::{info, warn};
use winnow::Parser as _;

use crate::usage;

const REMIND_TAG: &str = "remind";

#[must_use]
pub fn help() -> Command {
	Command::new("help", |ctx| Box::pin(help_command(ctx)))
		.aliases(&["menu", "commands"])
		.description("List the commands or explain one")
		.usage(".help [command]")
}

fn command_detail(prefix: &str, command: &Command) -> String {
	let mut detail = format!("*{prefix}{}*\n{}", command.name, command.description);
	if !command.aliases.is_empty() {
		let _ = write!(detail, "\n_Aliases:_ {}", command.aliases.join(", "));
	}
	if !command.usage.is_empty() {
		let _ = write!(detail, "\n_Usage:_ {}", command.usage);
	}
	if command.access == Access::OwnerOnly {
		detail.push_str("\n🔒 Owner only");
	}
	detail
}

fn command_menu(bot_name: &str, prefix: &str, commands: &[Command]) -> String {
	let mut grouped: BTreeMap<Category, Vec<&Command>> = BTreeMap::new();
	for command in commands {
		grouped.entry(command.category).or_default().push(command);
	}
	let mut menu = format!("*{bot_name}*\n");
	for (category, commands) in grouped {
		let _ = write!(menu, "\n*{}*\n", category.title());
		for command in commands {
			let lock = if command.access == Access::OwnerOnly {
				" 🔒"
			} else {
				""
			};
			let _ = writeln!(menu, "• {prefix}{}{lock} - {}", command.name, command.description);
		}
	}
	let _ = write!(menu, "\n_Use {prefix}help <command> for details._");
	menu
}

async fn help_command(ctx: Context) -> Result<(), Error> {
	let settings = ctx.settings();
	let prefix = settings.bot.prefixes.first().map_or(".", String::as_str);
	let wanted = ctx.args.trim().trim_start_matches(prefix).to_lowercase();
	if wanted.is_empty() {
		ctx.reply(command_menu(&settings.bot.name, prefix, &ctx.commands))
			.await?;
		return Ok(());
	}
	let found = ctx
		.commands
		.iter()
		.find(|command| {
			command.name == wanted || command.aliases.iter().any(|alias| *alias == wanted)
		});
	match found {
		Some(command) => {
			ctx.reply(command_detail(prefix, command)).await?;
		}
		None => {
			ctx.reply(format!("_No command named {wanted}._")).await?;
		}
	}
	Ok(())
}

#[must_use]
pub fn ping() -> Command {
	Command::new("ping", |ctx| Box::pin(ping_command(ctx)))
		.description("Check that the bot is alive")
		.usage(".ping")
}

async fn ping_command(ctx: Context) -> Result<(), Error> {
	let started = Instant::now();
	let key = ctx.reply("🏓 Pong!").await?;
	let latency = started.elapsed().as_millis();
	ctx.edit(&key, &format!("🏓 Pong! `{latency} ms`")).await?;
	Ok(())
}

#[must_use]
pub fn remind_me() -> Command {
	Command::new("remindme", |ctx| Box::pin(remind_me_command(ctx)))
		.aliases(&["remind"])
		.description("Remind you of something later")
		.usage(".remindme 10m drink water | .remindme cancel")
		.category(Category::Automation)
}

async fn remind_me_command(ctx: Context) -> Result<(), Error> {
	let args = ctx.args.trim();
	if args.is_empty() {
		return usage(&ctx).await;
	}
	if args.eq_ignore_ascii_case("cancel") {
		let cancelled = ctx.data.timers.cancel_session(ctx.chat(), REMIND_TAG);
		if cancelled == 0 {
			ctx.reply("_No reminders pending in this chat._").await?;
		} else {
			ctx.reply(format!("_🗑️ Cancelled {cancelled} reminder(s)._"))
				.await?;
		}
		return Ok(());
	}

	let Ok(request) = reminder.parse(args) else {
		ctx.reply("_❌ Invalid format. Try: .remindme 10m drink water_")
			.await?;
		return Ok(());
	};
	let Some(delay) = request.delay() else {
		ctx.reply("_⏰ Time must be greater than zero._").await?;
		return Ok(());
	};

	let task_ctx = ctx.clone();
	let text = request.text.clone();
	ctx.data.timers.schedule(ctx.chat(), REMIND_TAG, delay, async move {
		let author = task_ctx.author().clone();
		let message = OutgoingMessage::text_mentioning(
			format!("_🔔 Reminder for {}:_ {text}", author.mention()),
			vec![author],
		);
		if let Err(err) = task_ctx.send(message).await {
			warn!("Failed to deliver reminder in {}: {err:?}", task_ctx.chat());
		}
	});
	info!(
		"Reminder set by {} in {} for {}s",
		ctx.author(),
		ctx.chat(),
		delay.as_secs()
	);
	ctx.reply(format!(
		"_✅ Reminder set for {}{}: {}_",
		request.amount, request.unit, request.text
	))
	.await?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn menu_groups_commands_under_their_category() {
		let commands = vec![
			ping(),
			remind_me(),
			Command::new("autobio", |ctx| Box::pin(ping_command(ctx)))
				.description("Rotate the profile about text")
				.category(Category::Automation)
				.owner_only(),
		];
		let menu = command_menu("RagnaBot", ".", &commands);
		let automation = menu.find(Category::Automation.title());
		let misc = menu.find(Category::Misc.title());
		assert!(automation.is_some() && misc.is_some());
		assert!(automation < misc);
		assert!(menu.contains("• .autobio 🔒 - Rotate the profile about text"));
		assert!(menu.contains("• .ping - Check that the bot is alive"));
	}

	#[test]
	fn detail_lists_aliases_and_usage() {
		let detail = command_detail(".", &remind_me());
		assert!(detail.starts_with("*.remindme*"));
		assert!(detail.contains("_Aliases:_ remind"));
		assert!(detail.contains("_Usage:_ .remindme 10m drink water"));
		assert!(!detail.contains("Owner only"));
	}
}
