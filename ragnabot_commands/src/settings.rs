use std::{
	sync::{Arc, atomic::Ordering},
	time::Duration,
};

use anyhow::Context as _;
use ragnabot_core::{
	config::{
		constants::{CHATBOT_HELP, MISSING_GEMINI_KEY_MSG},
		types::{Context, Error, HTTP_CLIENT},
	},
	handlers::{Category, Command, Handled, Listener},
	host::{ChatHost, MediaKind},
	timers::TimerError,
	utils::{
		ai::{ChatbotReply, InlineImage, ai_chatbot},
		helpers::quoted_text,
		upstream::{UpstreamError, get_json, read_bytes, truncate_chars},
	},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::usage;

const AUTOBIO: &str = "autobio";
const AUTODP: &str = "autodp";
/// WhatsApp rejects longer "about" texts
const ABOUT_LIMIT: usize = 139;
const IMAGE_PROMPT: &str = "What do you see in this image?";

#[derive(Deserialize)]
struct ZenQuote {
	q: String,
	a: String,
}

async fn fetch_quote(url: &str) -> Result<String, UpstreamError> {
	let quotes: Vec<ZenQuote> = get_json(url, &[]).await?;
	let quote = quotes.into_iter().next().ok_or(UpstreamError::Empty)?;
	Ok(format!("{} ~ {}", quote.q.trim(), quote.a.trim()))
}

async fn update_bio(host: Arc<dyn ChatHost>, url: String) -> Result<(), Error> {
	let quote = fetch_quote(&url).await?;
	let (about, _) = truncate_chars(&quote, ABOUT_LIMIT);
	host.update_profile_status(about)
		.await
		.context("Failed to update profile status")?;
	info!("Profile about text set to {about:?}");
	Ok(())
}

async fn update_picture(host: Arc<dyn ChatHost>, url: String) -> Result<(), Error> {
	let image = read_bytes(HTTP_CLIENT.get(&url)).await?;
	host.update_profile_picture(image)
		.await
		.context("Failed to update profile picture")?;
	info!("Profile picture refreshed from {url}");
	Ok(())
}

fn minutes(period: Duration) -> u64 {
	period.as_secs().div_ceil(60)
}

/// A profile refresher driven by one named interval timer
struct Automation {
	timer: &'static str,
	label: &'static str,
	verb: &'static str,
	period: Duration,
	source: String,
}

/// Shared `on|off|status` handling; `refresh` runs once per period
async fn toggle_automation<F, Fut>(ctx: &Context, job: Automation, refresh: F) -> Result<(), Error>
where
	F: Fn(Arc<dyn ChatHost>, String) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
	let Automation {
		timer,
		label,
		verb,
		period,
		source,
	} = job;
	match ctx.args.trim().to_lowercase().as_str() {
		"on" | "start" => {
			let host = Arc::clone(&ctx.host);
			let started = ctx.data.timers.start_interval(timer, period, move || {
				let run = refresh(Arc::clone(&host), source.clone());
				async move {
					if let Err(err) = run.await {
						warn!("{label} update failed: {err:?}");
					}
				}
			});
			match started {
				Ok(()) => {
					ctx.reply(format!(
						"_✅ {label} started, {verb} every {} minute(s)._",
						minutes(period)
					))
					.await?;
				}
				Err(TimerError::AlreadyRunning(_)) => {
					ctx.reply(format!("_⚠️ {label} is already running._"))
						.await?;
				}
				Err(err) => return Err(err.into()),
			}
		}
		"off" | "stop" => {
			let reply = match ctx.data.timers.stop(timer) {
				Ok(()) => format!("_🛑 {label} stopped._"),
				Err(_) => format!("_⚠️ {label} is not running._"),
			};
			ctx.reply(reply).await?;
		}
		"status" => {
			let state = if ctx.data.timers.is_running(timer) {
				"running"
			} else {
				"stopped"
			};
			ctx.reply(format!(
				"_{label} is {state} (every {} minute(s), source {source})._",
				minutes(period)
			))
			.await?;
		}
		_ => return usage(ctx).await,
	}
	Ok(())
}

#[must_use]
pub fn autobio() -> Command {
	Command::new(AUTOBIO, |ctx| Box::pin(autobio_command(ctx)))
		.description("Rotate the profile about text with quotes")
		.usage(".autobio on|off|status")
		.category(Category::Automation)
		.owner_only()
}

async fn autobio_command(ctx: Context) -> Result<(), Error> {
	let job = Automation {
		timer: AUTOBIO,
		label: "Auto-bio",
		verb: "updating",
		period: Duration::from_secs(ctx.settings().automation.autobio_interval_secs),
		source: ctx.settings().api.quotes.clone(),
	};
	toggle_automation(&ctx, job, update_bio).await
}

#[must_use]
pub fn autodp() -> Command {
	Command::new(AUTODP, |ctx| Box::pin(autodp_command(ctx)))
		.description("Refresh the profile picture on a schedule")
		.usage(".autodp on|off|status")
		.category(Category::Automation)
		.owner_only()
}

async fn autodp_command(ctx: Context) -> Result<(), Error> {
	let automation = &ctx.settings().automation;
	let job = Automation {
		timer: AUTODP,
		label: "Auto-DP",
		verb: "refreshing",
		period: Duration::from_secs(automation.autodp_interval_secs),
		source: automation.autodp_image_url.clone(),
	};
	toggle_automation(&ctx, job, update_picture).await
}

#[must_use]
pub fn chatbot() -> Command {
	Command::new("chatbot", |ctx| Box::pin(chatbot_command(ctx)))
		.description("Manage the AI chatbot")
		.usage(".chatbot on|off [groups|dms] | .chatbot set \"prompt\" | .chatbot clear | .chatbot status")
		.category(Category::Ai)
		.owner_only()
}

async fn chatbot_command(ctx: Context) -> Result<(), Error> {
	let args = ctx.args.trim();
	let mut words = args.split_whitespace();
	let action = words.next().map(str::to_lowercase);
	let target = words.next().map(str::to_lowercase);
	let chatbot = &ctx.data.chatbot;
	match (action.as_deref(), target.as_deref()) {
		(None | Some("help"), _) => {
			ctx.reply(CHATBOT_HELP).await?;
		}
		(Some(switch @ ("on" | "off")), scope) => {
			let enable = switch == "on";
			if enable && ctx.settings().api.gemini_key.is_none() {
				ctx.reply(MISSING_GEMINI_KEY_MSG).await?;
				return Ok(());
			}
			let verb = if enable { "enabled" } else { "disabled" };
			let reply = match scope {
				Some("groups") => {
					chatbot.groups.store(enable, Ordering::Relaxed);
					format!("_🤖 Chatbot {verb} for all groups (answers mentions and replies)._")
				}
				Some("dms") => {
					chatbot.dms.store(enable, Ordering::Relaxed);
					format!("_🤖 Chatbot {verb} for all DMs._")
				}
				None => {
					chatbot.enabled_chats.insert(ctx.chat().clone(), enable);
					format!("_🤖 Chatbot {verb} in this chat._")
				}
				Some(_) => return usage(&ctx).await,
			};
			info!("Chatbot {verb} ({}) by {}", scope.unwrap_or("chat"), ctx.author());
			ctx.reply(reply).await?;
		}
		(Some("set"), _) => {
			let Some(prompt) = quoted_text(args) else {
				ctx.reply("_Put the prompt in quotes, e.g. .chatbot set \"You are a helpful assistant.\"_")
					.await?;
				return Ok(());
			};
			let reply = format!("_🎯 System prompt updated:_ {prompt}");
			*chatbot.system_prompt.write().await = prompt;
			ctx.reply(reply).await?;
		}
		(Some("clear"), Some("all")) => {
			chatbot.contexts.invalidate_all();
			ctx.reply("_💭 Every conversation context was cleared._")
				.await?;
		}
		(Some("clear"), _) => {
			chatbot.contexts.invalidate(ctx.chat());
			ctx.reply("_💭 Context cleared for this chat._").await?;
		}
		(Some("status"), _) => {
			let on_off = |enabled: bool| if enabled { "on" } else { "off" };
			let model_level = chatbot.context(ctx.chat()).lock().await.model_level;
			let model = ctx
				.settings()
				.api
				.gemini_models
				.get(model_level)
				.map_or("none left", String::as_str);
			let prompt = chatbot.system_prompt.read().await.clone();
			ctx.reply(format!(
				"*🤖 Chatbot status*\n\nThis chat: {}\nGroups: {}\nDMs: {}\nModel: {model}\nPrompt: _{prompt}_",
				on_off(chatbot.is_enabled(ctx.chat())),
				on_off(chatbot.groups.load(Ordering::Relaxed)),
				on_off(chatbot.dms.load(Ordering::Relaxed)),
			))
			.await?;
		}
		_ => return usage(&ctx).await,
	}
	Ok(())
}

#[must_use]
pub fn chatbot_listener() -> Listener {
	Listener::new("chatbot", |ctx| Box::pin(chatbot_reply(ctx)))
}

/// Groups only get an answer when they talk to the bot
fn addressed_to_bot(ctx: &Context) -> bool {
	if !ctx.message.is_group() {
		return true;
	}
	let bot = ctx.host.bot_id();
	ctx.message.mentions.iter().any(|user| user == bot)
		|| ctx
			.message
			.quoted
			.as_ref()
			.is_some_and(|quoted| quoted.sender == *bot)
}

async fn chatbot_reply(ctx: Context) -> Result<Handled, Error> {
	if !ctx.data.chatbot.is_enabled(ctx.chat())
		|| ctx.settings().api.gemini_key.is_none()
		|| !addressed_to_bot(&ctx)
	{
		return Ok(Handled::Ignored);
	}

	let image = match ctx
		.message
		.media_or_quoted()
		.filter(|media| media.kind == MediaKind::Image)
	{
		Some(media) => match ctx.host.download_media(media).await {
			Ok(data) => Some(InlineImage {
				mime_type: media.mime_type.clone(),
				data,
			}),
			Err(err) => {
				warn!("Chatbot image download failed: {err}");
				ctx.reply("_❌ Failed to download the image, try again._")
					.await?;
				return Ok(Handled::Consumed);
			}
		},
		None => None,
	};
	let text = ctx.args.as_str();
	let text = if image.is_some() && text.chars().count() < 2 {
		IMAGE_PROMPT
	} else if text.chars().count() < 2 {
		return Ok(Handled::Ignored);
	} else {
		text
	};

	match ai_chatbot(&ctx.data, ctx.chat(), text, image).await {
		Ok(ChatbotReply::Answer(answer)) => {
			ctx.reply(answer).await?;
		}
		Ok(ChatbotReply::SwitchedModel(model)) => {
			ctx.reply(format!(
				"_⚠️ Rate limited, switched to {model}. Send your message again._"
			))
			.await?;
		}
		Ok(ChatbotReply::Exhausted) => {
			ctx.reply("_❌ Every AI model is rate limited right now, try again later._")
				.await?;
		}
		Err(UpstreamError::MissingKey(_)) => return Ok(Handled::Ignored),
		Err(err) => {
			warn!("Chatbot reply failed in {}: {err}", ctx.chat());
			ctx.reply(err.user_message("Gemini")).await?;
		}
	}
	Ok(Handled::Consumed)
}
