use fastrand::Rng;
use ragnabot_core::{
	config::{
		constants::{DRAFTS_DEST_HINT, DRAFTS_SELECT_HINT},
		types::{Context, Error},
	},
	games::{
		Difficulty,
		drafts::{Drafts, DraftsOpponent, DraftsOutcome, Move, Pos, Side},
	},
	handlers::{Category, Command, Handled, Listener},
	host::{OutgoingMessage, UserId},
	pending::{Interaction, SessionKey},
	utils::helpers::{board_coordinate, selection_number},
};
use tracing::{debug, warn};
use winnow::Parser as _;

use crate::usage;

const DRAFTS_TAG: &str = "drafts";

fn players(game: &Drafts) -> Vec<UserId> {
	let mut users = vec![game.challenger.clone()];
	if let DraftsOpponent::Player(opponent) = &game.opponent {
		users.push(opponent.clone());
	}
	users
}

fn side_name(game: &Drafts, side: Side) -> String {
	match (side, &game.opponent) {
		(Side::Dark, _) => game.challenger.mention(),
		(Side::Light, DraftsOpponent::Player(opponent)) => opponent.mention(),
		(Side::Light, DraftsOpponent::Bot(_)) => "🤖".to_owned(),
	}
}

fn describe_move(mv: &Move) -> String {
	mv.captured.map_or_else(
		|| format!("{} → {}", mv.from.label(), mv.to.label()),
		|captured| {
			format!(
				"{} → {} (captures {})",
				mv.from.label(),
				mv.to.label(),
				captured.label()
			)
		},
	)
}

fn next_step(game: &Drafts, outcome: DraftsOutcome) -> String {
	match outcome {
		DraftsOutcome::Won(side) => format!("🏆 {} wins!", side_name(game, side)),
		DraftsOutcome::JumpAgain(pos) => format!(
			"⚡ Another capture is available! {} must jump again with *.move {}*",
			side_name(game, game.turn),
			pos.label()
		),
		DraftsOutcome::Continue => {
			if game.is_bot_turn() {
				"🤖 Thinking...".to_owned()
			} else {
				format!("{} to play.\n{DRAFTS_SELECT_HINT}", side_name(game, game.turn))
			}
		}
	}
}

fn board_message(game: &Drafts, header: &str, outcome: DraftsOutcome) -> OutgoingMessage {
	OutgoingMessage::text_mentioning(
		format!(
			"♟️ *Drafts*{header}\n\n{}\n\n{}",
			game.render(),
			next_step(game, outcome)
		),
		players(game),
	)
}

fn current_game(ctx: &Context) -> Option<Drafts> {
	let key = SessionKey::chat(ctx.chat().clone());
	match ctx.data.interactions.peek(&key).map(|pending| pending.interaction) {
		Some(Interaction::Drafts(game)) => Some(game),
		_ => None,
	}
}

fn schedule_bot_turn(ctx: &Context) {
	let task_ctx = ctx.clone();
	let delay = ctx.settings().interactions.bot_move_delay();
	ctx.data.timers.schedule(ctx.chat(), DRAFTS_TAG, delay, async move {
		if let Err(err) = bot_turn(&task_ctx).await {
			warn!("Drafts bot turn failed: {err:?}");
		}
	});
}

/// Plays the bot's whole turn, including every jump of a capture chain
async fn bot_turn(ctx: &Context) -> Result<(), Error> {
	let key = SessionKey::chat(ctx.chat().clone());
	let mut played: Vec<Move> = Vec::new();
	let mut last = None;
	ctx.data.interactions.update(&key, &mut |interaction: &mut Interaction| {
		if let Interaction::Drafts(game) = interaction {
			let mut rng = Rng::new();
			while let Some((mv, outcome)) = game.play_bot(&mut rng) {
				played.push(mv);
				last = Some((outcome, game.clone()));
				if !matches!(outcome, DraftsOutcome::JumpAgain(_)) {
					break;
				}
			}
		}
	});
	let Some((outcome, game)) = last else {
		debug!("No Drafts move for the bot in {}", ctx.chat());
		return Ok(());
	};
	if matches!(outcome, DraftsOutcome::Won(_)) {
		ctx.data.interactions.resolve(&key);
	}
	let moves: Vec<String> = played.iter().map(describe_move).collect();
	let header = format!("\n🤖 played {}", moves.join(", "));
	ctx.send(board_message(&game, &header, outcome)).await?;
	Ok(())
}

#[must_use]
pub fn drafts() -> Command {
	Command::new("drafts", |ctx| Box::pin(drafts_command(ctx)))
		.aliases(&["checkers"])
		.description("Drafts against a friend or the bot")
		.usage(".drafts @user | .drafts bot [easy|hard] | .drafts board")
		.category(Category::Games)
}

async fn drafts_command(ctx: Context) -> Result<(), Error> {
	let args = ctx.args.trim().to_lowercase();
	let mut words = args.split_whitespace();
	let opponent = match words.next() {
		Some("board") => {
			match current_game(&ctx) {
				Some(game) => {
					ctx.send(board_message(&game, "", DraftsOutcome::Continue))
						.await?;
				}
				None => {
					ctx.reply("_No Drafts game here._").await?;
				}
			}
			return Ok(());
		}
		Some("bot") => match words.next().map(str::parse::<Difficulty>) {
			None => DraftsOpponent::Bot(Difficulty::Easy),
			Some(Ok(difficulty)) => DraftsOpponent::Bot(difficulty),
			Some(Err(())) => return usage(&ctx).await,
		},
		Some(_) => {
			let Some(opponent) = ctx.message.mentions.first().cloned() else {
				return usage(&ctx).await;
			};
			if opponent == *ctx.author() || opponent == *ctx.host.bot_id() {
				ctx.reply("_Challenge someone else, or use .drafts bot._")
					.await?;
				return Ok(());
			}
			DraftsOpponent::Player(opponent)
		}
		None => return usage(&ctx).await,
	};

	let game = Drafts::new(ctx.author().clone(), opponent);
	let key = SessionKey::chat(ctx.chat().clone());
	if let Err(err) = ctx
		.data
		.interactions
		.begin(key, Interaction::Drafts(game.clone()))
	{
		ctx.reply(format!("_❗ {err}_")).await?;
		return Ok(());
	}
	let header = format!(
		"\n⚫ {} vs ⚪ {}",
		side_name(&game, Side::Dark),
		side_name(&game, Side::Light)
	);
	ctx.send(board_message(&game, &header, DraftsOutcome::Continue))
		.await?;
	Ok(())
}

#[must_use]
pub fn move_piece() -> Command {
	Command::new("move", |ctx| Box::pin(select_piece(ctx)))
		.description("Select a Drafts piece by row and column")
		.usage(".move RC (e.g. .move 63)")
		.category(Category::Games)
}

async fn select_piece(ctx: Context) -> Result<(), Error> {
	let Some(pos) = board_coordinate
		.parse(ctx.args.trim())
		.ok()
		.and_then(|(row, col)| Pos::from_user(row, col))
	else {
		return usage(&ctx).await;
	};
	let key = SessionKey::chat(ctx.chat().clone());
	let mut selection = None;
	let author = ctx.author().clone();
	ctx.data.interactions.update(&key, &mut |interaction: &mut Interaction| {
		if let Interaction::Drafts(game) = interaction {
			selection = Some(game.select(&author, pos).map(<[Move]>::to_vec));
		}
	});
	match selection {
		None => {
			ctx.reply("_No Drafts game here. Start one with .drafts_").await?;
		}
		Some(Err(err)) => {
			ctx.reply(format!("_❗ {err}_")).await?;
		}
		Some(Ok(options)) => {
			let lines: Vec<String> = options
				.iter()
				.enumerate()
				.map(|(index, mv)| format!("*{}.* {}", index.saturating_add(1), describe_move(mv)))
				.collect();
			ctx.reply(format!(
				"Selected piece at {}.\n\n{}\n\n{DRAFTS_DEST_HINT}",
				pos.label(),
				lines.join("\n")
			))
			.await?;
		}
	}
	Ok(())
}

#[must_use]
pub fn stop_drafts() -> Command {
	Command::new("stopdrafts", |ctx| Box::pin(end_drafts(ctx)))
		.description("End the Drafts game in this chat")
		.usage(".stopdrafts")
		.category(Category::Games)
}

async fn end_drafts(ctx: Context) -> Result<(), Error> {
	let Some(game) = current_game(&ctx) else {
		ctx.reply("_No Drafts game here._").await?;
		return Ok(());
	};
	if game.side_of(ctx.author()).is_none() && !ctx.is_owner() {
		ctx.reply("_Only the players can stop this game._").await?;
		return Ok(());
	}
	ctx.data.timers.cancel_session(ctx.chat(), DRAFTS_TAG);
	let key = SessionKey::chat(ctx.chat().clone());
	if ctx.data.interactions.cancel(&key) {
		ctx.reply("_🛑 Drafts game ended._").await?;
	} else {
		ctx.reply("_No Drafts game here._").await?;
	}
	Ok(())
}

#[must_use]
pub fn destination_listener() -> Listener {
	Listener::new("drafts-destination", |ctx| Box::pin(choose_destination(ctx)))
}

/// A bare destination number after `.move`; anything out of range is left alone
async fn choose_destination(ctx: Context) -> Result<Handled, Error> {
	let Some(choice) = selection_number(&ctx.args) else {
		return Ok(Handled::Ignored);
	};
	let Some(game) = current_game(&ctx) else {
		return Ok(Handled::Ignored);
	};
	if game.selected.is_none()
		|| game.player_on_turn() != Some(ctx.author())
		|| choice > game.options.len()
	{
		return Ok(Handled::Ignored);
	}

	let key = SessionKey::chat(ctx.chat().clone());
	let author = ctx.author().clone();
	let mut result = None;
	ctx.data.interactions.update(&key, &mut |interaction: &mut Interaction| {
		if let Interaction::Drafts(game) = interaction {
			result = Some(
				game.choose(&author, choice)
					.map(|(mv, outcome)| (mv, outcome, game.clone())),
			);
		}
	});
	match result {
		None => Ok(Handled::Ignored),
		Some(Err(err)) => {
			ctx.reply(format!("_❗ {err}_")).await?;
			Ok(Handled::Consumed)
		}
		Some(Ok((mv, outcome, game))) => {
			if matches!(outcome, DraftsOutcome::Won(_)) {
				ctx.data.interactions.resolve(&key);
			}
			if game.is_bot_turn() {
				schedule_bot_turn(&ctx);
			}
			let header = format!("\n{} played {}", ctx.author().mention(), describe_move(&mv));
			ctx.send(board_message(&game, &header, outcome)).await?;
			Ok(Handled::Consumed)
		}
	}
}
