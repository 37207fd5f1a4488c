use fastrand::Rng;
use ragnabot_core::{
	config::types::{Context, Error},
	games::{
		Difficulty, MoveError,
		tictactoe::{MoveOutcome, Opponent, PLAYER_X, TicTacToe},
	},
	handlers::{Category, Command, Handled, Listener},
	host::{OutgoingMessage, UserId},
	pending::{Interaction, SessionKey},
	utils::helpers::board_cell,
};
use tracing::{debug, warn};

use crate::usage;

const TTT_TAG: &str = "ttt";

fn participants(game: &TicTacToe) -> Vec<UserId> {
	let mut users = vec![game.challenger.clone()];
	if let Opponent::Player(opponent) = &game.opponent {
		users.push(opponent.clone());
	}
	users
}

fn outcome_text(game: &TicTacToe, outcome: MoveOutcome) -> String {
	match outcome {
		MoveOutcome::Won(PLAYER_X) => format!("🏆 {} wins!", game.challenger.mention()),
		MoveOutcome::Won(_) => match &game.opponent {
			Opponent::Player(opponent) => format!("🏆 {} wins!", opponent.mention()),
			Opponent::Bot(_) => "🤖 I win! Better luck next time.".to_owned(),
		},
		MoveOutcome::Draw => "🤝 It's a draw!".to_owned(),
		MoveOutcome::Continue => game.current_player().map_or_else(
			|| "🤖 My turn...".to_owned(),
			|player| format!("Your move {} (send 1-9)", player.mention()),
		),
	}
}

fn board_message(game: &TicTacToe, outcome: MoveOutcome) -> OutgoingMessage {
	OutgoingMessage::text_mentioning(
		format!(
			"🎮 *Tic-Tac-Toe*\n\n{}\n\n{}",
			game.render(),
			outcome_text(game, outcome)
		),
		participants(game),
	)
}

/// Plays the bot's reply after the configured pause, unless the game was stopped meanwhile
fn schedule_bot_move(ctx: &Context) {
	let task_ctx = ctx.clone();
	let delay = ctx.settings().interactions.bot_move_delay();
	ctx.data.timers.schedule(ctx.chat(), TTT_TAG, delay, async move {
		if let Err(err) = bot_move(&task_ctx).await {
			warn!("Tic-Tac-Toe bot move failed: {err:?}");
		}
	});
}

async fn bot_move(ctx: &Context) -> Result<(), Error> {
	let key = SessionKey::chat(ctx.chat().clone());
	let mut played = None;
	ctx.data.interactions.update(&key, &mut |interaction: &mut Interaction| {
		if let Interaction::TicTacToe(game) = interaction {
			let mut rng = Rng::new();
			played = game
				.play_bot(&mut rng)
				.map(|(_, outcome)| (outcome, game.clone()));
		}
	});
	let Some((outcome, game)) = played else {
		debug!("No Tic-Tac-Toe move for the bot in {}", ctx.chat());
		return Ok(());
	};
	if outcome.is_finished() {
		ctx.data.interactions.resolve(&key);
	}
	ctx.send(board_message(&game, outcome)).await?;
	Ok(())
}

#[must_use]
pub fn tictactoe() -> Command {
	Command::new("ttt", |ctx| Box::pin(tictactoe_command(ctx)))
		.aliases(&["tictactoe"])
		.description("Tic-Tac-Toe against the bot or a friend")
		.usage(".ttt start [easy|medium|hard] | .ttt @user | .ttt board | .ttt stop")
		.category(Category::Games)
}

async fn tictactoe_command(ctx: Context) -> Result<(), Error> {
	let args = ctx.args.trim().to_lowercase();
	let mut words = args.split_whitespace();
	match words.next() {
		Some("stop" | "end") => stop_game(&ctx).await,
		Some("board") => show_board(&ctx).await,
		Some("start" | "bot") => {
			let difficulty = match words.next() {
				None => Difficulty::default(),
				Some(level) => match level.parse::<Difficulty>() {
					Ok(difficulty) => difficulty,
					Err(()) => return usage(&ctx).await,
				},
			};
			start_game(&ctx, Opponent::Bot(difficulty)).await
		}
		Some(_) => {
			let Some(opponent) = ctx.message.mentions.first().cloned() else {
				return usage(&ctx).await;
			};
			if opponent == *ctx.author() || opponent == *ctx.host.bot_id() {
				ctx.reply("_Challenge someone else, or use .ttt start to play me._")
					.await?;
				return Ok(());
			}
			start_game(&ctx, Opponent::Player(opponent)).await
		}
		None => usage(&ctx).await,
	}
}

async fn start_game(ctx: &Context, opponent: Opponent) -> Result<(), Error> {
	let game = TicTacToe::new(ctx.author().clone(), opponent);
	let key = SessionKey::chat(ctx.chat().clone());
	if let Err(err) = ctx
		.data
		.interactions
		.begin(key, Interaction::TicTacToe(game.clone()))
	{
		ctx.reply(format!("_❗ {err}_")).await?;
		return Ok(());
	}
	let intro = match &game.opponent {
		Opponent::Bot(difficulty) => format!("vs 🤖 ({})", difficulty.name()),
		Opponent::Player(opponent) => format!("vs {}", opponent.mention()),
	};
	ctx.send(OutgoingMessage::text_mentioning(
		format!(
			"🎮 *Tic-Tac-Toe* {} {intro}\n❌ goes first.\n\n{}\n\n{}",
			game.challenger.mention(),
			game.render(),
			outcome_text(&game, MoveOutcome::Continue)
		),
		participants(&game),
	))
	.await?;
	Ok(())
}

async fn stop_game(ctx: &Context) -> Result<(), Error> {
	let key = SessionKey::chat(ctx.chat().clone());
	let game = match ctx.data.interactions.peek(&key).map(|pending| pending.interaction) {
		Some(Interaction::TicTacToe(game)) => game,
		_ => {
			ctx.reply("_No Tic-Tac-Toe game here._").await?;
			return Ok(());
		}
	};
	if !game.is_participant(ctx.author()) && !ctx.is_owner() {
		ctx.reply("_Only the players can stop this game._").await?;
		return Ok(());
	}
	ctx.data.timers.cancel_session(ctx.chat(), TTT_TAG);
	if ctx.data.interactions.cancel(&key) {
		ctx.reply("_🛑 Tic-Tac-Toe game stopped._").await?;
	} else {
		ctx.reply("_No Tic-Tac-Toe game here._").await?;
	}
	Ok(())
}

async fn show_board(ctx: &Context) -> Result<(), Error> {
	let key = SessionKey::chat(ctx.chat().clone());
	match ctx.data.interactions.peek(&key).map(|pending| pending.interaction) {
		Some(Interaction::TicTacToe(game)) => {
			ctx.send(board_message(&game, MoveOutcome::Continue)).await?;
		}
		_ => {
			ctx.reply("_No Tic-Tac-Toe game here. Start one with .ttt start_")
				.await?;
		}
	}
	Ok(())
}

#[must_use]
pub fn move_listener() -> Listener {
	Listener::new("ttt-move", |ctx| Box::pin(handle_move(ctx)))
}

/// A bare `1`-`9` from a player of the chat's game
async fn handle_move(ctx: Context) -> Result<Handled, Error> {
	let Some(cell) = board_cell(&ctx.args) else {
		return Ok(Handled::Ignored);
	};
	let key = SessionKey::chat(ctx.chat().clone());
	match ctx.data.interactions.peek(&key).map(|pending| pending.interaction) {
		Some(Interaction::TicTacToe(game)) if game.is_participant(ctx.author()) => {}
		_ => return Ok(Handled::Ignored),
	}

	let mut result = None;
	let author = ctx.author().clone();
	ctx.data.interactions.update(&key, &mut |interaction: &mut Interaction| {
		if let Interaction::TicTacToe(game) = interaction {
			result = Some(game.play(&author, cell).map(|outcome| (outcome, game.clone())));
		}
	});
	let Some(result) = result else {
		return Ok(Handled::Ignored);
	};

	match result {
		Ok((outcome, game)) => {
			if outcome.is_finished() {
				ctx.data.interactions.resolve(&key);
			}
			// The bot must still answer if posting the board fails
			if game.is_bot_turn() {
				schedule_bot_move(&ctx);
			}
			ctx.send(board_message(&game, outcome)).await?;
		}
		Err(MoveError::NotYourTurn) => {
			ctx.reply("_⏳ It's not your turn._").await?;
		}
		Err(MoveError::Occupied) => {
			ctx.reply("_That square is taken, pick another._").await?;
		}
		Err(err) => {
			ctx.reply(format!("_❗ {err}_")).await?;
		}
	}
	Ok(Handled::Consumed)
}
