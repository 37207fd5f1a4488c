use std::time::Duration;

use fastrand::Rng;
use ragnabot_core::{
	config::{
		constants::{DARES, EIGHT_BALL_RESPONSES, HACK_STEPS, QUIZ_QUESTIONS, TRUTHS},
		types::{Context, Error, TOD_COOLDOWN},
	},
	games::quiz::{QuizKey, QuizQuestion, letter},
	handlers::{Category, Command},
	host::OutgoingMessage,
	pending::{Interaction, SessionKey},
	utils::{
		helpers::{decode_url3986, quiz_answers},
		upstream::{UpstreamError, get_json},
	},
};
use serde::Deserialize;
use tokio::time::{Instant, sleep};
use tracing::warn;
use winnow::Parser as _;

use crate::{upstream_failed, usage};

const HACK_TAG: &str = "hack";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RpsChoice {
	Rock,
	Paper,
	Scissors,
}

impl RpsChoice {
	const ALL: [Self; 3] = [Self::Rock, Self::Paper, Self::Scissors];

	fn parse(input: &str) -> Option<Self> {
		match input.trim().to_lowercase().as_str() {
			"rock" | "r" | "🪨" => Some(Self::Rock),
			"paper" | "p" | "🧻" => Some(Self::Paper),
			"scissors" | "scissor" | "s" | "✂️" => Some(Self::Scissors),
			_ => None,
		}
	}

	const fn beats(self, other: Self) -> bool {
		matches!(
			(self, other),
			(Self::Rock, Self::Scissors) | (Self::Paper, Self::Rock) | (Self::Scissors, Self::Paper)
		)
	}

	const fn emoji(self) -> &'static str {
		match self {
			Self::Rock => "🪨",
			Self::Paper => "🧻",
			Self::Scissors => "✂️",
		}
	}
}

#[must_use]
pub fn rps() -> Command {
	Command::new("rps", |ctx| Box::pin(rock_paper_scissors(ctx)))
		.description("Rock paper scissors against the bot")
		.usage(".rps <rock|paper|scissors>")
		.category(Category::Games)
}

async fn rock_paper_scissors(ctx: Context) -> Result<(), Error> {
	let Some(choice) = RpsChoice::parse(&ctx.args) else {
		return usage(&ctx).await;
	};
	let bot_choice = RpsChoice::ALL
		.get(fastrand::usize(..RpsChoice::ALL.len()))
		.copied()
		.unwrap_or(RpsChoice::Rock);
	let verdict = if choice == bot_choice {
		"🤝 It's a draw!"
	} else if choice.beats(bot_choice) {
		"🎉 You win!"
	} else {
		"😈 I win!"
	};
	ctx.reply(format!(
		"You: {}\nMe: {}\n\n{verdict}",
		choice.emoji(),
		bot_choice.emoji()
	))
	.await?;
	Ok(())
}

#[must_use]
pub fn eightball() -> Command {
	Command::new("8ball", |ctx| Box::pin(magic_eightball(ctx)))
		.aliases(&["eightball"])
		.description("Ask the magic 8-ball")
		.usage(".8ball <question>")
		.category(Category::Fun)
}

async fn magic_eightball(ctx: Context) -> Result<(), Error> {
	let question = ctx.args.trim();
	if question.chars().count() < 5 {
		ctx.reply("_🎱 Ask a real question (at least 5 characters)._")
			.await?;
		return Ok(());
	}
	let key = ctx.reply("🎱 _Shaking the magic 8-ball..._").await?;
	sleep(Duration::from_millis(1200)).await;
	let answer = EIGHT_BALL_RESPONSES
		.get(fastrand::usize(..EIGHT_BALL_RESPONSES.len()))
		.copied()
		.unwrap_or("Ask again later.");
	ctx.edit(&key, &format!("🎱 *Question:* {question}\n*Answer:* {answer}"))
		.await?;
	Ok(())
}

#[must_use]
pub fn truth_or_dare() -> Command {
	Command::new("tod", |ctx| Box::pin(pick_truth_or_dare(ctx)))
		.description("Truth or dare")
		.usage(".tod [truth|dare]")
		.category(Category::Fun)
}

async fn pick_truth_or_dare(ctx: Context) -> Result<(), Error> {
	let now = Instant::now();
	if let Some(last) = ctx.data.cooldowns.get(ctx.author()) {
		let left = TOD_COOLDOWN.saturating_sub(now.saturating_duration_since(last));
		if !left.is_zero() {
			ctx.reply(format!(
				"_⏳ Slow down! Try again in {}s._",
				left.as_secs().max(1)
			))
			.await?;
			return Ok(());
		}
	}
	let truth = match ctx.args.trim().to_lowercase().as_str() {
		"truth" | "t" => true,
		"dare" | "d" => false,
		"" => fastrand::bool(),
		_ => return usage(&ctx).await,
	};
	ctx.data.cooldowns.insert(ctx.author().clone(), now);
	let (label, pool): (&str, &[&str]) = if truth {
		("🤔 *Truth*", &TRUTHS)
	} else {
		("🔥 *Dare*", &DARES)
	};
	let prompt = pool
		.get(fastrand::usize(..pool.len()))
		.copied()
		.unwrap_or_default();
	ctx.send(OutgoingMessage::text_mentioning(
		format!("{label} for {}\n\n{prompt}", ctx.author().mention()),
		vec![ctx.author().clone()],
	))
	.await?;
	Ok(())
}

#[derive(Deserialize)]
struct TriviaResponse {
	response_code: u8,
	results: Vec<TriviaQuestion>,
}

#[derive(Deserialize)]
struct TriviaQuestion {
	category: String,
	question: String,
	correct_answer: String,
	incorrect_answers: Vec<String>,
}

async fn fetch_questions(url: &str, category: Option<&str>) -> Result<Vec<QuizQuestion>, UpstreamError> {
	let amount = QUIZ_QUESTIONS.to_string();
	let mut query = vec![
		("amount", amount.as_str()),
		("type", "multiple"),
		("encode", "url3986"),
	];
	if let Some(category) = category {
		query.push(("category", category));
	}
	let response: TriviaResponse = get_json(url, &query).await?;
	if response.response_code != 0 || response.results.len() < QUIZ_QUESTIONS {
		return Err(UpstreamError::Empty);
	}
	let mut rng = Rng::new();
	Ok(response
		.results
		.into_iter()
		.take(QUIZ_QUESTIONS)
		.map(|trivia| {
			QuizQuestion::shuffled(
				decode_url3986(&trivia.category),
				decode_url3986(&trivia.question),
				decode_url3986(&trivia.correct_answer),
				trivia
					.incorrect_answers
					.iter()
					.map(|answer| decode_url3986(answer))
					.collect(),
				&mut rng,
			)
		})
		.collect())
}

fn render_quiz(questions: &[QuizQuestion]) -> String {
	let body: Vec<String> = questions
		.iter()
		.enumerate()
		.map(|(number, question)| {
			let options: Vec<String> = question
				.options
				.iter()
				.enumerate()
				.map(|(index, option)| format!("{}. {option}", letter(index)))
				.collect();
			format!(
				"*{}.* {}\n_{}_\n{}",
				number.saturating_add(1),
				question.question,
				question.category,
				options.join("\n")
			)
		})
		.collect();
	format!(
		"🧠 *Quiz time!* ({} questions)\n\n{}\n\n_Answer with .answers followed by {} letters, e.g. .answers B A C D A_",
		questions.len(),
		body.join("\n\n"),
		questions.len()
	)
}

#[must_use]
pub fn quiz() -> Command {
	Command::new("quiz", |ctx| Box::pin(start_quiz(ctx)))
		.aliases(&["trivia"])
		.description("Five trivia questions, answer with .answers")
		.usage(".quiz [category id]")
		.category(Category::Games)
}

async fn start_quiz(ctx: Context) -> Result<(), Error> {
	let key = SessionKey::member(ctx.chat().clone(), ctx.author().clone());
	if let Some(pending) = ctx.data.interactions.peek(&key) {
		ctx.reply(format!(
			"_❗ You already have {} running. Finish it first._",
			pending.interaction.kind().describe()
		))
		.await?;
		return Ok(());
	}
	let category = Some(ctx.args.trim())
		.filter(|arg| !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit()));
	let questions = match fetch_questions(&ctx.settings().api.trivia, category).await {
		Ok(questions) => questions,
		Err(err) => return upstream_failed(&ctx, "Open Trivia DB", &err).await,
	};
	let answer_key = QuizKey::from_questions(&questions);
	if let Err(err) = ctx.data.interactions.begin(key, Interaction::Quiz(answer_key)) {
		ctx.reply(format!("_❗ {err}_")).await?;
		return Ok(());
	}
	ctx.reply(render_quiz(&questions)).await?;
	Ok(())
}

#[must_use]
pub fn answers() -> Command {
	Command::new("answers", |ctx| Box::pin(grade_answers(ctx)))
		.aliases(&["answer"])
		.description("Submit your quiz answers")
		.usage(".answers B A C D A")
		.category(Category::Games)
}

async fn grade_answers(ctx: Context) -> Result<(), Error> {
	let key = SessionKey::member(ctx.chat().clone(), ctx.author().clone());
	let expected = match ctx.data.interactions.peek(&key).map(|pending| pending.interaction) {
		Some(Interaction::Quiz(answer_key)) => answer_key.len(),
		_ => {
			ctx.reply("_You have no quiz running. Start one with .quiz_").await?;
			return Ok(());
		}
	};
	let submitted = match quiz_answers.parse(ctx.args.trim()) {
		Ok(letters) if letters.len() == expected => letters,
		_ => {
			ctx.reply(format!(
				"_Send exactly {expected} letters A-D, e.g. .answers B A C D A_"
			))
			.await?;
			return Ok(());
		}
	};
	let Some(Interaction::Quiz(answer_key)) = ctx
		.data
		.interactions
		.resolve(&key)
		.map(|pending| pending.interaction)
	else {
		ctx.reply("_You have no quiz running. Start one with .quiz_").await?;
		return Ok(());
	};
	let score = answer_key.grade(&submitted);
	let lines: Vec<String> = score
		.marks
		.iter()
		.enumerate()
		.map(|(index, &(given, right))| {
			if given == right {
				format!("{}. {given} ✅", index.saturating_add(1))
			} else {
				format!("{}. {given} ❌ ({right})", index.saturating_add(1))
			}
		})
		.collect();
	ctx.reply(format!(
		"📝 *Quiz results:* {}/{}\n\n{}",
		score.correct,
		score.total,
		lines.join("\n")
	))
	.await?;
	Ok(())
}

#[must_use]
pub fn hack() -> Command {
	Command::new("hack", |ctx| Box::pin(fake_hack(ctx)))
		.description("Totally real hacking animation")
		.usage(".hack @user | .hack stop")
		.category(Category::Fun)
}

async fn fake_hack(ctx: Context) -> Result<(), Error> {
	let args = ctx.args.trim();
	if args.eq_ignore_ascii_case("stop") {
		let stopped = ctx.data.timers.cancel_session(ctx.chat(), HACK_TAG);
		let reply = if stopped > 0 {
			"_🛑 Hack aborted._"
		} else {
			"_No hack is running here._"
		};
		ctx.reply(reply).await?;
		return Ok(());
	}
	if ctx.data.timers.has_session(ctx.chat(), HACK_TAG) {
		ctx.reply("_A hack is already running here. Use .hack stop_")
			.await?;
		return Ok(());
	}
	let target = ctx.message.mentions.first().map_or_else(
		|| {
			Some(args)
				.filter(|args| !args.is_empty())
				.unwrap_or("the mainframe")
				.to_owned()
		},
		|user| user.mention(),
	);
	let key = ctx.reply(format!("💻 Hacking {target}...")).await?;
	let step = Duration::from_millis(ctx.settings().automation.hack_step_ms);
	let task_ctx = ctx.clone();
	ctx.data.timers.spawn_session(ctx.chat(), HACK_TAG, async move {
		let finale = format!("✅ {target} has been hacked! Just kidding 😄");
		for text in HACK_STEPS.iter().copied().chain([finale.as_str()]) {
			sleep(step).await;
			if let Err(err) = task_ctx.edit(&key, text).await {
				warn!("Hack animation stopped: {err:?}");
				break;
			}
		}
	});
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rps_rules() {
		assert!(RpsChoice::Rock.beats(RpsChoice::Scissors));
		assert!(RpsChoice::Paper.beats(RpsChoice::Rock));
		assert!(!RpsChoice::Rock.beats(RpsChoice::Paper));
		assert_eq!(RpsChoice::parse(" Scissors "), Some(RpsChoice::Scissors));
		assert_eq!(RpsChoice::parse("lizard"), None);
	}

	#[test]
	fn quiz_lists_letters_for_every_option() {
		let questions = vec![QuizQuestion {
			category: "Science".to_owned(),
			question: "H2O is?".to_owned(),
			options: vec![
				"Salt".to_owned(),
				"Water".to_owned(),
				"Gold".to_owned(),
				"Air".to_owned(),
			],
			correct: 1,
		}];
		let rendered = render_quiz(&questions);
		assert!(rendered.contains("*1.* H2O is?"));
		assert!(rendered.contains("B. Water"));
		assert!(rendered.contains("D. Air"));
	}
}
