use std::time::Duration;

use scraper::{Html, Selector};
use urlencoding::decode;
use winnow::{
	ModalResult, Parser as _,
	ascii::{digit1, space0, space1},
	combinator::{alt, delimited, opt, preceded, separated},
	token::{one_of, rest, take_until, take_while},
};

/// Splits `.name args` into a lowercase command name and its trimmed arguments
#[must_use]
pub fn parse_invocation<'a>(text: &'a str, prefixes: &[String]) -> Option<(String, &'a str)> {
	let text = text.trim_start();
	let body = prefixes
		.iter()
		.filter(|prefix| !prefix.is_empty())
		.find_map(|prefix| text.strip_prefix(prefix.as_str()))?;
	let (name, args) = body
		.split_once(char::is_whitespace)
		.unwrap_or((body, ""));
	if name.is_empty() {
		return None;
	}
	Some((name.to_lowercase(), args.trim()))
}

fn number(input: &mut &str) -> ModalResult<usize> {
	digit1.parse_to().parse_next(input)
}

fn cell_digit(input: &mut &str) -> ModalResult<usize> {
	one_of('1'..='9')
		.try_map(|digit: char| usize::try_from(digit.to_digit(10).unwrap_or(0)))
		.parse_next(input)
}

/// A whole message that is just a positive number, e.g. a menu choice
#[must_use]
pub fn selection_number(text: &str) -> Option<usize> {
	number
		.parse(text.trim())
		.ok()
		.filter(|&number| number > 0)
}

/// A whole message that is a Tic-Tac-Toe cell `1`-`9`, returned zero-based
#[must_use]
pub fn board_cell(text: &str) -> Option<usize> {
	cell_digit
		.parse(text.trim())
		.ok()
		.and_then(|digit| digit.checked_sub(1))
}

fn board_digit(input: &mut &str) -> ModalResult<u8> {
	one_of('1'..='8')
		.try_map(|digit: char| u8::try_from(digit.to_digit(10).unwrap_or(0)))
		.parse_next(input)
}

/// Drafts coordinate as row then column, e.g. `63` or `6,3`
pub fn board_coordinate(input: &mut &str) -> ModalResult<(u8, u8)> {
	(
		board_digit,
		preceded(opt(alt((',', ' '))), board_digit),
	)
		.parse_next(input)
}

fn answer_letter(input: &mut &str) -> ModalResult<char> {
	one_of(|letter: char| matches!(letter.to_ascii_uppercase(), 'A'..='D'))
		.map(|letter: char| letter.to_ascii_uppercase())
		.parse_next(input)
}

/// Quiz answers like `B A C D A` or `b,a,c,d,a`
pub fn quiz_answers(input: &mut &str) -> ModalResult<Vec<char>> {
	delimited(
		space0,
		separated(
			1..,
			answer_letter,
			alt(((space0, ',', space0).void(), space1.void())),
		),
		space0,
	)
	.parse_next(input)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
	pub amount: u64,
	pub unit: char,
	pub text: String,
}

impl Reminder {
	/// `None` for zero or overflowing durations
	#[must_use]
	pub fn delay(&self) -> Option<Duration> {
		let factor = match self.unit {
			's' => 1,
			'm' => 60,
			'h' => 3600,
			_ => 86_400,
		};
		self.amount
			.checked_mul(factor)
			.filter(|&secs| secs > 0)
			.map(Duration::from_secs)
	}
}

fn amount(input: &mut &str) -> ModalResult<u64> {
	digit1.parse_to().parse_next(input)
}

fn unit(input: &mut &str) -> ModalResult<char> {
	one_of(['s', 'm', 'h', 'd', 'S', 'M', 'H', 'D'])
		.map(|unit: char| unit.to_ascii_lowercase())
		.parse_next(input)
}

fn reminder_text(input: &mut &str) -> ModalResult<String> {
	rest.verify(|text: &str| !text.trim().is_empty())
		.map(|text: &str| text.trim().to_owned())
		.parse_next(input)
}

/// `10m drink water`
pub fn reminder(input: &mut &str) -> ModalResult<Reminder> {
	(amount, unit, preceded(space1, reminder_text))
		.map(|(amount, unit, text)| Reminder { amount, unit, text })
		.parse_next(input)
}

/// Track id out of an `open.spotify.com/track/<id>` link, including localised `/intl-xx/` links
pub fn spotify_track_id(input: &mut &str) -> ModalResult<String> {
	preceded(
		(
			take_until(0.., "open.spotify.com/"),
			take_until(0.., "track/"),
			"track/",
		),
		take_while(1.., |c: char| c.is_ascii_alphanumeric()),
	)
	.map(str::to_owned)
	.parse_next(input)
}

/// Text inside the first pair of double quotes, e.g. `set "be nice"`
#[must_use]
pub fn quoted_text(text: &str) -> Option<String> {
	let (_, tail) = text.split_once(['"', '“'])?;
	let inner = tail.split(['"', '”']).next()?.trim();
	(!inner.is_empty()).then(|| inner.to_owned())
}

/// Decodes a field returned with `encode=url3986`
#[must_use]
pub fn decode_url3986(text: &str) -> String {
	decode(text).map_or_else(|_| text.to_owned(), |decoded| decoded.into_owned())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct OgMedia {
	pub video: Option<String>,
	pub image: Option<String>,
	pub title: Option<String>,
}

/// Open Graph media tags of a page
#[must_use]
pub fn og_media(html: &str) -> OgMedia {
	let document = Html::parse_document(html);
	let meta = |property: &str| {
		Selector::parse(&format!("meta[property=\"{property}\"]"))
			.ok()
			.and_then(|selector| {
				document
					.select(&selector)
					.find_map(|element| element.value().attr("content"))
					.map(str::to_owned)
			})
	};
	OgMedia {
		video: meta("og:video:secure_url").or_else(|| meta("og:video")),
		image: meta("og:image"),
		title: meta("og:title"),
	}
}
