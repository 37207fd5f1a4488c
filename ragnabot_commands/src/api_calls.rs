use base64::{Engine as _, engine::general_purpose};
use ragnabot_core::{
	config::{
		constants::{LANGUAGES, MISSING_GEMINI_KEY_MSG, weather_description, weather_emoji},
		settings::APIConfig,
		types::{Context, Error, HTTP_CLIENT},
	},
	handlers::{Category, Command},
	host::{MediaKind, MediaSource, OutgoingMessage},
	utils::{
		ai::{gemini_json, gemini_text},
		helpers::og_media,
		upstream::{UpstreamError, get_json, read_bytes, read_json, read_text, truncate_chars},
	},
};
use reqwest::{
	StatusCode,
	header::{ACCEPT, AUTHORIZATION, USER_AGENT},
};
use serde::Deserialize;
use serde_json::Value;
use urlencoding::encode;

use crate::{upstream_failed, usage};

const LYRICS_LIMIT: usize = 3000;
const BROWSER_AGENT: &str =
	"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Deserialize)]
struct DadJoke {
	joke: String,
}

#[derive(Deserialize)]
struct UselessFact {
	text: String,
}

#[derive(Deserialize)]
struct GeocodingResponse {
	#[serde(default)]
	results: Vec<Place>,
}

#[derive(Deserialize)]
struct Place {
	name: String,
	#[serde(default)]
	country: Option<String>,
	latitude: f64,
	longitude: f64,
}

impl Place {
	fn label(&self) -> String {
		self.country.as_ref().map_or_else(
			|| self.name.clone(),
			|country| format!("{}, {country}", self.name),
		)
	}
}

#[derive(Deserialize)]
struct CurrentResponse {
	current: CurrentWeather,
}

#[derive(Deserialize)]
struct CurrentWeather {
	temperature_2m: f64,
	apparent_temperature: f64,
	relative_humidity_2m: f64,
	wind_speed_10m: f64,
	weather_code: u16,
}

#[derive(Deserialize)]
struct DailyResponse {
	daily: Daily,
}

#[derive(Deserialize)]
struct Daily {
	time: Vec<String>,
	weather_code: Vec<u16>,
	temperature_2m_max: Vec<f64>,
	temperature_2m_min: Vec<f64>,
	#[serde(default)]
	precipitation_probability_max: Vec<Option<u8>>,
}

#[derive(Deserialize)]
struct LyricsResponse {
	lyrics: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Definition {
	word: String,
	part_of_speech: String,
	definition: String,
	#[serde(default)]
	example: Option<String>,
	#[serde(default)]
	synonyms: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Analysis {
	topic_summary: String,
	sentiment: String,
	#[serde(default)]
	response_suggestion: String,
	#[serde(default)]
	keywords: Vec<String>,
}

impl Analysis {
	fn render(&self) -> String {
		let mut reply = format!(
			"*💬 Message Analysis* 📊\n\n*📈 Sentiment:* {}\n*💡 Topic:* {}",
			self.sentiment, self.topic_summary
		);
		if !self.keywords.is_empty() {
			reply.push_str(&format!("\n\n*🔑 Keywords:* {}", self.keywords.join(", ")));
		}
		if !self.response_suggestion.is_empty() {
			reply.push_str(&format!(
				"\n\n*✍️ Suggested reply:* _{}_",
				self.response_suggestion
			));
		}
		reply
	}
}

#[derive(Deserialize)]
struct News {
	headlines: Vec<Headline>,
}

#[derive(Deserialize)]
struct Headline {
	title: String,
	#[serde(default)]
	source: Option<String>,
	#[serde(default)]
	time: Option<String>,
}

#[derive(Deserialize)]
struct Conversion {
	converted: f64,
	rate: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
	#[serde(default)]
	parsed_results: Vec<OcrResult>,
	#[serde(default)]
	is_errored_on_processing: bool,
	#[serde(default)]
	error_message: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResult {
	parsed_text: String,
}

#[derive(Deserialize)]
struct TtsResponse {
	#[serde(rename = "URL")]
	url: Option<String>,
}

#[derive(Deserialize)]
struct PexelsResponse {
	photos: Vec<PexelsPhoto>,
}

#[derive(Deserialize)]
struct PexelsPhoto {
	photographer: String,
	src: PexelsSource,
}

#[derive(Deserialize)]
struct PexelsSource {
	large: String,
}

/// Text the command works on: its arguments, or the text of the replied-to message
fn input_text(ctx: &Context) -> Option<String> {
	let args = ctx.args.trim();
	if !args.is_empty() {
		return Some(args.to_owned());
	}
	ctx.message
		.quoted
		.as_ref()
		.and_then(|quoted| quoted.text.as_deref())
		.map(str::trim)
		.filter(|text| !text.is_empty())
		.map(str::to_owned)
}

/// Replies with the missing-key notice and returns `false` when Gemini is not configured
async fn gemini_ready(ctx: &Context) -> Result<bool, Error> {
	if ctx.settings().api.gemini_key.is_some() {
		return Ok(true);
	}
	ctx.reply(MISSING_GEMINI_KEY_MSG).await?;
	Ok(false)
}

#[must_use]
pub fn joke() -> Command {
	Command::new("joke", |ctx| Box::pin(tell_joke(ctx)))
		.description("Random dad joke")
		.usage(".joke")
		.category(Category::Fun)
}

async fn tell_joke(ctx: Context) -> Result<(), Error> {
	let request = HTTP_CLIENT
		.get(&ctx.settings().api.joke)
		.header(ACCEPT, "application/json");
	match read_json::<DadJoke>(request).await {
		Ok(joke) => {
			ctx.reply(format!("😂 {}", joke.joke)).await?;
		}
		Err(err) => upstream_failed(&ctx, "icanhazdadjoke", &err).await?,
	}
	Ok(())
}

#[must_use]
pub fn fact() -> Command {
	Command::new("fact", |ctx| Box::pin(tell_fact(ctx)))
		.description("Random useless fact")
		.usage(".fact")
		.category(Category::Fun)
}

async fn tell_fact(ctx: Context) -> Result<(), Error> {
	match get_json::<UselessFact>(&ctx.settings().api.fact, &[("language", "en")]).await {
		Ok(fact) => {
			ctx.reply(format!("🧠 *Did you know?*\n\n{}", fact.text)).await?;
		}
		Err(err) => upstream_failed(&ctx, "uselessfacts", &err).await?,
	}
	Ok(())
}

async fn geocode(api: &APIConfig, city: &str) -> Result<Place, UpstreamError> {
	let response: GeocodingResponse = get_json(
		&api.geocoding,
		&[("name", city), ("count", "1"), ("language", "en"), ("format", "json")],
	)
	.await?;
	response.results.into_iter().next().ok_or(UpstreamError::Empty)
}

async fn current_weather(api: &APIConfig, place: &Place) -> Result<CurrentWeather, UpstreamError> {
	let latitude = place.latitude.to_string();
	let longitude = place.longitude.to_string();
	let response: CurrentResponse = get_json(
		&api.forecast,
		&[
			("latitude", latitude.as_str()),
			("longitude", longitude.as_str()),
			(
				"current",
				"temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,weather_code",
			),
			("timezone", "auto"),
		],
	)
	.await?;
	Ok(response.current)
}

async fn daily_forecast(api: &APIConfig, place: &Place) -> Result<Daily, UpstreamError> {
	let latitude = place.latitude.to_string();
	let longitude = place.longitude.to_string();
	let response: DailyResponse = get_json(
		&api.forecast,
		&[
			("latitude", latitude.as_str()),
			("longitude", longitude.as_str()),
			(
				"daily",
				"weather_code,temperature_2m_max,temperature_2m_min,precipitation_probability_max",
			),
			("forecast_days", "7"),
			("timezone", "auto"),
		],
	)
	.await?;
	if response.daily.time.is_empty() {
		return Err(UpstreamError::Empty);
	}
	Ok(response.daily)
}

fn render_current(place: &Place, weather: &CurrentWeather) -> String {
	format!(
		"{} *Weather in {}*\n\n🌡️ Temperature: {:.1}°C (feels like {:.1}°C)\n☁️ Condition: {}\n💧 Humidity: {:.0}%\n💨 Wind: {:.1} km/h",
		weather_emoji(weather.weather_code),
		place.label(),
		weather.temperature_2m,
		weather.apparent_temperature,
		weather_description(weather.weather_code),
		weather.relative_humidity_2m,
		weather.wind_speed_10m,
	)
}

fn render_daily(place: &Place, daily: &Daily) -> String {
	let days: Vec<String> = daily
		.time
		.iter()
		.enumerate()
		.map(|(index, day)| {
			let code = daily.weather_code.get(index).copied().unwrap_or_default();
			let high = daily.temperature_2m_max.get(index).copied().unwrap_or_default();
			let low = daily.temperature_2m_min.get(index).copied().unwrap_or_default();
			let rain = daily
				.precipitation_probability_max
				.get(index)
				.copied()
				.flatten()
				.map_or_else(String::new, |chance| format!(" 🌂 {chance}%"));
			format!(
				"{} *{day}*: {} {:.0}°/{:.0}°C{rain}",
				weather_emoji(code),
				weather_description(code),
				high,
				low
			)
		})
		.collect();
	format!("📅 *7-day forecast for {}*\n\n{}", place.label(), days.join("\n"))
}

#[must_use]
pub fn weather() -> Command {
	Command::new("weather", |ctx| Box::pin(show_weather(ctx)))
		.description("Current weather for a city")
		.usage(".weather <city>")
		.category(Category::Info)
}

async fn show_weather(ctx: Context) -> Result<(), Error> {
	let city = ctx.args.trim();
	if city.is_empty() {
		return usage(&ctx).await;
	}
	let api = &ctx.settings().api;
	let place = match geocode(api, city).await {
		Ok(place) => place,
		Err(UpstreamError::Empty) => {
			ctx.reply(format!("_❌ City \"{city}\" not found._")).await?;
			return Ok(());
		}
		Err(err) => return upstream_failed(&ctx, "Open-Meteo", &err).await,
	};
	match current_weather(api, &place).await {
		Ok(weather) => {
			ctx.reply(render_current(&place, &weather)).await?;
		}
		Err(err) => upstream_failed(&ctx, "Open-Meteo", &err).await?,
	}
	Ok(())
}

#[must_use]
pub fn forecast() -> Command {
	Command::new("forecast", |ctx| Box::pin(show_forecast(ctx)))
		.description("7-day forecast for a city")
		.usage(".forecast <city>")
		.category(Category::Info)
}

async fn show_forecast(ctx: Context) -> Result<(), Error> {
	let city = ctx.args.trim();
	if city.is_empty() {
		return usage(&ctx).await;
	}
	let api = &ctx.settings().api;
	let place = match geocode(api, city).await {
		Ok(place) => place,
		Err(UpstreamError::Empty) => {
			ctx.reply(format!("_❌ City \"{city}\" not found._")).await?;
			return Ok(());
		}
		Err(err) => return upstream_failed(&ctx, "Open-Meteo", &err).await,
	};
	match daily_forecast(api, &place).await {
		Ok(daily) => {
			ctx.reply(render_daily(&place, &daily)).await?;
		}
		Err(err) => upstream_failed(&ctx, "Open-Meteo", &err).await?,
	}
	Ok(())
}

/// Google code and display name for a language alias
fn language(alias: &str) -> Option<(&'static str, &'static str)> {
	LANGUAGES
		.iter()
		.find(|(known, _, _)| known.eq_ignore_ascii_case(alias))
		.map(|&(_, code, name)| (code, name))
}

/// Joins the translated segments of a `translate_a/single` answer
fn translated_text(body: &Value) -> Result<(String, Option<String>), UpstreamError> {
	let segments = body
		.get(0)
		.and_then(Value::as_array)
		.ok_or_else(|| UpstreamError::shape("missing translation segments"))?;
	let text: String = segments
		.iter()
		.filter_map(|segment| segment.get(0).and_then(Value::as_str))
		.collect();
	if text.trim().is_empty() {
		return Err(UpstreamError::Empty);
	}
	let detected = body.get(2).and_then(Value::as_str).map(str::to_owned);
	Ok((text, detected))
}

#[must_use]
pub fn translate() -> Command {
	Command::new("trans", |ctx| Box::pin(run_translate(ctx)))
		.aliases(&["translate", "tr"])
		.description("Translate text, or reply to a message")
		.usage(".trans <lang> <text> (en, sw, sheng, fr, es, de, it, pt, ko, jp, zh, hi)")
		.category(Category::Info)
}

async fn run_translate(ctx: Context) -> Result<(), Error> {
	let args = ctx.args.trim();
	let (alias, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
	if alias.is_empty() {
		return usage(&ctx).await;
	}
	let Some((code, name)) = language(alias) else {
		let known: Vec<&str> = LANGUAGES.iter().map(|(alias, _, _)| *alias).collect();
		ctx.reply(format!(
			"_❌ Unknown language \"{alias}\". Try one of: {}_",
			known.join(", ")
		))
		.await?;
		return Ok(());
	};
	let text = if rest.trim().is_empty() {
		ctx.message
			.quoted
			.as_ref()
			.and_then(|quoted| quoted.text.clone())
			.unwrap_or_default()
	} else {
		rest.trim().to_owned()
	};
	if text.trim().is_empty() {
		return usage(&ctx).await;
	}

	let request = HTTP_CLIENT.get(&ctx.settings().api.translate).query(&[
		("client", "gtx"),
		("sl", "auto"),
		("tl", code),
		("dt", "t"),
		("q", text.as_str()),
	]);
	let result = read_json::<Value>(request)
		.await
		.and_then(|body| translated_text(&body));
	match result {
		Ok((translated, detected)) => {
			let from = detected.unwrap_or_else(|| "auto".to_owned());
			ctx.reply(format!("🌐 *Translation* ({from} → {name})\n\n{translated}"))
				.await?;
		}
		Err(err) => upstream_failed(&ctx, "Google Translate", &err).await?,
	}
	Ok(())
}

/// `song by artist` or `artist - song`, returned as (artist, song)
fn artist_and_song(args: &str) -> Option<(&str, &str)> {
	let (artist, song) = if let Some((song, artist)) = args.rsplit_once(" by ") {
		(artist, song)
	} else {
		args.split_once(" - ")?
	};
	let (artist, song) = (artist.trim(), song.trim());
	(!artist.is_empty() && !song.is_empty()).then_some((artist, song))
}

#[must_use]
pub fn lyrics() -> Command {
	Command::new("lyrics", |ctx| Box::pin(find_lyrics(ctx)))
		.description("Song lyrics")
		.usage(".lyrics <song> by <artist> or .lyrics <artist> - <song>")
		.category(Category::Info)
}

async fn find_lyrics(ctx: Context) -> Result<(), Error> {
	let Some((artist, song)) = artist_and_song(ctx.args.trim()) else {
		return usage(&ctx).await;
	};
	let url = format!(
		"{}/{}/{}",
		ctx.settings().api.lyrics.trim_end_matches('/'),
		encode(artist),
		encode(song)
	);
	match read_json::<LyricsResponse>(HTTP_CLIENT.get(url)).await {
		Ok(found) if !found.lyrics.trim().is_empty() => {
			let (text, truncated) = truncate_chars(found.lyrics.trim(), LYRICS_LIMIT);
			let more = if truncated { "\n\n_…lyrics truncated_" } else { "" };
			ctx.reply(format!("🎤 *{song}* by *{artist}*\n\n{text}{more}"))
				.await?;
		}
		Ok(_) | Err(UpstreamError::Status(StatusCode::NOT_FOUND)) => {
			ctx.reply(format!("_❌ No lyrics found for {song} by {artist}._"))
				.await?;
		}
		Err(err) => upstream_failed(&ctx, "lyrics.ovh", &err).await?,
	}
	Ok(())
}

#[must_use]
pub fn define() -> Command {
	Command::new("define", |ctx| Box::pin(define_word(ctx)))
		.description("Define a word")
		.usage(".define <word>")
		.category(Category::Ai)
}

async fn define_word(ctx: Context) -> Result<(), Error> {
	let word = ctx.args.trim();
	if word.is_empty() {
		return usage(&ctx).await;
	}
	if !gemini_ready(&ctx).await? {
		return Ok(());
	}
	ctx.reply(format!("_Looking up \"{word}\"..._")).await?;
	let prompt = format!(
		"Define the word \"{word}\" as JSON with the keys word, partOfSpeech, definition, example and synonyms (an array of strings)."
	);
	let result: Result<Definition, _> = gemini_json(
		&ctx.settings().api,
		"You are a helpful dictionary assistant. Return clean, accurate definitions in JSON format.",
		prompt,
	)
	.await;
	match result {
		Ok(definition) => {
			let mut reply = format!(
				"📘 *{}* ({})\n\n*Definition:* {}",
				definition.word, definition.part_of_speech, definition.definition
			);
			if let Some(example) = definition.example.filter(|example| !example.is_empty()) {
				reply.push_str(&format!("\n*Example:* \"{example}\""));
			}
			if !definition.synonyms.is_empty() {
				reply.push_str(&format!("\n*Synonyms:* {}", definition.synonyms.join(", ")));
			}
			ctx.reply(reply).await?;
		}
		Err(err) => upstream_failed(&ctx, "Gemini", &err).await?,
	}
	Ok(())
}

#[must_use]
pub fn analyze() -> Command {
	Command::new("analyze", |ctx| Box::pin(analyze_message(ctx)))
		.description("Topic, sentiment and a suggested reply for a quoted message")
		.usage("Reply to a text message with .analyze")
		.category(Category::Ai)
}

async fn analyze_message(ctx: Context) -> Result<(), Error> {
	let Some(text) = ctx
		.message
		.quoted
		.as_ref()
		.and_then(|quoted| quoted.text.as_deref())
		.map(str::trim)
		.filter(|text| !text.is_empty())
		.map(str::to_owned)
	else {
		return usage(&ctx).await;
	};
	if !gemini_ready(&ctx).await? {
		return Ok(());
	}
	ctx.reply("_Analyzing the quoted message..._").await?;
	let prompt = format!(
		"Analyze this WhatsApp message. Return JSON with the keys topicSummary (one sentence), sentiment (exactly one of Positive, Negative, Neutral or Mixed), responseSuggestion (a short reply a person could send) and keywords (3 to 5 strings).\n\nMessage:\n{text}"
	);
	let result: Result<Analysis, _> = gemini_json(
		&ctx.settings().api,
		"You are a professional message sentiment and topic analyst. Answer only with the requested JSON.",
		prompt,
	)
	.await;
	match result {
		Ok(analysis) => {
			ctx.reply(analysis.render()).await?;
		}
		Err(err) => upstream_failed(&ctx, "Gemini", &err).await?,
	}
	Ok(())
}

#[must_use]
pub fn news() -> Command {
	Command::new("news", |ctx| Box::pin(latest_news(ctx)))
		.description("Latest headlines on a topic")
		.usage(".news [topic]")
		.category(Category::Ai)
}

async fn latest_news(ctx: Context) -> Result<(), Error> {
	let topic = Some(ctx.args.trim())
		.filter(|topic| !topic.is_empty())
		.unwrap_or("Kenya")
		.to_owned();
	if !gemini_ready(&ctx).await? {
		return Ok(());
	}
	ctx.reply(format!("_Fetching latest news about \"{topic}\"..._"))
		.await?;
	let prompt = format!(
		"List the latest news headlines about {topic} as JSON: {{\"headlines\": [{{\"title\": string, \"source\": string, \"time\": string}}]}}"
	);
	let result: Result<News, _> = gemini_json(
		&ctx.settings().api,
		"You are a professional news assistant. Provide factual, concise headlines in JSON format.",
		prompt,
	)
	.await
	.and_then(|news: News| {
		if news.headlines.is_empty() {
			Err(UpstreamError::Empty)
		} else {
			Ok(news)
		}
	});
	match result {
		Ok(news) => {
			let lines: Vec<String> = news
				.headlines
				.iter()
				.enumerate()
				.map(|(index, headline)| {
					let source = headline.source.as_deref().unwrap_or("unknown source");
					let time = headline
						.time
						.as_deref()
						.map_or_else(String::new, |time| format!(" • {time}"));
					format!("*{}. {}*\n_{source}{time}_", index.saturating_add(1), headline.title)
				})
				.collect();
			ctx.reply(format!("📰 *News: {topic}*\n\n{}", lines.join("\n\n")))
				.await?;
		}
		Err(err) => upstream_failed(&ctx, "Gemini", &err).await?,
	}
	Ok(())
}

#[must_use]
pub fn currency() -> Command {
	Command::new("currency", |ctx| Box::pin(convert_currency(ctx)))
		.description("Convert between currencies")
		.usage(".currency <amount> <from> <to>")
		.category(Category::Ai)
}

async fn convert_currency(ctx: Context) -> Result<(), Error> {
	let mut parts = ctx.args.split_whitespace();
	let (Some(amount), Some(from), Some(to)) = (parts.next(), parts.next(), parts.next()) else {
		return usage(&ctx).await;
	};
	let Ok(amount) = amount.parse::<f64>() else {
		return usage(&ctx).await;
	};
	if !gemini_ready(&ctx).await? {
		return Ok(());
	}
	let (from, to) = (from.to_uppercase(), to.to_uppercase());
	ctx.reply(format!("_Converting {amount} {from} to {to}..._"))
		.await?;
	let result: Result<Conversion, _> = gemini_json(
		&ctx.settings().api,
		"You are a financial assistant. Return clean conversion data in JSON format.",
		format!(
			"Convert {amount} {from} to {to}. Return JSON with the numeric keys converted and rate."
		),
	)
	.await;
	match result {
		Ok(conversion) => {
			ctx.reply(format!(
				"💱 *Currency Conversion*\n• Amount: {amount} {from}\n• Rate: 1 {from} = {} {to}\n• Converted: {:.2} {to}",
				conversion.rate, conversion.converted
			))
			.await?;
		}
		Err(err) => upstream_failed(&ctx, "Gemini", &err).await?,
	}
	Ok(())
}

#[must_use]
pub fn ask() -> Command {
	Command::new("ask", |ctx| Box::pin(ask_gemini(ctx)))
		.aliases(&["gpt", "ai"])
		.description("Ask Gemini anything")
		.usage(".ask <question>")
		.category(Category::Ai)
}

async fn ask_gemini(ctx: Context) -> Result<(), Error> {
	let Some(prompt) = input_text(&ctx) else {
		return usage(&ctx).await;
	};
	if !gemini_ready(&ctx).await? {
		return Ok(());
	}
	match gemini_text(&ctx.settings().api, prompt).await {
		Ok(answer) => {
			ctx.reply(answer.trim()).await?;
		}
		Err(err) => upstream_failed(&ctx, "Gemini", &err).await?,
	}
	Ok(())
}

fn ocr_text(response: OcrResponse) -> Result<String, UpstreamError> {
	if response.is_errored_on_processing {
		let detail = match response.error_message {
			Some(Value::String(message)) => message,
			Some(Value::Array(messages)) => messages
				.iter()
				.filter_map(Value::as_str)
				.collect::<Vec<_>>()
				.join("; "),
			_ => "unknown error".to_owned(),
		};
		return Err(UpstreamError::shape(detail));
	}
	let text = response
		.parsed_results
		.iter()
		.map(|result| result.parsed_text.trim())
		.filter(|text| !text.is_empty())
		.collect::<Vec<_>>()
		.join("\n\n");
	if text.is_empty() {
		Err(UpstreamError::Empty)
	} else {
		Ok(text)
	}
}

#[must_use]
pub fn ocr() -> Command {
	Command::new("ocr", |ctx| Box::pin(read_image_text(ctx)))
		.description("Extract text from an image")
		.usage(".ocr (reply to an image)")
		.category(Category::Media)
}

async fn read_image_text(ctx: Context) -> Result<(), Error> {
	let Some(media) = ctx
		.message
		.media_or_quoted()
		.filter(|media| media.kind == MediaKind::Image)
		.cloned()
	else {
		ctx.reply("_❌ Reply to an image with .ocr_").await?;
		return Ok(());
	};
	ctx.reply("_🔍 Reading text from the image..._").await?;
	let image = ctx.host.download_media(&media).await?;
	let api = &ctx.settings().api;
	let encoded = format!(
		"data:{};base64,{}",
		media.mime_type,
		general_purpose::STANDARD.encode(&image)
	);
	let request = HTTP_CLIENT.post(&api.ocr).form(&[
		("apikey", api.ocr_key.as_str()),
		("language", api.ocr_language.as_str()),
		("isOverlayRequired", "false"),
		("base64Image", encoded.as_str()),
	]);
	match read_json::<OcrResponse>(request).await.and_then(ocr_text) {
		Ok(text) => {
			ctx.reply(format!("📝 *Extracted text:*\n\n{text}")).await?;
		}
		Err(UpstreamError::Empty) => {
			ctx.reply("_No text found in the image._").await?;
		}
		Err(err) => upstream_failed(&ctx, "OCR.space", &err).await?,
	}
	Ok(())
}

#[must_use]
pub fn insta() -> Command {
	Command::new("insta", |ctx| Box::pin(instagram_media(ctx)))
		.aliases(&["ig"])
		.description("Download an Instagram post or reel")
		.usage(".insta <instagram url>")
		.category(Category::Media)
}

async fn instagram_media(ctx: Context) -> Result<(), Error> {
	let url = ctx.args.trim();
	if !url.starts_with("http") || !url.contains("instagram.com/") {
		return usage(&ctx).await;
	}
	ctx.reply("_⬇️ Fetching Instagram media..._").await?;
	let html = match read_text(HTTP_CLIENT.get(url).header(USER_AGENT, BROWSER_AGENT)).await {
		Ok(html) => html,
		Err(err) => return upstream_failed(&ctx, "Instagram", &err).await,
	};
	let media = og_media(&html);
	let caption = media.title.clone();
	let message = match (media.video, media.image) {
		(Some(video), _) => OutgoingMessage::Video {
			source: MediaSource::Url(video),
			caption,
		},
		(None, Some(image)) => OutgoingMessage::Image {
			source: MediaSource::Url(image),
			caption,
		},
		(None, None) => {
			ctx.reply("_❌ No public media found at that link._").await?;
			return Ok(());
		}
	};
	ctx.send(message).await?;
	Ok(())
}

#[must_use]
pub fn tts() -> Command {
	Command::new("tts", |ctx| Box::pin(text_to_speech(ctx)))
		.description("Text to speech")
		.usage(".tts <text>")
		.category(Category::Media)
}

async fn text_to_speech(ctx: Context) -> Result<(), Error> {
	let Some(text) = input_text(&ctx) else {
		return usage(&ctx).await;
	};
	let api = &ctx.settings().api;
	let request = HTTP_CLIENT.post(&api.tts).form(&[
		("msg", text.as_str()),
		("lang", api.tts_voice.as_str()),
		("source", "ttsmp3"),
	]);
	let result = read_json::<TtsResponse>(request).await.and_then(|response| {
		response
			.url
			.filter(|url| url.starts_with("https://") || url.starts_with("http://"))
			.ok_or_else(|| UpstreamError::shape("no audio URL"))
	});
	match result {
		Ok(url) => {
			ctx.send(OutgoingMessage::Audio {
				source: MediaSource::Url(url),
				mime_type: "audio/mpeg".to_owned(),
				file_name: Some("speech.mp3".to_owned()),
			})
			.await?;
		}
		Err(err) => upstream_failed(&ctx, "ttsmp3", &err).await?,
	}
	Ok(())
}

#[must_use]
pub fn image() -> Command {
	Command::new("image", |ctx| Box::pin(random_image(ctx)))
		.aliases(&["img"])
		.description("Random image")
		.usage(".image [query]")
		.category(Category::Media)
}

async fn random_image(ctx: Context) -> Result<(), Error> {
	let query = ctx.args.trim();
	let mut request = HTTP_CLIENT.get(&ctx.settings().api.random_image);
	if !query.is_empty() {
		request = request.query(&[("q", query)]);
	}
	match read_bytes(request).await {
		Ok(bytes) if !bytes.is_empty() => {
			let caption = (!query.is_empty()).then(|| format!("🖼️ {query}"));
			ctx.send(OutgoingMessage::Image {
				source: MediaSource::Bytes(bytes),
				caption,
			})
			.await?;
		}
		Ok(_) => upstream_failed(&ctx, "the image service", &UpstreamError::Empty).await?,
		Err(err) => upstream_failed(&ctx, "the image service", &err).await?,
	}
	Ok(())
}

#[must_use]
pub fn pimage() -> Command {
	Command::new("pimage", |ctx| Box::pin(pexels_image(ctx)))
		.description("Search Pexels for a photo")
		.usage(".pimage <query>")
		.category(Category::Media)
}

async fn pexels_image(ctx: Context) -> Result<(), Error> {
	let query = ctx.args.trim();
	if query.is_empty() {
		return usage(&ctx).await;
	}
	let api = &ctx.settings().api;
	let Some(key) = api.pexels_key.as_deref() else {
		return upstream_failed(&ctx, "Pexels", &UpstreamError::MissingKey("PEXELS_API_KEY")).await;
	};
	let request = HTTP_CLIENT
		.get(&api.pexels)
		.header(AUTHORIZATION, key)
		.query(&[("query", query), ("per_page", "1")]);
	let result = read_json::<PexelsResponse>(request)
		.await
		.and_then(|response| response.photos.into_iter().next().ok_or(UpstreamError::Empty));
	match result {
		Ok(photo) => {
			ctx.send(OutgoingMessage::Image {
				source: MediaSource::Url(photo.src.large),
				caption: Some(format!("📸 {query} • by {}", photo.photographer)),
			})
			.await?;
		}
		Err(err) => upstream_failed(&ctx, "Pexels", &err).await?,
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn sheng_is_swahili_under_its_own_name() {
		assert_eq!(language("SHENG"), Some(("sw", "Sheng (Nairobi Slang)")));
		assert_eq!(language("jp"), Some(("ja", "Japanese")));
		assert_eq!(language("klingon"), None);
	}

	#[test]
	fn translation_segments_are_joined() {
		let body = json!([[["Habari ", "Hello ", null], ["dunia", "world", null]], null, "en"]);
		let (text, detected) = translated_text(&body).unwrap();
		assert_eq!(text, "Habari dunia");
		assert_eq!(detected.as_deref(), Some("en"));
		assert!(matches!(
			translated_text(&json!({"error": true})),
			Err(UpstreamError::Shape(_))
		));
	}

	#[test]
	fn lyrics_arguments_accept_both_orders() {
		assert_eq!(
			artist_and_song("Bohemian Rhapsody by Queen"),
			Some(("Queen", "Bohemian Rhapsody"))
		);
		assert_eq!(artist_and_song("Sauti Sol - Suzanna"), Some(("Sauti Sol", "Suzanna")));
		assert_eq!(artist_and_song("just a title"), None);
		assert_eq!(artist_and_song(" by Queen"), None);
	}

	#[test]
	fn ocr_errors_surface_their_message() {
		let response: OcrResponse = serde_json::from_value(json!({
			"IsErroredOnProcessing": true,
			"ErrorMessage": ["File failed validation"]
		}))
		.unwrap();
		assert!(
			matches!(ocr_text(response), Err(UpstreamError::Shape(detail)) if detail == "File failed validation")
		);
		let response: OcrResponse = serde_json::from_value(json!({
			"IsErroredOnProcessing": false,
			"ParsedResults": [{"ParsedText": " Hello \r\n"}, {"ParsedText": ""}]
		}))
		.unwrap();
		assert_eq!(ocr_text(response).unwrap(), "Hello");
	}

	#[test]
	fn analysis_skips_empty_sections() {
		let analysis: Analysis = serde_json::from_value(json!({
			"topicSummary": "Planning a weekend hike",
			"sentiment": "Positive",
			"keywords": ["hike", "Ngong Hills", "Saturday"]
		}))
		.unwrap();
		let rendered = analysis.render();
		assert!(rendered.contains("*📈 Sentiment:* Positive"));
		assert!(rendered.contains("hike, Ngong Hills, Saturday"));
		assert!(!rendered.contains("Suggested reply"));
		assert!(serde_json::from_value::<Analysis>(json!({"sentiment": "Mixed"})).is_err());
	}

	#[test]
	fn forecast_tolerates_missing_rain_column() {
		let daily: Daily = serde_json::from_value(json!({
			"time": ["2026-10-17", "2026-10-18"],
			"weather_code": [0, 61],
			"temperature_2m_max": [25.4, 22.0],
			"temperature_2m_min": [14.1, 13.0]
		}))
		.unwrap();
		let place = Place {
			name: "Nairobi".to_owned(),
			country: Some("Kenya".to_owned()),
			latitude: -1.28,
			longitude: 36.82,
		};
		let rendered = render_daily(&place, &daily);
		assert!(rendered.contains("Nairobi, Kenya"));
		assert!(rendered.contains("*2026-10-18*: Light rain 22°/13°C"));
	}
}
