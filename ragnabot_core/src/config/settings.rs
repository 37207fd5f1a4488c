use std::{
	collections::HashSet,
	env,
	fs::read_to_string,
	io::{Error as IoError, ErrorKind},
	path::Path,
	time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	Read {
		path: String,
		#[source]
		source: IoError,
	},
	#[error("failed to parse config file {path}: {source}")]
	Parse {
		path: String,
		#[source]
		source: toml::de::Error,
	},
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct Settings {
	pub bot: BotConfig,
	pub api: APIConfig,
	pub interactions: InteractionConfig,
	pub automation: AutomationConfig,
	pub chatbot: ChatbotConfig,
	pub access: AccessConfig,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct BotConfig {
	pub name: String,
	pub prefixes: Vec<String>,
	/// Phone numbers (without `@s.whatsapp.net`) allowed to use owner-only commands
	pub owners: Vec<String>,
	pub log_level: String,
}

impl Default for BotConfig {
	fn default() -> Self {
		Self {
			name: "RagnaBot".to_owned(),
			prefixes: vec![".".to_owned()],
			owners: Vec::new(),
			log_level: "info".to_owned(),
		}
	}
}

#[derive(Deserialize)]
#[serde(default)]
pub struct APIConfig {
	pub gemini_key: Option<String>,
	pub gemini_base: String,
	pub gemini_models: Vec<String>,
	pub gemini_json_model: String,
	pub pexels_key: Option<String>,
	pub ocr_key: String,
	pub ocr_language: String,
	pub joke: String,
	pub fact: String,
	pub geocoding: String,
	pub forecast: String,
	pub translate: String,
	pub lyrics: String,
	pub trivia: String,
	pub quotes: String,
	pub ocr: String,
	pub tts: String,
	pub tts_voice: String,
	pub random_image: String,
	pub pexels: String,
	pub music_search: String,
	pub music_download: String,
	/// openfootball season file for the Premier League
	pub football: String,
}

impl Default for APIConfig {
	fn default() -> Self {
		Self {
			gemini_key: None,
			gemini_base: "https://generativelanguage.googleapis.com/v1beta/models".to_owned(),
			gemini_models: [
				"gemini-2.5-flash-lite",
				"gemini-2.5-flash",
				"gemini-2.0-flash",
				"gemini-2.0-flash-lite",
				"gemini-1.5-flash",
				"gemma-3-12b-it",
			]
			.into_iter()
			.map(str::to_owned)
			.collect(),
			gemini_json_model: "gemini-2.5-flash".to_owned(),
			pexels_key: None,
			ocr_key: "helloworld".to_owned(),
			ocr_language: "eng".to_owned(),
			joke: "https://icanhazdadjoke.com".to_owned(),
			fact: "https://uselessfacts.jsph.pl/api/v2/facts/random".to_owned(),
			geocoding: "https://geocoding-api.open-meteo.com/v1/search".to_owned(),
			forecast: "https://api.open-meteo.com/v1/forecast".to_owned(),
			translate: "https://translate.googleapis.com/translate_a/single".to_owned(),
			lyrics: "https://api.lyrics.ovh/v1".to_owned(),
			trivia: "https://opentdb.com/api.php".to_owned(),
			quotes: "https://zenquotes.io/api/random".to_owned(),
			ocr: "https://api.ocr.space/parse/image".to_owned(),
			tts: "https://ttsmp3.com/makemp3_new.php".to_owned(),
			tts_voice: "Joanna".to_owned(),
			random_image: "https://picsum.photos/1024/768".to_owned(),
			pexels: "https://api.pexels.com/v1/search".to_owned(),
			music_search: "https://api.spotifydown.com/search".to_owned(),
			music_download: "https://api.spotifydown.com/download".to_owned(),
			football: "https://raw.githubusercontent.com/openfootball/football.json/master/2025-26/en.1.json"
				.to_owned(),
		}
	}
}

/// Longest candidate list a selection flow may show
pub const MAX_SELECTION: usize = 8;

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRangePolicy {
	/// Leave the interaction pending and say nothing
	#[default]
	Ignore,
	/// Leave the interaction pending and answer with the valid range once
	Hint,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct InteractionConfig {
	pub selection_ttl_secs: u64,
	pub game_ttl_secs: u64,
	pub quiz_ttl_secs: u64,
	pub sweep_interval_secs: u64,
	pub selection_limit: usize,
	pub out_of_range: OutOfRangePolicy,
	pub bot_move_delay_ms: u64,
}

impl Default for InteractionConfig {
	fn default() -> Self {
		Self {
			selection_ttl_secs: 300,
			game_ttl_secs: 900,
			quiz_ttl_secs: 600,
			sweep_interval_secs: 60,
			selection_limit: MAX_SELECTION,
			out_of_range: OutOfRangePolicy::Ignore,
			bot_move_delay_ms: 1500,
		}
	}
}

impl InteractionConfig {
	fn sanitize(&mut self) {
		let limit = self.selection_limit.clamp(1, MAX_SELECTION);
		if limit != self.selection_limit {
			warn!(
				"selection_limit {} is outside 1..={MAX_SELECTION}, using {limit}",
				self.selection_limit
			);
			self.selection_limit = limit;
		}
	}

	#[must_use]
	pub const fn bot_move_delay(&self) -> Duration {
		Duration::from_millis(self.bot_move_delay_ms)
	}
}

#[derive(Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
	pub autobio_interval_secs: u64,
	pub autodp_interval_secs: u64,
	pub autodp_image_url: String,
	pub hack_step_ms: u64,
}

impl Default for AutomationConfig {
	fn default() -> Self {
		Self {
			autobio_interval_secs: 300,
			autodp_interval_secs: 86_400,
			autodp_image_url: "https://picsum.photos/640".to_owned(),
			hack_step_ms: 1500,
		}
	}
}

#[derive(Deserialize)]
#[serde(default)]
pub struct ChatbotConfig {
	pub system_prompt: String,
	pub groups: bool,
	pub dms: bool,
	pub context_limit: usize,
	pub context_window: usize,
	pub max_output_tokens: u32,
	pub temperature: f32,
}

impl Default for ChatbotConfig {
	fn default() -> Self {
		Self {
			system_prompt: "You are a friendly WhatsApp assistant. Keep answers short and casual."
				.to_owned(),
			groups: false,
			dms: false,
			context_limit: 20,
			context_window: 10,
			max_output_tokens: 256,
			temperature: 0.7,
		}
	}
}

/// Per-command overrides of the default access level
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct AccessConfig {
	pub public: HashSet<String>,
	pub owner_only: HashSet<String>,
}

impl Settings {
	/// Reads `path` if it exists and layers secrets from the environment on top.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let shown = path.display().to_string();
		let mut settings = match read_to_string(path) {
			Ok(raw) => toml::from_str::<Self>(&raw).map_err(|source| ConfigError::Parse {
				path: shown.clone(),
				source,
			})?,
			Err(err) if err.kind() == ErrorKind::NotFound => {
				warn!("Config file {shown} not found, using defaults");
				Self::default()
			}
			Err(source) => {
				return Err(ConfigError::Read {
					path: shown,
					source,
				});
			}
		};
		settings.interactions.sanitize();
		settings.apply_env();
		info!(
			"Loaded config with {} owner(s) and prefixes {:?}",
			settings.bot.owners.len(),
			settings.bot.prefixes
		);
		Ok(settings)
	}

	fn apply_env(&mut self) {
		if let Ok(key) = env::var("GEMINI_API_KEY")
			&& !key.is_empty()
		{
			self.api.gemini_key = Some(key);
		}
		if let Ok(key) = env::var("PEXELS_API_KEY")
			&& !key.is_empty()
		{
			self.api.pexels_key = Some(key);
		}
		if let Ok(key) = env::var("OCR_API_KEY")
			&& !key.is_empty()
		{
			self.api.ocr_key = key;
		}
		if let Ok(owners) = env::var("RAGNABOT_OWNERS") {
			self.bot.owners.extend(
				owners
					.split(',')
					.map(str::trim)
					.filter(|owner| !owner.is_empty())
					.map(str::to_owned),
			);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_sections_fall_back_to_defaults() {
		let settings: Settings = toml::from_str(
			r#"
			[bot]
			owners = ["254700000001"]

			[interactions]
			out_of_range = "hint"
			"#,
		)
		.unwrap();

		assert_eq!(settings.bot.owners, vec!["254700000001".to_owned()]);
		assert_eq!(settings.bot.prefixes, vec![".".to_owned()]);
		assert_eq!(settings.interactions.out_of_range, OutOfRangePolicy::Hint);
		assert_eq!(settings.interactions.selection_limit, 8);
		assert_eq!(settings.automation.autobio_interval_secs, 300);
		assert_eq!(settings.api.gemini_models.len(), 6);
	}

	#[test]
	fn selection_limit_is_capped() {
		let mut settings: Settings = toml::from_str(
			r#"
			[interactions]
			selection_limit = 25
			"#,
		)
		.unwrap();
		settings.interactions.sanitize();
		assert_eq!(settings.interactions.selection_limit, MAX_SELECTION);

		settings.interactions.selection_limit = 0;
		settings.interactions.sanitize();
		assert_eq!(settings.interactions.selection_limit, 1);

		settings.interactions.selection_limit = 5;
		settings.interactions.sanitize();
		assert_eq!(settings.interactions.selection_limit, 5);
	}

	#[test]
	fn access_overrides_parse_as_sets() {
		let settings: Settings = toml::from_str(
			r#"
			[access]
			public = ["autodp"]
			owner_only = ["8ball", "chatbot"]
			"#,
		)
		.unwrap();

		assert!(settings.access.public.contains("autodp"));
		assert!(settings.access.owner_only.contains("chatbot"));
	}

	#[test]
	fn missing_file_yields_defaults() {
		let settings = Settings::load(Path::new("/nonexistent/ragnabot.toml")).unwrap();
		assert_eq!(settings.bot.name, "RagnaBot");
	}

	#[test]
	fn broken_file_is_a_parse_error() {
		let err = toml::from_str::<Settings>("[bot\nname = 1").err();
		assert!(err.is_some());
	}
}
