use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{info, warn};

use crate::{
	config::{
		settings::APIConfig,
		types::{ChatTurn, Data, HTTP_CLIENT, Role},
	},
	host::ChatId,
	utils::upstream::{UpstreamError, parse_json, read_json, strip_code_fence},
};

#[derive(Serialize)]
struct GeminiRequest {
	contents: Vec<GeminiContent>,
	#[serde(rename = "generationConfig")]
	generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
	role: Role,
	parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart {
	Text { text: String },
	Inline { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
	mime_type: String,
	data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
	max_output_tokens: u32,
	temperature: f32,
	#[serde(skip_serializing_if = "Option::is_none")]
	response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
struct GeminiResponse {
	candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
	content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
	parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
	#[serde(default)]
	text: Option<String>,
}

pub struct InlineImage {
	pub mime_type: String,
	pub data: Bytes,
}

pub struct GeminiPrompt {
	pub system: Option<String>,
	pub turns: Vec<ChatTurn>,
	pub image: Option<InlineImage>,
	pub json: bool,
	pub max_output_tokens: u32,
	pub temperature: f32,
}

impl GeminiPrompt {
	#[must_use]
	pub fn single(text: String) -> Self {
		Self {
			system: None,
			turns: vec![ChatTurn::user(text)],
			image: None,
			json: false,
			max_output_tokens: 1024,
			temperature: 0.7,
		}
	}

	fn into_request(self) -> GeminiRequest {
		let mut contents: Vec<GeminiContent> = Vec::with_capacity(self.turns.len().saturating_add(1));
		// Gemma models reject system instructions, so the prompt rides along as the first turn
		if let Some(system) = self.system {
			contents.push(GeminiContent {
				role: Role::User,
				parts: vec![GeminiPart::Text {
					text: format!("System: {system}"),
				}],
			});
		}
		contents.extend(self.turns.into_iter().map(|turn| GeminiContent {
			role: turn.role,
			parts: vec![GeminiPart::Text { text: turn.text }],
		}));
		if let Some(image) = self.image
			&& let Some(last) = contents.last_mut()
		{
			last.parts.push(GeminiPart::Inline {
				inline_data: InlineData {
					mime_type: image.mime_type,
					data: BASE64.encode(&image.data),
				},
			});
		}
		GeminiRequest {
			contents,
			generation_config: GenerationConfig {
				max_output_tokens: self.max_output_tokens,
				temperature: self.temperature,
				response_mime_type: self.json.then_some("application/json"),
			},
		}
	}
}

/// Single `generateContent` call against `model`
pub async fn gemini_generate(api: &APIConfig, model: &str, prompt: GeminiPrompt) -> Result<String, UpstreamError> {
	let key = api
		.gemini_key
		.as_deref()
		.ok_or(UpstreamError::MissingKey("GEMINI_API_KEY"))?;
	let url = format!("{}/{model}:generateContent", api.gemini_base.trim_end_matches('/'));
	let response: GeminiResponse = read_json(
		HTTP_CLIENT
			.post(url)
			.query(&[("key", key)])
			.json(&prompt.into_request()),
	)
	.await?;
	let text: String = response
		.candidates
		.into_iter()
		.next()
		.ok_or_else(|| UpstreamError::shape("no candidates"))?
		.content
		.parts
		.into_iter()
		.filter_map(|part| part.text)
		.collect();
	if text.trim().is_empty() {
		return Err(UpstreamError::shape("candidate without text"));
	}
	Ok(text)
}

pub async fn gemini_text(api: &APIConfig, prompt: String) -> Result<String, UpstreamError> {
	gemini_generate(api, &api.gemini_json_model, GeminiPrompt::single(prompt)).await
}

/// Asks for JSON and decodes it into `T`
pub async fn gemini_json<T: DeserializeOwned>(
	api: &APIConfig,
	system: &str,
	prompt: String,
) -> Result<T, UpstreamError> {
	let mut request = GeminiPrompt::single(prompt);
	request.system = Some(system.to_owned());
	request.json = true;
	request.temperature = 0.3;
	let raw = gemini_generate(api, &api.gemini_json_model, request).await?;
	parse_json(strip_code_fence(&raw).as_bytes())
}

pub enum ChatbotReply {
	Answer(String),
	/// Rate limited; the chat now uses this model from the fallback list
	SwitchedModel(String),
	Exhausted,
}

/// One chatbot turn for `chat`, keeping the rolling context and the model fallback level
pub async fn ai_chatbot(
	data: &Data,
	chat: &ChatId,
	text: &str,
	image: Option<InlineImage>,
) -> Result<ChatbotReply, UpstreamError> {
	let settings = &data.settings;
	let models = &settings.api.gemini_models;
	let context = data.chatbot.context(chat);
	let (recent, level) = {
		let context = context.lock().await;
		(
			context.recent(settings.chatbot.context_window),
			context.model_level,
		)
	};
	let Some(model) = models.get(level) else {
		return Ok(ChatbotReply::Exhausted);
	};
	let has_image = image.is_some();
	let mut turns = recent;
	turns.push(ChatTurn::user(text.to_owned()));
	let prompt = GeminiPrompt {
		system: Some(data.chatbot.system_prompt.read().await.clone()),
		turns,
		image,
		json: false,
		max_output_tokens: settings.chatbot.max_output_tokens,
		temperature: settings.chatbot.temperature,
	};

	match gemini_generate(&settings.api, model, prompt).await {
		Ok(answer) => {
			let mut context = context.lock().await;
			let remembered = if has_image {
				format!("{text} [Image included]")
			} else {
				text.to_owned()
			};
			context.push(ChatTurn::user(remembered), settings.chatbot.context_limit);
			context.push(ChatTurn::model(answer.clone()), settings.chatbot.context_limit);
			Ok(ChatbotReply::Answer(answer))
		}
		Err(err) if err.is_rate_limited() => {
			let next = level.saturating_add(1);
			context.lock().await.model_level = next;
			if let Some(next_model) = models.get(next) {
				info!("Chat {chat} switched to model {next_model} after rate limit on {model}");
				Ok(ChatbotReply::SwitchedModel(next_model.clone()))
			} else {
				warn!("Chat {chat} exhausted every chatbot model");
				Ok(ChatbotReply::Exhausted)
			}
		}
		Err(err) => Err(err),
	}
}
