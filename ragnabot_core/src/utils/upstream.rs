//! Shared plumbing for third-party APIs.
//!
//! Adapters decode responses into their own `#[derive(Deserialize)]` structs through
//! [`get_json`]/[`read_json`], so a missing field becomes [`UpstreamError::Shape`] at the boundary
//! instead of a silent `None` further down.

use bytes::Bytes;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::config::types::HTTP_CLIENT;

#[derive(Debug, Error)]
pub enum UpstreamError {
	#[error("request failed: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("upstream answered with status {0}")]
	Status(StatusCode),
	#[error("unexpected response shape: {0}")]
	Shape(String),
	#[error("{0} is not configured")]
	MissingKey(&'static str),
	#[error("nothing found")]
	Empty,
}

impl UpstreamError {
	#[must_use]
	pub fn shape(detail: impl Into<String>) -> Self {
		Self::Shape(detail.into())
	}

	#[must_use]
	pub const fn is_rate_limited(&self) -> bool {
		matches!(self, Self::Status(StatusCode::TOO_MANY_REQUESTS))
	}

	/// Short chat-friendly text for `service`
	#[must_use]
	pub fn user_message(&self, service: &str) -> String {
		match self {
			Self::Transport(err) if err.is_timeout() => format!("_❌ {service} timed out, try again later._"),
			Self::Transport(_) => format!("_❌ Could not reach {service}._"),
			Self::Status(StatusCode::TOO_MANY_REQUESTS) => {
				format!("_⚠️ {service} is rate limiting us, try again later._")
			}
			Self::Status(status) => format!("_❌ {service} failed ({status})._"),
			Self::Shape(_) => format!("_❌ {service} sent something unexpected._"),
			Self::MissingKey(key) => format!("_❌ {key} is not configured._"),
			Self::Empty => format!("_❌ {service} found nothing._"),
		}
	}
}

async fn checked(request: RequestBuilder) -> Result<Response, UpstreamError> {
	let response = request.send().await?;
	let status = response.status();
	if status.is_success() {
		Ok(response)
	} else {
		warn!("Upstream {} answered {status}", response.url());
		Err(UpstreamError::Status(status))
	}
}

/// Decodes a 2xx JSON body into `T`
pub async fn read_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, UpstreamError> {
	let body = checked(request).await?.bytes().await?;
	parse_json(&body)
}

pub async fn get_json<T: DeserializeOwned>(url: &str, query: &[(&str, &str)]) -> Result<T, UpstreamError> {
	read_json(HTTP_CLIENT.get(url).query(query)).await
}

pub async fn read_text(request: RequestBuilder) -> Result<String, UpstreamError> {
	Ok(checked(request).await?.text().await?)
}

pub async fn read_bytes(request: RequestBuilder) -> Result<Bytes, UpstreamError> {
	Ok(checked(request).await?.bytes().await?)
}

pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, UpstreamError> {
	serde_json::from_slice(body).map_err(|err| UpstreamError::shape(err.to_string()))
}

/// Strips the ```json fences models like to wrap structured answers in
#[must_use]
pub fn strip_code_fence(text: &str) -> &str {
	let trimmed = text.trim();
	let without_open = trimmed
		.strip_prefix("```json")
		.or_else(|| trimmed.strip_prefix("```"))
		.unwrap_or(trimmed);
	without_open
		.strip_suffix("```")
		.unwrap_or(without_open)
		.trim()
}

/// Cuts `text` to at most `max` characters on a char boundary
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> (&str, bool) {
	text.char_indices()
		.nth(max)
		.map_or((text, false), |(index, _)| (text.get(..index).unwrap_or(text), true))
}

#[cfg(test)]
mod tests {
	use serde::Deserialize;

	use super::*;

	#[derive(Deserialize, Debug)]
	struct Joke {
		joke: String,
	}

	#[test]
	fn fences_are_removed() {
		assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
		assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
	}

	#[test]
	fn missing_fields_are_shape_errors() {
		let err = parse_json::<Joke>(br#"{"status":200}"#).unwrap_err();
		assert!(matches!(err, UpstreamError::Shape(_)));
		let joke = parse_json::<Joke>(br#"{"joke":"hi"}"#).unwrap();
		assert_eq!(joke.joke, "hi");
	}

	#[test]
	fn truncation_respects_multibyte_text() {
		let (cut, truncated) = truncate_chars("héllo wörld", 4);
		assert_eq!(cut, "héll");
		assert!(truncated);
		assert_eq!(truncate_chars("short", 10), ("short", false));
	}

	#[test]
	fn rate_limit_is_recognised() {
		assert!(UpstreamError::Status(StatusCode::TOO_MANY_REQUESTS).is_rate_limited());
		assert!(!UpstreamError::Empty.is_rate_limited());
	}
}
