//! The messaging client the bot runs on top of.
//!
//! Everything the bot can do to a chat goes through [`ChatHost`]; the binary wires in a concrete
//! host and tests use a recording fake.

use core::fmt::{Display, Formatter, Result as FmtResult};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub String);

impl ChatId {
	pub fn new(jid: impl Into<String>) -> Self {
		Self(jid.into())
	}

	#[must_use]
	pub fn is_group(&self) -> bool {
		self.0.ends_with("@g.us")
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for ChatId {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub String);

impl UserId {
	pub fn new(jid: impl Into<String>) -> Self {
		Self(jid.into())
	}

	/// Phone number part of the JID, also used for `@` mentions
	#[must_use]
	pub fn number(&self) -> &str {
		self.0.split_once('@').map_or(self.0.as_str(), |(number, _)| number)
	}

	#[must_use]
	pub fn mention(&self) -> String {
		format!("@{}", self.number())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Display for UserId {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Key of a sent message, needed to edit it in place later
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MessageKey {
	pub chat: ChatId,
	pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
	Image,
	Video,
	Audio,
	Document,
	Sticker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
	pub kind: MediaKind,
	pub mime_type: String,
	/// Opaque host handle passed back to [`ChatHost::download_media`]
	pub handle: String,
}

#[derive(Debug, Clone, Default)]
pub struct QuotedMessage {
	pub id: String,
	pub sender: UserId,
	pub text: Option<String>,
	pub media: Option<MediaAttachment>,
}

#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
	pub id: String,
	pub chat: ChatId,
	pub sender: UserId,
	pub push_name: Option<String>,
	pub text: String,
	pub from_me: bool,
	pub mentions: Vec<UserId>,
	pub quoted: Option<QuotedMessage>,
	pub media: Option<MediaAttachment>,
}

impl InboundMessage {
	#[must_use]
	pub fn is_group(&self) -> bool {
		self.chat.is_group()
	}

	/// Media attached to this message, or to the message it replies to
	#[must_use]
	pub fn media_or_quoted(&self) -> Option<&MediaAttachment> {
		self.media.as_ref().or_else(|| {
			self.quoted
				.as_ref()
				.and_then(|quoted| quoted.media.as_ref())
		})
	}

	#[must_use]
	pub fn display_name(&self) -> &str {
		self.push_name
			.as_deref()
			.unwrap_or_else(|| self.sender.number())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
	Url(String),
	Bytes(Bytes),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
	Text {
		text: String,
		mentions: Vec<UserId>,
	},
	Image {
		source: MediaSource,
		caption: Option<String>,
	},
	Video {
		source: MediaSource,
		caption: Option<String>,
	},
	Audio {
		source: MediaSource,
		mime_type: String,
		file_name: Option<String>,
	},
}

impl OutgoingMessage {
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text {
			text: text.into(),
			mentions: Vec::new(),
		}
	}

	pub fn text_mentioning(text: impl Into<String>, mentions: Vec<UserId>) -> Self {
		Self::Text {
			text: text.into(),
			mentions,
		}
	}

	/// Text body or media caption
	#[must_use]
	pub fn body(&self) -> Option<&str> {
		match self {
			Self::Text { text, .. } => Some(text),
			Self::Image { caption, .. } | Self::Video { caption, .. } => caption.as_deref(),
			Self::Audio { .. } => None,
		}
	}
}

#[derive(Debug, Error)]
pub enum HostError {
	#[error("the host does not support {0}")]
	Unsupported(&'static str),
	#[error("message delivery failed: {0}")]
	Delivery(String),
}

#[async_trait]
pub trait ChatHost: Send + Sync {
	async fn send(
		&self,
		chat: &ChatId,
		message: OutgoingMessage,
		quoted: Option<&InboundMessage>,
	) -> Result<MessageKey, HostError>;

	async fn edit(&self, key: &MessageKey, text: &str) -> Result<(), HostError>;

	async fn download_media(&self, media: &MediaAttachment) -> Result<Bytes, HostError>;

	async fn update_profile_status(&self, status: &str) -> Result<(), HostError>;

	async fn update_profile_picture(&self, image: Bytes) -> Result<(), HostError>;

	fn bot_id(&self) -> &UserId;
}
