//! Line-based stand-in for the WhatsApp client: stdin lines become messages from one
//! console user in a private chat, everything the bot sends is printed to stdout.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use ragnabot_core::host::{
	ChatHost, ChatId, HostError, InboundMessage, MediaAttachment, MediaSource, MessageKey,
	OutgoingMessage, UserId,
};
use tokio::{
	io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Stdout, stdin, stdout},
	sync::{Mutex, mpsc::Sender},
};
use tracing::{debug, info, warn};

pub const CONSOLE_NUMBER: &str = "0";
const BOT_NUMBER: &str = "1";
const SUFFIX: &str = "@s.whatsapp.net";

fn console_user() -> UserId {
	UserId::new(format!("{CONSOLE_NUMBER}{SUFFIX}"))
}

pub struct ConsoleHost {
	bot: UserId,
	out: Mutex<Stdout>,
	next_id: AtomicU64,
}

impl Default for ConsoleHost {
	fn default() -> Self {
		Self::new()
	}
}

impl ConsoleHost {
	#[must_use]
	pub fn new() -> Self {
		Self {
			bot: UserId::new(format!("{BOT_NUMBER}{SUFFIX}")),
			out: Mutex::new(stdout()),
			next_id: AtomicU64::new(0),
		}
	}

	async fn print(&self, line: &str) -> Result<(), HostError> {
		let mut out = self.out.lock().await;
		out.write_all(format!("{line}\n").as_bytes())
			.await
			.map_err(|err| HostError::Delivery(err.to_string()))?;
		out.flush()
			.await
			.map_err(|err| HostError::Delivery(err.to_string()))
	}
}

fn describe_source(source: &MediaSource) -> String {
	match source {
		MediaSource::Url(url) => url.clone(),
		MediaSource::Bytes(bytes) => format!("{} bytes", bytes.len()),
	}
}

fn render(message: &OutgoingMessage) -> String {
	match message {
		OutgoingMessage::Text { text, .. } => text.clone(),
		OutgoingMessage::Image { source, caption } => format!(
			"[image {}] {}",
			describe_source(source),
			caption.as_deref().unwrap_or_default()
		),
		OutgoingMessage::Video { source, caption } => format!(
			"[video {}] {}",
			describe_source(source),
			caption.as_deref().unwrap_or_default()
		),
		OutgoingMessage::Audio {
			source, file_name, ..
		} => format!(
			"[audio {}] {}",
			describe_source(source),
			file_name.as_deref().unwrap_or_default()
		),
	}
}

#[async_trait]
impl ChatHost for ConsoleHost {
	async fn send(
		&self,
		chat: &ChatId,
		message: OutgoingMessage,
		_quoted: Option<&InboundMessage>,
	) -> Result<MessageKey, HostError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
		self.print(&format!("<{id}> {}", render(&message))).await?;
		Ok(MessageKey {
			chat: chat.clone(),
			id,
		})
	}

	async fn edit(&self, key: &MessageKey, text: &str) -> Result<(), HostError> {
		self.print(&format!("<{} edited> {text}", key.id)).await
	}

	async fn download_media(&self, _media: &MediaAttachment) -> Result<Bytes, HostError> {
		Err(HostError::Unsupported("media download"))
	}

	async fn update_profile_status(&self, status: &str) -> Result<(), HostError> {
		self.print(&format!("[about] {status}")).await
	}

	async fn update_profile_picture(&self, image: Bytes) -> Result<(), HostError> {
		self.print(&format!("[profile picture] {} bytes", image.len()))
			.await
	}

	fn bot_id(&self) -> &UserId {
		&self.bot
	}
}

/// Feeds stdin lines to the bot until stdin closes or the bot stops listening
pub async fn read_stdin(inbound: Sender<InboundMessage>) {
	let chat = ChatId::new(format!("{CONSOLE_NUMBER}{SUFFIX}"));
	let mut lines = BufReader::new(stdin()).lines();
	let mut counter = 0_u64;
	loop {
		match lines.next_line().await {
			Ok(Some(line)) => {
				let text = line.trim();
				if text.is_empty() {
					continue;
				}
				counter = counter.wrapping_add(1);
				debug!("Console line {counter}: {text}");
				let message = InboundMessage {
					id: format!("console-{counter}"),
					chat: chat.clone(),
					sender: console_user(),
					push_name: Some("console".to_owned()),
					text: text.to_owned(),
					..InboundMessage::default()
				};
				if inbound.send(message).await.is_err() {
					break;
				}
			}
			Ok(None) => {
				info!("Console stdin closed");
				break;
			}
			Err(err) => {
				warn!("Console read failed: {err}");
				break;
			}
		}
	}
}
