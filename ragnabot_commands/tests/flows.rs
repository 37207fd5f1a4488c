use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use ragnabot_commands::{commands, listeners};
use ragnabot_core::{
	config::{settings::Settings, types::Data},
	handlers::Framework,
	host::{
		ChatHost, ChatId, HostError, InboundMessage, MediaAttachment, MediaSource, MessageKey,
		OutgoingMessage, QuotedMessage, UserId,
	},
	pending::{Interaction, SessionKey},
};
use serde_json::json;
use tokio::time::sleep;
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{method, path, query_param},
};

const GROUP: &str = "120363000000000001@g.us";
const ALICE: &str = "254700000001@s.whatsapp.net";
const BOB: &str = "254700000002@s.whatsapp.net";
const BOT: &str = "254799999999@s.whatsapp.net";

struct RecordingHost {
	bot: UserId,
	next_id: AtomicUsize,
	sent: Mutex<Vec<(MessageKey, OutgoingMessage)>>,
	edits: Mutex<Vec<(MessageKey, String)>>,
	statuses: Mutex<Vec<String>>,
	/// Makes every `send` fail, like a dropped connection
	offline: AtomicBool,
}

impl RecordingHost {
	fn new() -> Self {
		Self {
			bot: UserId::new(BOT),
			next_id: AtomicUsize::new(0),
			sent: Mutex::new(Vec::new()),
			edits: Mutex::new(Vec::new()),
			statuses: Mutex::new(Vec::new()),
			offline: AtomicBool::new(false),
		}
	}

	fn texts(&self) -> Vec<String> {
		self.sent
			.lock()
			.unwrap()
			.iter()
			.filter_map(|(_, message)| message.body().map(str::to_owned))
			.collect()
	}

	fn last_text(&self) -> String {
		self.texts().pop().unwrap_or_default()
	}

	fn sent_count(&self) -> usize {
		self.sent.lock().unwrap().len()
	}

	fn edits_of(&self, key: &MessageKey) -> Vec<String> {
		self.edits
			.lock()
			.unwrap()
			.iter()
			.filter(|(edited, _)| edited == key)
			.map(|(_, text)| text.clone())
			.collect()
	}

	fn key_of(&self, needle: &str) -> Option<MessageKey> {
		self.sent
			.lock()
			.unwrap()
			.iter()
			.find(|(_, message)| message.body().is_some_and(|body| body.contains(needle)))
			.map(|(key, _)| key.clone())
	}
}

#[async_trait]
impl ChatHost for RecordingHost {
	async fn send(
		&self,
		chat: &ChatId,
		message: OutgoingMessage,
		_quoted: Option<&InboundMessage>,
	) -> Result<MessageKey, HostError> {
		if self.offline.load(Ordering::SeqCst) {
			return Err(HostError::Delivery("connection lost".to_owned()));
		}
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let key = MessageKey {
			chat: chat.clone(),
			id: format!("out-{id}"),
		};
		self.sent.lock().unwrap().push((key.clone(), message));
		Ok(key)
	}

	async fn edit(&self, key: &MessageKey, text: &str) -> Result<(), HostError> {
		self.edits
			.lock()
			.unwrap()
			.push((key.clone(), text.to_owned()));
		Ok(())
	}

	async fn download_media(&self, _media: &MediaAttachment) -> Result<Bytes, HostError> {
		Err(HostError::Unsupported("media download"))
	}

	async fn update_profile_status(&self, status: &str) -> Result<(), HostError> {
		self.statuses.lock().unwrap().push(status.to_owned());
		Ok(())
	}

	async fn update_profile_picture(&self, _image: Bytes) -> Result<(), HostError> {
		Ok(())
	}

	fn bot_id(&self) -> &UserId {
		&self.bot
	}
}

struct Harness {
	framework: Framework,
	host: Arc<RecordingHost>,
}

impl Harness {
	fn new(mut settings: Settings) -> Self {
		settings.bot.owners.push("254700000001".to_owned());
		let data = Arc::new(Data::new(settings));
		Self {
			framework: Framework::new(data, commands(), listeners()),
			host: Arc::new(RecordingHost::new()),
		}
	}

	fn message(&self, sender: &str, text: &str) -> InboundMessage {
		InboundMessage {
			id: format!("in-{}", self.host.sent_count()),
			chat: ChatId::new(GROUP),
			sender: UserId::new(sender),
			text: text.to_owned(),
			..InboundMessage::default()
		}
	}

	async fn deliver(&self, message: InboundMessage) {
		let host: Arc<dyn ChatHost> = Arc::clone(&self.host) as Arc<dyn ChatHost>;
		self.framework.dispatch(host, message).await;
	}

	async fn send(&self, sender: &str, text: &str, mentions: &[&str]) {
		let mut message = self.message(sender, text);
		message.mentions = mentions.iter().map(|user| UserId::new(*user)).collect();
		self.deliver(message).await;
	}

	async fn say(&self, sender: &str, text: &str) {
		self.send(sender, text, &[]).await;
	}

	/// `text` sent as a reply to `quoted`
	async fn reply_to(&self, sender: &str, text: &str, quoted: &str) {
		let mut message = self.message(sender, text);
		message.quoted = Some(QuotedMessage {
			id: "quoted-1".to_owned(),
			sender: UserId::new(BOB),
			text: Some(quoted.to_owned()),
			media: None,
		});
		self.deliver(message).await;
	}

	fn last_text(&self) -> String {
		self.host.last_text()
	}

	fn set_offline(&self, offline: bool) {
		self.host.offline.store(offline, Ordering::SeqCst);
	}

	fn pending(&self, key: &SessionKey) -> Option<Interaction> {
		self.framework
			.data()
			.interactions
			.peek(key)
			.map(|pending| pending.interaction)
	}
}

fn member_key(sender: &str) -> SessionKey {
	SessionKey::member(ChatId::new(GROUP), UserId::new(sender))
}

fn chat_key() -> SessionKey {
	SessionKey::chat(ChatId::new(GROUP))
}

fn trivia_question(n: usize) -> serde_json::Value {
	json!({
		"category": "General%20Knowledge",
		"question": format!("Question%20{n}%3F"),
		"correct_answer": format!("Right%20{n}"),
		"incorrect_answers": ["Wrong%20a", "Wrong%20b", "Wrong%20c"]
	})
}

#[tokio::test]
async fn quiz_is_graded_once_and_then_cleared() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/trivia"))
		.and(query_param("amount", "5"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"response_code": 0,
			"results": (1..=5).map(trivia_question).collect::<Vec<_>>()
		})))
		.mount(&server)
		.await;
	let mut settings = Settings::default();
	settings.api.trivia = format!("{}/trivia", server.uri());
	let harness = Harness::new(settings);

	harness.say(ALICE, ".quiz").await;
	assert!(harness.last_text().contains("Quiz time!"));
	assert!(harness.last_text().contains("Question 1?"));
	assert!(matches!(
		harness.pending(&member_key(ALICE)),
		Some(Interaction::Quiz(_))
	));

	harness.say(ALICE, ".answers B A C").await;
	assert!(harness.last_text().contains("exactly 5 letters"));

	harness.say(ALICE, ".answers B A C D A").await;
	assert!(harness.last_text().contains("Quiz results:* "));
	assert!(harness.last_text().contains("/5"));
	assert!(harness.pending(&member_key(ALICE)).is_none());

	harness.say(ALICE, ".answers B A C D A").await;
	assert!(harness.last_text().contains("no quiz running"));
}

#[tokio::test]
async fn spotify_selection_ignores_noise_and_downloads_the_pick() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/search"))
		.and(query_param("q", "sauti sol"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"success": true,
			"results": [
				{"id": "t1", "title": "Sura Yako", "artists": "Sauti Sol", "duration": 215000},
				{"id": "t2", "title": "Melanin", "artists": "Sauti Sol", "duration": 190000},
				{"id": "t3", "title": "Suzanna", "artists": "Sauti Sol", "duration": 200000}
			]
		})))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/download/t2"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"success": true,
			"link": "https://cdn.example.com/melanin.mp3",
			"metadata": {"title": "Melanin", "artists": "Sauti Sol"}
		})))
		.expect(1)
		.mount(&server)
		.await;
	let mut settings = Settings::default();
	settings.api.music_search = format!("{}/search", server.uri());
	settings.api.music_download = format!("{}/download", server.uri());
	let harness = Harness::new(settings);

	harness.say(ALICE, ".spotify sauti sol").await;
	let status = harness.host.key_of("Searching for").unwrap();
	let list = harness.host.edits_of(&status).pop().unwrap();
	assert!(list.contains("*2. Melanin*"));
	assert!(list.contains("(1-3)"));

	let before = harness.host.sent_count();
	harness.say(ALICE, "9").await;
	harness.say(ALICE, "hello there").await;
	harness.say(BOB, "2").await;
	assert_eq!(harness.host.sent_count(), before);
	assert!(matches!(
		harness.pending(&member_key(ALICE)),
		Some(Interaction::Selection(_))
	));

	harness.say(ALICE, "2").await;
	assert!(harness.pending(&member_key(ALICE)).is_none());
	let audio = harness
		.host
		.sent
		.lock()
		.unwrap()
		.iter()
		.find_map(|(_, message)| match message {
			OutgoingMessage::Audio {
				source: MediaSource::Url(url),
				..
			} => Some(url.clone()),
			_ => None,
		});
	assert_eq!(audio.as_deref(), Some("https://cdn.example.com/melanin.mp3"));
	let edits = harness.host.edits_of(&status);
	assert!(edits.iter().any(|text| text.contains("Downloading *Melanin*")));
	assert_eq!(
		edits.last().map(String::as_str),
		Some("✅ Success: *Melanin* - Sauti Sol")
	);

	// The pick was consumed, so repeating it does nothing
	let before = harness.host.sent_count();
	harness.say(ALICE, "2").await;
	assert_eq!(harness.host.sent_count(), before);
}

#[tokio::test(start_paused = true)]
async fn tictactoe_bot_answers_after_the_pause() {
	let harness = Harness::new(Settings::default());

	harness.say(ALICE, ".ttt start easy").await;
	assert!(harness.last_text().contains("Tic-Tac-Toe"));

	let before = harness.host.sent_count();
	harness.say(BOB, "3").await;
	assert_eq!(harness.host.sent_count(), before);

	harness.say(ALICE, "5").await;
	assert!(harness.last_text().contains("My turn"));
	let after_move = harness.host.sent_count();

	sleep(Duration::from_secs(2)).await;
	assert_eq!(harness.host.sent_count(), after_move + 1);
	assert!(harness.last_text().contains("Your move @254700000001"));
	let Some(Interaction::TicTacToe(game)) = harness.pending(&chat_key()) else {
		panic!("game should still be running");
	};
	assert_eq!(game.board.iter().filter(|&&cell| cell != 0).count(), 2);

	harness.say(ALICE, ".ttt stop").await;
	assert!(harness.last_text().contains("stopped"));
	assert!(harness.pending(&chat_key()).is_none());
}

#[tokio::test(start_paused = true)]
async fn drafts_move_then_destination_hands_over_to_the_bot() {
	let harness = Harness::new(Settings::default());

	harness.say(ALICE, ".drafts bot").await;
	assert!(harness.last_text().contains("Step 1"));

	harness.say(ALICE, ".move 61").await;
	assert!(harness.last_text().contains("*1.* 61 → 52"));
	assert!(harness.last_text().contains("Step 2"));

	let before = harness.host.sent_count();
	harness.say(ALICE, "4").await;
	assert_eq!(harness.host.sent_count(), before);

	harness.say(ALICE, "1").await;
	assert!(harness.last_text().contains("played 61 → 52"));
	assert!(harness.last_text().contains("Thinking"));

	sleep(Duration::from_secs(2)).await;
	assert!(harness.last_text().contains("🤖 played"));
	let Some(Interaction::Drafts(game)) = harness.pending(&chat_key()) else {
		panic!("game should still be running");
	};
	assert!(!game.is_bot_turn());

	harness.say(BOB, ".stopdrafts").await;
	assert!(harness.last_text().contains("Only the players"));
	harness.say(ALICE, ".stopdrafts").await;
	assert!(harness.last_text().contains("Drafts game ended"));
	assert!(harness.pending(&chat_key()).is_none());
}

#[tokio::test]
async fn autobio_reports_duplicate_start_and_idle_stop() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/quotes"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(json!([{"q": "Stay hungry.", "a": "Steve Jobs"}])),
		)
		.mount(&server)
		.await;
	let mut settings = Settings::default();
	settings.api.quotes = format!("{}/quotes", server.uri());
	let harness = Harness::new(settings);

	harness.say(ALICE, ".autobio on").await;
	assert!(harness.last_text().contains("Auto-bio started"));
	harness.say(ALICE, ".autobio on").await;
	assert!(harness.last_text().contains("already running"));

	for _ in 0..100 {
		if !harness.host.statuses.lock().unwrap().is_empty() {
			break;
		}
		sleep(Duration::from_millis(50)).await;
	}
	assert_eq!(
		harness.host.statuses.lock().unwrap().first().map(String::as_str),
		Some("Stay hungry. ~ Steve Jobs")
	);

	harness.say(ALICE, ".autobio off").await;
	assert!(harness.last_text().contains("stopped"));
	harness.say(ALICE, ".autobio off").await;
	assert!(harness.last_text().contains("not running"));
}

#[tokio::test]
async fn owner_only_commands_ignore_everyone_else() {
	let harness = Harness::new(Settings::default());

	harness.say(BOB, ".autobio on").await;
	harness.say(BOB, ".chatbot on").await;
	assert_eq!(harness.host.sent_count(), 0);
	assert!(!harness.framework.data().timers.is_running("autobio"));

	harness.say(ALICE, ".autobio status").await;
	assert!(harness.last_text().contains("Auto-bio is stopped"));
}

#[tokio::test]
async fn access_overrides_open_owner_only_commands() {
	let mut settings = Settings::default();
	settings.access.public.insert("autobio".to_owned());
	let harness = Harness::new(settings);

	harness.say(BOB, ".autobio status").await;
	assert!(harness.last_text().contains("Auto-bio is stopped"));
}

#[tokio::test]
async fn help_lists_categories_and_explains_a_command() {
	let harness = Harness::new(Settings::default());

	harness.say(BOB, ".help").await;
	let menu = harness.last_text();
	assert!(menu.contains("🎮 Games"));
	assert!(menu.contains(".spotify"));

	harness.say(BOB, ".help ttt").await;
	assert!(harness.last_text().contains("_Usage:_ .ttt start"));

	harness.say(BOB, ".help nonsense").await;
	assert!(harness.last_text().contains("No command named nonsense"));
}

#[tokio::test(start_paused = true)]
async fn reminders_fire_and_can_be_cancelled() {
	let harness = Harness::new(Settings::default());

	harness.say(ALICE, ".remindme 10m stretch").await;
	assert!(harness.last_text().contains("Reminder set for 10m: stretch"));
	sleep(Duration::from_secs(601)).await;
	assert!(harness.last_text().contains("Reminder for @254700000001:_ stretch"));

	harness.say(ALICE, ".remindme 1h call mum").await;
	harness.say(ALICE, ".remindme cancel").await;
	assert!(harness.last_text().contains("Cancelled 1 reminder"));
	let before = harness.host.sent_count();
	sleep(Duration::from_secs(3601)).await;
	assert_eq!(harness.host.sent_count(), before);

	harness.say(ALICE, ".remindme 0m nothing").await;
	assert!(harness.last_text().contains("greater than zero"));
}

#[tokio::test]
async fn mentions_start_a_player_game() {
	let harness = Harness::new(Settings::default());

	harness.send(ALICE, ".ttt @254700000002", &[BOB]).await;
	assert!(harness.last_text().contains("vs @254700000002"));
	harness.send(ALICE, ".drafts @254700000002", &[BOB]).await;
	assert!(harness.last_text().contains("already in progress"));
}

async fn mount_search(server: &MockServer, query: &str, id: &str, title: &str) {
	Mock::given(method("GET"))
		.and(path("/search"))
		.and(query_param("q", query))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"success": true,
			"results": [{"id": id, "title": title, "artists": "Sauti Sol", "duration": 200000}]
		})))
		.mount(server)
		.await;
}

fn music_settings(server: &MockServer) -> Settings {
	let mut settings = Settings::default();
	settings.api.music_search = format!("{}/search", server.uri());
	settings.api.music_download = format!("{}/download", server.uri());
	settings
}

#[tokio::test]
async fn second_search_is_refused_while_a_list_is_open() {
	let server = MockServer::start().await;
	mount_search(&server, "first", "a1", "Alpha").await;
	Mock::given(method("GET"))
		.and(path("/search"))
		.and(query_param("q", "second"))
		.respond_with(ResponseTemplate::new(200))
		.expect(0)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/download/a1"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"success": true,
			"link": "https://cdn.example.com/alpha.mp3",
			"metadata": {"title": "Alpha", "artist": "Sauti Sol"}
		})))
		.expect(1)
		.mount(&server)
		.await;
	let harness = Harness::new(music_settings(&server));

	harness.say(ALICE, ".spotify first").await;
	let first = harness.host.key_of("*first*").unwrap();
	harness.say(ALICE, ".spotify second").await;
	assert!(harness.last_text().contains("waiting for an answer"));
	assert!(harness.host.key_of("*second*").is_none());

	harness.say(ALICE, "1").await;
	assert_eq!(
		harness.host.edits_of(&first).last().map(String::as_str),
		Some("✅ Success: *Alpha* - Sauti Sol")
	);
}

#[tokio::test]
async fn failed_download_does_not_reopen_the_list() {
	let server = MockServer::start().await;
	mount_search(&server, "melanin", "t1", "Melanin").await;
	Mock::given(method("GET"))
		.and(path("/download/t1"))
		.respond_with(ResponseTemplate::new(502))
		.expect(1)
		.mount(&server)
		.await;
	let harness = Harness::new(music_settings(&server));

	harness.say(ALICE, ".spotify melanin").await;
	let status = harness.host.key_of("Searching for").unwrap();
	harness.say(ALICE, "1").await;
	assert_eq!(
		harness.host.edits_of(&status).last().map(String::as_str),
		Some("_❌ Spotify failed (502 Bad Gateway)._")
	);
	assert!(harness.pending(&member_key(ALICE)).is_none());

	let (sent, edits) = (harness.host.sent_count(), harness.host.edits_of(&status).len());
	harness.say(ALICE, "1").await;
	assert_eq!(harness.host.sent_count(), sent);
	assert_eq!(harness.host.edits_of(&status).len(), edits);
}

#[tokio::test]
async fn upstream_failures_become_one_line_replies() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/epl"))
		.respond_with(ResponseTemplate::new(500))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/joke"))
		.respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
		.mount(&server)
		.await;
	let mut settings = Settings::default();
	settings.api.football = format!("{}/epl", server.uri());
	settings.api.joke = format!("{}/joke", server.uri());
	let harness = Harness::new(settings);

	harness.say(BOB, ".epl table").await;
	assert_eq!(
		harness.last_text(),
		"_❌ Football feed failed (500 Internal Server Error)._"
	);
	harness.say(BOB, ".joke").await;
	assert_eq!(
		harness.last_text(),
		"_❌ icanhazdadjoke sent something unexpected._"
	);
	assert_eq!(harness.host.sent_count(), 2);
}

#[tokio::test]
async fn premier_league_table_is_computed_from_results() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/epl"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"name": "English Premier League 2025/26",
			"matches": [
				{"round": "Matchday 1", "date": "2025-08-15", "team1": "Arsenal FC",
					"team2": "Chelsea FC", "score": {"ft": [2, 1]}},
				{"round": "Matchday 2", "date": "2025-08-22", "team1": "Chelsea FC",
					"team2": "Arsenal FC"}
			]
		})))
		.mount(&server)
		.await;
	let mut settings = Settings::default();
	settings.api.football = format!("{}/epl", server.uri());
	let harness = Harness::new(settings);

	harness.say(BOB, ".epl").await;
	let table = harness.last_text();
	assert!(table.contains("1. Arsenal FC - *3 pts* (P1 W1 D0 L0, GD +1)"));
	assert!(table.contains("2. Chelsea FC - *0 pts*"));

	harness.say(BOB, ".epl fixtures").await;
	assert!(harness.last_text().contains("*Chelsea FC vs Arsenal FC*"));

	harness.say(BOB, ".epl relegation").await;
	assert!(harness.last_text().contains("_Usage: .epl table"));
}

#[tokio::test]
async fn analyze_summarises_the_quoted_message() {
	let server = MockServer::start().await;
	let analysis = json!({
		"topicSummary": "Invitation to a Saturday hike",
		"sentiment": "Positive",
		"responseSuggestion": "Count me in!",
		"keywords": ["hike", "Saturday", "Ngong Hills"]
	});
	Mock::given(method("POST"))
		.and(path("/models/gemini-2.5-flash:generateContent"))
		.and(query_param("key", "test-key"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"candidates": [{"content": {"parts": [{"text": analysis.to_string()}]}}]
		})))
		.expect(1)
		.mount(&server)
		.await;
	let mut settings = Settings::default();
	settings.api.gemini_key = Some("test-key".to_owned());
	settings.api.gemini_base = format!("{}/models", server.uri());
	let harness = Harness::new(settings);

	harness.say(ALICE, ".analyze").await;
	assert!(harness.last_text().contains("_Usage: Reply to a text message"));

	harness
		.reply_to(ALICE, ".analyze", "Who's up for Ngong Hills on Saturday?")
		.await;
	let reply = harness.last_text();
	assert!(reply.contains("*📈 Sentiment:* Positive"));
	assert!(reply.contains("hike, Saturday, Ngong Hills"));
	assert!(reply.contains("_Count me in!_"));
}

#[tokio::test(start_paused = true)]
async fn bot_still_moves_when_the_board_cannot_be_posted() {
	let harness = Harness::new(Settings::default());
	harness.say(ALICE, ".ttt start easy").await;

	harness.set_offline(true);
	harness.say(ALICE, "5").await;
	harness.set_offline(false);
	let before = harness.host.sent_count();

	sleep(Duration::from_secs(2)).await;
	assert_eq!(harness.host.sent_count(), before + 1);
	assert!(harness.last_text().contains("Your move @254700000001"));
	let Some(Interaction::TicTacToe(game)) = harness.pending(&chat_key()) else {
		panic!("game should still be running");
	};
	assert_eq!(game.board.iter().filter(|&&cell| cell != 0).count(), 2);
}

#[tokio::test(start_paused = true)]
async fn stopping_a_game_cancels_the_pending_bot_move() {
	let harness = Harness::new(Settings::default());
	let group = ChatId::new(GROUP);

	harness.say(ALICE, ".ttt start").await;
	harness.say(ALICE, "1").await;
	assert!(harness.last_text().contains("My turn"));
	assert!(harness.framework.data().timers.has_session(&group, "ttt"));
	harness.say(ALICE, ".ttt stop").await;
	assert!(!harness.framework.data().timers.has_session(&group, "ttt"));
	let before = harness.host.sent_count();
	sleep(Duration::from_secs(5)).await;
	assert_eq!(harness.host.sent_count(), before);

	harness.say(ALICE, ".drafts bot").await;
	harness.say(ALICE, ".move 61").await;
	harness.say(ALICE, "1").await;
	assert!(harness.last_text().contains("Thinking"));
	harness.say(ALICE, ".stopdrafts").await;
	assert!(harness.last_text().contains("Drafts game ended"));
	let before = harness.host.sent_count();
	sleep(Duration::from_secs(5)).await;
	assert_eq!(harness.host.sent_count(), before);
	assert!(harness.pending(&chat_key()).is_none());
}

#[tokio::test(start_paused = true)]
async fn hack_stop_aborts_the_animation() {
	let harness = Harness::new(Settings::default());

	harness.send(ALICE, ".hack @254700000002", &[BOB]).await;
	let animation = harness.host.key_of("Hacking").unwrap();
	sleep(Duration::from_millis(1600)).await;
	assert_eq!(harness.host.edits_of(&animation), ["🔍 Scanning system..."]);

	harness.say(ALICE, ".hack stop").await;
	assert!(harness.last_text().contains("Hack aborted"));
	sleep(Duration::from_secs(30)).await;
	assert_eq!(harness.host.edits_of(&animation).len(), 1);

	harness.say(ALICE, ".hack stop").await;
	assert!(harness.last_text().contains("No hack is running"));
}
