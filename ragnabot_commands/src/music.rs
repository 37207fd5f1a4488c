use ragnabot_core::{
	config::{
		settings::OutOfRangePolicy,
		types::{Context, Error, HTTP_CLIENT},
	},
	handlers::{Category, Command, Handled, Listener},
	host::{MediaSource, MessageKey, OutgoingMessage},
	pending::{Candidate, Interaction, SelectionState, SessionKey},
	utils::{
		helpers::{selection_number, spotify_track_id},
		upstream::{UpstreamError, get_json, read_json},
	},
};
use serde::Deserialize;
use tracing::{info, warn};
use winnow::Parser as _;

use crate::{upstream_failed, usage};

const SERVICE: &str = "Spotify";

#[derive(Deserialize)]
struct SearchResponse {
	#[serde(default)]
	success: bool,
	#[serde(default)]
	results: Vec<SearchTrack>,
}

#[derive(Deserialize)]
struct SearchTrack {
	id: String,
	title: String,
	#[serde(default)]
	artists: String,
	/// Milliseconds
	#[serde(default)]
	duration: u64,
}

#[derive(Deserialize)]
struct DownloadResponse {
	#[serde(default)]
	success: bool,
	#[serde(default)]
	link: Option<String>,
	#[serde(default)]
	metadata: Option<TrackMetadata>,
}

#[derive(Deserialize)]
struct TrackMetadata {
	title: String,
	#[serde(default, alias = "artists")]
	artist: String,
}

fn format_duration(millis: u64) -> String {
	let secs = millis / 1000;
	format!("{}:{:02}", secs / 60, secs % 60)
}

fn candidate_list(query: &str, candidates: &[Candidate]) -> String {
	let lines: Vec<String> = candidates
		.iter()
		.enumerate()
		.map(|(index, candidate)| {
			format!(
				"*{}. {}*\n_{}_",
				index.saturating_add(1),
				candidate.title,
				candidate.detail
			)
		})
		.collect();
	format!(
		"🎵 *Search results for:* _\"{query}\"_\n\n{}\n\n_Reply with a number (1-{}) to download_",
		lines.join("\n\n"),
		candidates.len()
	)
}

async fn search(ctx: &Context, query: &str) -> Result<Vec<Candidate>, UpstreamError> {
	let response: SearchResponse = get_json(&ctx.settings().api.music_search, &[("q", query)]).await?;
	if !response.success {
		return Err(UpstreamError::shape("search reported failure"));
	}
	Ok(response
		.results
		.into_iter()
		.take(ctx.settings().interactions.selection_limit)
		.map(|track| Candidate {
			detail: format!("by {} • {}", track.artists, format_duration(track.duration)),
			id: track.id,
			title: track.title,
		})
		.collect())
}

/// Sends the track as audio and returns `(title, artist)`
async fn download(ctx: &Context, track_id: &str) -> Result<(String, String), UpstreamError> {
	let url = format!(
		"{}/{}",
		ctx.settings().api.music_download.trim_end_matches('/'),
		track_id
	);
	let response: DownloadResponse = read_json(HTTP_CLIENT.get(url)).await?;
	if !response.success {
		return Err(UpstreamError::shape("download reported failure"));
	}
	let link = response.link.ok_or(UpstreamError::Empty)?;
	let metadata = response
		.metadata
		.ok_or_else(|| UpstreamError::shape("download without metadata"))?;
	ctx.send(OutgoingMessage::Audio {
		source: MediaSource::Url(link),
		mime_type: "audio/mpeg".to_owned(),
		file_name: Some(format!("{} - {}.mp3", metadata.title, metadata.artist)),
	})
	.await
	.map_err(|err| UpstreamError::shape(format!("sending audio failed: {err}")))?;
	Ok((metadata.title, metadata.artist))
}

/// Downloads into an existing status message, editing it to the result
async fn download_into(ctx: &Context, status: &MessageKey, track_id: &str) -> Result<(), Error> {
	match download(ctx, track_id).await {
		Ok((title, artist)) => {
			info!("Sent track {track_id} to {}", ctx.chat());
			ctx.edit(status, &format!("✅ Success: *{title}* - {artist}"))
				.await?;
		}
		Err(err) => {
			warn!("{SERVICE} download of {track_id} failed: {err}");
			ctx.edit(status, &err.user_message(SERVICE)).await?;
		}
	}
	Ok(())
}

#[must_use]
pub fn spotify() -> Command {
	Command::new("spotify", |ctx| Box::pin(spotify_command(ctx)))
		.aliases(&["song", "play"])
		.description("Search a song and download it")
		.usage(".spotify <song name | track link>")
		.category(Category::Media)
}

async fn spotify_command(ctx: Context) -> Result<(), Error> {
	let query = if ctx.args.trim().is_empty() {
		ctx.message
			.quoted
			.as_ref()
			.and_then(|quoted| quoted.text.as_deref())
			.map(str::trim)
			.unwrap_or_default()
			.to_owned()
	} else {
		ctx.args.trim().to_owned()
	};
	if query.is_empty() {
		return usage(&ctx).await;
	}

	let mut input = query.as_str();
	if query.starts_with("http")
		&& let Ok(track_id) = spotify_track_id.parse_next(&mut input)
	{
		let status = ctx.reply("⬇️ Fetching the track...").await?;
		return download_into(&ctx, &status, &track_id).await;
	}

	let key = SessionKey::member(ctx.chat().clone(), ctx.author().clone());
	if let Some(pending) = ctx.data.interactions.peek(&key) {
		ctx.reply(format!(
			"_❗ You already have {} waiting for an answer. Reply to it first._",
			pending.interaction.kind().describe()
		))
		.await?;
		return Ok(());
	}

	let status = ctx.reply(format!("_Searching for:_ *{query}*")).await?;
	let candidates = match search(&ctx, &query).await {
		Ok(candidates) => candidates,
		Err(err) => return upstream_failed(&ctx, SERVICE, &err).await,
	};
	if candidates.is_empty() {
		ctx.edit(&status, "_No tracks found!_").await?;
		return Ok(());
	}

	// Claim the slot before the list becomes visible
	let list = candidate_list(&query, &candidates);
	let selection = SelectionState {
		message: status.clone(),
		candidates,
	};
	if let Err(err) = ctx
		.data
		.interactions
		.begin(key.clone(), Interaction::Selection(selection))
	{
		ctx.edit(&status, &format!("_❗ {err}_")).await?;
		return Ok(());
	}
	if let Err(err) = ctx.edit(&status, &list).await {
		ctx.data.interactions.cancel(&key);
		return Err(err);
	}
	Ok(())
}

#[must_use]
pub fn selection_listener() -> Listener {
	Listener::new("spotify-selection", |ctx| Box::pin(select_track(ctx)))
}

async fn select_track(ctx: Context) -> Result<Handled, Error> {
	let key = SessionKey::member(ctx.chat().clone(), ctx.author().clone());
	let Some(Interaction::Selection(selection)) = ctx
		.data
		.interactions
		.peek(&key)
		.map(|pending| pending.interaction)
	else {
		return Ok(Handled::Ignored);
	};
	let Some(number) = selection_number(&ctx.args) else {
		return Ok(Handled::Ignored);
	};
	if selection.candidate(number).is_none() {
		return match ctx.settings().interactions.out_of_range {
			OutOfRangePolicy::Ignore => Ok(Handled::Ignored),
			OutOfRangePolicy::Hint => {
				ctx.reply(format!(
					"_Pick a number between 1 and {}._",
					selection.candidates.len()
				))
				.await?;
				Ok(Handled::Consumed)
			}
		};
	}

	// Another message may have claimed it since the peek
	let Some(Interaction::Selection(selection)) = ctx
		.data
		.interactions
		.resolve(&key)
		.map(|pending| pending.interaction)
	else {
		return Ok(Handled::Ignored);
	};
	let Some(track) = selection.candidate(number) else {
		return Ok(Handled::Ignored);
	};
	ctx.edit(
		&selection.message,
		&format!("⬇️ Downloading *{}*...", track.title),
	)
	.await?;
	download_into(&ctx, &selection.message, &track.id).await?;
	Ok(Handled::Consumed)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn durations_render_as_minutes_and_seconds() {
		assert_eq!(format_duration(215_000), "3:35");
		assert_eq!(format_duration(59_999), "0:59");
	}

	#[test]
	fn list_numbers_every_candidate_and_states_the_range() {
		let candidates = vec![
			Candidate {
				id: "a".to_owned(),
				title: "Sura Yako".to_owned(),
				detail: "by Sauti Sol • 3:35".to_owned(),
			},
			Candidate {
				id: "b".to_owned(),
				title: "Melanin".to_owned(),
				detail: "by Sauti Sol • 3:10".to_owned(),
			},
		];
		let list = candidate_list("sauti sol", &candidates);
		assert!(list.contains("*1. Sura Yako*"));
		assert!(list.contains("*2. Melanin*"));
		assert!(list.contains("(1-2)"));
	}
}
