use std::{
	cmp::{Ordering, Reverse},
	collections::HashMap,
};

use ragnabot_core::{
	config::types::{Context, Error},
	handlers::{Category, Command},
	utils::upstream::{UpstreamError, get_json},
};
use serde::Deserialize;

use crate::{upstream_failed, usage};

const SERVICE: &str = "Football feed";
const FIXTURE_LIMIT: usize = 10;

#[derive(Deserialize)]
struct Season {
	#[serde(default)]
	name: String,
	matches: Vec<Fixture>,
}

#[derive(Deserialize)]
struct Fixture {
	#[serde(default)]
	round: String,
	#[serde(default)]
	date: String,
	#[serde(default)]
	time: Option<String>,
	team1: String,
	team2: String,
	#[serde(default)]
	score: Option<Score>,
}

#[derive(Deserialize)]
struct Score {
	/// Full-time goals, home first
	#[serde(default)]
	ft: Option<[u8; 2]>,
}

impl Fixture {
	fn full_time(&self) -> Option<[u8; 2]> {
		self.score.as_ref().and_then(|score| score.ft)
	}
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Standing<'a> {
	team: &'a str,
	played: u32,
	won: u32,
	drawn: u32,
	lost: u32,
	goals_for: u32,
	goals_against: u32,
}

impl Standing<'_> {
	const fn points(&self) -> u32 {
		self.won.saturating_mul(3).saturating_add(self.drawn)
	}

	fn goal_difference(&self) -> i64 {
		i64::from(self.goals_for).saturating_sub(i64::from(self.goals_against))
	}

	fn record(&mut self, scored: u8, conceded: u8) {
		self.played = self.played.saturating_add(1);
		self.goals_for = self.goals_for.saturating_add(u32::from(scored));
		self.goals_against = self.goals_against.saturating_add(u32::from(conceded));
		match scored.cmp(&conceded) {
			Ordering::Greater => self.won = self.won.saturating_add(1),
			Ordering::Equal => self.drawn = self.drawn.saturating_add(1),
			Ordering::Less => self.lost = self.lost.saturating_add(1),
		}
	}
}

/// League order: points, goal difference, goals scored, then name
fn standings(matches: &[Fixture]) -> Vec<Standing<'_>> {
	let mut table: HashMap<&str, Standing<'_>> = HashMap::new();
	for fixture in matches {
		let Some([home, away]) = fixture.full_time() else {
			continue;
		};
		table
			.entry(fixture.team1.as_str())
			.or_insert_with(|| Standing {
				team: &fixture.team1,
				..Standing::default()
			})
			.record(home, away);
		table
			.entry(fixture.team2.as_str())
			.or_insert_with(|| Standing {
				team: &fixture.team2,
				..Standing::default()
			})
			.record(away, home);
	}
	let mut rows: Vec<Standing<'_>> = table.into_values().collect();
	rows.sort_by_key(|row| {
		(
			Reverse(row.points()),
			Reverse(row.goal_difference()),
			Reverse(row.goals_for),
			row.team,
		)
	});
	rows
}

fn render_table(season: &Season) -> Result<String, UpstreamError> {
	let rows = standings(&season.matches);
	if rows.is_empty() {
		return Err(UpstreamError::Empty);
	}
	let lines: Vec<String> = rows
		.iter()
		.enumerate()
		.map(|(index, row)| {
			format!(
				"{}. {} - *{} pts* (P{} W{} D{} L{}, GD {:+})",
				index.saturating_add(1),
				row.team,
				row.points(),
				row.played,
				row.won,
				row.drawn,
				row.lost,
				row.goal_difference()
			)
		})
		.collect();
	Ok(format!(
		"🏆 *English Premier League Table*\n_{}_\n\n{}",
		season.name,
		lines.join("\n")
	))
}

fn render_fixtures(season: &Season) -> Result<String, UpstreamError> {
	let mut upcoming: Vec<&Fixture> = season
		.matches
		.iter()
		.filter(|fixture| fixture.full_time().is_none())
		.collect();
	if upcoming.is_empty() {
		return Err(UpstreamError::Empty);
	}
	upcoming.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));
	let lines: Vec<String> = upcoming
		.iter()
		.take(FIXTURE_LIMIT)
		.map(|fixture| {
			format!(
				"*{} vs {}*\n{} {} • {}",
				fixture.team1,
				fixture.team2,
				fixture.date,
				fixture.time.as_deref().unwrap_or("TBC"),
				fixture.round
			)
		})
		.collect();
	Ok(format!("📅 *Upcoming EPL Fixtures*\n\n{}", lines.join("\n\n")))
}

#[must_use]
pub fn epl() -> Command {
	Command::new("epl", |ctx| Box::pin(premier_league(ctx)))
		.description("Premier League table or upcoming fixtures")
		.usage(".epl table | .epl fixtures")
		.category(Category::Sports)
}

async fn premier_league(ctx: Context) -> Result<(), Error> {
	let render: fn(&Season) -> Result<String, UpstreamError> =
		match ctx.args.trim().to_lowercase().as_str() {
			"" | "table" | "standings" => render_table,
			"fixture" | "fixtures" => render_fixtures,
			_ => return usage(&ctx).await,
		};
	let result = get_json::<Season>(&ctx.settings().api.football, &[])
		.await
		.and_then(|season| render(&season));
	match result {
		Ok(text) => {
			ctx.reply(text).await?;
		}
		Err(err) => upstream_failed(&ctx, SERVICE, &err).await?,
	}
	Ok(())
}
