use fastrand::Rng;

use crate::{
	config::constants::{CELL_NUMBERS, EMOJI_O, EMOJI_X},
	games::{Difficulty, MoveError},
	host::UserId,
};

pub const EMPTY: u8 = 0;
pub const PLAYER_X: u8 = 1;
pub const PLAYER_O: u8 = 2;
const CENTER: usize = 4;
const CORNERS: [usize; 4] = [0, 2, 6, 8];
const WIN_LINES: [[usize; 3]; 8] = [
	[0, 1, 2],
	[3, 4, 5],
	[6, 7, 8],
	[0, 3, 6],
	[1, 4, 7],
	[2, 5, 8],
	[0, 4, 8],
	[2, 4, 6],
];

pub type Board = [u8; 9];

/// Marker holding a complete row, column or diagonal, or [`EMPTY`]
#[must_use]
pub fn check_win(board: &Board) -> u8 {
	WIN_LINES
		.iter()
		.find_map(|line| {
			let [a, b, c] = line.map(|cell| board.get(cell).copied().unwrap_or(EMPTY));
			(a != EMPTY && a == b && b == c).then_some(a)
		})
		.unwrap_or(EMPTY)
}

#[must_use]
pub fn check_draw(board: &Board) -> bool {
	board.iter().all(|&cell| cell != EMPTY) && check_win(board) == EMPTY
}

#[must_use]
pub const fn opponent_of(marker: u8) -> u8 {
	if marker == PLAYER_X { PLAYER_O } else { PLAYER_X }
}

fn empty_cells(board: &Board) -> Vec<usize> {
	board
		.iter()
		.enumerate()
		.filter_map(|(index, &cell)| (cell == EMPTY).then_some(index))
		.collect()
}

fn winning_cell(board: &Board, marker: u8) -> Option<usize> {
	empty_cells(board).into_iter().find(|&index| {
		let mut probe = *board;
		if let Some(cell) = probe.get_mut(index) {
			*cell = marker;
		}
		check_win(&probe) == marker
	})
}

fn random_of(cells: &[usize], rng: &mut Rng) -> Option<usize> {
	if cells.is_empty() {
		None
	} else {
		cells.get(rng.usize(..cells.len())).copied()
	}
}

/// One-ply heuristic: hard takes a win, then blocks, then center, then a corner;
/// medium only blocks; easy plays anywhere.
#[must_use]
pub fn find_best_move(
	board: &Board,
	difficulty: Difficulty,
	bot_marker: u8,
	rng: &mut Rng,
) -> Option<usize> {
	let free = empty_cells(board);
	if free.is_empty() {
		return None;
	}
	let opponent = opponent_of(bot_marker);
	match difficulty {
		Difficulty::Easy => random_of(&free, rng),
		Difficulty::Medium => winning_cell(board, opponent).or_else(|| random_of(&free, rng)),
		Difficulty::Hard => winning_cell(board, bot_marker)
			.or_else(|| winning_cell(board, opponent))
			.or_else(|| free.contains(&CENTER).then_some(CENTER))
			.or_else(|| {
				let corners: Vec<usize> = CORNERS
					.into_iter()
					.filter(|corner| free.contains(corner))
					.collect();
				random_of(&corners, rng)
			})
			.or_else(|| random_of(&free, rng)),
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opponent {
	Bot(Difficulty),
	Player(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
	Continue,
	Won(u8),
	Draw,
}

impl MoveOutcome {
	#[must_use]
	pub const fn is_finished(self) -> bool {
		!matches!(self, Self::Continue)
	}
}

#[derive(Debug, Clone)]
pub struct TicTacToe {
	pub board: Board,
	/// Always plays ❌ and moves first
	pub challenger: UserId,
	pub opponent: Opponent,
	pub turn: u8,
	pub outcome: Option<MoveOutcome>,
}

impl TicTacToe {
	#[must_use]
	pub const fn new(challenger: UserId, opponent: Opponent) -> Self {
		Self {
			board: [EMPTY; 9],
			challenger,
			opponent,
			turn: PLAYER_X,
			outcome: None,
		}
	}

	#[must_use]
	pub fn marker_of(&self, user: &UserId) -> Option<u8> {
		if *user == self.challenger {
			Some(PLAYER_X)
		} else if matches!(&self.opponent, Opponent::Player(opponent) if opponent == user) {
			Some(PLAYER_O)
		} else {
			None
		}
	}

	#[must_use]
	pub fn is_participant(&self, user: &UserId) -> bool {
		self.marker_of(user).is_some()
	}

	#[must_use]
	pub const fn is_bot_turn(&self) -> bool {
		self.outcome.is_none() && self.turn == PLAYER_O && matches!(self.opponent, Opponent::Bot(_))
	}

	/// Who has to move next, `None` while the bot is thinking or the game is over
	#[must_use]
	pub fn current_player(&self) -> Option<&UserId> {
		if self.outcome.is_some() {
			return None;
		}
		match (&self.opponent, self.turn) {
			(_, PLAYER_X) => Some(&self.challenger),
			(Opponent::Player(opponent), _) => Some(opponent),
			(Opponent::Bot(_), _) => None,
		}
	}

	/// Places the sender's marker on `cell` (0-based)
	pub fn play(&mut self, sender: &UserId, cell: usize) -> Result<MoveOutcome, MoveError> {
		if self.outcome.is_some() {
			return Err(MoveError::Finished);
		}
		let marker = self.marker_of(sender).ok_or(MoveError::NotAParticipant)?;
		if marker != self.turn {
			return Err(MoveError::NotYourTurn);
		}
		match self.board.get(cell) {
			None => Err(MoveError::OutOfRange),
			Some(&occupant) if occupant != EMPTY => Err(MoveError::Occupied),
			Some(_) => Ok(self.place(cell)),
		}
	}

	/// Lets the bot move if it is its turn, returning the chosen cell
	pub fn play_bot(&mut self, rng: &mut Rng) -> Option<(usize, MoveOutcome)> {
		let Opponent::Bot(difficulty) = self.opponent else {
			return None;
		};
		if !self.is_bot_turn() {
			return None;
		}
		let cell = find_best_move(&self.board, difficulty, PLAYER_O, rng)?;
		Some((cell, self.place(cell)))
	}

	fn place(&mut self, cell: usize) -> MoveOutcome {
		if let Some(slot) = self.board.get_mut(cell) {
			*slot = self.turn;
		}
		let winner = check_win(&self.board);
		let outcome = if winner != EMPTY {
			MoveOutcome::Won(winner)
		} else if check_draw(&self.board) {
			MoveOutcome::Draw
		} else {
			self.turn = opponent_of(self.turn);
			MoveOutcome::Continue
		};
		if outcome.is_finished() {
			self.outcome = Some(outcome);
		}
		outcome
	}

	#[must_use]
	pub fn render(&self) -> String {
		self.board
			.chunks(3)
			.enumerate()
			.map(|(row, cells)| {
				cells
					.iter()
					.enumerate()
					.map(|(col, &cell)| match cell {
						PLAYER_X => EMOJI_X,
						PLAYER_O => EMOJI_O,
						_ => CELL_NUMBERS
							.get(row.saturating_mul(3).saturating_add(col))
							.copied()
							.unwrap_or("▫️"),
					})
					.collect::<String>()
			})
			.collect::<Vec<_>>()
			.join("\n")
	}
}
