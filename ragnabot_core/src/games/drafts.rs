use fastrand::Rng;

use crate::{
	config::constants::{
		DRAFTS_DARK_KING, DRAFTS_DARK_MAN, DRAFTS_DARK_SQUARE, DRAFTS_LIGHT_KING,
		DRAFTS_LIGHT_MAN, DRAFTS_LIGHT_SQUARE,
	},
	games::{Difficulty, MoveError},
	host::UserId,
};

pub const SIZE: usize = 8;
const DIRECTIONS: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
	/// ⚫, starts on the bottom three rows and moves up
	Dark,
	/// ⚪, starts on the top three rows and moves down
	Light,
}

impl Side {
	#[must_use]
	pub const fn opponent(self) -> Self {
		match self {
			Self::Dark => Self::Light,
			Self::Light => Self::Dark,
		}
	}

	const fn forward(self) -> isize {
		match self {
			Self::Dark => -1,
			Self::Light => 1,
		}
	}

	const fn promotion_row(self) -> usize {
		match self {
			Self::Dark => 0,
			Self::Light => SIZE - 1,
		}
	}

	#[must_use]
	pub const fn emoji(self) -> &'static str {
		match self {
			Self::Dark => DRAFTS_DARK_MAN,
			Self::Light => DRAFTS_LIGHT_MAN,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
	pub side: Side,
	pub king: bool,
}

impl Piece {
	#[must_use]
	pub const fn man(side: Side) -> Self {
		Self { side, king: false }
	}

	const fn emoji(self) -> &'static str {
		match (self.side, self.king) {
			(Side::Dark, false) => DRAFTS_DARK_MAN,
			(Side::Dark, true) => DRAFTS_DARK_KING,
			(Side::Light, false) => DRAFTS_LIGHT_MAN,
			(Side::Light, true) => DRAFTS_LIGHT_KING,
		}
	}
}

/// Zero-based board coordinate; users type it one-based as two digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
	pub row: usize,
	pub col: usize,
}

impl Pos {
	#[must_use]
	pub const fn new(row: usize, col: usize) -> Self {
		Self { row, col }
	}

	/// Builds a position from one-based user input
	#[must_use]
	pub fn from_user(row: u8, col: u8) -> Option<Self> {
		let row = usize::from(row).checked_sub(1)?;
		let col = usize::from(col).checked_sub(1)?;
		(row < SIZE && col < SIZE).then_some(Self { row, col })
	}

	fn offset(self, step: (isize, isize), times: isize) -> Option<Self> {
		let row = self.row.checked_add_signed(step.0.checked_mul(times)?)?;
		let col = self.col.checked_add_signed(step.1.checked_mul(times)?)?;
		(row < SIZE && col < SIZE).then_some(Self { row, col })
	}

	#[must_use]
	pub fn label(self) -> String {
		format!("{}{}", self.row.saturating_add(1), self.col.saturating_add(1))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
	pub from: Pos,
	pub to: Pos,
	pub captured: Option<Pos>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
	cells: [[Option<Piece>; SIZE]; SIZE],
}

impl Default for Board {
	fn default() -> Self {
		Self::initial()
	}
}

impl Board {
	#[must_use]
	pub const fn empty() -> Self {
		Self {
			cells: [[None; SIZE]; SIZE],
		}
	}

	#[must_use]
	pub fn initial() -> Self {
		let mut board = Self::empty();
		for (row, cells) in board.cells.iter_mut().enumerate() {
			let side = match row {
				0..=2 => Side::Light,
				5..=7 => Side::Dark,
				_ => continue,
			};
			for (col, cell) in cells.iter_mut().enumerate() {
				if is_dark_square(row, col) {
					*cell = Some(Piece::man(side));
				}
			}
		}
		board
	}

	#[must_use]
	pub fn get(&self, pos: Pos) -> Option<Piece> {
		self.cells
			.get(pos.row)
			.and_then(|row| row.get(pos.col))
			.copied()
			.flatten()
	}

	pub fn set(&mut self, pos: Pos, piece: Option<Piece>) {
		if let Some(cell) = self
			.cells
			.get_mut(pos.row)
			.and_then(|row| row.get_mut(pos.col))
		{
			*cell = piece;
		}
	}

	fn positions(&self, side: Side) -> impl Iterator<Item = Pos> + '_ {
		(0..SIZE)
			.flat_map(|row| (0..SIZE).map(move |col| Pos::new(row, col)))
			.filter(move |&pos| self.get(pos).is_some_and(|piece| piece.side == side))
	}

	#[must_use]
	pub fn count(&self, side: Side) -> usize {
		self.positions(side).count()
	}

	fn directions(piece: Piece) -> impl Iterator<Item = (isize, isize)> {
		DIRECTIONS
			.into_iter()
			.filter(move |&(row, _)| piece.king || row == piece.side.forward())
	}

	#[must_use]
	pub fn captures_from(&self, from: Pos) -> Vec<Move> {
		let Some(piece) = self.get(from) else {
			return Vec::new();
		};
		Self::directions(piece)
			.filter_map(|step| {
				let over = from.offset(step, 1)?;
				let to = from.offset(step, 2)?;
				let jumped = self.get(over)?;
				(jumped.side != piece.side && self.get(to).is_none()).then_some(Move {
					from,
					to,
					captured: Some(over),
				})
			})
			.collect()
	}

	fn steps_from(&self, from: Pos) -> Vec<Move> {
		let Some(piece) = self.get(from) else {
			return Vec::new();
		};
		Self::directions(piece)
			.filter_map(|step| {
				let to = from.offset(step, 1)?;
				self.get(to).is_none().then_some(Move {
					from,
					to,
					captured: None,
				})
			})
			.collect()
	}

	/// Legal moves for `side`; captures are mandatory and a jumping piece must keep jumping
	#[must_use]
	pub fn legal_moves(&self, side: Side, chain: Option<Pos>) -> Vec<Move> {
		if let Some(from) = chain {
			return self.captures_from(from);
		}
		let captures: Vec<Move> = self
			.positions(side)
			.flat_map(|pos| self.captures_from(pos))
			.collect();
		if captures.is_empty() {
			self.positions(side)
				.flat_map(|pos| self.steps_from(pos))
				.collect()
		} else {
			captures
		}
	}

	/// Applies `mv` and reports whether the piece was crowned
	pub fn apply(&mut self, mv: Move) -> bool {
		let Some(mut piece) = self.get(mv.from) else {
			return false;
		};
		self.set(mv.from, None);
		if let Some(captured) = mv.captured {
			self.set(captured, None);
		}
		let crowned = !piece.king && mv.to.row == piece.side.promotion_row();
		piece.king |= crowned;
		self.set(mv.to, Some(piece));
		crowned
	}

	#[must_use]
	pub fn render(&self) -> String {
		let mut out = String::from("⬛1️⃣2️⃣3️⃣4️⃣5️⃣6️⃣7️⃣8️⃣\n");
		let labels = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣"];
		for (row, (cells, label)) in self.cells.iter().zip(labels).enumerate() {
			out.push_str(label);
			for (col, cell) in cells.iter().enumerate() {
				out.push_str(cell.map_or_else(
					|| {
						if is_dark_square(row, col) {
							DRAFTS_DARK_SQUARE
						} else {
							DRAFTS_LIGHT_SQUARE
						}
					},
					Piece::emoji,
				));
			}
			out.push('\n');
		}
		out
	}
}

const fn is_dark_square(row: usize, col: usize) -> bool {
	(row + col) % 2 == 1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftsOpponent {
	Player(UserId),
	Bot(Difficulty),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftsOutcome {
	Continue,
	/// The moving piece captured and must jump again from this square
	JumpAgain(Pos),
	Won(Side),
}

#[derive(Debug, Clone)]
pub struct Drafts {
	pub board: Board,
	/// Plays dark and moves first
	pub challenger: UserId,
	pub opponent: DraftsOpponent,
	pub turn: Side,
	pub selected: Option<Pos>,
	pub options: Vec<Move>,
	pub chain: Option<Pos>,
	pub winner: Option<Side>,
}

impl Drafts {
	#[must_use]
	pub fn new(challenger: UserId, opponent: DraftsOpponent) -> Self {
		Self {
			board: Board::initial(),
			challenger,
			opponent,
			turn: Side::Dark,
			selected: None,
			options: Vec::new(),
			chain: None,
			winner: None,
		}
	}

	#[must_use]
	pub fn side_of(&self, user: &UserId) -> Option<Side> {
		if *user == self.challenger {
			Some(Side::Dark)
		} else if matches!(&self.opponent, DraftsOpponent::Player(opponent) if opponent == user) {
			Some(Side::Light)
		} else {
			None
		}
	}

	#[must_use]
	pub const fn is_bot_turn(&self) -> bool {
		self.winner.is_none()
			&& matches!(self.turn, Side::Light)
			&& matches!(self.opponent, DraftsOpponent::Bot(_))
	}

	#[must_use]
	pub fn player_on_turn(&self) -> Option<&UserId> {
		match (self.turn, &self.opponent) {
			(Side::Dark, _) => Some(&self.challenger),
			(Side::Light, DraftsOpponent::Player(opponent)) => Some(opponent),
			(Side::Light, DraftsOpponent::Bot(_)) => None,
		}
	}

	fn check_turn(&self, sender: &UserId) -> Result<Side, MoveError> {
		if self.winner.is_some() {
			return Err(MoveError::Finished);
		}
		let side = self.side_of(sender).ok_or(MoveError::NotAParticipant)?;
		if side == self.turn {
			Ok(side)
		} else {
			Err(MoveError::NotYourTurn)
		}
	}

	/// First step of a move: pick the piece and list where it may go
	pub fn select(&mut self, sender: &UserId, pos: Pos) -> Result<&[Move], MoveError> {
		let side = self.check_turn(sender)?;
		match self.board.get(pos) {
			Some(piece) if piece.side == side => {}
			_ => return Err(MoveError::NotYourPiece),
		}
		let options: Vec<Move> = self
			.board
			.legal_moves(side, self.chain)
			.into_iter()
			.filter(|mv| mv.from == pos)
			.collect();
		if options.is_empty() {
			return Err(MoveError::NoLegalMoves);
		}
		self.selected = Some(pos);
		self.options = options;
		Ok(&self.options)
	}

	/// Second step of a move: `choice` is the one-based index into the listed destinations
	pub fn choose(&mut self, sender: &UserId, choice: usize) -> Result<(Move, DraftsOutcome), MoveError> {
		self.check_turn(sender)?;
		if self.selected.is_none() {
			return Err(MoveError::NothingSelected);
		}
		let mv = choice
			.checked_sub(1)
			.and_then(|index| self.options.get(index))
			.copied()
			.ok_or(MoveError::InvalidDestination)?;
		Ok((mv, self.apply(mv)))
	}

	/// Plays one bot move (one jump of a chain) if it is the bot's turn
	pub fn play_bot(&mut self, rng: &mut Rng) -> Option<(Move, DraftsOutcome)> {
		let DraftsOpponent::Bot(difficulty) = self.opponent else {
			return None;
		};
		if !self.is_bot_turn() {
			return None;
		}
		let moves = self.board.legal_moves(Side::Light, self.chain);
		let mv = match difficulty {
			Difficulty::Easy => moves.get(rng.usize(..moves.len().max(1))).copied(),
			Difficulty::Medium | Difficulty::Hard => self.preferred_move(&moves, rng),
		}?;
		Some((mv, self.apply(mv)))
	}

	fn preferred_move(&self, moves: &[Move], rng: &mut Rng) -> Option<Move> {
		let score = |mv: &Move| {
			let mut after = self.board.clone();
			let crowned = after.apply(*mv);
			let follow_up = mv.captured.is_some() && !after.captures_from(mv.to).is_empty();
			u8::from(follow_up) * 2 + u8::from(crowned)
		};
		let best = moves.iter().map(score).max()?;
		let candidates: Vec<Move> = moves.iter().filter(|mv| score(mv) == best).copied().collect();
		candidates.get(rng.usize(..candidates.len().max(1))).copied()
	}

	fn apply(&mut self, mv: Move) -> DraftsOutcome {
		let crowned = self.board.apply(mv);
		self.selected = None;
		self.options.clear();
		if mv.captured.is_some() && !crowned && !self.board.captures_from(mv.to).is_empty() {
			self.chain = Some(mv.to);
			return DraftsOutcome::JumpAgain(mv.to);
		}
		self.chain = None;
		let mover = self.turn;
		self.turn = mover.opponent();
		if self.board.count(self.turn) == 0 || self.board.legal_moves(self.turn, None).is_empty() {
			self.winner = Some(mover);
			return DraftsOutcome::Won(mover);
		}
		DraftsOutcome::Continue
	}

	#[must_use]
	pub fn render(&self) -> String {
		let mut out = self.board.render();
		if let Some(winner) = self.winner {
			out.push_str(&format!("\n🏆 {} wins!", winner.emoji()));
		} else {
			out.push_str(&format!(
				"\nTurn: {} ({} ⚫ / {} ⚪)",
				self.turn.emoji(),
				self.board.count(Side::Dark),
				self.board.count(Side::Light)
			));
		}
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn alice() -> UserId {
		UserId::new("alice@s.whatsapp.net")
	}

	fn bob() -> UserId {
		UserId::new("bob@s.whatsapp.net")
	}

	#[test]
	fn initial_board_has_twelve_men_each() {
		let board = Board::initial();
		assert_eq!(board.count(Side::Dark), 12);
		assert_eq!(board.count(Side::Light), 12);
		assert_eq!(board.get(Pos::new(5, 0)), Some(Piece::man(Side::Dark)));
		assert_eq!(board.get(Pos::new(5, 1)), None);
	}

	#[test]
	fn opening_moves_go_forward_only() {
		let board = Board::initial();
		let moves = board.legal_moves(Side::Dark, None);
		assert_eq!(moves.len(), 7);
		assert!(moves.iter().all(|mv| mv.to.row == 4 && mv.captured.is_none()));
	}

	#[test]
	fn user_coordinates_are_one_based() {
		assert_eq!(Pos::from_user(6, 3), Some(Pos::new(5, 2)));
		assert_eq!(Pos::from_user(0, 3), None);
		assert_eq!(Pos::from_user(9, 1), None);
	}

	#[test]
	fn captures_are_mandatory() {
		let mut board = Board::empty();
		board.set(Pos::new(5, 2), Some(Piece::man(Side::Dark)));
		board.set(Pos::new(6, 5), Some(Piece::man(Side::Dark)));
		board.set(Pos::new(4, 3), Some(Piece::man(Side::Light)));
		let moves = board.legal_moves(Side::Dark, None);
		assert_eq!(
			moves,
			vec![Move {
				from: Pos::new(5, 2),
				to: Pos::new(3, 4),
				captured: Some(Pos::new(4, 3)),
			}]
		);
	}

	#[test]
	fn reaching_the_far_row_crowns() {
		let mut board = Board::empty();
		board.set(Pos::new(1, 2), Some(Piece::man(Side::Dark)));
		let crowned = board.apply(Move {
			from: Pos::new(1, 2),
			to: Pos::new(0, 1),
			captured: None,
		});
		assert!(crowned);
		assert_eq!(
			board.get(Pos::new(0, 1)),
			Some(Piece {
				side: Side::Dark,
				king: true
			})
		);
	}

	#[test]
	fn two_step_move_with_turn_enforcement() {
		let mut game = Drafts::new(alice(), DraftsOpponent::Player(bob()));
		assert_eq!(
			game.select(&bob(), Pos::new(2, 1)).err(),
			Some(MoveError::NotYourTurn)
		);
		assert_eq!(
			game.select(&alice(), Pos::new(2, 1)).err(),
			Some(MoveError::NotYourPiece)
		);
		let options = game.select(&alice(), Pos::new(5, 2)).unwrap().to_vec();
		assert_eq!(options.len(), 2);
		assert_eq!(game.choose(&alice(), 3).err(), Some(MoveError::InvalidDestination));
		let (mv, outcome) = game.choose(&alice(), 1).unwrap();
		assert_eq!(outcome, DraftsOutcome::Continue);
		assert_eq!(game.board.get(mv.to), Some(Piece::man(Side::Dark)));
		assert_eq!(game.turn, Side::Light);
		assert_eq!(game.player_on_turn(), Some(&bob()));
	}

	#[test]
	fn capturing_last_piece_wins() {
		let mut game = Drafts::new(alice(), DraftsOpponent::Player(bob()));
		game.board = Board::empty();
		game.board.set(Pos::new(5, 2), Some(Piece::man(Side::Dark)));
		game.board.set(Pos::new(4, 3), Some(Piece::man(Side::Light)));
		game.select(&alice(), Pos::new(5, 2)).unwrap();
		let (_, outcome) = game.choose(&alice(), 1).unwrap();
		assert_eq!(outcome, DraftsOutcome::Won(Side::Dark));
		assert_eq!(game.select(&bob(), Pos::new(3, 4)).err(), Some(MoveError::Finished));
	}

	#[test]
	fn multi_jump_keeps_the_turn() {
		let mut game = Drafts::new(alice(), DraftsOpponent::Player(bob()));
		game.board = Board::empty();
		game.board.set(Pos::new(6, 1), Some(Piece::man(Side::Dark)));
		game.board.set(Pos::new(5, 2), Some(Piece::man(Side::Light)));
		game.board.set(Pos::new(3, 4), Some(Piece::man(Side::Light)));
		game.board.set(Pos::new(0, 7), Some(Piece::man(Side::Light)));
		game.select(&alice(), Pos::new(6, 1)).unwrap();
		let (_, outcome) = game.choose(&alice(), 1).unwrap();
		assert_eq!(outcome, DraftsOutcome::JumpAgain(Pos::new(4, 3)));
		assert_eq!(game.turn, Side::Dark);
		let options = game.select(&alice(), Pos::new(4, 3)).unwrap();
		assert_eq!(options.len(), 1);
		let (_, outcome) = game.choose(&alice(), 1).unwrap();
		assert_eq!(outcome, DraftsOutcome::Continue);
		assert_eq!(game.board.count(Side::Light), 1);
	}

	#[test]
	fn bot_prefers_captures() {
		let mut game = Drafts::new(alice(), DraftsOpponent::Bot(Difficulty::Hard));
		game.board = Board::empty();
		game.board.set(Pos::new(2, 1), Some(Piece::man(Side::Light)));
		game.board.set(Pos::new(2, 5), Some(Piece::man(Side::Light)));
		game.board.set(Pos::new(3, 2), Some(Piece::man(Side::Dark)));
		game.board.set(Pos::new(7, 0), Some(Piece::man(Side::Dark)));
		game.turn = Side::Light;
		let (mv, _) = game.play_bot(&mut Rng::with_seed(9)).unwrap();
		assert_eq!(mv.captured, Some(Pos::new(3, 2)));
		assert_eq!(game.turn, Side::Dark);
	}
}
