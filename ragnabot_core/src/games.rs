pub mod drafts;
pub mod quiz;
pub mod tictactoe;

use core::str::FromStr;

use thiserror::Error;

/// Why a move was refused; the game state is left untouched in every case
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
	#[error("you are not playing in this game")]
	NotAParticipant,
	#[error("it is not your turn")]
	NotYourTurn,
	#[error("the game is already over")]
	Finished,
	#[error("that square is outside the board")]
	OutOfRange,
	#[error("that square is already taken")]
	Occupied,
	#[error("that is not one of your pieces")]
	NotYourPiece,
	#[error("that piece has no legal moves")]
	NoLegalMoves,
	#[error("select a piece first with .move RC")]
	NothingSelected,
	#[error("that destination is not in the list")]
	InvalidDestination,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Difficulty {
	Easy,
	#[default]
	Medium,
	Hard,
}

impl FromStr for Difficulty {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"easy" => Ok(Self::Easy),
			"medium" | "normal" => Ok(Self::Medium),
			"hard" => Ok(Self::Hard),
			_ => Err(()),
		}
	}
}

impl Difficulty {
	#[must_use]
	pub const fn name(self) -> &'static str {
		match self {
			Self::Easy => "easy",
			Self::Medium => "medium",
			Self::Hard => "hard",
		}
	}
}
