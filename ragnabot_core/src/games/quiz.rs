use fastrand::Rng;

use crate::config::constants::QUIZ_LETTERS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
	pub category: String,
	pub question: String,
	pub options: Vec<String>,
	pub correct: usize,
}

impl QuizQuestion {
	/// Shuffles the correct answer in among the wrong ones and remembers where it landed
	#[must_use]
	pub fn shuffled(
		category: String,
		question: String,
		correct_answer: String,
		incorrect: Vec<String>,
		rng: &mut Rng,
	) -> Self {
		let mut options = incorrect;
		options.push(correct_answer.clone());
		rng.shuffle(&mut options);
		let correct = options
			.iter()
			.position(|option| *option == correct_answer)
			.unwrap_or_default();
		Self {
			category,
			question,
			options,
			correct,
		}
	}
}

/// What a pending quiz keeps: the index of the right option for each question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizKey {
	pub answers: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizScore {
	pub correct: usize,
	pub total: usize,
	/// Per question: submitted letter, expected letter
	pub marks: Vec<(char, char)>,
}

#[must_use]
pub fn letter(index: usize) -> char {
	QUIZ_LETTERS.get(index).copied().unwrap_or('?')
}

impl QuizKey {
	#[must_use]
	pub fn from_questions(questions: &[QuizQuestion]) -> Self {
		Self {
			answers: questions.iter().map(|question| question.correct).collect(),
		}
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.answers.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.answers.is_empty()
	}

	/// Compares submitted letters with the stored indices, as letters
	#[must_use]
	pub fn grade(&self, submitted: &[char]) -> QuizScore {
		let marks: Vec<(char, char)> = self
			.answers
			.iter()
			.zip(submitted)
			.map(|(&index, &given)| (given.to_ascii_uppercase(), letter(index)))
			.collect();
		QuizScore {
			correct: marks.iter().filter(|(given, expected)| given == expected).count(),
			total: self.answers.len(),
			marks,
		}
	}
}
