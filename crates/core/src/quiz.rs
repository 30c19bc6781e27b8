use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{Question, Quiz, Score};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Calls the quiz state machine refuses. A refused call leaves the state untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("option {option} is out of range for question {question} ({options} options)")]
    OptionOutOfRange {
        question: usize,
        option: usize,
        options: usize,
    },
    #[error("question {0} has not been answered")]
    Unanswered(usize),
    #[error("quiz has already been graded")]
    AlreadyGraded,
    #[error("quiz has not been graded yet")]
    NotGraded,
}

//
// ─── GRADING ───────────────────────────────────────────────────────────────────
//

/// Selected option per question index.
pub type Answers = BTreeMap<usize, usize>;

/// Terminal result of a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradedQuiz {
    score: Score,
    correct: usize,
    total: usize,
}

impl GradedQuiz {
    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// `score >= passing_score`.
    #[must_use]
    pub fn passed(&self, quiz: &Quiz) -> bool {
        quiz.is_passing(self.score)
    }
}

/// Grade answers against a quiz. Questions without an answer count as wrong.
///
/// Pure: the same answers and questions always produce the same result.
#[must_use]
pub fn grade(quiz: &Quiz, answers: &Answers) -> GradedQuiz {
    let total = quiz.len();
    let correct = quiz
        .questions()
        .iter()
        .enumerate()
        .filter(|(i, q)| answers.get(i).is_some_and(|a| q.is_correct(*a)))
        .count();

    GradedQuiz {
        score: Score::from_ratio(correct, total),
        correct,
        total,
    }
}

//
// ─── STATE MACHINE ─────────────────────────────────────────────────────────────
//

/// What `advance` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Moved to the question at this index.
    Question(usize),
    /// The last question was answered and the attempt is graded.
    Graded(GradedQuiz),
}

/// One attempt at a lesson quiz.
///
/// The state holds only indices and answers; every operation that needs the
/// questions takes the `Quiz` it belongs to.
///
/// # Examples
///
/// ```
/// # use lms_core::model::{Question, Quiz, Score};
/// # use lms_core::quiz::{QuizState, Step};
/// let question = Question::new("q1".parse()?, "2 + 2?", vec!["4".into(), "5".into()], 0)?;
/// let quiz = Quiz::new(Score::new(100)?, vec![question])?;
///
/// let mut state = QuizState::start();
/// state.select_answer(&quiz, 0)?;
/// let Step::Graded(result) = state.advance(&quiz)? else {
///     unreachable!("single question quiz grades on first advance");
/// };
/// assert_eq!(result.score().value(), 100);
/// assert!(result.passed(&quiz));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    InProgress {
        question_index: usize,
        answers: Answers,
    },
    Graded(GradedQuiz),
}

impl Default for QuizState {
    fn default() -> Self {
        Self::start()
    }
}

impl QuizState {
    /// First question, no answers.
    #[must_use]
    pub fn start() -> Self {
        Self::InProgress {
            question_index: 0,
            answers: Answers::new(),
        }
    }

    /// Discard answers and score and begin again from the first question.
    pub fn retry(&mut self) {
        *self = Self::start();
    }

    /// Select an option for the current question, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// `QuizError::OptionOutOfRange` if `option` does not index the current
    /// question's options, `QuizError::AlreadyGraded` after grading.
    pub fn select_answer(&mut self, quiz: &Quiz, option: usize) -> Result<(), QuizError> {
        let Self::InProgress {
            question_index,
            answers,
        } = self
        else {
            return Err(QuizError::AlreadyGraded);
        };

        let options = quiz.question(*question_index).map_or(0, |q| q.options().len());
        if option >= options {
            return Err(QuizError::OptionOutOfRange {
                question: *question_index,
                option,
                options,
            });
        }
        answers.insert(*question_index, option);
        Ok(())
    }

    /// Move past the current question, grading after the last one.
    ///
    /// # Errors
    ///
    /// `QuizError::Unanswered` if the current question has no answer,
    /// `QuizError::AlreadyGraded` after grading.
    pub fn advance(&mut self, quiz: &Quiz) -> Result<Step, QuizError> {
        let Self::InProgress {
            question_index,
            answers,
        } = self
        else {
            return Err(QuizError::AlreadyGraded);
        };

        if !answers.contains_key(question_index) {
            return Err(QuizError::Unanswered(*question_index));
        }

        if *question_index >= quiz.last_index() {
            let graded = grade(quiz, answers);
            *self = Self::Graded(graded);
            return Ok(Step::Graded(graded));
        }

        *question_index += 1;
        Ok(Step::Question(*question_index))
    }

    /// Step back one question; a no-op on the first question.
    ///
    /// Returns the question index after the move.
    ///
    /// # Errors
    ///
    /// `QuizError::AlreadyGraded` after grading.
    pub fn retreat(&mut self) -> Result<usize, QuizError> {
        match self {
            Self::InProgress { question_index, .. } => {
                *question_index = question_index.saturating_sub(1);
                Ok(*question_index)
            }
            Self::Graded(_) => Err(QuizError::AlreadyGraded),
        }
    }

    /// # Errors
    ///
    /// `QuizError::NotGraded` while the attempt is still in progress.
    pub fn graded(&self) -> Result<GradedQuiz, QuizError> {
        match self {
            Self::Graded(graded) => Ok(*graded),
            Self::InProgress { .. } => Err(QuizError::NotGraded),
        }
    }

    #[must_use]
    pub fn is_graded(&self) -> bool {
        matches!(self, Self::Graded(_))
    }

    #[must_use]
    pub fn question_index(&self) -> Option<usize> {
        match self {
            Self::InProgress { question_index, .. } => Some(*question_index),
            Self::Graded(_) => None,
        }
    }

    #[must_use]
    pub fn current_question<'q>(&self, quiz: &'q Quiz) -> Option<&'q Question> {
        self.question_index().and_then(|i| quiz.question(i))
    }

    /// The option chosen for the current question, if any.
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        match self {
            Self::InProgress {
                question_index,
                answers,
            } => answers.get(question_index).copied(),
            Self::Graded(_) => None,
        }
    }

    /// Whether forward navigation should be enabled.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.selected().is_some()
    }

    #[must_use]
    pub fn can_retreat(&self) -> bool {
        self.question_index().is_some_and(|i| i > 0)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    /// Three questions with correct answers at indices 0, 1, 2.
    fn quiz(passing: u32) -> Quiz {
        let questions = (0..3)
            .map(|i| {
                Question::new(
                    format!("q{i}").parse().unwrap(),
                    format!("Question {i}"),
                    vec!["a".into(), "b".into(), "c".into()],
                    i,
                )
                .unwrap()
            })
            .collect();
        Quiz::new(Score::new(passing).unwrap(), questions).unwrap()
    }

    fn answer_all(quiz: &Quiz, picks: &[usize]) -> GradedQuiz {
        let mut state = QuizState::start();
        for (i, pick) in picks.iter().enumerate() {
            state.select_answer(quiz, *pick).unwrap();
            let step = state.advance(quiz).unwrap();
            if i + 1 < picks.len() {
                assert_eq!(step, Step::Question(i + 1));
            }
        }
        state.graded().unwrap()
    }

    #[test]
    fn two_of_three_scores_67_and_fails_at_80() {
        let quiz = quiz(80);
        let graded = answer_all(&quiz, &[0, 1, 0]);
        assert_eq!(graded.score().value(), 67);
        assert_eq!(graded.correct(), 2);
        assert_eq!(graded.total(), 3);
        assert!(!graded.passed(&quiz));
    }

    #[test]
    fn all_correct_scores_100_and_passes() {
        let quiz = quiz(80);
        let graded = answer_all(&quiz, &[0, 1, 2]);
        assert_eq!(graded.score(), Score::PERFECT);
        assert!(graded.passed(&quiz));
    }

    #[test]
    fn pass_boundary_is_inclusive() {
        // 2 of 3 correct is 67
        let graded = answer_all(&quiz(67), &[0, 1, 0]);
        assert!(graded.passed(&quiz(67)));
        assert!(graded.passed(&quiz(66)));
        assert!(!graded.passed(&quiz(68)));
    }

    #[test]
    fn grading_is_deterministic() {
        let quiz = quiz(50);
        let answers = Answers::from([(0, 0), (1, 2), (2, 2)]);
        assert_eq!(grade(&quiz, &answers), grade(&quiz, &answers));
        assert_eq!(grade(&quiz, &answers).score().value(), 67);
    }

    #[test]
    fn unanswered_questions_count_as_wrong() {
        let quiz = quiz(50);
        let answers = Answers::from([(0, 0)]);
        assert_eq!(grade(&quiz, &answers).score().value(), 33);
    }

    #[test]
    fn advance_requires_an_answer() {
        let quiz = quiz(50);
        let mut state = QuizState::start();
        assert!(!state.can_advance());
        assert_eq!(state.advance(&quiz), Err(QuizError::Unanswered(0)));
        assert_eq!(state, QuizState::start());
    }

    #[test]
    fn out_of_range_option_is_rejected_without_mutation() {
        let quiz = quiz(50);
        let mut state = QuizState::start();
        state.select_answer(&quiz, 1).unwrap();
        let before = state.clone();
        let err = state.select_answer(&quiz, 3).unwrap_err();
        assert_eq!(
            err,
            QuizError::OptionOutOfRange {
                question: 0,
                option: 3,
                options: 3
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn reselecting_overwrites_previous_answer() {
        let quiz = quiz(50);
        let mut state = QuizState::start();
        state.select_answer(&quiz, 2).unwrap();
        state.select_answer(&quiz, 0).unwrap();
        assert_eq!(state.selected(), Some(0));
    }

    #[test]
    fn retreat_keeps_answers_and_stops_at_zero() {
        let quiz = quiz(50);
        let mut state = QuizState::start();
        assert_eq!(state.retreat(), Ok(0));
        assert!(!state.can_retreat());

        state.select_answer(&quiz, 0).unwrap();
        state.advance(&quiz).unwrap();
        assert!(state.can_retreat());
        assert_eq!(state.retreat(), Ok(0));
        assert_eq!(state.selected(), Some(0));
    }

    #[test]
    fn graded_state_refuses_navigation() {
        let quiz = quiz(50);
        let mut state = QuizState::start();
        for pick in [0, 1, 2] {
            state.select_answer(&quiz, pick).unwrap();
            state.advance(&quiz).unwrap();
        }
        assert!(state.is_graded());
        assert_eq!(state.select_answer(&quiz, 0), Err(QuizError::AlreadyGraded));
        assert_eq!(state.advance(&quiz), Err(QuizError::AlreadyGraded));
        assert_eq!(state.retreat(), Err(QuizError::AlreadyGraded));
        assert_eq!(state.current_question(&quiz), None);
    }

    #[test]
    fn retry_discards_everything() {
        let quiz = quiz(50);
        let mut state = QuizState::start();
        state.select_answer(&quiz, 0).unwrap();
        state.advance(&quiz).unwrap();
        state.retry();
        assert_eq!(state, QuizState::start());
        assert_eq!(state.graded(), Err(QuizError::NotGraded));
    }

    #[test]
    fn single_question_quiz_grades_on_first_advance() {
        let q = Question::new("only".parse().unwrap(), "?", vec!["x".into(), "y".into()], 1)
            .unwrap();
        let quiz = Quiz::new(Score::new(100).unwrap(), vec![q]).unwrap();
        let mut state = QuizState::start();
        state.select_answer(&quiz, 0).unwrap();
        let step = state.advance(&quiz).unwrap();
        assert!(matches!(step, Step::Graded(g) if g.score() == Score::ZERO));
    }
}
