use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, QuestionId};
use crate::model::score::Score;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("title cannot be empty")]
    EmptyTitle,

    #[error("question {question} has an empty prompt")]
    EmptyPrompt { question: QuestionId },

    #[error("question {question} needs at least 2 options, got {count}")]
    TooFewOptions { question: QuestionId, count: usize },

    #[error("question {question} has an empty option")]
    EmptyOption { question: QuestionId },

    #[error("question {question} marks option {index} correct but has {options} options")]
    CorrectOptionOutOfRange {
        question: QuestionId,
        index: usize,
        options: usize,
    },

    #[error("duplicate question id {0}")]
    DuplicateQuestion(QuestionId),

    #[error("quiz must contain at least one question")]
    NoQuestions,

    #[error("passing score must be between 0 and 100, got {0}")]
    InvalidPassingScore(u32),

    #[error("course {0} has no lessons")]
    NoLessons(CourseId),

    #[error("duplicate lesson id {lesson} in course {course}")]
    DuplicateLesson { course: CourseId, lesson: LessonId },

    #[error("duplicate course id {0}")]
    DuplicateCourse(CourseId),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with exactly one correct option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct_option: usize,
}

impl Question {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the prompt or an option is blank, fewer than two
    /// options are given, or `correct_option` does not index into `options`.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
    ) -> Result<Self, CourseError> {
        let prompt = prompt.into().trim().to_owned();
        if prompt.is_empty() {
            return Err(CourseError::EmptyPrompt { question: id });
        }
        if options.len() < 2 {
            return Err(CourseError::TooFewOptions {
                question: id,
                count: options.len(),
            });
        }
        if options.iter().any(|o| o.trim().is_empty()) {
            return Err(CourseError::EmptyOption { question: id });
        }
        if correct_option >= options.len() {
            return Err(CourseError::CorrectOptionOutOfRange {
                question: id,
                index: correct_option,
                options: options.len(),
            });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct_option,
        })
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Ordered questions plus the score needed to pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    passing_score: Score,
    questions: Vec<Question>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `CourseError::NoQuestions` for an empty quiz and
    /// `CourseError::DuplicateQuestion` if two questions share an id.
    pub fn new(passing_score: Score, questions: Vec<Question>) -> Result<Self, CourseError> {
        if questions.is_empty() {
            return Err(CourseError::NoQuestions);
        }
        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id()) {
                return Err(CourseError::DuplicateQuestion(q.id().clone()));
            }
        }
        Ok(Self {
            passing_score,
            questions,
        })
    }

    #[must_use]
    pub fn passing_score(&self) -> Score {
        self.passing_score
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a validated quiz.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn last_index(&self) -> usize {
        self.questions.len().saturating_sub(1)
    }

    /// Ties go to pass.
    #[must_use]
    pub fn is_passing(&self, score: Score) -> bool {
        score >= self.passing_score
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    content: String,
    audio_ref: Option<String>,
    quiz: Quiz,
}

impl Lesson {
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is blank.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        content: impl Into<String>,
        audio_ref: Option<String>,
        quiz: Quiz,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        let audio_ref = audio_ref
            .map(|a| a.trim().to_owned())
            .filter(|a| !a.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            content: content.into(),
            audio_ref,
            quiz,
        })
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn audio_ref(&self) -> Option<&str> {
        self.audio_ref.as_deref()
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// An ordered chain of lessons. Lesson order is the prerequisite order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: String,
    lessons: Vec<Lesson>,
}

impl Course {
    /// # Errors
    ///
    /// Returns `CourseError` if the title is blank, there are no lessons,
    /// or two lessons share an id.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: impl Into<String>,
        lessons: Vec<Lesson>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        if lessons.is_empty() {
            return Err(CourseError::NoLessons(id));
        }
        let mut seen = HashSet::new();
        for lesson in &lessons {
            if !seen.insert(lesson.id()) {
                return Err(CourseError::DuplicateLesson {
                    course: id,
                    lesson: lesson.id().clone(),
                });
            }
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description: description.into().trim().to_owned(),
            lessons,
        })
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn lesson(&self, index: usize) -> Option<&Lesson> {
        self.lessons.get(index)
    }

    #[must_use]
    pub fn lesson_index(&self, id: &LessonId) -> Option<usize> {
        self.lessons.iter().position(|l| l.id() == id)
    }

    pub fn lesson_ids(&self) -> impl Iterator<Item = &LessonId> {
        self.lessons.iter().map(Lesson::id)
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.lessons.len()
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// The read-only list of courses shared by every user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    courses: Vec<Course>,
}

impl Catalog {
    /// # Errors
    ///
    /// Returns `CourseError::DuplicateCourse` if two courses share an id.
    pub fn new(courses: Vec<Course>) -> Result<Self, CourseError> {
        let mut seen = HashSet::new();
        for course in &courses {
            if !seen.insert(course.id()) {
                return Err(CourseError::DuplicateCourse(course.id().clone()));
            }
        }
        Ok(Self { courses })
    }

    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    #[must_use]
    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.iter().find(|c| c.id() == id)
    }
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//
// Deserialized catalog shapes. `validate` turns them into the domain types.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
}

impl QuestionDraft {
    /// # Errors
    ///
    /// See [`Question::new`].
    pub fn validate(self) -> Result<Question, CourseError> {
        Question::new(self.id, self.prompt, self.options, self.correct_option_index)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub passing_score: u32,
    pub questions: Vec<QuestionDraft>,
}

impl QuizDraft {
    /// # Errors
    ///
    /// Returns `CourseError::InvalidPassingScore` above 100, or any question error.
    pub fn validate(self) -> Result<Quiz, CourseError> {
        let passing_score = Score::new(self.passing_score)
            .map_err(|_| CourseError::InvalidPassingScore(self.passing_score))?;
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Quiz::new(passing_score, questions)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub id: LessonId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub audio_ref: Option<String>,
    pub quiz: QuizDraft,
}

impl LessonDraft {
    /// # Errors
    ///
    /// Returns the first validation failure of the lesson or its quiz.
    pub fn validate(self) -> Result<Lesson, CourseError> {
        let quiz = self.quiz.validate()?;
        Lesson::new(self.id, self.title, self.content, self.audio_ref, quiz)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub id: CourseId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Older catalogs name this collection `modules`.
    #[serde(alias = "modules")]
    pub lessons: Vec<LessonDraft>,
}

impl CourseDraft {
    /// # Errors
    ///
    /// Returns the first validation failure of the course or its lessons.
    pub fn validate(self) -> Result<Course, CourseError> {
        let lessons = self
            .lessons
            .into_iter()
            .map(LessonDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Course::new(self.id, self.title, self.description, lessons)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDraft {
    pub courses: Vec<CourseDraft>,
}

impl CatalogDraft {
    /// # Errors
    ///
    /// Returns the first validation failure found in any course.
    pub fn validate(self) -> Result<Catalog, CourseError> {
        let courses = self
            .courses
            .into_iter()
            .map(CourseDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        Catalog::new(courses)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
