use std::sync::Arc;

use lms_core::model::{Catalog, Course, CourseId, Lesson, Progress, ProgressChange, UserId};
use lms_core::quiz::{GradedQuiz, QuizState};
use lms_core::unlock;
use storage::progress_store::ProgressStore;
use tracing::info;

use crate::error::QuizServiceError;

/// Result of finishing a graded quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishOutcome {
    pub graded: GradedQuiz,
    pub passed: bool,
    pub progress: Progress,
    pub change: ProgressChange,
    /// Lesson to move to automatically: set only on a pass with a lesson after this one.
    pub next_lesson: Option<usize>,
}

/// Gates lesson access and writes quiz results back to progress.
#[derive(Clone)]
pub struct QuizService {
    catalog: Arc<Catalog>,
    progress: ProgressStore,
}

impl QuizService {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, progress: ProgressStore) -> Self {
        Self { catalog, progress }
    }

    fn lookup(
        &self,
        course_id: &CourseId,
        index: usize,
    ) -> Result<(&Course, &Lesson), QuizServiceError> {
        let course = self
            .catalog
            .course(course_id)
            .ok_or_else(|| QuizServiceError::UnknownCourse(course_id.clone()))?;
        let lesson = course
            .lesson(index)
            .ok_or_else(|| QuizServiceError::UnknownLesson {
                course: course_id.clone(),
                index,
            })?;
        Ok((course, lesson))
    }

    /// Catalog lookup without the unlock check.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::UnknownCourse` or `QuizServiceError::UnknownLesson`.
    pub fn lesson(&self, course_id: &CourseId, index: usize) -> Result<&Lesson, QuizServiceError> {
        self.lookup(course_id, index).map(|(_, lesson)| lesson)
    }

    async fn open(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        index: usize,
    ) -> Result<(&Course, &Lesson, Progress), QuizServiceError> {
        let (course, lesson) = self.lookup(course_id, index)?;
        let progress = self.progress.load_or_initialize(user_id, course).await?;
        if !unlock::is_unlocked(course, &progress, index) {
            return Err(QuizServiceError::LessonLocked {
                course: course_id.clone(),
                index,
            });
        }
        Ok((course, lesson, progress))
    }

    /// Resolve a lesson the user is allowed to open, with their current progress.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::LessonLocked` if the previous lesson is not
    /// completed, or a lookup/storage error.
    pub async fn open_lesson(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        index: usize,
    ) -> Result<(&Lesson, Progress), QuizServiceError> {
        let (_, lesson, progress) = self.open(user_id, course_id, index).await?;
        Ok((lesson, progress))
    }

    /// Begin an attempt at the lesson's quiz.
    ///
    /// # Errors
    ///
    /// As [`QuizService::open_lesson`].
    pub async fn start(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        index: usize,
    ) -> Result<QuizState, QuizServiceError> {
        self.open(user_id, course_id, index).await?;
        Ok(QuizState::start())
    }

    /// Record a graded attempt and report whether to auto-advance.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` if `state` is not graded, plus the
    /// errors of [`QuizService::open_lesson`].
    pub async fn finish(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        index: usize,
        state: &QuizState,
    ) -> Result<FinishOutcome, QuizServiceError> {
        let graded = state.graded()?;
        let (course, lesson, _) = self.open(user_id, course_id, index).await?;

        let passed = graded.passed(lesson.quiz());
        let recorded = self
            .progress
            .record_quiz_result(user_id, course, lesson.id(), graded.score(), passed)
            .await?;

        info!(
            %user_id,
            %course_id,
            lesson_id = %lesson.id(),
            score = graded.score().value(),
            passed,
            "recorded quiz result"
        );
        if recorded.change.certificate_issued {
            info!(%user_id, %course_id, "certificate issued");
        }

        let next_lesson = if passed {
            unlock::next_lesson_index(course, index)
        } else {
            None
        };

        Ok(FinishOutcome {
            graded,
            passed,
            progress: recorded.progress,
            change: recorded.change,
            next_lesson,
        })
    }
}
