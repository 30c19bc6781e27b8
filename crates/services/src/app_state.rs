use lms_core::model::{CourseId, Quiz, UserId};
use lms_core::quiz::{QuizError, QuizState, Step};
use tracing::debug;

use crate::error::{DispatchError, QuizServiceError};
use crate::progress_service::ProgressService;
use crate::quiz_service::QuizService;

/// Which screen is active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Catalog,
    Course(CourseId),
    Lesson {
        course: CourseId,
        index: usize,
    },
    Quiz {
        course: CourseId,
        index: usize,
    },
    Certificate(CourseId),
}

impl View {
    /// The course the screen belongs to, if any.
    #[must_use]
    pub fn course(&self) -> Option<&CourseId> {
        match self {
            Self::Catalog => None,
            Self::Course(course) | Self::Certificate(course) => Some(course),
            Self::Lesson { course, .. } | Self::Quiz { course, .. } => Some(course),
        }
    }
}

/// Navigation state for one signed-in user.
///
/// `quiz` is only ever `Some` while `view` is `View::Quiz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub user: UserId,
    pub view: View,
    pub quiz: Option<QuizState>,
}

impl AppState {
    #[must_use]
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            view: View::Catalog,
            quiz: None,
        }
    }

    fn show(&self, view: View) -> Self {
        Self {
            user: self.user.clone(),
            view,
            quiz: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    OpenCatalog,
    OpenCourse(CourseId),
    OpenLesson(usize),
    StartQuiz,
    SelectAnswer(usize),
    Advance,
    Retreat,
    Retry,
    Finish,
    SkipToEnd,
    OpenCertificate,
}

/// Applies intents to an `AppState`, consulting and updating stored progress.
#[derive(Clone)]
pub struct AppController {
    progress: ProgressService,
    quizzes: QuizService,
}

impl AppController {
    #[must_use]
    pub fn new(progress: ProgressService, quizzes: QuizService) -> Self {
        Self { progress, quizzes }
    }

    /// Compute the state that follows `intent`.
    ///
    /// A rejected intent leaves `state` untouched; the caller keeps showing it.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidIntent` when the intent does not apply to
    /// the current view, and the underlying service error otherwise (locked
    /// lesson, unanswered question, storage failure).
    pub async fn dispatch(
        &self,
        state: &AppState,
        intent: Intent,
    ) -> Result<AppState, DispatchError> {
        debug!(user_id = %state.user, ?intent, "dispatch");
        match intent {
            Intent::OpenCatalog => Ok(state.show(View::Catalog)),
            Intent::OpenCourse(course) => {
                self.progress.load(&state.user, &course).await?;
                Ok(state.show(View::Course(course)))
            }
            Intent::OpenLesson(index) => {
                let course = state.view.course().ok_or(DispatchError::InvalidIntent)?;
                self.quizzes.open_lesson(&state.user, course, index).await?;
                Ok(state.show(View::Lesson {
                    course: course.clone(),
                    index,
                }))
            }
            Intent::StartQuiz => {
                let View::Lesson { course, index } = &state.view else {
                    return Err(DispatchError::InvalidIntent);
                };
                let quiz = self.quizzes.start(&state.user, course, *index).await?;
                Ok(AppState {
                    user: state.user.clone(),
                    view: View::Quiz {
                        course: course.clone(),
                        index: *index,
                    },
                    quiz: Some(quiz),
                })
            }
            Intent::SelectAnswer(option) => self.on_quiz(state, |quiz, attempt| {
                attempt.select_answer(quiz, option)
            }),
            Intent::Advance => self.on_quiz(state, |quiz, attempt| {
                attempt.advance(quiz).map(|step| {
                    if let Step::Graded(graded) = step {
                        debug!(score = graded.score().value(), "quiz graded");
                    }
                })
            }),
            Intent::Retreat => self.on_quiz(state, |_, attempt| attempt.retreat().map(drop)),
            Intent::Retry => self.on_quiz(state, |_, attempt| {
                attempt.retry();
                Ok(())
            }),
            Intent::Finish => self.finish(state).await,
            Intent::SkipToEnd => {
                let course = state.view.course().ok_or(DispatchError::InvalidIntent)?;
                self.progress.skip_to_end(&state.user, course).await?;
                Ok(state.show(View::Certificate(course.clone())))
            }
            Intent::OpenCertificate => {
                let course = state.view.course().ok_or(DispatchError::InvalidIntent)?;
                let progress = self.progress.load(&state.user, course).await?;
                if !progress.certificate_issued() {
                    return Err(DispatchError::CertificateNotIssued(course.clone()));
                }
                Ok(state.show(View::Certificate(course.clone())))
            }
        }
    }

    fn on_quiz<F>(&self, state: &AppState, apply: F) -> Result<AppState, DispatchError>
    where
        F: FnOnce(&Quiz, &mut QuizState) -> Result<(), QuizError>,
    {
        let (View::Quiz { course, index }, Some(attempt)) = (&state.view, &state.quiz) else {
            return Err(DispatchError::InvalidIntent);
        };
        let lesson = self.quizzes.lesson(course, *index)?;
        let mut attempt = attempt.clone();
        apply(lesson.quiz(), &mut attempt).map_err(QuizServiceError::from)?;
        Ok(AppState {
            quiz: Some(attempt),
            ..state.clone()
        })
    }

    async fn finish(&self, state: &AppState) -> Result<AppState, DispatchError> {
        let (View::Quiz { course, index }, Some(attempt)) = (&state.view, &state.quiz) else {
            return Err(DispatchError::InvalidIntent);
        };
        let outcome = self
            .quizzes
            .finish(&state.user, course, *index, attempt)
            .await?;

        if let Some(next) = outcome.next_lesson {
            return Ok(state.show(View::Lesson {
                course: course.clone(),
                index: next,
            }));
        }
        if outcome.passed && outcome.progress.certificate_issued() {
            return Ok(state.show(View::Certificate(course.clone())));
        }
        Ok(state.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::bundled_catalog;
    use storage::repository::Storage;

    fn controller() -> AppController {
        let storage = Storage::in_memory();
        let catalog = Arc::new(bundled_catalog().unwrap());
        AppController::new(
            ProgressService::new(catalog.clone(), storage.progress.clone()),
            QuizService::new(catalog, storage.progress),
        )
    }

    fn data() -> CourseId {
        "data-literacy".parse().unwrap()
    }

    async fn run(ctl: &AppController, mut state: AppState, intents: Vec<Intent>) -> AppState {
        for intent in intents {
            state = ctl.dispatch(&state, intent).await.unwrap();
        }
        state
    }

    fn fresh() -> AppState {
        AppState::new("learner".parse().unwrap())
    }

    #[tokio::test]
    async fn navigation_reaches_the_quiz() {
        let ctl = controller();
        let state = run(
            &ctl,
            fresh(),
            vec![Intent::OpenCourse(data()), Intent::OpenLesson(0), Intent::StartQuiz],
        )
        .await;
        assert_eq!(
            state.view,
            View::Quiz {
                course: data(),
                index: 0
            }
        );
        assert_eq!(state.quiz, Some(QuizState::start()));
    }

    #[tokio::test]
    async fn locked_lesson_is_refused() {
        let ctl = controller();
        let state = run(&ctl, fresh(), vec![Intent::OpenCourse(data())]).await;
        let err = ctl.dispatch(&state, Intent::OpenLesson(1)).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Quiz(QuizServiceError::LessonLocked { index: 1, .. })
        ));
        assert_eq!(state.view, View::Course(data()));
    }

    #[tokio::test]
    async fn quiz_intents_outside_a_quiz_are_invalid() {
        let ctl = controller();
        for intent in [Intent::Advance, Intent::Finish, Intent::StartQuiz, Intent::OpenLesson(0)] {
            let err = ctl.dispatch(&fresh(), intent).await.unwrap_err();
            assert!(matches!(err, DispatchError::InvalidIntent));
        }
    }

    #[tokio::test]
    async fn advancing_without_an_answer_is_rejected() {
        let ctl = controller();
        let state = run(
            &ctl,
            fresh(),
            vec![Intent::OpenCourse(data()), Intent::OpenLesson(0), Intent::StartQuiz],
        )
        .await;
        let err = ctl.dispatch(&state, Intent::Advance).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Quiz(QuizServiceError::Quiz(QuizError::Unanswered(0)))
        ));
    }

    #[tokio::test]
    async fn passing_finish_moves_to_next_lesson() {
        let ctl = controller();
        let quiz = ctl.quizzes.lesson(&data(), 0).unwrap().quiz().clone();
        let mut intents = vec![Intent::OpenCourse(data()), Intent::OpenLesson(0), Intent::StartQuiz];
        for q in quiz.questions() {
            intents.push(Intent::SelectAnswer(q.correct_option()));
            intents.push(Intent::Advance);
        }
        intents.push(Intent::Finish);

        let state = run(&ctl, fresh(), intents).await;
        assert_eq!(
            state.view,
            View::Lesson {
                course: data(),
                index: 1
            }
        );
        assert_eq!(state.quiz, None);
    }

    #[tokio::test]
    async fn failing_finish_stays_on_graded_quiz_and_retry_restarts() {
        let ctl = controller();
        let quiz = ctl.quizzes.lesson(&data(), 0).unwrap().quiz().clone();
        let mut intents = vec![Intent::OpenCourse(data()), Intent::OpenLesson(0), Intent::StartQuiz];
        for q in quiz.questions() {
            intents.push(Intent::SelectAnswer((q.correct_option() + 1) % q.options().len()));
            intents.push(Intent::Advance);
        }
        intents.push(Intent::Finish);

        let state = run(&ctl, fresh(), intents).await;
        assert!(matches!(state.view, View::Quiz { index: 0, .. }));
        assert!(state.quiz.as_ref().is_some_and(QuizState::is_graded));

        let state = ctl.dispatch(&state, Intent::Retry).await.unwrap();
        assert_eq!(state.quiz, Some(QuizState::start()));
    }

    #[tokio::test]
    async fn certificate_requires_completion() {
        let ctl = controller();
        let state = run(&ctl, fresh(), vec![Intent::OpenCourse(data())]).await;
        let err = ctl.dispatch(&state, Intent::OpenCertificate).await.unwrap_err();
        assert!(matches!(err, DispatchError::CertificateNotIssued(_)));

        let state = ctl.dispatch(&state, Intent::SkipToEnd).await.unwrap();
        assert_eq!(state.view, View::Certificate(data()));
        let state = run(&ctl, state, vec![Intent::OpenCatalog, Intent::OpenCourse(data())]).await;
        let state = ctl.dispatch(&state, Intent::OpenCertificate).await.unwrap();
        assert_eq!(state.view, View::Certificate(data()));
    }
}
