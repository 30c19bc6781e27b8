//! Shared error types for the services crate.

use thiserror::Error;

use lms_core::model::{CourseError, CourseId, UserError};
use lms_core::quiz::QuizError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Labeled registration and login failures, meant to be shown to the user.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("email or password is incorrect")]
    InvalidCredentials,
    #[error(transparent)]
    InvalidUser(#[from] UserError),
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading a catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] CourseError),
    #[error("could not read catalog file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("unknown course {0}")]
    UnknownCourse(CourseId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("unknown course {0}")]
    UnknownCourse(CourseId),
    #[error("course {course} has no lesson at index {index}")]
    UnknownLesson { course: CourseId, index: usize },
    #[error("lesson {index} of course {course} is locked")]
    LessonLocked { course: CourseId, index: usize },
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ProgressServiceError> for QuizServiceError {
    fn from(err: ProgressServiceError) -> Self {
        match err {
            ProgressServiceError::UnknownCourse(id) => Self::UnknownCourse(id),
            ProgressServiceError::Storage(e) => Self::Storage(e),
        }
    }
}

/// Errors emitted by the app-state reducer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("this action is not available on the current screen")]
    InvalidIntent,
    #[error("no certificate has been issued for course {0}")]
    CertificateNotIssued(CourseId),
    #[error(transparent)]
    Quiz(#[from] QuizServiceError),
    #[error(transparent)]
    Progress(#[from] ProgressServiceError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
