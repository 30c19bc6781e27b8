#![forbid(unsafe_code)]

pub mod app_services;
pub mod app_state;
pub mod auth_service;
pub mod catalog;
pub mod error;
pub mod progress_service;
pub mod quiz_service;

pub use lms_core::Clock;

pub use app_services::AppServices;
pub use app_state::{AppController, AppState, Intent, View};
pub use auth_service::AuthService;
pub use catalog::{bundled_catalog, load_catalog_file, parse_catalog};
pub use error::{
    AppServicesError, AuthError, CatalogError, DispatchError, ProgressServiceError,
    QuizServiceError,
};
pub use progress_service::{Certificate, CourseOverview, LessonStatus, ProgressService};
pub use quiz_service::{FinishOutcome, QuizService};
