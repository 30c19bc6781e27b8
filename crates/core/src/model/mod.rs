pub mod course;
mod ids;
mod progress;
mod score;
mod user;

pub use course::{
    Catalog, CatalogDraft, Course, CourseDraft, CourseError, Lesson, LessonDraft, Question,
    QuestionDraft, Quiz, QuizDraft,
};
pub use ids::{CourseId, LessonId, ParseIdError, QuestionId, UserId};
pub use progress::{Progress, ProgressChange};
pub use score::{Score, ScoreError};
pub use user::{MIN_PASSWORD_LEN, User, UserError, check_password, normalize_email};
