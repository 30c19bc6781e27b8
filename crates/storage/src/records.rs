//! Persisted JSON shapes.
//!
//! These mirror the domain types so stores can serialize/deserialize without
//! leaking storage concerns into the domain layer. Field types validate on
//! read: a bad id or an out-of-range score fails deserialization.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use lms_core::model::{CourseId, LessonId, Progress, Score, User, UserError, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub course_id: CourseId,
    #[serde(default)]
    pub completed_lesson_ids: BTreeSet<LessonId>,
    #[serde(default)]
    pub quiz_scores: BTreeMap<LessonId, Score>,
    #[serde(default)]
    pub certificate_issued: bool,
}

impl ProgressRecord {
    #[must_use]
    pub fn from_progress(progress: &Progress) -> Self {
        Self {
            user_id: progress.user_id().clone(),
            course_id: progress.course_id().clone(),
            completed_lesson_ids: progress.completed_lesson_ids().clone(),
            quiz_scores: progress.quiz_scores().clone(),
            certificate_issued: progress.certificate_issued(),
        }
    }

    #[must_use]
    pub fn into_progress(self) -> Progress {
        Progress::from_persisted(
            self.user_id,
            self.course_id,
            self.completed_lesson_ids,
            self.quiz_scores,
            self.certificate_issued,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub registered_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl UserRecord {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id().clone(),
            name: user.name().to_owned(),
            email: user.email().to_owned(),
            password_hash: user.password_hash().to_owned(),
            registered_at: user.registered_at(),
            last_login: user.last_login(),
        }
    }

    /// Convert the record back into a domain `User`.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the stored fields no longer validate.
    pub fn into_user(self) -> Result<User, UserError> {
        User::from_persisted(
            self.id,
            self.name,
            &self.email,
            self.password_hash,
            self.registered_at,
            self.last_login,
        )
    }
}
