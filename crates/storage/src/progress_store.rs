use std::sync::Arc;

use lms_core::model::{Course, CourseId, LessonId, Progress, ProgressChange, Score, UserId};
use tracing::{debug, warn};

use crate::records::ProgressRecord;
use crate::repository::{KeyValueStore, StorageError};

/// Outcome of [`ProgressStore::record_quiz_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResult {
    pub progress: Progress,
    pub change: ProgressChange,
}

/// Per user and course progress records on top of a key-value backend.
///
/// Records live under `progress:{user_id}:{course_id}`. A record that fails to
/// parse, or that belongs to a different user or course than its key, reads
/// as absent and is replaced on the next write.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    #[must_use]
    pub fn key(user_id: &UserId, course_id: &CourseId) -> String {
        format!("progress:{user_id}:{course_id}")
    }

    /// Fetch the stored record, if a valid one exists.
    ///
    /// The certificate flag of the returned record always agrees with
    /// `course`: a flag that does not match the completed set is corrected.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    pub async fn get(
        &self,
        user_id: &UserId,
        course: &Course,
    ) -> Result<Option<Progress>, StorageError> {
        let course_id = course.id();
        let key = Self::key(user_id, course_id);
        let Some(raw) = self.kv.read(&key).await? else {
            return Ok(None);
        };

        let record = match serde_json::from_str::<ProgressRecord>(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!(%key, error = %err, "discarding unreadable progress record");
                return Ok(None);
            }
        };
        if &record.user_id != user_id || &record.course_id != course_id {
            warn!(%key, "discarding progress record stored under the wrong key");
            return Ok(None);
        }
        let mut progress = record.into_progress();
        if progress.certificate_issued() != progress.covers(course) {
            warn!(%key, "correcting certificate flag of progress record");
            progress.reconcile(course);
        }
        Ok(Some(progress))
    }

    /// Create and persist the zero-value record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    pub async fn initialize(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Progress, StorageError> {
        let progress = Progress::new(user_id.clone(), course_id.clone());
        self.save(&progress).await?;
        Ok(progress)
    }

    /// Fetch the record, creating it on first access.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn load_or_initialize(
        &self,
        user_id: &UserId,
        course: &Course,
    ) -> Result<Progress, StorageError> {
        match self.get(user_id, course).await? {
            Some(progress) => Ok(progress),
            None => self.initialize(user_id, course.id()).await,
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn save(&self, progress: &Progress) -> Result<(), StorageError> {
        let key = Self::key(progress.user_id(), progress.course_id());
        let raw = serde_json::to_string(&ProgressRecord::from_progress(progress))
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        debug!(%key, "writing progress record");
        self.kv.write(&key, raw).await
    }

    /// Load-or-initialize, apply the result, persist and return the record.
    ///
    /// The score always overwrites the previous one; a pass adds the lesson
    /// to the completed set; the certificate flag is recomputed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn record_quiz_result(
        &self,
        user_id: &UserId,
        course: &Course,
        lesson_id: &LessonId,
        score: Score,
        passed: bool,
    ) -> Result<RecordedResult, StorageError> {
        let mut progress = self.load_or_initialize(user_id, course).await?;
        let change = progress.record_quiz_result(course, lesson_id, score, passed);
        self.save(&progress).await?;
        Ok(RecordedResult { progress, change })
    }

    /// Mark every lesson of `course` complete and issue the certificate.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn mark_all_complete(
        &self,
        user_id: &UserId,
        course: &Course,
    ) -> Result<Progress, StorageError> {
        let mut progress = self.load_or_initialize(user_id, course).await?;
        progress.complete_all(course);
        self.save(&progress).await?;
        Ok(progress)
    }
}
