use std::sync::Arc;

use lms_core::model::{Catalog, Course, CourseId, LessonId, Progress, Score, User, UserId};
use lms_core::unlock;
use storage::progress_store::ProgressStore;
use tracing::info;

use crate::error::ProgressServiceError;

/// One row of the course screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonStatus {
    pub index: usize,
    pub id: LessonId,
    pub title: String,
    pub unlocked: bool,
    pub completed: bool,
    pub score: Option<Score>,
}

/// Aggregated view of one user's standing in a course, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseOverview {
    pub course_id: CourseId,
    pub title: String,
    pub lessons: Vec<LessonStatus>,
    pub percent_complete: Score,
    pub resume_index: usize,
    pub certificate_issued: bool,
}

/// What the certificate screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub user_name: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub lesson_count: usize,
    pub average_score: Option<Score>,
}

/// Reads progress against the catalog and applies course-level operations.
#[derive(Clone)]
pub struct ProgressService {
    catalog: Arc<Catalog>,
    progress: ProgressStore,
}

impl ProgressService {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, progress: ProgressStore) -> Self {
        Self { catalog, progress }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::UnknownCourse` if the id is not in the catalog.
    pub fn course(&self, course_id: &CourseId) -> Result<&Course, ProgressServiceError> {
        self.catalog
            .course(course_id)
            .ok_or_else(|| ProgressServiceError::UnknownCourse(course_id.clone()))
    }

    /// Progress for the user in the course, created on first access.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` for unknown courses or storage failures.
    pub async fn load(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Progress, ProgressServiceError> {
        let course = self.course(course_id)?;
        Ok(self.progress.load_or_initialize(user_id, course).await?)
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError` for unknown courses or storage failures.
    pub async fn overview(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<CourseOverview, ProgressServiceError> {
        let course = self.course(course_id)?;
        let progress = self.progress.load_or_initialize(user_id, course).await?;
        Ok(project_overview(course, &progress))
    }

    /// Overviews for every course in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if any read fails.
    pub async fn overviews(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CourseOverview>, ProgressServiceError> {
        let mut out = Vec::with_capacity(self.catalog.courses().len());
        for course in self.catalog.courses() {
            let progress = self.progress.load_or_initialize(user_id, course).await?;
            out.push(project_overview(course, &progress));
        }
        Ok(out)
    }

    /// Mark every lesson complete ("skip to end").
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` for unknown courses or storage failures.
    pub async fn skip_to_end(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Progress, ProgressServiceError> {
        let course = self.course(course_id)?;
        let progress = self.progress.mark_all_complete(user_id, course).await?;
        info!(%user_id, %course_id, "marked all lessons complete");
        Ok(progress)
    }

    /// The certificate, once issued.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` for unknown courses or storage failures.
    pub async fn certificate(
        &self,
        user: &User,
        course_id: &CourseId,
    ) -> Result<Option<Certificate>, ProgressServiceError> {
        let course = self.course(course_id)?;
        let progress = self.progress.load_or_initialize(user.id(), course).await?;
        if !progress.certificate_issued() {
            return Ok(None);
        }
        Ok(Some(Certificate {
            user_name: user.name().to_owned(),
            course_id: course.id().clone(),
            course_title: course.title().to_owned(),
            lesson_count: course.lesson_count(),
            average_score: progress.average_score(course),
        }))
    }
}

/// Pure projection of a progress snapshot onto the course's lesson list.
#[must_use]
pub fn project_overview(course: &Course, progress: &Progress) -> CourseOverview {
    let lessons = course
        .lessons()
        .iter()
        .enumerate()
        .map(|(index, lesson)| LessonStatus {
            index,
            id: lesson.id().clone(),
            title: lesson.title().to_owned(),
            unlocked: unlock::is_unlocked(course, progress, index),
            completed: progress.is_completed(lesson.id()),
            score: progress.score(lesson.id()),
        })
        .collect();

    CourseOverview {
        course_id: course.id().clone(),
        title: course.title().to_owned(),
        lessons,
        percent_complete: progress.percent_complete(course),
        resume_index: unlock::resume_index(course, progress),
        certificate_issued: progress.certificate_issued(),
    }
}
