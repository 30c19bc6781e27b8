use std::collections::{BTreeMap, BTreeSet};

use crate::model::course::Course;
use crate::model::ids::{CourseId, LessonId, UserId};
use crate::model::score::Score;

/// What a single quiz result changed in a `Progress` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressChange {
    /// The lesson moved into the completed set with this result.
    pub newly_completed: bool,
    /// The certificate flipped from not issued to issued with this result.
    pub certificate_issued: bool,
}

/// Completion state of one user in one course.
///
/// Invariant: `certificate_issued` is true exactly when every lesson of the
/// course is in `completed_lesson_ids`. Every mutator re-establishes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    user_id: UserId,
    course_id: CourseId,
    completed_lesson_ids: BTreeSet<LessonId>,
    quiz_scores: BTreeMap<LessonId, Score>,
    certificate_issued: bool,
}

impl Progress {
    /// The zero-value record created on first access to a course.
    #[must_use]
    pub fn new(user_id: UserId, course_id: CourseId) -> Self {
        Self {
            user_id,
            course_id,
            completed_lesson_ids: BTreeSet::new(),
            quiz_scores: BTreeMap::new(),
            certificate_issued: false,
        }
    }

    /// Rehydrate from storage exactly as written.
    ///
    /// Use [`Progress::reconcile`] afterwards to re-check the certificate
    /// flag against the current catalog.
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        course_id: CourseId,
        completed_lesson_ids: BTreeSet<LessonId>,
        quiz_scores: BTreeMap<LessonId, Score>,
        certificate_issued: bool,
    ) -> Self {
        Self {
            user_id,
            course_id,
            completed_lesson_ids,
            quiz_scores,
            certificate_issued,
        }
    }

    /// Apply a quiz result: the latest score always replaces the previous
    /// one, a pass adds the lesson to the completed set, and the certificate
    /// flag is recomputed.
    pub fn record_quiz_result(
        &mut self,
        course: &Course,
        lesson_id: &LessonId,
        score: Score,
        passed: bool,
    ) -> ProgressChange {
        let had_certificate = self.certificate_issued;
        self.quiz_scores.insert(lesson_id.clone(), score);
        let newly_completed = passed && self.completed_lesson_ids.insert(lesson_id.clone());
        self.reconcile(course);

        ProgressChange {
            newly_completed,
            certificate_issued: !had_certificate && self.certificate_issued,
        }
    }

    /// Mark every lesson of the course complete. Recorded scores are kept.
    pub fn complete_all(&mut self, course: &Course) {
        self.completed_lesson_ids.extend(course.lesson_ids().cloned());
        self.certificate_issued = true;
    }

    /// Recompute the certificate flag from the completed set.
    pub fn reconcile(&mut self, course: &Course) {
        self.certificate_issued = self.covers(course);
    }

    /// True when every lesson of `course` is completed.
    #[must_use]
    pub fn covers(&self, course: &Course) -> bool {
        course
            .lesson_ids()
            .all(|id| self.completed_lesson_ids.contains(id))
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn completed_lesson_ids(&self) -> &BTreeSet<LessonId> {
        &self.completed_lesson_ids
    }

    #[must_use]
    pub fn quiz_scores(&self) -> &BTreeMap<LessonId, Score> {
        &self.quiz_scores
    }

    #[must_use]
    pub fn is_completed(&self, lesson_id: &LessonId) -> bool {
        self.completed_lesson_ids.contains(lesson_id)
    }

    #[must_use]
    pub fn score(&self, lesson_id: &LessonId) -> Option<Score> {
        self.quiz_scores.get(lesson_id).copied()
    }

    #[must_use]
    pub fn certificate_issued(&self) -> bool {
        self.certificate_issued
    }

    /// Completed lessons of `course` as a rounded percentage.
    #[must_use]
    pub fn percent_complete(&self, course: &Course) -> Score {
        let done = course
            .lesson_ids()
            .filter(|id| self.completed_lesson_ids.contains(*id))
            .count();
        Score::from_ratio(done, course.lesson_count())
    }

    /// Mean of the recorded scores for lessons in `course`, if any exist.
    #[must_use]
    pub fn average_score(&self, course: &Course) -> Option<Score> {
        let scores: Vec<u32> = course
            .lesson_ids()
            .filter_map(|id| self.quiz_scores.get(id))
            .map(|s| u32::from(*s))
            .collect();
        if scores.is_empty() {
            return None;
        }
        let total: u32 = scores.iter().sum();
        let count = u32::try_from(scores.len()).ok()?;
        Score::new((2 * total + count) / (2 * count)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::course::{Lesson, Question, Quiz};

    fn course(lessons: &[&str]) -> Course {
        let lessons = lessons
            .iter()
            .map(|id| {
                let q = Question::new(
                    "q1".parse().unwrap(),
                    "?",
                    vec!["a".into(), "b".into()],
                    0,
                )
                .unwrap();
                let quiz = Quiz::new(Score::new(80).unwrap(), vec![q]).unwrap();
                Lesson::new(id.parse().unwrap(), *id, "", None, quiz).unwrap()
            })
            .collect();
        Course::new("c".parse().unwrap(), "Course", "", lessons).unwrap()
    }

    fn progress() -> Progress {
        Progress::new("u".parse().unwrap(), "c".parse().unwrap())
    }

    fn lid(s: &str) -> LessonId {
        s.parse().unwrap()
    }

    #[test]
    fn new_progress_is_zero_value() {
        let p = progress();
        assert!(p.completed_lesson_ids().is_empty());
        assert!(p.quiz_scores().is_empty());
        assert!(!p.certificate_issued());
    }

    #[test]
    fn failed_result_records_score_only() {
        let course = course(&["a", "b"]);
        let mut p = progress();
        let change = p.record_quiz_result(&course, &lid("a"), Score::new(67).unwrap(), false);
        assert!(!change.newly_completed);
        assert_eq!(p.score(&lid("a")), Some(Score::new(67).unwrap()));
        assert!(!p.is_completed(&lid("a")));
    }

    #[test]
    fn latest_score_overwrites_even_when_lower() {
        let course = course(&["a", "b"]);
        let mut p = progress();
        p.record_quiz_result(&course, &lid("a"), Score::PERFECT, true);
        let change = p.record_quiz_result(&course, &lid("a"), Score::new(10).unwrap(), false);
        assert!(!change.newly_completed);
        assert_eq!(p.score(&lid("a")), Some(Score::new(10).unwrap()));
        // a later failure never un-completes a lesson
        assert!(p.is_completed(&lid("a")));
    }

    #[test]
    fn certificate_follows_completion() {
        let course = course(&["a", "b"]);
        let mut p = progress();
        let first = p.record_quiz_result(&course, &lid("a"), Score::PERFECT, true);
        assert!(first.newly_completed);
        assert!(!first.certificate_issued);
        assert!(!p.certificate_issued());

        let second = p.record_quiz_result(&course, &lid("b"), Score::PERFECT, true);
        assert!(second.certificate_issued);
        assert!(p.certificate_issued());

        let again = p.record_quiz_result(&course, &lid("b"), Score::PERFECT, true);
        assert!(!again.newly_completed);
        assert!(!again.certificate_issued);
        assert!(p.certificate_issued());
    }

    #[test]
    fn complete_all_issues_certificate_and_keeps_scores() {
        let course = course(&["a", "b", "c"]);
        let mut p = progress();
        p.record_quiz_result(&course, &lid("a"), Score::new(40).unwrap(), false);
        p.complete_all(&course);
        assert!(p.certificate_issued());
        assert!(p.covers(&course));
        assert_eq!(p.score(&lid("a")), Some(Score::new(40).unwrap()));
    }

    #[test]
    fn reconcile_revokes_stale_certificate() {
        let short = course(&["a"]);
        let long = course(&["a", "b"]);
        let mut p = progress();
        p.record_quiz_result(&short, &lid("a"), Score::PERFECT, true);
        assert!(p.certificate_issued());
        p.reconcile(&long);
        assert!(!p.certificate_issued());
    }

    #[test]
    fn percent_and_average() {
        let course = course(&["a", "b", "c"]);
        let mut p = progress();
        assert_eq!(p.average_score(&course), None);
        p.record_quiz_result(&course, &lid("a"), Score::new(90).unwrap(), true);
        p.record_quiz_result(&course, &lid("b"), Score::new(67).unwrap(), false);
        assert_eq!(p.percent_complete(&course).value(), 33);
        assert_eq!(p.average_score(&course), Some(Score::new(79).unwrap()));
    }
}
