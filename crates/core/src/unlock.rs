//! Which lessons of a course a learner may open.
//!
//! Lesson 0 is always open. Lesson `i` opens once lesson `i - 1` is completed.
//! Everything here is a pure function of the course and a progress snapshot,
//! so callers simply re-evaluate after each progress change.

use crate::model::{Course, Progress};

/// Whether the lesson at `index` is accessible. Indices past the end are locked.
#[must_use]
pub fn is_unlocked(course: &Course, progress: &Progress, index: usize) -> bool {
    if index >= course.lesson_count() {
        return false;
    }
    match index.checked_sub(1).and_then(|prev| course.lesson(prev)) {
        None => true,
        Some(prev) => progress.is_completed(prev.id()),
    }
}

/// Per-lesson unlock flags, in lesson order.
#[must_use]
pub fn unlock_flags(course: &Course, progress: &Progress) -> Vec<bool> {
    (0..course.lesson_count())
        .map(|i| is_unlocked(course, progress, i))
        .collect()
}

/// Number of accessible lessons.
#[must_use]
pub fn unlocked_count(course: &Course, progress: &Progress) -> usize {
    unlock_flags(course, progress)
        .into_iter()
        .filter(|open| *open)
        .count()
}

/// The lesson a learner should land on when opening the course: the first
/// unlocked lesson that is not yet completed, or the last lesson once every
/// lesson is done.
#[must_use]
pub fn resume_index(course: &Course, progress: &Progress) -> usize {
    course
        .lessons()
        .iter()
        .enumerate()
        .find(|(i, lesson)| {
            is_unlocked(course, progress, *i) && !progress.is_completed(lesson.id())
        })
        .map_or_else(|| course.lesson_count().saturating_sub(1), |(i, _)| i)
}

/// Index of the lesson after `index`, if the course has one.
#[must_use]
pub fn next_lesson_index(course: &Course, index: usize) -> Option<usize> {
    let next = index.checked_add(1)?;
    (next < course.lesson_count()).then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Lesson, LessonId, Question, Quiz, Score};

    fn course(n: usize) -> Course {
        let lessons = (0..n)
            .map(|i| {
                let q = Question::new(
                    "q".parse().unwrap(),
                    "?",
                    vec!["a".into(), "b".into()],
                    0,
                )
                .unwrap();
                let quiz = Quiz::new(Score::new(50).unwrap(), vec![q]).unwrap();
                Lesson::new(format!("l{i}").parse().unwrap(), "Lesson", "", None, quiz).unwrap()
            })
            .collect();
        Course::new("c".parse().unwrap(), "Course", "", lessons).unwrap()
    }

    fn lid(i: usize) -> LessonId {
        format!("l{i}").parse().unwrap()
    }

    fn progress() -> Progress {
        Progress::new("u".parse().unwrap(), "c".parse().unwrap())
    }

    #[test]
    fn first_lesson_is_always_unlocked() {
        let course = course(3);
        assert!(is_unlocked(&course, &progress(), 0));
        assert!(!is_unlocked(&course, &progress(), 1));
        assert!(!is_unlocked(&course, &progress(), 3));
    }

    #[test]
    fn completing_a_lesson_unlocks_the_next() {
        let course = course(3);
        let mut p = progress();
        p.record_quiz_result(&course, &lid(0), Score::PERFECT, true);
        assert_eq!(unlock_flags(&course, &p), vec![true, true, false]);
    }

    #[test]
    fn failing_does_not_unlock() {
        let course = course(2);
        let mut p = progress();
        p.record_quiz_result(&course, &lid(0), Score::ZERO, false);
        assert!(!is_unlocked(&course, &p, 1));
    }

    #[test]
    fn unlocking_is_monotonic() {
        let course = course(4);
        let mut p = progress();
        for i in 0..4 {
            let before = unlock_flags(&course, &p);
            assert!(before[i]);
            p.record_quiz_result(&course, &lid(i), Score::PERFECT, true);
            let after = unlock_flags(&course, &p);
            for (was, is) in before.iter().zip(&after) {
                assert!(!was || *is, "a lesson became locked");
            }
            if i + 1 < 4 {
                assert!(after[i + 1]);
            }
        }
        assert_eq!(unlocked_count(&course, &p), 4);
    }

    #[test]
    fn resume_points_at_first_open_incomplete_lesson() {
        let course = course(3);
        let mut p = progress();
        assert_eq!(resume_index(&course, &p), 0);
        p.record_quiz_result(&course, &lid(0), Score::PERFECT, true);
        assert_eq!(resume_index(&course, &p), 1);
        p.complete_all(&course);
        assert_eq!(resume_index(&course, &p), 2);
    }

    #[test]
    fn next_lesson_stops_at_end() {
        let course = course(2);
        assert_eq!(next_lesson_index(&course, 0), Some(1));
        assert_eq!(next_lesson_index(&course, 1), None);
    }
}
