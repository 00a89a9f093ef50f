use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{Course, Difficulty, PublicUser};

pub const DEFAULT_LIMIT: usize = 6;

/// Aggregated signal from a user's completed and in-progress courses:
/// the categories and tags touched, and the difficulty of the most
/// recently listed course.
#[derive(Debug, Default)]
pub struct UserHistory {
    pub categories: HashSet<String>,
    pub tags: HashSet<String>,
    pub latest_difficulty: Option<Difficulty>,
}

impl UserHistory {
    pub fn collect(user: Option<&PublicUser>, courses: &[Course]) -> Self {
        let mut history = Self::default();
        let Some(user) = user else {
            return history;
        };
        for course_id in user.completed.iter().chain(user.in_progress.iter()) {
            if let Some(course) = find(courses, course_id) {
                history.categories.insert(course.category.clone());
                for tag in &course.tags {
                    history.tags.insert(tag.clone());
                }
                history.latest_difficulty = Some(course.difficulty);
            }
        }
        history
    }
}

/// Recommendations tuned to one account. Enrolled courses are skipped;
/// the rest are scored on popularity, preference matches, tag overlap
/// with completed courses, and difficulty progression. Without a signed-in
/// user this degrades to the first `limit` catalog entries.
pub fn personalized(user: Option<&PublicUser>, courses: &[Course], limit: usize) -> Vec<Course> {
    let Some(user) = user else {
        return courses.iter().take(limit).cloned().collect();
    };

    let completed_tags: HashSet<&str> = user
        .completed
        .iter()
        .filter_map(|id| find(courses, id))
        .flat_map(|c| c.tags.iter().map(String::as_str))
        .collect();
    let next_difficulty = if user.completed.is_empty() {
        None
    } else {
        average_completed_difficulty(user, courses).next()
    };

    let mut scored: Vec<(&Course, f64)> = Vec::new();
    for course in courses {
        if user.enrolled.iter().any(|id| id == &course.id) {
            continue;
        }

        let mut score = course.rating * 10.0;
        score += ((course.enrollments + 1) as f64).ln() * 2.0;

        if user.preferences.categories.contains(&course.category) {
            score += 20.0;
        }
        if course.difficulty == user.preferences.difficulty {
            score += 15.0;
        }
        for tag in &course.tags {
            if completed_tags.contains(tag.as_str()) {
                score += 5.0;
            }
        }
        if next_difficulty == Some(course.difficulty) {
            score += 10.0;
        }

        scored.push((course, score));
    }

    take_top(scored, limit)
}

/// Catalog-wide ranking weighted by popularity, freshness, and overlap
/// with the given history. Works without any account.
pub fn catalog_wide(history: &UserHistory, courses: &[Course], limit: usize) -> Vec<Course> {
    let mut scored: Vec<(&Course, f64)> = Vec::new();
    for course in courses {
        let mut score = course.rating * 2.0;
        score += ((course.enrollments + 1) as f64).ln();

        if course.is_new {
            score += 5.0;
        }
        if history.categories.contains(&course.category) {
            score += 10.0;
        }
        for tag in &course.tags {
            if history.tags.contains(tag) {
                score += 3.0;
            }
        }
        if let Some(latest) = history.latest_difficulty {
            if course.difficulty == latest {
                score += 5.0;
            } else if latest.next() == Some(course.difficulty) {
                score += 8.0;
            }
        }

        scored.push((course, score));
    }

    take_top(scored, limit)
}

/// Rounded mean difficulty over the user's completed courses; Beginner
/// when there is nothing to average.
pub fn average_completed_difficulty(user: &PublicUser, courses: &[Course]) -> Difficulty {
    let levels: Vec<i32> = user
        .completed
        .iter()
        .filter_map(|id| find(courses, id))
        .map(|c| c.difficulty.as_i32())
        .collect();
    if levels.is_empty() {
        return Difficulty::Beginner;
    }
    let mean = levels.iter().sum::<i32>() as f64 / levels.len() as f64;
    Difficulty::clamp_i32(mean.round() as i32)
}

fn find<'a>(courses: &'a [Course], course_id: &str) -> Option<&'a Course> {
    courses.iter().find(|c| c.id == course_id)
}

/// Stable score-descending sort; ties keep catalog order.
fn take_top(mut scored: Vec<(&Course, f64)>, limit: usize) -> Vec<Course> {
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored
        .into_iter()
        .take(limit)
        .map(|(course, _)| course.clone())
        .collect()
}
