use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Course difficulty on an ordinal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner = 1,
    Intermediate = 2,
    Advanced = 3,
    Expert = 4,
}

impl Difficulty {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            1 => Some(Difficulty::Beginner),
            2 => Some(Difficulty::Intermediate),
            3 => Some(Difficulty::Advanced),
            4 => Some(Difficulty::Expert),
            _ => None,
        }
    }

    /// Maps an arbitrary integer onto the scale, clamping at both ends.
    pub fn clamp_i32(v: i32) -> Self {
        match v {
            i32::MIN..=1 => Difficulty::Beginner,
            2 => Difficulty::Intermediate,
            3 => Difficulty::Advanced,
            _ => Difficulty::Expert,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginner" | "1" => Some(Difficulty::Beginner),
            "intermediate" | "2" => Some(Difficulty::Intermediate),
            "advanced" | "3" => Some(Difficulty::Advanced),
            "expert" | "4" => Some(Difficulty::Expert),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
            Difficulty::Expert => "Expert",
        }
    }

    /// The next step up the scale, if any.
    pub fn next(&self) -> Option<Self> {
        Self::from_i32(self.as_i32() + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub categories: Vec<String>,
    pub difficulty: Difficulty,
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            difficulty: Difficulty::Beginner,
            notifications: true,
        }
    }
}

/// Per-course progress entry in a user's progress map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub completed_units: u32,
    pub total_units: u32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub secret_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
    pub join_date: DateTime<Utc>,
    pub preferences: Preferences,
    pub enrolled: Vec<String>,
    pub in_progress: Vec<String>,
    pub completed: Vec<String>,
    #[serde(default)]
    pub course_progress: HashMap<String, CourseProgress>,
    pub total_points: u32,
    pub streak: u32,
    pub achievements: Vec<String>,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    pub login_count: u32,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// View of the user with the credential hash omitted.
    pub fn sanitized(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            avatar: self.avatar.clone(),
            join_date: self.join_date,
            preferences: self.preferences.clone(),
            enrolled: self.enrolled.clone(),
            in_progress: self.in_progress.clone(),
            completed: self.completed.clone(),
            course_progress: self.course_progress.clone(),
            total_points: self.total_points,
            streak: self.streak,
            achievements: self.achievements.clone(),
            login_count: self.login_count,
            last_login: self.last_login,
        }
    }
}

/// Sanitized user record returned by every store operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
    pub join_date: DateTime<Utc>,
    pub preferences: Preferences,
    pub enrolled: Vec<String>,
    pub in_progress: Vec<String>,
    pub completed: Vec<String>,
    pub course_progress: HashMap<String, CourseProgress>,
    pub total_points: u32,
    pub streak: u32,
    pub achievements: Vec<String>,
    pub login_count: u32,
    pub last_login: Option<DateTime<Utc>>,
}

pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// Time-bounded proof of an authenticated identity, stored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: &str, email: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            email: email.to_string(),
            created_at: now,
            expires_at: now + Duration::hours(SESSION_LIFETIME_HOURS),
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub duration_minutes: u32,
    pub tags: Vec<String>,
    pub prerequisites: Vec<String>,
    pub instructor: String,
    pub rating: f64,
    pub enrollments: u64,
    pub created_at: DateTime<Utc>,
    pub is_featured: bool,
    pub is_new: bool,
    /// Navigation target for the course page.
    pub path: String,
}

impl Course {
    /// Concatenated lowercase text the search index tokenizes.
    pub fn searchable_text(&self) -> String {
        let mut parts: Vec<&str> = vec![
            &self.title,
            &self.description,
            &self.category,
            &self.instructor,
        ];
        parts.extend(self.tags.iter().map(|t| t.as_str()));
        parts.join(" ").to_lowercase()
    }
}

/// Legacy per-course numeric snapshot, persisted separately from the
/// per-user progress map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub completed_units: u32,
    pub total_units: u32,
}

/// Persisted state of a course page tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerState {
    pub completed_modules: Vec<u32>,
    pub completed_projects: Vec<u32>,
    pub time_spent_ms: u64,
    pub certifications: Vec<String>,
}

/// Achievement identifiers and their unlock thresholds.
pub mod achievements {
    pub const FIRST_COURSE: &str = "first-course";
    pub const WEEK_STREAK: &str = "week-streak";
    pub const MONTH_STREAK: &str = "month-streak";
    pub const POINTS_500: &str = "points-500";

    pub const WEEK_STREAK_DAYS: u32 = 7;
    pub const MONTH_STREAK_DAYS: u32 = 30;
    pub const POINTS_500_THRESHOLD: u32 = 500;
}

/// Signals emitted by the core for optional consumers. Services queue them;
/// callers drain the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlatformEvent {
    Login {
        user_id: String,
    },
    Register {
        user_id: String,
    },
    Logout {
        user_id: String,
    },
    SessionRestored {
        user_id: String,
    },
    ProfileUpdated {
        user_id: String,
    },
    PreferencesUpdated {
        user_id: String,
    },
    CourseEnrolled {
        user_id: String,
        course_id: String,
    },
    ProgressUpdated {
        user_id: String,
        course_id: String,
        completed_units: u32,
        total_units: u32,
    },
    CourseCompleted {
        user_id: String,
        course_id: String,
    },
    PointsEarned {
        delta: u32,
        total: u32,
    },
    AchievementsUnlocked {
        unlocked: Vec<String>,
    },
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod difficulty_tests {
        use super::*;

        #[test]
        fn as_i32_returns_ordinal_values() {
            assert_eq!(Difficulty::Beginner.as_i32(), 1);
            assert_eq!(Difficulty::Intermediate.as_i32(), 2);
            assert_eq!(Difficulty::Advanced.as_i32(), 3);
            assert_eq!(Difficulty::Expert.as_i32(), 4);
        }

        #[test]
        fn from_i32_round_trips() {
            for d in [
                Difficulty::Beginner,
                Difficulty::Intermediate,
                Difficulty::Advanced,
                Difficulty::Expert,
            ] {
                assert_eq!(Difficulty::from_i32(d.as_i32()), Some(d));
            }
        }

        #[test]
        fn from_i32_invalid_returns_none() {
            assert_eq!(Difficulty::from_i32(0), None);
            assert_eq!(Difficulty::from_i32(5), None);
            assert_eq!(Difficulty::from_i32(-1), None);
        }

        #[test]
        fn clamp_i32_clamps_both_ends() {
            assert_eq!(Difficulty::clamp_i32(-10), Difficulty::Beginner);
            assert_eq!(Difficulty::clamp_i32(0), Difficulty::Beginner);
            assert_eq!(Difficulty::clamp_i32(2), Difficulty::Intermediate);
            assert_eq!(Difficulty::clamp_i32(99), Difficulty::Expert);
        }

        #[test]
        fn from_str_accepts_names_and_numbers() {
            assert_eq!(Difficulty::from_str("beginner"), Some(Difficulty::Beginner));
            assert_eq!(Difficulty::from_str("EXPERT"), Some(Difficulty::Expert));
            assert_eq!(Difficulty::from_str("2"), Some(Difficulty::Intermediate));
            assert_eq!(Difficulty::from_str("wizard"), None);
        }

        #[test]
        fn next_steps_up_and_stops_at_expert() {
            assert_eq!(Difficulty::Beginner.next(), Some(Difficulty::Intermediate));
            assert_eq!(Difficulty::Advanced.next(), Some(Difficulty::Expert));
            assert_eq!(Difficulty::Expert.next(), None);
        }

        #[test]
        fn ordering_follows_the_scale() {
            assert!(Difficulty::Beginner < Difficulty::Intermediate);
            assert!(Difficulty::Advanced < Difficulty::Expert);
        }

        #[test]
        fn serializes_lowercase() {
            let json = serde_json::to_string(&Difficulty::Intermediate).unwrap();
            assert_eq!(json, "\"intermediate\"");
            let back: Difficulty = serde_json::from_str("\"expert\"").unwrap();
            assert_eq!(back, Difficulty::Expert);
        }
    }

    mod session_tests {
        use super::*;

        #[test]
        fn expiry_is_creation_plus_lifetime() {
            let now = Utc::now();
            let session = Session::new("user-1", "a@b.com", now);
            assert_eq!(
                session.expires_at,
                now + Duration::hours(SESSION_LIFETIME_HOURS)
            );
        }

        #[test]
        fn valid_before_expiry() {
            let now = Utc::now();
            let session = Session::new("user-1", "a@b.com", now);
            assert!(session.is_valid(now + Duration::hours(23)));
        }

        #[test]
        fn invalid_at_and_after_expiry() {
            let now = Utc::now();
            let session = Session::new("user-1", "a@b.com", now);
            assert!(!session.is_valid(session.expires_at));
            assert!(!session.is_valid(now + Duration::hours(25)));
        }
    }

    mod user_tests {
        use super::*;

        fn make_user() -> User {
            User {
                id: "user-1".to_string(),
                email: "a@b.com".to_string(),
                secret_hash: "$argon2id$fake".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                avatar: String::new(),
                join_date: Utc::now(),
                preferences: Preferences::default(),
                enrolled: vec![],
                in_progress: vec![],
                completed: vec![],
                course_progress: HashMap::new(),
                total_points: 0,
                streak: 0,
                achievements: vec![],
                last_activity: None,
                login_count: 0,
                last_login: None,
            }
        }

        #[test]
        fn sanitized_omits_secret_hash() {
            let user = make_user();
            let public = user.sanitized();
            let json = serde_json::to_string(&public).unwrap();
            assert!(!json.contains("secret_hash"));
            assert!(!json.contains("argon2"));
            assert_eq!(public.id, user.id);
            assert_eq!(public.email, user.email);
        }

        #[test]
        fn default_preferences() {
            let prefs = Preferences::default();
            assert!(prefs.categories.is_empty());
            assert_eq!(prefs.difficulty, Difficulty::Beginner);
            assert!(prefs.notifications);
        }
    }

    mod course_tests {
        use super::*;

        #[test]
        fn searchable_text_is_lowercase_and_complete() {
            let course = Course {
                id: "c1".to_string(),
                title: "n8n Crash Course".to_string(),
                description: "Master Workflows".to_string(),
                category: "Automation".to_string(),
                difficulty: Difficulty::Beginner,
                duration_minutes: 45,
                tags: vec!["No-Code".to_string()],
                prerequisites: vec![],
                instructor: "AI Learning Assistant".to_string(),
                rating: 4.8,
                enrollments: 1247,
                created_at: Utc::now(),
                is_featured: true,
                is_new: true,
                path: "./courses/n8n".to_string(),
            };
            let text = course.searchable_text();
            assert!(text.contains("n8n crash course"));
            assert!(text.contains("master workflows"));
            assert!(text.contains("automation"));
            assert!(text.contains("no-code"));
            assert!(text.contains("ai learning assistant"));
        }
    }

    mod json_output_tests {
        use super::*;

        #[test]
        fn serializes_ok_correctly() {
            let output = JsonOutput::ok("test");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":true"));
            assert!(json.contains("\"data\":\"test\""));
            assert!(json.contains("\"error\":null"));
        }

        #[test]
        fn serializes_err_correctly() {
            let output = JsonOutput::<()>::err("error");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":false"));
            assert!(json.contains("\"error\":\"error\""));
        }
    }
}
