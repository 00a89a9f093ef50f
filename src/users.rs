use std::collections::HashMap;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::error::{PlatformError, Result};
use crate::models::{
    achievements, CourseProgress, Difficulty, PlatformEvent, Preferences, PublicUser, Session,
    User,
};
use crate::store::{keys, LocalStore};

pub const MIN_SECRET_LEN: usize = 6;
pub const COMPLETION_BONUS: u32 = 100;

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
}

/// Partial preference update; absent fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct PreferencesPatch {
    pub categories: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
    pub notifications: Option<bool>,
}

/// In-memory registry of user records with login/session/progress
/// operations. Every mutation persists the full user set (and the session
/// where relevant) before returning.
pub struct UserStore<'a> {
    store: &'a LocalStore,
    users: HashMap<String, User>,
    session: Option<Session>,
    events: Vec<PlatformEvent>,
}

impl<'a> UserStore<'a> {
    pub fn load(store: &'a LocalStore) -> Result<Self> {
        let saved: Vec<User> = store.get(keys::USERS)?.unwrap_or_default();
        let users = saved
            .into_iter()
            .map(|u| (u.email.clone(), u))
            .collect();
        Ok(Self {
            store,
            users,
            session: None,
            events: Vec::new(),
        })
    }

    /// Installs the demo account when the user set is empty.
    pub fn seed_demo_user(&mut self) -> Result<bool> {
        if !self.users.is_empty() {
            return Ok(false);
        }
        let now = Utc::now();
        let demo = User {
            id: "demo-001".to_string(),
            email: "demo@learnhub.local".to_string(),
            secret_hash: hash_secret("demo123")?,
            first_name: "Demo".to_string(),
            last_name: "User".to_string(),
            avatar: avatar_uri("Demo", "User"),
            join_date: now,
            preferences: Preferences {
                categories: vec!["Automation".to_string(), "Programming".to_string()],
                difficulty: Difficulty::Intermediate,
                notifications: true,
            },
            enrolled: vec!["n8n-crash-course".to_string(), "python-basics".to_string()],
            in_progress: vec!["n8n-crash-course".to_string()],
            completed: vec![],
            course_progress: HashMap::new(),
            total_points: 150,
            streak: 5,
            achievements: vec![
                achievements::FIRST_COURSE.to_string(),
                achievements::WEEK_STREAK.to_string(),
            ],
            last_activity: Some(now),
            login_count: 0,
            last_login: None,
        };
        self.users.insert(demo.email.clone(), demo);
        self.persist_users()?;
        Ok(true)
    }

    // --- Authentication ---

    pub fn register(
        &mut self,
        email: &str,
        secret: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<PublicUser> {
        for (field, value) in [
            ("email", email),
            ("password", secret),
            ("first name", first_name),
            ("last name", last_name),
        ] {
            if value.trim().is_empty() {
                return Err(PlatformError::Validation(format!("{field} is required")));
            }
        }
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(PlatformError::WeakCredential(MIN_SECRET_LEN));
        }

        let email = email.trim().to_lowercase();
        if self.users.contains_key(&email) {
            return Err(PlatformError::DuplicateUser);
        }

        let now = Utc::now();
        let user = User {
            id: generate_user_id(now),
            email: email.clone(),
            secret_hash: hash_secret(secret)?,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            avatar: avatar_uri(first_name.trim(), last_name.trim()),
            join_date: now,
            preferences: Preferences::default(),
            enrolled: vec![],
            in_progress: vec![],
            completed: vec![],
            course_progress: HashMap::new(),
            total_points: 0,
            streak: 0,
            achievements: vec![],
            last_activity: None,
            login_count: 1,
            last_login: Some(now),
        };
        let public = user.sanitized();

        self.users.insert(email.clone(), user);
        self.open_session(&public.id, &email, now)?;
        self.persist_users()?;
        self.events.push(PlatformEvent::Register {
            user_id: public.id.clone(),
        });
        Ok(public)
    }

    pub fn login(&mut self, email: &str, secret: &str) -> Result<PublicUser> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .get_mut(&email)
            .ok_or_else(|| PlatformError::NotFound(format!("user {email}")))?;

        if !verify_secret(secret, &user.secret_hash)? {
            return Err(PlatformError::InvalidCredential);
        }

        let now = Utc::now();
        user.login_count += 1;
        user.last_login = Some(now);
        let public = user.sanitized();

        self.open_session(&public.id, &email, now)?;
        self.persist_users()?;
        self.events.push(PlatformEvent::Login {
            user_id: public.id.clone(),
        });
        Ok(public)
    }

    /// Clears the active session; a no-op when signed out.
    pub fn logout(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            self.store.remove(keys::SESSION)?;
            self.events.push(PlatformEvent::Logout {
                user_id: session.user_id,
            });
        }
        Ok(())
    }

    /// Loads the persisted session. Expired or dangling sessions are
    /// discarded; a valid one re-attaches the referenced user.
    pub fn restore_session(&mut self, now: DateTime<Utc>) -> Result<bool> {
        let Some(session) = self.store.get::<Session>(keys::SESSION)? else {
            return Ok(false);
        };

        if !session.is_valid(now) || !self.users.contains_key(&session.email) {
            self.store.remove(keys::SESSION)?;
            return Ok(false);
        }

        self.events.push(PlatformEvent::SessionRestored {
            user_id: session.user_id.clone(),
        });
        self.session = Some(session);
        Ok(true)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_user(&self) -> Option<PublicUser> {
        let session = self.session.as_ref()?;
        self.users.get(&session.email).map(User::sanitized)
    }

    /// All users, sanitized, ordered by join date.
    pub fn all_users(&self) -> Vec<PublicUser> {
        let mut users: Vec<PublicUser> = self.users.values().map(User::sanitized).collect();
        users.sort_by(|a, b| a.join_date.cmp(&b.join_date).then(a.id.cmp(&b.id)));
        users
    }

    // --- Profile and preferences ---

    pub fn update_profile(&mut self, patch: ProfilePatch) -> Result<PublicUser> {
        let user = self.current_mut()?;
        if let Some(first) = patch.first_name {
            user.first_name = first;
        }
        if let Some(last) = patch.last_name {
            user.last_name = last;
        }
        if let Some(avatar) = patch.avatar {
            user.avatar = avatar;
        }
        let public = user.sanitized();
        self.persist_users()?;
        self.events.push(PlatformEvent::ProfileUpdated {
            user_id: public.id.clone(),
        });
        Ok(public)
    }

    pub fn update_preferences(&mut self, patch: PreferencesPatch) -> Result<PublicUser> {
        let user = self.current_mut()?;
        if let Some(categories) = patch.categories {
            user.preferences.categories = categories;
        }
        if let Some(difficulty) = patch.difficulty {
            user.preferences.difficulty = difficulty;
        }
        if let Some(notifications) = patch.notifications {
            user.preferences.notifications = notifications;
        }
        let public = user.sanitized();
        self.persist_users()?;
        self.events.push(PlatformEvent::PreferencesUpdated {
            user_id: public.id.clone(),
        });
        Ok(public)
    }

    // --- Enrollment and progress ---

    /// Idempotent: enrolls the current user and marks the course in
    /// progress; re-enrolling is a no-op. A course already completed never
    /// re-enters the in-progress set.
    pub fn enroll(&mut self, course_id: &str) -> Result<()> {
        let user = self.current_mut()?;
        if user.enrolled.iter().any(|id| id == course_id) {
            return Ok(());
        }
        user.enrolled.push(course_id.to_string());
        if !user.completed.iter().any(|id| id == course_id) {
            user.in_progress.push(course_id.to_string());
        }
        let user_id = user.id.clone();
        self.persist_users()?;
        self.events.push(PlatformEvent::CourseEnrolled {
            user_id,
            course_id: course_id.to_string(),
        });
        Ok(())
    }

    /// Updates the per-course progress entry; a fully completed unit count
    /// triggers course completion.
    pub fn record_progress(
        &mut self,
        course_id: &str,
        completed_units: u32,
        total_units: u32,
    ) -> Result<()> {
        if total_units == 0 {
            return Err(PlatformError::Validation(
                "total units must be positive".to_string(),
            ));
        }
        let now = Utc::now();
        let user = self.current_mut()?;
        user.course_progress.insert(
            course_id.to_string(),
            CourseProgress {
                completed_units,
                total_units,
                last_updated: now,
            },
        );
        let user_id = user.id.clone();
        self.events.push(PlatformEvent::ProgressUpdated {
            user_id,
            course_id: course_id.to_string(),
            completed_units,
            total_units,
        });

        if completed_units == total_units {
            self.complete_course(course_id)?;
        } else {
            self.persist_users()?;
        }
        Ok(())
    }

    /// Moves the course from in-progress to completed. Idempotent: the
    /// completion bonus is awarded exactly once. Completion implies
    /// enrollment, so an unenrolled id is enrolled on the way through.
    pub fn complete_course(&mut self, course_id: &str) -> Result<()> {
        let user = self.current_mut()?;
        if !user.enrolled.iter().any(|id| id == course_id) {
            user.enrolled.push(course_id.to_string());
        }
        user.in_progress.retain(|id| id != course_id);

        let first_completion = !user.completed.iter().any(|id| id == course_id);
        let user_id = user.id.clone();
        if first_completion {
            user.completed.push(course_id.to_string());
            self.add_points(COMPLETION_BONUS)?;
            self.evaluate_achievements()?;
        }
        self.persist_users()?;
        self.events.push(PlatformEvent::CourseCompleted {
            user_id,
            course_id: course_id.to_string(),
        });
        Ok(())
    }

    // --- Gamification ---

    pub fn add_points(&mut self, points: u32) -> Result<()> {
        let user = self.current_mut()?;
        user.total_points += points;
        let total = user.total_points;
        self.persist_users()?;
        self.events.push(PlatformEvent::PointsEarned {
            delta: points,
            total,
        });
        Ok(())
    }

    /// Consecutive-calendar-day streak bookkeeping: +1 when the last
    /// activity was exactly one day earlier, reset to 1 when the gap is
    /// wider, unchanged within the same day.
    pub fn update_streak(&mut self, now: DateTime<Utc>) -> Result<()> {
        let user = self.current_mut()?;
        let today = now.date_naive();
        match user.last_activity {
            Some(last) => {
                let gap = (today - last.date_naive()).num_days();
                if gap == 1 {
                    user.streak += 1;
                } else if gap > 1 {
                    user.streak = 1;
                }
            }
            None => user.streak = 1,
        }
        user.last_activity = Some(now);
        self.evaluate_achievements()?;
        self.persist_users()?;
        Ok(())
    }

    /// Deterministic threshold rules; each unlock happens at most once.
    pub fn evaluate_achievements(&mut self) -> Result<()> {
        let user = self.current_mut()?;
        let mut unlocked = Vec::new();

        let rules: [(&str, bool); 4] = [
            (achievements::FIRST_COURSE, !user.completed.is_empty()),
            (
                achievements::WEEK_STREAK,
                user.streak >= achievements::WEEK_STREAK_DAYS,
            ),
            (
                achievements::MONTH_STREAK,
                user.streak >= achievements::MONTH_STREAK_DAYS,
            ),
            (
                achievements::POINTS_500,
                user.total_points >= achievements::POINTS_500_THRESHOLD,
            ),
        ];
        for (id, earned) in rules {
            if earned && !user.achievements.iter().any(|a| a == id) {
                user.achievements.push(id.to_string());
                unlocked.push(id.to_string());
            }
        }

        if !unlocked.is_empty() {
            self.persist_users()?;
            self.events
                .push(PlatformEvent::AchievementsUnlocked { unlocked });
        }
        Ok(())
    }

    // --- Events ---

    pub fn drain_events(&mut self) -> Vec<PlatformEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Internals ---

    fn current_mut(&mut self) -> Result<&mut User> {
        let session = self
            .session
            .as_ref()
            .ok_or(PlatformError::Unauthenticated)?;
        self.users
            .get_mut(&session.email)
            .ok_or(PlatformError::Unauthenticated)
    }

    fn open_session(&mut self, user_id: &str, email: &str, now: DateTime<Utc>) -> Result<()> {
        let session = Session::new(user_id, email, now);
        self.store.put(keys::SESSION, &session)?;
        self.session = Some(session);
        Ok(())
    }

    fn persist_users(&self) -> Result<()> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by(|a, b| a.join_date.cmp(&b.join_date).then(a.id.cmp(&b.id)));
        self.store.put(keys::USERS, &users)
    }
}

fn generate_user_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("user-{}-{}", now.timestamp_millis(), suffix)
}

fn avatar_uri(first_name: &str, last_name: &str) -> String {
    format!("https://ui-avatars.com/api/?name={first_name}+{last_name}&background=667eea&color=fff")
}

fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PlatformError::Hash(e.to_string()))
}

fn verify_secret(secret: &str, secret_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(secret_hash).map_err(|e| PlatformError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}
