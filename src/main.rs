mod catalog;
mod error;
mod models;
mod recommend;
mod store;
mod tracker;
mod users;

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};

use catalog::{Catalog, CourseDraft, SearchFilters};
use models::{Difficulty, JsonOutput, PlatformEvent};
use recommend::UserHistory;
use store::LocalStore;
use tracker::CourseTracker;
use users::{PreferencesPatch, ProfilePatch, UserStore};

const DEFAULT_DB_NAME: &str = "learnhub.db";

#[derive(Parser)]
#[command(name = "learnhub")]
#[command(about = "A local-first learning platform: accounts, course catalog, search and recommendations")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the local store
    Init,

    /// Seed the built-in catalog and demo account
    Seed,

    /// Create an account and sign in
    Register {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, short)]
        password: String,

        /// First name
        #[arg(long)]
        first_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,
    },

    /// Sign in to an existing account
    Login {
        /// Account email
        email: String,

        /// Account password
        #[arg(long, short)]
        password: String,
    },

    /// Sign out of the current session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Manage the signed-in profile
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Manage learning preferences
    #[command(subcommand)]
    Prefs(PrefsCommands),

    /// Enroll in a course
    Enroll {
        /// Course ID
        course_id: String,
    },

    /// Record unit progress for a course
    Progress {
        /// Course ID
        course_id: String,

        /// Units completed so far
        #[arg(long)]
        completed: u32,

        /// Total units in the course
        #[arg(long)]
        total: u32,
    },

    /// Mark a course as completed
    Complete {
        /// Course ID
        course_id: String,
    },

    /// Record today's activity and show the streak
    Streak,

    /// List unlocked achievements
    Achievements,

    /// Manage courses
    #[command(subcommand)]
    Course(CourseCommands),

    /// Search the catalog
    Search {
        /// Search query; omit to list everything
        query: Option<String>,

        /// Filter by exact category
        #[arg(long)]
        category: Option<String>,

        /// Filter by difficulty: beginner/intermediate/advanced/expert
        #[arg(long, short)]
        difficulty: Option<String>,

        /// Minimum course rating
        #[arg(long, default_value_t = 0.0)]
        min_rating: f64,

        /// Maximum duration in minutes
        #[arg(long)]
        max_duration: Option<u32>,
    },

    /// Recommend courses
    Recommend {
        /// Number of courses to suggest
        #[arg(long, short, default_value_t = recommend::DEFAULT_LIMIT)]
        limit: usize,

        /// Rank the whole catalog instead of skipping enrolled courses
        #[arg(long)]
        catalog: bool,
    },

    /// Per-course progress tracker
    #[command(subcommand)]
    Tracker(TrackerCommands),

    /// Show platform statistics
    Stats,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Update profile fields
    Set {
        /// New first name
        #[arg(long)]
        first_name: Option<String>,

        /// New last name
        #[arg(long)]
        last_name: Option<String>,

        /// New avatar URL
        #[arg(long)]
        avatar: Option<String>,
    },
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Update learning preferences
    Set {
        /// Comma-separated preferred categories
        #[arg(long)]
        categories: Option<String>,

        /// Preferred difficulty: beginner/intermediate/advanced/expert
        #[arg(long, short)]
        difficulty: Option<String>,

        /// Enable or disable notifications
        #[arg(long)]
        notifications: Option<bool>,
    },
}

#[derive(Subcommand)]
enum CourseCommands {
    /// List all courses
    List {
        /// Filter by exact category
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Add a course to the catalog
    Add {
        /// Course ID
        id: String,

        /// Course title
        #[arg(long, short)]
        title: String,

        /// Course description
        #[arg(long, default_value = "")]
        description: String,

        /// Category
        #[arg(long, short)]
        category: String,

        /// Difficulty: beginner/intermediate/advanced/expert
        #[arg(long, short, default_value = "beginner")]
        difficulty: String,

        /// Duration in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Instructor name
        #[arg(long, default_value = "AI Learning Assistant")]
        instructor: String,

        /// Mark as featured
        #[arg(long)]
        featured: bool,

        /// Mark as new
        #[arg(long)]
        new: bool,

        /// Navigation path for the course page
        #[arg(long, default_value = "#coming-soon")]
        path: String,
    },

    /// Show course details
    Show {
        /// Course ID
        id: String,
    },

    /// List featured courses
    Featured,

    /// List recently added courses
    Recent,
}

#[derive(Subcommand)]
enum TrackerCommands {
    /// Show tracker state for a course
    Show {
        /// Course ID
        course_id: String,

        /// Total modules in the course
        #[arg(long, default_value_t = 1)]
        modules: u32,

        /// Total projects in the course
        #[arg(long, default_value_t = 0)]
        projects: u32,
    },

    /// Mark a module as completed
    Module {
        /// Course ID
        course_id: String,

        /// Module number (1-based)
        index: u32,

        /// Total modules in the course
        #[arg(long, default_value_t = 1)]
        modules: u32,

        /// Total projects in the course
        #[arg(long, default_value_t = 0)]
        projects: u32,
    },

    /// Mark a project as completed
    Project {
        /// Course ID
        course_id: String,

        /// Project number (1-based)
        index: u32,

        /// Total modules in the course
        #[arg(long, default_value_t = 1)]
        modules: u32,

        /// Total projects in the course
        #[arg(long, default_value_t = 1)]
        projects: u32,
    },

    /// Add study time in minutes
    Time {
        /// Course ID
        course_id: String,

        /// Minutes to add
        minutes: u64,

        /// Total modules in the course
        #[arg(long, default_value_t = 1)]
        modules: u32,

        /// Total projects in the course
        #[arg(long, default_value_t = 0)]
        projects: u32,
    },

    /// Record an earned certification
    Cert {
        /// Course ID
        course_id: String,

        /// Certification name
        name: String,

        /// Total modules in the course
        #[arg(long, default_value_t = 1)]
        modules: u32,

        /// Total projects in the course
        #[arg(long, default_value_t = 0)]
        projects: u32,
    },

    /// Wipe all tracker state for a course
    Reset {
        /// Course ID
        course_id: String,
    },
}

fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("LEARNHUB_DB") {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("learnhub");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_db_path();
    let store = LocalStore::open(&db_path)?;
    let mut users = UserStore::load(&store)?;
    let mut courses = Catalog::load(&store)?;
    users.restore_session(Utc::now())?;

    match cli.command {
        Commands::Init => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Store initialized at: {}", db_path.display());
            }
        }

        Commands::Seed => {
            let seeded_courses = courses.seed_default_courses(Utc::now())?;
            let seeded_demo = users.seed_demo_user()?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "courses": seeded_courses,
                        "demo_user": seeded_demo
                    })))?
                );
            } else {
                println!("Seeded {} courses.", seeded_courses);
                if seeded_demo {
                    println!("Demo account created: demo@learnhub.local / demo123");
                } else {
                    println!("Demo account already present.");
                }
            }
        }

        Commands::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let user = users.register(&email, &password, &first_name, &last_name)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&user))?);
            } else {
                println!("Welcome, {} {}!", user.first_name, user.last_name);
                println!("Signed in as {}.", user.email);
            }
        }

        Commands::Login { email, password } => {
            let user = users.login(&email, &password)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&user))?);
            } else {
                println!("Welcome back, {}!", user.first_name);
                println!("Login count: {}", user.login_count);
            }
        }

        Commands::Logout => {
            let was_signed_in = users.is_authenticated();
            users.logout()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else if was_signed_in {
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
        }

        Commands::Whoami => {
            if let Some(user) = users.current_user() {
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&user))?);
                } else {
                    println!("{} {} <{}>", user.first_name, user.last_name, user.email);
                    println!("Points: {}  Streak: {} days", user.total_points, user.streak);
                    println!(
                        "Courses: {} enrolled, {} in progress, {} completed",
                        user.enrolled.len(),
                        user.in_progress.len(),
                        user.completed.len()
                    );
                }
            } else if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::<()>::err("Not signed in"))?
                );
            } else {
                println!("Not signed in.");
            }
        }

        Commands::Profile(profile_cmd) => match profile_cmd {
            ProfileCommands::Set {
                first_name,
                last_name,
                avatar,
            } => {
                let user = users.update_profile(ProfilePatch {
                    first_name,
                    last_name,
                    avatar,
                })?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&user))?);
                } else {
                    println!("Profile updated: {} {}", user.first_name, user.last_name);
                }
            }
        },

        Commands::Prefs(prefs_cmd) => match prefs_cmd {
            PrefsCommands::Set {
                categories,
                difficulty,
                notifications,
            } => {
                let difficulty = difficulty.map(|d| parse_difficulty(&d)).transpose()?;
                let categories = categories
                    .map(|c| c.split(',').map(|s| s.trim().to_string()).collect());

                let user = users.update_preferences(PreferencesPatch {
                    categories,
                    difficulty,
                    notifications,
                })?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&user.preferences))?);
                } else {
                    println!(
                        "Preferences updated: {} / {} / notifications {}",
                        if user.preferences.categories.is_empty() {
                            "any category".to_string()
                        } else {
                            user.preferences.categories.join(", ")
                        },
                        user.preferences.difficulty.label(),
                        if user.preferences.notifications { "on" } else { "off" }
                    );
                }
            }
        },

        Commands::Enroll { course_id } => {
            if courses.get(&course_id).is_none() {
                return Err(format!("Course not found: {}", course_id).into());
            }
            users.enroll(&course_id)?;
            courses.record_started(&course_id, Utc::now());
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Enrolled in {}.", course_id);
            }
        }

        Commands::Progress {
            course_id,
            completed,
            total,
        } => {
            users.record_progress(&course_id, completed, total)?;
            let events = users.drain_events();
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&events))?);
            } else {
                println!("Progress recorded: {}/{} units.", completed, total);
                announce(&events);
            }
        }

        Commands::Complete { course_id } => {
            if courses.get(&course_id).is_none() {
                return Err(format!("Course not found: {}", course_id).into());
            }
            users.complete_course(&course_id)?;
            courses.record_completed(&course_id, Utc::now());
            let events = users.drain_events();
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&events))?);
            } else {
                println!("Course {} completed.", course_id);
                announce(&events);
            }
        }

        Commands::Streak => {
            users.update_streak(Utc::now())?;
            let events = users.drain_events();
            let user = users
                .current_user()
                .ok_or_else(|| "Not signed in".to_string())?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "streak": user.streak
                    })))?
                );
            } else {
                println!("Current streak: {} days", user.streak);
                announce(&events);
            }
        }

        Commands::Achievements => {
            users.evaluate_achievements()?;
            let user = users
                .current_user()
                .ok_or_else(|| "Not signed in".to_string())?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&user.achievements))?);
            } else if user.achievements.is_empty() {
                println!("No achievements yet. Complete a course to earn your first!");
            } else {
                for achievement in &user.achievements {
                    println!("{}", achievement);
                }
            }
        }

        Commands::Course(course_cmd) => match course_cmd {
            CourseCommands::List { category } => {
                let list: Vec<&models::Course> = match category {
                    Some(c) => courses.by_category(&c),
                    None => courses.all().iter().collect(),
                };
                print_course_table(&list, cli.json)?;
            }

            CourseCommands::Add {
                id,
                title,
                description,
                category,
                difficulty,
                duration,
                tags,
                instructor,
                featured,
                new,
                path,
            } => {
                let tag_list: Vec<String> = tags
                    .map(|t| t.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default();
                let course = courses.register(
                    CourseDraft {
                        id,
                        title,
                        description,
                        category,
                        difficulty: parse_difficulty(&difficulty)?,
                        duration_minutes: duration,
                        tags: tag_list,
                        prerequisites: Vec::new(),
                        instructor,
                        rating: 0.0,
                        enrollments: 0,
                        is_featured: featured,
                        is_new: new,
                        path,
                        created_at: None,
                    },
                    Utc::now(),
                )?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(course))?);
                } else {
                    println!("Added course '{}' with ID: {}", course.title, course.id);
                }
            }

            CourseCommands::Show { id } => {
                if let Some(course) = courses.get(&id) {
                    let snapshot = tracker::load_snapshot(&store, &id)?;
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "course": course,
                                "progress": snapshot
                            })))?
                        );
                    } else {
                        println!("Course: {}", course.title);
                        println!("ID: {}", course.id);
                        println!("Description: {}", course.description);
                        println!("Category: {}", course.category);
                        println!("Difficulty: {}", course.difficulty.label());
                        println!("Duration: {}", format_duration(course.duration_minutes));
                        println!(
                            "Tags: {}",
                            if course.tags.is_empty() {
                                "-".to_string()
                            } else {
                                course.tags.join(", ")
                            }
                        );
                        println!("Instructor: {}", course.instructor);
                        println!(
                            "Rating: {} ({} students)",
                            course.rating, course.enrollments
                        );
                        if snapshot.total_units > 0 {
                            println!();
                            println!(
                                "Progress: {}/{} units",
                                snapshot.completed_units, snapshot.total_units
                            );
                        }
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Course not found"))?
                    );
                } else {
                    println!("Course not found.");
                }
            }

            CourseCommands::Featured => {
                print_course_table(&courses.featured(), cli.json)?;
            }

            CourseCommands::Recent => {
                print_course_table(&courses.recently_added(Utc::now()), cli.json)?;
            }
        },

        Commands::Search {
            query,
            category,
            difficulty,
            min_rating,
            max_duration,
        } => {
            let difficulty = difficulty.map(|d| parse_difficulty(&d)).transpose()?;
            let filters = SearchFilters {
                category,
                difficulty,
                min_rating,
                max_duration_minutes: max_duration,
            };
            let results = courses.search(query.as_deref().unwrap_or(""), &filters);
            let refs: Vec<&models::Course> = results.iter().collect();
            print_course_table(&refs, cli.json)?;
        }

        Commands::Recommend { limit, catalog } => {
            let current = users.current_user();
            let results = if catalog {
                let history = UserHistory::collect(current.as_ref(), courses.all());
                recommend::catalog_wide(&history, courses.all(), limit)
            } else {
                recommend::personalized(current.as_ref(), courses.all(), limit)
            };
            let refs: Vec<&models::Course> = results.iter().collect();
            print_course_table(&refs, cli.json)?;
        }

        Commands::Tracker(tracker_cmd) => run_tracker(&store, tracker_cmd, cli.json)?,

        Commands::Stats => {
            let user = users.current_user();
            let total_users = users.all_users().len();
            let total_courses = courses.all().len();
            let categories = courses.category_counts();
            if cli.json {
                let by_category: serde_json::Map<String, serde_json::Value> = categories
                    .iter()
                    .map(|(category, n)| (category.clone(), serde_json::json!(n)))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "total_users": total_users,
                        "total_courses": total_courses,
                        "by_category": by_category,
                        "current_user": user
                    })))?
                );
            } else {
                println!("=== Platform Statistics ===");
                println!("Users: {}", total_users);
                println!("Courses: {}", total_courses);
                for (category, n) in &categories {
                    println!("  {}: {}", category, n);
                }
                if let Some(user) = user {
                    println!();
                    println!("Signed in as: {}", user.email);
                    println!("Points: {}", user.total_points);
                    println!("Streak: {} days", user.streak);
                    println!("Completed courses: {}", user.completed.len());
                    println!("Achievements: {}", user.achievements.len());
                }
            }
        }
    }

    Ok(())
}

fn run_tracker(
    store: &LocalStore,
    cmd: TrackerCommands,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        TrackerCommands::Show {
            course_id,
            modules,
            projects,
        } => {
            let tracker = CourseTracker::load(store, &course_id, modules, projects)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "state": tracker.state(),
                        "percent": tracker.completion_percent(),
                        "complete": tracker.is_complete()
                    })))?
                );
            } else {
                let state = tracker.state();
                println!("Tracker for {}:", course_id);
                println!(
                    "Modules: {}/{} completed",
                    state.completed_modules.len(),
                    modules
                );
                if projects > 0 {
                    println!(
                        "Projects: {}/{} completed",
                        state.completed_projects.len(),
                        projects
                    );
                }
                println!("Time spent: {} min", state.time_spent_ms / 60_000);
                if !state.certifications.is_empty() {
                    println!("Certifications: {}", state.certifications.join(", "));
                }
                println!("Completion: {}%", tracker.completion_percent());
            }
        }

        TrackerCommands::Module {
            course_id,
            index,
            modules,
            projects,
        } => {
            let mut tracker = CourseTracker::load(store, &course_id, modules, projects)?;
            let newly = tracker.complete_module(index)?;
            report_unit(&tracker, json, newly, "Module", index)?;
        }

        TrackerCommands::Project {
            course_id,
            index,
            modules,
            projects,
        } => {
            let mut tracker = CourseTracker::load(store, &course_id, modules, projects)?;
            let newly = tracker.complete_project(index)?;
            report_unit(&tracker, json, newly, "Project", index)?;
        }

        TrackerCommands::Time {
            course_id,
            minutes,
            modules,
            projects,
        } => {
            let mut tracker = CourseTracker::load(store, &course_id, modules, projects)?;
            tracker.add_time(minutes * 60_000)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "time_spent_ms": tracker.state().time_spent_ms
                    })))?
                );
            } else {
                println!(
                    "Time logged. Total: {} min",
                    tracker.state().time_spent_ms / 60_000
                );
            }
        }

        TrackerCommands::Cert {
            course_id,
            name,
            modules,
            projects,
        } => {
            let mut tracker = CourseTracker::load(store, &course_id, modules, projects)?;
            let newly = tracker.earn_certification(&name)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "earned": newly,
                        "certifications": tracker.state().certifications
                    })))?
                );
            } else if newly {
                println!("Certification earned: {}", name);
            } else {
                println!("Certification already recorded.");
            }
        }

        TrackerCommands::Reset { course_id } => {
            let mut tracker = CourseTracker::load(store, &course_id, 1, 0)?;
            tracker.reset()?;
            if json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Tracker for {} reset.", course_id);
            }
        }
    }
    Ok(())
}

fn report_unit(
    tracker: &CourseTracker,
    json: bool,
    newly: bool,
    kind: &str,
    index: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!(
            "{}",
            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                "newly_completed": newly,
                "percent": tracker.completion_percent(),
                "complete": tracker.is_complete()
            })))?
        );
    } else {
        if newly {
            println!("{} {} completed.", kind, index);
        } else {
            println!("{} {} was already completed.", kind, index);
        }
        println!("Completion: {}%", tracker.completion_percent());
        if tracker.is_complete() {
            println!("All units done! Mark the course completed with: learnhub complete <course-id>");
        }
    }
    Ok(())
}

fn announce(events: &[PlatformEvent]) {
    for event in events {
        match event {
            PlatformEvent::CourseCompleted { course_id, .. } => {
                println!("Completed: {}", course_id);
            }
            PlatformEvent::PointsEarned { delta, total } => {
                println!("+{} points (total: {})", delta, total);
            }
            PlatformEvent::AchievementsUnlocked { unlocked } => {
                for achievement in unlocked {
                    println!("Achievement unlocked: {}", achievement);
                }
            }
            _ => {}
        }
    }
}

fn print_course_table(
    courses: &[&models::Course],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(&JsonOutput::ok(courses))?);
    } else if courses.is_empty() {
        println!("No courses found.");
    } else {
        println!(
            "{:<20} {:<35} {:<16} {:<13} RATING",
            "ID", "TITLE", "CATEGORY", "DIFFICULTY"
        );
        println!("{}", "-".repeat(95));
        for course in courses {
            println!(
                "{:<20} {:<35} {:<16} {:<13} {}",
                truncate(&course.id, 18),
                truncate(&course.title, 33),
                truncate(&course.category, 14),
                course.difficulty.label(),
                course.rating
            );
        }
    }
    Ok(())
}

fn parse_difficulty(raw: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(raw).ok_or_else(|| {
        format!(
            "Invalid difficulty '{}'. Use: beginner, intermediate, advanced, or expert",
            raw
        )
    })
}

fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        let hours = minutes / 60;
        let remaining = minutes % 60;
        if remaining > 0 {
            format!("{}h {}m", hours, remaining)
        } else {
            format!("{}h", hours)
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_empty_string() {
            assert_eq!(truncate("", 10), "");
        }

        #[test]
        fn truncate_multibyte_titles() {
            // Cuts on character boundaries, never mid-codepoint.
            assert_eq!(truncate("Programmation avancée", 12), "Programma...");
            assert_eq!(truncate("Éducation à la données", 10), "Éducati...");
            assert_eq!(truncate("Éducation", 20), "Éducation");
        }
    }

    mod format_duration_tests {
        use super::*;

        #[test]
        fn minutes_below_an_hour() {
            assert_eq!(format_duration(45), "45 min");
        }

        #[test]
        fn whole_hours() {
            assert_eq!(format_duration(120), "2h");
        }

        #[test]
        fn hours_and_minutes() {
            assert_eq!(format_duration(150), "2h 30m");
        }
    }

    mod parse_difficulty_tests {
        use super::*;

        #[test]
        fn accepts_known_levels() {
            assert_eq!(parse_difficulty("beginner").unwrap(), Difficulty::Beginner);
            assert_eq!(parse_difficulty("EXPERT").unwrap(), Difficulty::Expert);
        }

        #[test]
        fn rejects_unknown_levels() {
            assert!(parse_difficulty("wizard").is_err());
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_init_command() {
            let cli = Cli::try_parse_from(["learnhub", "init"]).unwrap();
            assert!(!cli.json);
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_seed_with_json() {
            let cli = Cli::try_parse_from(["learnhub", "--json", "seed"]).unwrap();
            assert!(cli.json);
            assert!(matches!(cli.command, Commands::Seed));
        }

        #[test]
        fn parse_register_command() {
            let cli = Cli::try_parse_from([
                "learnhub",
                "register",
                "ada@example.com",
                "--password",
                "secret1",
                "--first-name",
                "Ada",
                "--last-name",
                "Lovelace",
            ])
            .unwrap();
            match cli.command {
                Commands::Register {
                    email,
                    password,
                    first_name,
                    last_name,
                } => {
                    assert_eq!(email, "ada@example.com");
                    assert_eq!(password, "secret1");
                    assert_eq!(first_name, "Ada");
                    assert_eq!(last_name, "Lovelace");
                }
                _ => panic!("Expected Register command"),
            }
        }

        #[test]
        fn parse_login_short_flag() {
            let cli =
                Cli::try_parse_from(["learnhub", "login", "a@b.com", "-p", "secret1"]).unwrap();
            match cli.command {
                Commands::Login { email, password } => {
                    assert_eq!(email, "a@b.com");
                    assert_eq!(password, "secret1");
                }
                _ => panic!("Expected Login command"),
            }
        }

        #[test]
        fn parse_search_with_filters() {
            let cli = Cli::try_parse_from([
                "learnhub",
                "search",
                "n8n",
                "--category",
                "Automation",
                "--difficulty",
                "advanced",
                "--min-rating",
                "4.5",
                "--max-duration",
                "120",
            ])
            .unwrap();
            match cli.command {
                Commands::Search {
                    query,
                    category,
                    difficulty,
                    min_rating,
                    max_duration,
                } => {
                    assert_eq!(query, Some("n8n".to_string()));
                    assert_eq!(category, Some("Automation".to_string()));
                    assert_eq!(difficulty, Some("advanced".to_string()));
                    assert_eq!(min_rating, 4.5);
                    assert_eq!(max_duration, Some(120));
                }
                _ => panic!("Expected Search command"),
            }
        }

        #[test]
        fn parse_search_without_query() {
            let cli = Cli::try_parse_from(["learnhub", "search"]).unwrap();
            match cli.command {
                Commands::Search { query, .. } => assert!(query.is_none()),
                _ => panic!("Expected Search command"),
            }
        }

        #[test]
        fn parse_recommend_defaults() {
            let cli = Cli::try_parse_from(["learnhub", "recommend"]).unwrap();
            match cli.command {
                Commands::Recommend { limit, catalog } => {
                    assert_eq!(limit, recommend::DEFAULT_LIMIT);
                    assert!(!catalog);
                }
                _ => panic!("Expected Recommend command"),
            }
        }

        #[test]
        fn parse_recommend_catalog_wide() {
            let cli =
                Cli::try_parse_from(["learnhub", "recommend", "--catalog", "-l", "3"]).unwrap();
            match cli.command {
                Commands::Recommend { limit, catalog } => {
                    assert_eq!(limit, 3);
                    assert!(catalog);
                }
                _ => panic!("Expected Recommend command"),
            }
        }

        #[test]
        fn parse_progress_command() {
            let cli = Cli::try_parse_from([
                "learnhub",
                "progress",
                "n8n-crash-course",
                "--completed",
                "3",
                "--total",
                "10",
            ])
            .unwrap();
            match cli.command {
                Commands::Progress {
                    course_id,
                    completed,
                    total,
                } => {
                    assert_eq!(course_id, "n8n-crash-course");
                    assert_eq!(completed, 3);
                    assert_eq!(total, 10);
                }
                _ => panic!("Expected Progress command"),
            }
        }

        #[test]
        fn parse_course_add_with_defaults() {
            let cli = Cli::try_parse_from([
                "learnhub",
                "course",
                "add",
                "rust-basics",
                "--title",
                "Rust Fundamentals",
                "--category",
                "Programming",
            ])
            .unwrap();
            match cli.command {
                Commands::Course(CourseCommands::Add {
                    id,
                    title,
                    difficulty,
                    duration,
                    path,
                    ..
                }) => {
                    assert_eq!(id, "rust-basics");
                    assert_eq!(title, "Rust Fundamentals");
                    assert_eq!(difficulty, "beginner");
                    assert_eq!(duration, 60);
                    assert_eq!(path, "#coming-soon");
                }
                _ => panic!("Expected Course Add command"),
            }
        }

        #[test]
        fn parse_course_list_with_category() {
            let cli =
                Cli::try_parse_from(["learnhub", "course", "list", "-c", "Automation"]).unwrap();
            match cli.command {
                Commands::Course(CourseCommands::List { category }) => {
                    assert_eq!(category, Some("Automation".to_string()));
                }
                _ => panic!("Expected Course List command"),
            }
        }

        #[test]
        fn parse_tracker_module() {
            let cli = Cli::try_parse_from([
                "learnhub", "tracker", "module", "n8n-advanced", "3", "--modules", "12",
                "--projects", "4",
            ])
            .unwrap();
            match cli.command {
                Commands::Tracker(TrackerCommands::Module {
                    course_id,
                    index,
                    modules,
                    projects,
                }) => {
                    assert_eq!(course_id, "n8n-advanced");
                    assert_eq!(index, 3);
                    assert_eq!(modules, 12);
                    assert_eq!(projects, 4);
                }
                _ => panic!("Expected Tracker Module command"),
            }
        }

        #[test]
        fn parse_tracker_reset() {
            let cli = Cli::try_parse_from(["learnhub", "tracker", "reset", "c1"]).unwrap();
            match cli.command {
                Commands::Tracker(TrackerCommands::Reset { course_id }) => {
                    assert_eq!(course_id, "c1");
                }
                _ => panic!("Expected Tracker Reset command"),
            }
        }

        #[test]
        fn parse_prefs_set() {
            let cli = Cli::try_parse_from([
                "learnhub",
                "prefs",
                "set",
                "--categories",
                "Automation,Programming",
                "--difficulty",
                "intermediate",
                "--notifications",
                "false",
            ])
            .unwrap();
            match cli.command {
                Commands::Prefs(PrefsCommands::Set {
                    categories,
                    difficulty,
                    notifications,
                }) => {
                    assert_eq!(categories, Some("Automation,Programming".to_string()));
                    assert_eq!(difficulty, Some("intermediate".to_string()));
                    assert_eq!(notifications, Some(false));
                }
                _ => panic!("Expected Prefs Set command"),
            }
        }

        #[test]
        fn parse_invalid_command_fails() {
            let result = Cli::try_parse_from(["learnhub", "invalid"]);
            assert!(result.is_err());
        }

        #[test]
        fn parse_missing_required_arg_fails() {
            // register requires a password
            let result = Cli::try_parse_from(["learnhub", "register", "a@b.com"]);
            assert!(result.is_err());

            // progress requires both counters
            let result = Cli::try_parse_from(["learnhub", "progress", "c1"]);
            assert!(result.is_err());
        }
    }

    mod db_path_tests {
        use super::*;
        use std::env;

        #[test]
        fn get_db_path_uses_env_var() {
            let test_path = "/tmp/test_learnhub.db";
            env::set_var("LEARNHUB_DB", test_path);

            let path = get_db_path();
            assert_eq!(path.to_str().unwrap(), test_path);

            env::remove_var("LEARNHUB_DB");
        }
    }
}
