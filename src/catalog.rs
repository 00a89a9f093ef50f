use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};

use crate::error::{PlatformError, Result};
use crate::models::{Course, Difficulty};
use crate::store::{keys, LocalStore};

/// Words shorter than this are not indexed.
const MIN_TOKEN_LEN: usize = 3;

/// Window for "recently added" listings.
pub const RECENT_WINDOW_DAYS: i64 = 30;

const SCORE_TITLE: i64 = 10;
const SCORE_TAG: i64 = 5;
const SCORE_DESCRIPTION: i64 = 3;
const SCORE_CATEGORY: i64 = 2;

/// Input for course registration. Optional metadata defaults to empty or
/// false; a missing creation date defaults to the registration time.
#[derive(Debug, Clone)]
pub struct CourseDraft {
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
    pub is_featured: bool,
    pub is_new: bool,
    pub path: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Post-scoring result filters. Defaults pass everything through.
#[derive(Debug, Default, Clone)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub min_rating: f64,
    pub max_duration_minutes: Option<u32>,
}

/// One line of the search analytics log.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchRecord {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub result_count: usize,
}

/// The course registry with its inverted word index. Courses are held in
/// registration order; the index maps lowercase words to course positions.
pub struct Catalog<'a> {
    store: &'a LocalStore,
    courses: Vec<Course>,
    by_id: HashMap<String, usize>,
    index: HashMap<String, HashSet<usize>>,
    search_log: Vec<SearchRecord>,
    started: HashMap<String, DateTime<Utc>>,
    completed: HashMap<String, DateTime<Utc>>,
}

impl<'a> Catalog<'a> {
    pub fn load(store: &'a LocalStore) -> Result<Self> {
        let courses: Vec<Course> = store.get(keys::COURSES)?.unwrap_or_default();
        let mut catalog = Self {
            store,
            courses,
            by_id: HashMap::new(),
            index: HashMap::new(),
            search_log: Vec::new(),
            started: HashMap::new(),
            completed: HashMap::new(),
        };
        catalog.rebuild_index();
        Ok(catalog)
    }

    /// Registers a course, indexes it, and persists the catalog. The id must
    /// be unique.
    pub fn register(&mut self, draft: CourseDraft, now: DateTime<Utc>) -> Result<&Course> {
        if draft.id.trim().is_empty() {
            return Err(PlatformError::Validation("course id is required".to_string()));
        }
        if self.by_id.contains_key(&draft.id) {
            return Err(PlatformError::Validation(format!(
                "course {} already exists",
                draft.id
            )));
        }
        if !(0.0..=5.0).contains(&draft.rating) {
            return Err(PlatformError::Validation(format!(
                "rating must be between 0 and 5, got {}",
                draft.rating
            )));
        }

        let course = Course {
            id: draft.id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            difficulty: draft.difficulty,
            duration_minutes: draft.duration_minutes,
            tags: draft.tags,
            prerequisites: draft.prerequisites,
            instructor: draft.instructor,
            rating: draft.rating,
            enrollments: draft.enrollments,
            created_at: draft.created_at.unwrap_or(now),
            is_featured: draft.is_featured,
            is_new: draft.is_new,
            path: draft.path,
        };

        let idx = self.courses.len();
        self.by_id.insert(course.id.clone(), idx);
        self.courses.push(course);
        self.index_course(idx);
        self.persist()?;
        Ok(&self.courses[idx])
    }

    pub fn get(&self, course_id: &str) -> Option<&Course> {
        self.by_id.get(course_id).map(|&idx| &self.courses[idx])
    }

    /// All courses in registration order.
    pub fn all(&self) -> &[Course] {
        &self.courses
    }

    pub fn by_category(&self, category: &str) -> Vec<&Course> {
        self.courses
            .iter()
            .filter(|c| c.category == category)
            .collect()
    }

    pub fn featured(&self) -> Vec<&Course> {
        self.courses.iter().filter(|c| c.is_featured).collect()
    }

    /// Courses flagged as new or created within the recency window.
    pub fn recently_added(&self, now: DateTime<Utc>) -> Vec<&Course> {
        let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
        self.courses
            .iter()
            .filter(|c| c.is_new || c.created_at > cutoff)
            .collect()
    }

    /// Word-index search. An empty query returns the whole catalog in
    /// registration order without touching the analytics log. Results are
    /// score-ordered, ties in catalog order.
    pub fn search(&mut self, query: &str, filters: &SearchFilters) -> Vec<Course> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return self.courses.clone();
        }

        let mut scores: HashMap<usize, i64> = HashMap::new();
        for word in normalized.split_whitespace() {
            let Some(candidates) = self.index.get(word) else {
                continue;
            };
            for &idx in candidates {
                let course = &self.courses[idx];
                let entry = scores.entry(idx).or_insert(0);
                if course.title.to_lowercase().contains(word) {
                    *entry += SCORE_TITLE;
                }
                if course.tags.iter().any(|t| t.to_lowercase().contains(word)) {
                    *entry += SCORE_TAG;
                }
                if course.description.to_lowercase().contains(word) {
                    *entry += SCORE_DESCRIPTION;
                }
                if course.category.to_lowercase().contains(word) {
                    *entry += SCORE_CATEGORY;
                }
            }
        }

        let mut scored: Vec<(usize, i64)> = scores
            .into_iter()
            .filter(|&(idx, _)| self.passes_filters(&self.courses[idx], filters))
            .collect();
        scored.sort_by_key(|&(idx, _)| idx);
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let results: Vec<Course> = scored
            .into_iter()
            .map(|(idx, _)| self.courses[idx].clone())
            .collect();

        self.search_log.push(SearchRecord {
            query: normalized,
            timestamp: Utc::now(),
            result_count: results.len(),
        });
        results
    }

    pub fn search_log(&self) -> &[SearchRecord] {
        &self.search_log
    }

    /// Stamps the first start of a course; repeats keep the original time.
    pub fn record_started(&mut self, course_id: &str, now: DateTime<Utc>) {
        self.started.entry(course_id.to_string()).or_insert(now);
    }

    pub fn record_completed(&mut self, course_id: &str, now: DateTime<Utc>) {
        self.completed.entry(course_id.to_string()).or_insert(now);
    }

    pub fn started_at(&self, course_id: &str) -> Option<DateTime<Utc>> {
        self.started.get(course_id).copied()
    }

    pub fn completed_at(&self, course_id: &str) -> Option<DateTime<Utc>> {
        self.completed.get(course_id).copied()
    }

    /// Course counts per category, sorted by category name.
    pub fn category_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for course in &self.courses {
            *counts.entry(course.category.as_str()).or_insert(0) += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(category, n)| (category.to_string(), n))
            .collect();
        counts.sort();
        counts
    }

    /// Drops and rebuilds the whole word index from the course list.
    pub fn rebuild_index(&mut self) {
        self.index.clear();
        self.by_id.clear();
        for idx in 0..self.courses.len() {
            self.by_id.insert(self.courses[idx].id.clone(), idx);
            self.index_course(idx);
        }
    }

    /// Seeds the built-in catalog when empty.
    pub fn seed_default_courses(&mut self, now: DateTime<Utc>) -> Result<usize> {
        if !self.courses.is_empty() {
            return Ok(0);
        }
        let drafts = default_course_drafts();
        let count = drafts.len();
        for draft in drafts {
            self.register(draft, now)?;
        }
        Ok(count)
    }

    fn passes_filters(&self, course: &Course, filters: &SearchFilters) -> bool {
        if let Some(category) = &filters.category {
            if &course.category != category {
                return false;
            }
        }
        if let Some(difficulty) = filters.difficulty {
            if course.difficulty != difficulty {
                return false;
            }
        }
        if course.rating < filters.min_rating {
            return false;
        }
        if let Some(max) = filters.max_duration_minutes {
            if course.duration_minutes > max {
                return false;
            }
        }
        true
    }

    fn index_course(&mut self, idx: usize) {
        let text = self.courses[idx].searchable_text();
        for word in text.split_whitespace() {
            if word.len() >= MIN_TOKEN_LEN {
                self.index.entry(word.to_string()).or_default().insert(idx);
            }
        }
    }

    fn persist(&self) -> Result<()> {
        self.store.put(keys::COURSES, &self.courses)
    }
}

fn draft(
    id: &str,
    title: &str,
    description: &str,
    category: &str,
    difficulty: Difficulty,
    duration_minutes: u32,
    tags: &[&str],
    rating: f64,
    enrollments: u64,
    is_featured: bool,
    is_new: bool,
    path: &str,
) -> CourseDraft {
    CourseDraft {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        difficulty,
        duration_minutes,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        prerequisites: Vec::new(),
        instructor: "AI Learning Assistant".to_string(),
        rating,
        enrollments,
        is_featured,
        is_new,
        path: path.to_string(),
        created_at: None,
    }
}

/// The built-in catalog.
pub fn default_course_drafts() -> Vec<CourseDraft> {
    vec![
        draft(
            "n8n-crash-course",
            "n8n Crash Course",
            "Master workflow automation with n8n in this comprehensive crash course. Learn to build powerful integrations without code.",
            "Automation",
            Difficulty::Beginner,
            45,
            &["automation", "no-code", "workflows", "integration", "productivity"],
            4.8,
            1247,
            true,
            true,
            "./courses/n8n/index.html",
        ),
        draft(
            "n8n-intermediate",
            "Intermediate n8n Course",
            "Take your n8n skills to the next level. Learn advanced automation patterns, error handling, and complex integrations.",
            "Automation",
            Difficulty::Intermediate,
            90,
            &[
                "automation",
                "no-code",
                "advanced-workflows",
                "error-handling",
                "complex-integrations",
                "n8n",
            ],
            4.9,
            743,
            true,
            true,
            "./courses/n8n-intermediate/index.html",
        ),
        draft(
            "n8n-advanced",
            "Advanced n8n Course",
            "Master enterprise-level n8n automation. Learn microservices integration, advanced security, custom nodes, and large-scale deployment strategies.",
            "Automation",
            Difficulty::Advanced,
            150,
            &[
                "automation",
                "enterprise",
                "microservices",
                "security",
                "custom-nodes",
                "deployment",
                "n8n-expert",
            ],
            4.95,
            389,
            true,
            true,
            "./courses/n8n-advanced/index.html",
        ),
        draft(
            "zapier-automation",
            "Zapier Automation Mastery",
            "Learn to automate your workflow with Zapier. Connect apps and automate repetitive tasks.",
            "Automation",
            Difficulty::Beginner,
            60,
            &["automation", "zapier", "integration", "productivity"],
            4.6,
            892,
            false,
            false,
            "#coming-soon",
        ),
        draft(
            "python-basics",
            "Python Programming Fundamentals",
            "Start your coding journey with Python. Learn the basics of programming and build real projects.",
            "Programming",
            Difficulty::Beginner,
            120,
            &["python", "programming", "coding", "fundamentals"],
            4.9,
            2341,
            true,
            false,
            "#coming-soon",
        ),
        draft(
            "react-fundamentals",
            "React.js Fundamentals",
            "Build modern web applications with React. Learn components, state management, and hooks.",
            "Web Development",
            Difficulty::Intermediate,
            150,
            &["react", "javascript", "web-development", "frontend"],
            4.7,
            1876,
            false,
            false,
            "#coming-soon",
        ),
        draft(
            "data-analysis",
            "Data Analysis with Excel",
            "Master data analysis techniques using Microsoft Excel. From basics to advanced analytics.",
            "Data Science",
            Difficulty::Beginner,
            90,
            &["excel", "data-analysis", "spreadsheets", "business"],
            4.5,
            1543,
            false,
            false,
            "#coming-soon",
        ),
        draft(
            "machine-learning",
            "Introduction to Machine Learning",
            "Discover the world of AI and machine learning. Build your first predictive models.",
            "Data Science",
            Difficulty::Intermediate,
            180,
            &["machine-learning", "ai", "python", "data-science"],
            4.8,
            987,
            false,
            false,
            "#coming-soon",
        ),
    ]
}
