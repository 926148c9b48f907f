//! # Database Module
//!
//! PostgreSQL access for users, the course catalog, ratings and relayed
//! support questions. All queries are raw and parameterized.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::catalog::{Course, CourseFilter};
use crate::rating::{RatingKind, Score};
use crate::support::PendingQuestion;

/// A bot user
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub full_name: String,
    pub position: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// A stored rating
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub rating_type: String,
    pub target: String,
    pub rating: i16,
    pub created_at: DateTime<Utc>,
}

const COURSE_COLUMNS: &str =
    "course_id AS id, title, description, duration_weeks, price, url, access, role, direction";

/// Open a connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!(max_connections, "Connecting to database");
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id BIGINT PRIMARY KEY,
            username TEXT,
            full_name TEXT NOT NULL,
            position TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_activity TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS courses (
            course_id SERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            duration_weeks INTEGER,
            price INTEGER NOT NULL DEFAULT 0,
            url TEXT,
            access TEXT NOT NULL DEFAULT 'open' CHECK (access IN ('open', 'limited')),
            role TEXT NOT NULL,
            direction TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create courses table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS ratings (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL,
            rating_type TEXT NOT NULL CHECK (rating_type IN ('course', 'teacher')),
            target TEXT NOT NULL,
            rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create ratings table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS support_questions (
            id BIGSERIAL PRIMARY KEY,
            user_chat_id BIGINT NOT NULL,
            username TEXT,
            question TEXT NOT NULL,
            support_message_id INTEGER NOT NULL,
            answer TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
            answered_at TIMESTAMPTZ
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create support_questions table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_support_questions_message
         ON support_questions (support_message_id)",
    )
    .execute(pool)
    .await
    .context("Failed to create support_questions index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Insert or refresh a user. An already stored position is never overwritten.
pub async fn save_user(
    pool: &PgPool,
    telegram_id: i64,
    username: Option<&str>,
    full_name: &str,
    position: Option<&str>,
) -> Result<()> {
    debug!(telegram_id, "Saving user");

    sqlx::query(
        "INSERT INTO users (telegram_id, username, full_name, position)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (telegram_id) DO UPDATE
         SET username = EXCLUDED.username,
             full_name = EXCLUDED.full_name,
             position = COALESCE(users.position, EXCLUDED.position),
             last_activity = CURRENT_TIMESTAMP",
    )
    .bind(telegram_id)
    .bind(username)
    .bind(full_name)
    .bind(position)
    .execute(pool)
    .await
    .context("Failed to save user")?;

    Ok(())
}

pub async fn get_user(pool: &PgPool, telegram_id: i64) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        "SELECT telegram_id, username, full_name, position, created_at, last_activity
         FROM users WHERE telegram_id = $1",
    )
    .bind(telegram_id)
    .fetch_optional(pool)
    .await
    .context("Failed to read user")
}

pub async fn get_user_position(pool: &PgPool, telegram_id: i64) -> Result<Option<String>> {
    let position: Option<Option<String>> =
        sqlx::query_scalar("SELECT position FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .fetch_optional(pool)
            .await
            .context("Failed to read user position")?;

    Ok(position.flatten())
}

/// Store `position` for a known user that has none yet. Returns whether a row changed.
pub async fn update_user_position(pool: &PgPool, telegram_id: i64, position: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET position = $2, last_activity = CURRENT_TIMESTAMP
         WHERE telegram_id = $1 AND position IS NULL",
    )
    .bind(telegram_id)
    .bind(position)
    .execute(pool)
    .await
    .context("Failed to update user position")?;

    Ok(result.rows_affected() > 0)
}

/// Courses matching a catalog filter, ordered by title
pub async fn get_courses_by_filter(pool: &PgPool, filter: CourseFilter) -> Result<Vec<Course>> {
    let column = match filter {
        CourseFilter::Direction(_) => "direction",
        CourseFilter::Role(_) => "role",
        CourseFilter::Access(_) => "access",
    };
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE {column} = $1 ORDER BY title");

    let courses = sqlx::query_as::<_, Course>(&sql)
        .bind(filter.as_key())
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to load courses for filter {filter}"))?;

    debug!(filter = %filter, count = courses.len(), "Loaded courses");
    Ok(courses)
}

pub async fn get_all_courses(pool: &PgPool) -> Result<Vec<Course>> {
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY title");
    sqlx::query_as::<_, Course>(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to load courses")
}

/// The first `limit` courses by title, offered on the rating screen
pub async fn get_rateable_courses(pool: &PgPool, limit: i64) -> Result<Vec<Course>> {
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY title LIMIT $1");
    sqlx::query_as::<_, Course>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to load courses for rating")
}

pub async fn get_course_by_id(pool: &PgPool, course_id: i32) -> Result<Option<Course>> {
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = $1");
    sqlx::query_as::<_, Course>(&sql)
        .bind(course_id)
        .fetch_optional(pool)
        .await
        .context("Failed to load course")
}

/// Insert a course, returning its id
#[allow(clippy::too_many_arguments)]
pub async fn create_course(
    pool: &PgPool,
    title: &str,
    description: &str,
    duration_weeks: Option<i32>,
    price: i32,
    url: Option<&str>,
    access: &str,
    role: &str,
    direction: &str,
) -> Result<i32> {
    let id = sqlx::query_scalar(
        "INSERT INTO courses (title, description, duration_weeks, price, url, access, role, direction)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING course_id",
    )
    .bind(title)
    .bind(description)
    .bind(duration_weeks)
    .bind(price)
    .bind(url)
    .bind(access)
    .bind(role)
    .bind(direction)
    .fetch_one(pool)
    .await
    .context("Failed to insert course")?;

    Ok(id)
}

pub async fn save_rating(
    pool: &PgPool,
    user_id: i64,
    kind: RatingKind,
    target: &str,
    score: Score,
) -> Result<i64> {
    info!(user_id, rating_type = %kind, score = score.value(), "Saving rating");

    let id = sqlx::query_scalar(
        "INSERT INTO ratings (user_id, rating_type, target, rating)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(target)
    .bind(i16::from(score.value()))
    .fetch_one(pool)
    .await
    .context("Failed to save rating")?;

    Ok(id)
}

pub async fn get_ratings_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Rating>> {
    sqlx::query_as::<_, Rating>(
        "SELECT id, user_id, rating_type, target, rating, created_at
         FROM ratings WHERE user_id = $1 ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to load ratings")
}

/// Persist a question relayed to the support chat
pub async fn record_support_question(
    pool: &PgPool,
    support_message_id: i32,
    question: &PendingQuestion,
) -> Result<i64> {
    let id = sqlx::query_scalar(
        "INSERT INTO support_questions (user_chat_id, username, question, support_message_id)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(question.user_chat_id)
    .bind(question.username.as_deref())
    .bind(&question.question)
    .bind(support_message_id)
    .fetch_one(pool)
    .await
    .context("Failed to record support question")?;

    Ok(id)
}

/// Unanswered question relayed as `support_message_id`, if any
pub async fn find_pending_question(pool: &PgPool, support_message_id: i32) -> Result<Option<PendingQuestion>> {
    let row: Option<(i64, Option<String>, String)> = sqlx::query_as(
        "SELECT user_chat_id, username, question FROM support_questions
         WHERE support_message_id = $1 AND answered_at IS NULL
         ORDER BY id DESC LIMIT 1",
    )
    .bind(support_message_id)
    .fetch_optional(pool)
    .await
    .context("Failed to look up support question")?;

    Ok(row.map(|(user_chat_id, username, question)| PendingQuestion {
        user_chat_id,
        username,
        question,
    }))
}

/// Store the support answer. Returns whether an open question was closed.
pub async fn record_support_answer(pool: &PgPool, support_message_id: i32, answer: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE support_questions SET answer = $2, answered_at = CURRENT_TIMESTAMP
         WHERE support_message_id = $1 AND answered_at IS NULL",
    )
    .bind(support_message_id)
    .bind(answer)
    .execute(pool)
    .await
    .context("Failed to record support answer")?;

    Ok(result.rows_affected() > 0)
}
