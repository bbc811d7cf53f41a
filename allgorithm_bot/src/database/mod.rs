use std::{str::FromStr, sync::atomic::AtomicBool};

pub use sqlx::Error;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Executor, Row, Sqlite,
};
use teloxide::types::{User, UserId};

use crate::speed_dating::{Gender, Registration};

type Pool = sqlx::Pool<Sqlite>;
const DB_PATH: &str = "sqlite:allgorithm.sqlite";
static WAS_CONSTRUCTED: AtomicBool = AtomicBool::new(false);

/// An event of the club, as far as this bot cares.
#[allow(dead_code)] // Intentionally allow unused fields here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    /// Game format, like "fast_dates".
    pub kind: String,
    pub date_string: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Paid bookings of an event, turned into registrations.
#[derive(Debug, Clone, Default)]
pub struct PaidRegistrations {
    /// In booking order.
    pub registrations: Vec<Registration>,
    /// Names of people whose gender in their profile makes no sense.
    /// They're not in `registrations`.
    pub unknown_gender: Vec<String>,
}

pub struct Database {
    pool: Pool,
}

impl Database {
    pub async fn new() -> Result<Self, Error> {
        assert!(
            !WAS_CONSTRUCTED.swap(true, std::sync::atomic::Ordering::SeqCst),
            "Second database was constructed. This is not allowed."
        );

        if !Sqlite::database_exists(DB_PATH).await.unwrap_or(false) {
            Sqlite::create_database(DB_PATH).await?;
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(32)
            .connect_with(
                SqliteConnectOptions::from_str(DB_PATH)?
                    .pragma("cache_size", "-32768")
                    .busy_timeout(std::time::Duration::from_secs(600)),
            )
            .await?;

        Self::with_pool(pool).await
    }

    /// Fresh empty database living in memory. Only one connection, since
    /// every connection to `:memory:` would get its own database.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: Pool) -> Result<Self, Error> {
        // USERS:
        // id (key, i64)
        // telegram_id (i64 because sqlite doesn't support u64)
        // username (without the @, may be NULL)
        // first_name (from telegram, may be NULL)
        // name (filled in by the questionnaire, may be NULL)
        // gender ("female"/"male", or whatever the questionnaire wrote; may be NULL)
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY NOT NULL,
                telegram_id INTEGER NOT NULL UNIQUE,
                username TEXT NULL,
                first_name TEXT NULL,
                name TEXT NULL,
                gender TEXT NULL
            ) STRICT;",
        ))
        .await?;

        // EVENTS:
        // id (key, i64)
        // type (game format, string)
        // date_string (human readable, may be NULL)
        // description (may be NULL)
        // is_active (0 for no, 1 for yes)
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY NOT NULL,
                type TEXT NOT NULL,
                date_string TEXT NULL,
                description TEXT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            ) STRICT;",
        ))
        .await?;

        // BOOKINGS:
        // id (key, i64; order of booking)
        // user_id (users.id)
        // event_id (events.id)
        // paid (0 for no, 1 for yes)
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS bookings (
                id INTEGER PRIMARY KEY NOT NULL,
                user_id INTEGER NOT NULL,
                event_id INTEGER NOT NULL,
                paid INTEGER NOT NULL DEFAULT 0
            ) STRICT;",
        ))
        .await?;

        let _ = sqlx::query("CREATE INDEX bookings_event_id ON bookings(event_id);")
            .execute(&pool)
            .await;

        Ok(Database { pool })
    }

    /// People with paid bookings for the event, in booking order.
    ///
    /// A person's name is their questionnaire name, or their Telegram first
    /// name, or "Participant".
    pub async fn paid_registrations(&self, event_id: i64) -> Result<PaidRegistrations, Error> {
        let rows = sqlx::query(
            "SELECT users.telegram_id, users.username, users.first_name, users.name, users.gender
            FROM bookings
            JOIN users ON users.id = bookings.user_id
            WHERE bookings.event_id = ? AND bookings.paid = 1
            ORDER BY bookings.id;",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        let mut output = PaidRegistrations::default();

        for row in rows {
            let display_name = row
                .get::<Option<String>, _>("name")
                .filter(|name| !name.trim().is_empty())
                .or_else(|| row.get::<Option<String>, _>("first_name"))
                .unwrap_or_else(|| "Participant".to_string());

            let gender = row
                .get::<Option<String>, _>("gender")
                .as_deref()
                .and_then(Gender::from_profile);

            let Some(gender) = gender else {
                log::warn!("{display_name} booked event {event_id} but has no usable gender");
                output.unknown_gender.push(display_name);
                continue;
            };

            output.registrations.push(Registration {
                identity: UserId(row.get::<i64, _>("telegram_id") as u64),
                gender,
                display_name,
                contact_handle: row.get("username"),
            });
        }

        Ok(output)
    }

    pub async fn get_event(&self, event_id: i64) -> Result<Option<Event>, Error> {
        sqlx::query(
            "SELECT id, type, date_string, description, is_active FROM events WHERE id = ?;",
        )
        .bind(event_id)
        .map(|row: SqliteRow| Event {
            id: row.get("id"),
            kind: row.get("type"),
            date_string: row.get("date_string"),
            description: row.get("description"),
            is_active: row.get::<i64, _>("is_active") != 0,
        })
        .fetch_optional(&self.pool)
        .await
    }

    /// Remember this Telegram user, or refresh their username and first name.
    pub async fn upsert_user(&self, user: &User) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO users(telegram_id, username, first_name)
            VALUES (?, ?, ?)
        ON CONFLICT(telegram_id) DO
            UPDATE SET username=excluded.username, first_name=excluded.first_name;",
        )
        .bind(user.id.0 as i64)
        .bind(user.username.as_deref())
        .bind(user.first_name.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns `false` if there's no such user.
    pub async fn set_gender(&self, user: UserId, gender: Gender) -> Result<bool, Error> {
        let result = sqlx::query("UPDATE users SET gender=? WHERE telegram_id=?;")
            .bind(gender.as_profile_str())
            .bind(user.0 as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
