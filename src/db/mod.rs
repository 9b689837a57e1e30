// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Database module for accounts, curriculum, progress and rewards

pub mod accounts;
pub mod assets;
pub mod curriculum;
pub mod progress;
pub mod rewards;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::locale::{Locale, LocalizedText};
use crate::{CeriaError, Result};

pub use accounts::{Kid, LeaderboardEntry, NewKid, Parent};
pub use assets::{AssetKind, MediaAsset};
pub use curriculum::{Activity, ActivityKind, Subject, Theme};
pub use progress::{KidProgress, ProgressStatus, Settlement};
pub use rewards::{Equipment, Equipped, Pet, Slot};

/// Database manager for Ceria (thread-safe wrapper)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// Row counts per table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStats {
    pub parents: i64,
    pub kids: i64,
    pub subjects: i64,
    pub themes: i64,
    pub activities: i64,
    pub completed_activities: i64,
    pub equipment: i64,
    pub pets: i64,
    pub media_assets: i64,
}

impl Database {
    /// Open or create the database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.initialize()?;
        Ok(db)
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CeriaError::Config("Database lock poisoned".to_string()))
    }

    /// Initialize database schema
    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute_batch(r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS parents (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                token_hash TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kids (
                id TEXT PRIMARY KEY,
                parent_id TEXT NOT NULL REFERENCES parents(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                avatar_url TEXT,
                locale TEXT NOT NULL DEFAULT 'ms',
                level INTEGER NOT NULL DEFAULT 1,
                total_xp INTEGER NOT NULL DEFAULT 0 CHECK (total_xp >= 0),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS subjects (
                id TEXT PRIMARY KEY,
                title_ms TEXT NOT NULL,
                title_zh TEXT NOT NULL,
                title_en TEXT NOT NULL,
                icon TEXT,
                sort_order INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS equipment (
                id TEXT PRIMARY KEY,
                slot TEXT NOT NULL,
                rarity TEXT NOT NULL DEFAULT 'common',
                name_ms TEXT NOT NULL,
                name_zh TEXT NOT NULL,
                name_en TEXT NOT NULL,
                image_prompt TEXT NOT NULL,
                image_url TEXT
            );

            CREATE TABLE IF NOT EXISTS pets (
                id TEXT PRIMARY KEY,
                name_ms TEXT NOT NULL,
                name_zh TEXT NOT NULL,
                name_en TEXT NOT NULL,
                image_prompt TEXT NOT NULL,
                image_url TEXT
            );

            CREATE TABLE IF NOT EXISTS themes (
                id TEXT PRIMARY KEY,
                subject_id TEXT NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
                title_ms TEXT NOT NULL,
                title_zh TEXT NOT NULL,
                title_en TEXT NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                pet_reward_id TEXT REFERENCES pets(id)
            );

            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                theme_id TEXT NOT NULL REFERENCES themes(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                title_ms TEXT NOT NULL,
                title_zh TEXT NOT NULL,
                title_en TEXT NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                xp_reward INTEGER NOT NULL DEFAULT 0,
                equipment_reward_id TEXT REFERENCES equipment(id),
                content TEXT NOT NULL DEFAULT '{}'
            );

            CREATE TABLE IF NOT EXISTS kid_progress (
                kid_id TEXT NOT NULL REFERENCES kids(id) ON DELETE CASCADE,
                activity_id TEXT NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
                status TEXT NOT NULL,
                score INTEGER,
                stars INTEGER,
                attempts INTEGER NOT NULL DEFAULT 0,
                started_at TEXT,
                completed_at TEXT,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (kid_id, activity_id)
            );

            CREATE TABLE IF NOT EXISTS kid_inventory (
                kid_id TEXT NOT NULL REFERENCES kids(id) ON DELETE CASCADE,
                equipment_id TEXT NOT NULL REFERENCES equipment(id),
                acquired_at TEXT NOT NULL,
                PRIMARY KEY (kid_id, equipment_id)
            );

            CREATE TABLE IF NOT EXISTS kid_equipped (
                kid_id TEXT PRIMARY KEY REFERENCES kids(id) ON DELETE CASCADE,
                helmet TEXT,
                chestplate TEXT,
                leggings TEXT,
                boots TEXT,
                weapon TEXT,
                tool TEXT,
                ranged TEXT,
                shield TEXT,
                pet TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kid_pets (
                kid_id TEXT NOT NULL REFERENCES kids(id) ON DELETE CASCADE,
                pet_id TEXT NOT NULL REFERENCES pets(id),
                acquired_at TEXT NOT NULL,
                PRIMARY KEY (kid_id, pet_id)
            );

            CREATE TABLE IF NOT EXISTS media_assets (
                kind TEXT NOT NULL,
                asset_key TEXT NOT NULL,
                locale TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (kind, asset_key, locale)
            );

            CREATE INDEX IF NOT EXISTS idx_kids_parent ON kids(parent_id);
            CREATE INDEX IF NOT EXISTS idx_kids_xp ON kids(total_xp DESC);
            CREATE INDEX IF NOT EXISTS idx_themes_subject ON themes(subject_id, sort_order);
            CREATE INDEX IF NOT EXISTS idx_activities_theme ON activities(theme_id, sort_order);
        "#)?;
        Ok(())
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DbStats> {
        let conn = self.lock_conn()?;
        let count = |sql: &str| -> Result<i64> {
            conn.query_row(sql, [], |row| row.get(0)).map_err(Into::into)
        };
        Ok(DbStats {
            parents: count("SELECT COUNT(*) FROM parents")?,
            kids: count("SELECT COUNT(*) FROM kids")?,
            subjects: count("SELECT COUNT(*) FROM subjects")?,
            themes: count("SELECT COUNT(*) FROM themes")?,
            activities: count("SELECT COUNT(*) FROM activities")?,
            completed_activities: count("SELECT COUNT(*) FROM kid_progress WHERE status = 'completed'")?,
            equipment: count("SELECT COUNT(*) FROM equipment")?,
            pets: count("SELECT COUNT(*) FROM pets")?,
            media_assets: count("SELECT COUNT(*) FROM media_assets")?,
        })
    }

    /// Vacuum database
    pub fn vacuum(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("VACUUM", [])?;
        Ok(())
    }
}

/// Generate a new UUID for parent and kid records
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn now_ts() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn parse_ts(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Read three consecutive `*_ms`, `*_zh`, `*_en` columns
pub(crate) fn localized_at(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<LocalizedText> {
    Ok(LocalizedText {
        ms: row.get(first)?,
        zh: row.get(first + 1)?,
        en: row.get(first + 2)?,
    })
}

/// Enums stored as their lowercase text form
macro_rules! text_column {
    ($ty:ty, $as_str:ident) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.$as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
            }
        }
    };
}

text_column!(Locale, code);
text_column!(ActivityKind, as_str);
text_column!(ProgressStatus, as_str);
text_column!(Slot, as_str);
text_column!(AssetKind, as_str);
