// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Parents, kid profiles and the leaderboard

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{new_id, now_ts, parse_ts, Database};
use crate::locale::Locale;
use crate::progression::LevelProgress;
use crate::{CeriaError, Result};

/// A parent account; the only authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// A learner profile owned by a parent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kid {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub locale: Locale,
    pub level: u32,
    pub total_xp: u64,
    pub created_at: DateTime<Utc>,
}

impl Kid {
    pub fn level_progress(&self) -> LevelProgress {
        LevelProgress::from_xp(self.total_xp)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewKid {
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub locale: Locale,
}

/// Public leaderboard row; carries nothing that identifies the parent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub kid_id: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub level: u32,
    pub total_xp: u64,
}

const KID_COLUMNS: &str = "id, parent_id, name, avatar_url, locale, level, total_xp, created_at";

fn kid_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Kid> {
    let created: String = row.get(7)?;
    Ok(Kid {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        name: row.get(2)?,
        avatar_url: row.get(3)?,
        locale: row.get(4)?,
        level: row.get(5)?,
        total_xp: row.get::<_, i64>(6)?.max(0) as u64,
        created_at: parse_ts(&created),
    })
}

/// Hash stored for a bearer token
pub fn hash_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

fn generate_token() -> String {
    format!("ceria_{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

impl Database {
    /// Register a parent; the returned token is only ever shown once
    pub fn create_parent(&self, email: &str, display_name: &str) -> Result<(Parent, String)> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(CeriaError::Invalid(format!("'{}' is not an email address", email)));
        }
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(CeriaError::Invalid("display name must not be empty".into()));
        }

        let conn = self.lock_conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM parents WHERE email = ?1)",
            params![email],
            |row| row.get(0),
        )?;
        if exists {
            return Err(CeriaError::Invalid(format!("a parent with email {} already exists", email)));
        }

        let token = generate_token();
        let created_at = now_ts();
        let parent = Parent {
            id: new_id(),
            email,
            display_name: display_name.to_string(),
            created_at: parse_ts(&created_at),
        };

        conn.execute(
            "INSERT INTO parents (id, email, display_name, token_hash, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![parent.id, parent.email, parent.display_name, hash_token(&token), created_at],
        )?;
        Ok((parent, token))
    }

    /// Resolve a bearer token to its parent
    pub fn parent_by_token(&self, token: &str) -> Result<Option<Parent>> {
        let conn = self.lock_conn()?;
        conn.query_row(
            "SELECT id, email, display_name, created_at FROM parents WHERE token_hash = ?1",
            params![hash_token(token)],
            |row| {
                let created: String = row.get(3)?;
                Ok(Parent {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    display_name: row.get(2)?,
                    created_at: parse_ts(&created),
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn create_kid(&self, parent_id: &str, new_kid: &NewKid) -> Result<Kid> {
        let name = new_kid.name.trim();
        if name.is_empty() {
            return Err(CeriaError::Invalid("kid name must not be empty".into()));
        }

        let created_at = now_ts();
        let kid = Kid {
            id: new_id(),
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            avatar_url: new_kid.avatar_url.clone(),
            locale: new_kid.locale,
            level: 1,
            total_xp: 0,
            created_at: parse_ts(&created_at),
        };

        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT INTO kids (id, parent_id, name, avatar_url, locale, level, total_xp, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, 1, 0, ?6)"#,
            params![kid.id, kid.parent_id, kid.name, kid.avatar_url, kid.locale, created_at],
        )?;
        Ok(kid)
    }

    pub fn list_kids(&self, parent_id: &str) -> Result<Vec<Kid>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM kids WHERE parent_id = ?1 ORDER BY created_at",
            KID_COLUMNS
        ))?;
        let kids = stmt
            .query_map(params![parent_id], kid_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(kids)
    }

    /// Every kid, for admin tooling
    pub fn list_all_kids(&self) -> Result<Vec<Kid>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM kids ORDER BY created_at", KID_COLUMNS))?;
        let kids = stmt
            .query_map([], kid_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(kids)
    }

    /// Fetch a kid only if it belongs to `parent_id`
    pub fn get_owned_kid(&self, parent_id: &str, kid_id: &str) -> Result<Option<Kid>> {
        let conn = self.lock_conn()?;
        conn.query_row(
            &format!("SELECT {} FROM kids WHERE id = ?1 AND parent_id = ?2", KID_COLUMNS),
            params![kid_id, parent_id],
            kid_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn get_kid(&self, kid_id: &str) -> Result<Option<Kid>> {
        let conn = self.lock_conn()?;
        conn.query_row(
            &format!("SELECT {} FROM kids WHERE id = ?1", KID_COLUMNS),
            params![kid_id],
            kid_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Delete a kid and everything it owns; false if not owned by `parent_id`
    pub fn delete_kid(&self, parent_id: &str, kid_id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let removed = conn.execute(
            "DELETE FROM kids WHERE id = ?1 AND parent_id = ?2",
            params![kid_id, parent_id],
        )?;
        Ok(removed > 0)
    }

    pub fn set_kid_avatar(&self, kid_id: &str, avatar_url: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("UPDATE kids SET avatar_url = ?1 WHERE id = ?2", params![avatar_url, kid_id])?;
        Ok(())
    }

    /// Global ranking by XP; ties go to the higher level, then the older profile
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, name, avatar_url, level, total_xp FROM kids
               ORDER BY total_xp DESC, level DESC, created_at ASC LIMIT ?1"#,
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, (kid_id, name, avatar_url, level, xp))| LeaderboardEntry {
                rank: i as u32 + 1,
                kid_id,
                name,
                avatar_url,
                level,
                total_xp: xp.max(0) as u64,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent(db: &Database, email: &str) -> (Parent, String) {
        db.create_parent(email, "Parent").unwrap()
    }

    fn kid(db: &Database, parent_id: &str, name: &str) -> Kid {
        db.create_kid(parent_id, &NewKid { name: name.into(), avatar_url: None, locale: Locale::Ms })
            .unwrap()
    }

    #[test]
    fn test_token_resolves_to_parent() {
        let db = Database::in_memory().unwrap();
        let (p, token) = parent(&db, "Ayah@Example.my");
        assert_eq!(p.email, "ayah@example.my");

        let found = db.parent_by_token(&token).unwrap().unwrap();
        assert_eq!(found.id, p.id);
        assert!(db.parent_by_token("ceria_wrong").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = Database::in_memory().unwrap();
        parent(&db, "a@b.my");
        assert!(matches!(db.create_parent("A@B.my", "x"), Err(CeriaError::Invalid(_))));
    }

    #[test]
    fn test_token_stored_hashed() {
        let db = Database::in_memory().unwrap();
        let (_, token) = parent(&db, "a@b.my");
        let conn = db.lock_conn().unwrap();
        let stored: String = conn.query_row("SELECT token_hash FROM parents", [], |r| r.get(0)).unwrap();
        assert_ne!(stored, token);
        assert_eq!(stored, hash_token(&token));
    }

    #[test]
    fn test_kid_ownership() {
        let db = Database::in_memory().unwrap();
        let (a, _) = parent(&db, "a@b.my");
        let (b, _) = parent(&db, "b@b.my");
        let k = kid(&db, &a.id, "Ali");

        assert!(db.get_owned_kid(&a.id, &k.id).unwrap().is_some());
        assert!(db.get_owned_kid(&b.id, &k.id).unwrap().is_none());
        assert!(db.list_kids(&b.id).unwrap().is_empty());
        assert!(!db.delete_kid(&b.id, &k.id).unwrap());
        assert!(db.delete_kid(&a.id, &k.id).unwrap());
        assert!(db.get_kid(&k.id).unwrap().is_none());
    }

    #[test]
    fn test_new_kid_starts_at_level_one() {
        let db = Database::in_memory().unwrap();
        let (a, _) = parent(&db, "a@b.my");
        let k = kid(&db, &a.id, "  Mei Ling ");
        assert_eq!(k.name, "Mei Ling");
        assert_eq!(k.level, 1);
        assert_eq!(k.total_xp, 0);
        assert!(db.create_kid(&a.id, &NewKid { name: " ".into(), avatar_url: None, locale: Locale::Zh }).is_err());
    }

    #[test]
    fn test_leaderboard_order() {
        let db = Database::in_memory().unwrap();
        let (a, _) = parent(&db, "a@b.my");
        let k1 = kid(&db, &a.id, "One");
        let k2 = kid(&db, &a.id, "Two");
        let k3 = kid(&db, &a.id, "Three");
        {
            let conn = db.lock_conn().unwrap();
            conn.execute("UPDATE kids SET total_xp = 300, level = 3 WHERE id = ?1", params![k2.id]).unwrap();
            conn.execute("UPDATE kids SET total_xp = 120, level = 2 WHERE id = ?1", params![k3.id]).unwrap();
        }

        let board = db.leaderboard(10).unwrap();
        let ids: Vec<_> = board.iter().map(|e| e.kid_id.as_str()).collect();
        assert_eq!(ids, vec![k2.id.as_str(), k3.id.as_str(), k1.id.as_str()]);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[2].rank, 3);

        assert_eq!(db.leaderboard(1).unwrap().len(), 1);
    }
}
