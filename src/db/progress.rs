// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Per-kid activity progress and reward settlement

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Transaction};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

use super::{now_ts, parse_ts, Database};
use crate::progression::{level_for_xp, stars_for_score, MAX_SCORE};
use crate::{CeriaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Locked,
    Available,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Locked => "locked",
            ProgressStatus::Available => "available",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }
}

impl FromStr for ProgressStatus {
    type Err = CeriaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "locked" => Ok(ProgressStatus::Locked),
            "available" => Ok(ProgressStatus::Available),
            "in_progress" => Ok(ProgressStatus::InProgress),
            "completed" => Ok(ProgressStatus::Completed),
            other => Err(CeriaError::Invalid(format!("unknown progress status '{}'", other))),
        }
    }
}

/// Status shown for an activity given its stored row and its predecessor
pub fn resolve_status(previous_completed: bool, stored: Option<ProgressStatus>) -> ProgressStatus {
    match stored {
        Some(status) => status,
        None if previous_completed => ProgressStatus::Available,
        None => ProgressStatus::Locked,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KidProgress {
    pub kid_id: String,
    pub activity_id: String,
    pub status: ProgressStatus,
    pub score: Option<u32>,
    pub stars: Option<u8>,
    pub attempts: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of completing an activity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub activity_id: String,
    pub score: u32,
    pub stars: u8,
    pub attempts: u32,
    pub first_completion: bool,
    pub xp_gained: u64,
    pub total_xp: u64,
    pub previous_level: u32,
    pub level: u32,
    pub leveled_up: bool,
    /// Equipment newly added to the inventory
    pub equipment_reward: Option<String>,
    /// Pet newly granted for finishing the theme
    pub pet_reward: Option<String>,
    pub theme_completed: bool,
}

const PROGRESS_COLUMNS: &str =
    "kid_id, activity_id, status, score, stars, attempts, started_at, completed_at, updated_at";

fn progress_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<KidProgress> {
    let started: Option<String> = row.get(6)?;
    let completed: Option<String> = row.get(7)?;
    let updated: String = row.get(8)?;
    Ok(KidProgress {
        kid_id: row.get(0)?,
        activity_id: row.get(1)?,
        status: row.get(2)?,
        score: row.get(3)?,
        stars: row.get(4)?,
        attempts: row.get(5)?,
        started_at: started.as_deref().map(parse_ts),
        completed_at: completed.as_deref().map(parse_ts),
        updated_at: parse_ts(&updated),
    })
}

struct ActivityRewards {
    theme_id: String,
    sort_order: i64,
    xp_reward: u32,
    equipment_reward_id: Option<String>,
}

fn activity_rewards(tx: &Transaction<'_>, activity_id: &str) -> Result<ActivityRewards> {
    tx.query_row(
        "SELECT theme_id, sort_order, xp_reward, equipment_reward_id FROM activities WHERE id = ?1",
        params![activity_id],
        |row| {
            Ok(ActivityRewards {
                theme_id: row.get(0)?,
                sort_order: row.get(1)?,
                xp_reward: row.get(2)?,
                equipment_reward_id: row.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CeriaError::NotFound(format!("activity {}", activity_id)))
}

fn stored_status(tx: &Transaction<'_>, kid_id: &str, activity_id: &str) -> Result<Option<ProgressStatus>> {
    tx.query_row(
        "SELECT status FROM kid_progress WHERE kid_id = ?1 AND activity_id = ?2",
        params![kid_id, activity_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

/// An activity is open when it is first in its theme or its predecessor is completed
fn predecessor_completed(
    tx: &Transaction<'_>,
    kid_id: &str,
    activity_id: &str,
    rewards: &ActivityRewards,
) -> Result<bool> {
    let previous: Option<String> = tx
        .query_row(
            r#"SELECT id FROM activities
               WHERE theme_id = ?1 AND (sort_order < ?2 OR (sort_order = ?2 AND id < ?3))
               ORDER BY sort_order DESC, id DESC LIMIT 1"#,
            params![rewards.theme_id, rewards.sort_order, activity_id],
            |row| row.get(0),
        )
        .optional()?;

    match previous {
        None => Ok(true),
        Some(prev) => Ok(stored_status(tx, kid_id, &prev)? == Some(ProgressStatus::Completed)),
    }
}

impl Database {
    pub fn progress_for_kid(&self, kid_id: &str) -> Result<Vec<KidProgress>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM kid_progress WHERE kid_id = ?1 ORDER BY updated_at DESC",
            PROGRESS_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![kid_id], progress_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn progress_for_theme(&self, kid_id: &str, theme_id: &str) -> Result<Vec<KidProgress>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT p.kid_id, p.activity_id, p.status, p.score, p.stars, p.attempts,
                      p.started_at, p.completed_at, p.updated_at
               FROM kid_progress p JOIN activities a ON a.id = p.activity_id
               WHERE p.kid_id = ?1 AND a.theme_id = ?2"#,
        )?;
        let rows = stmt
            .query_map(params![kid_id, theme_id], progress_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_progress(&self, kid_id: &str, activity_id: &str) -> Result<Option<KidProgress>> {
        let conn = self.lock_conn()?;
        conn.query_row(
            &format!("SELECT {} FROM kid_progress WHERE kid_id = ?1 AND activity_id = ?2", PROGRESS_COLUMNS),
            params![kid_id, activity_id],
            progress_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Record a visit: creates the row on first visit and moves it to `in_progress`.
    /// Completed rows stay completed.
    pub fn start_activity(&self, kid_id: &str, activity_id: &str) -> Result<KidProgress> {
        {
            let mut conn = self.lock_conn()?;
            let tx = conn.transaction()?;
            let rewards = activity_rewards(&tx, activity_id)?;
            let now = now_ts();

            match stored_status(&tx, kid_id, activity_id)? {
                Some(ProgressStatus::Completed) | Some(ProgressStatus::InProgress) => {}
                Some(ProgressStatus::Available) => {
                    tx.execute(
                        r#"UPDATE kid_progress SET status = 'in_progress', started_at = ?3, updated_at = ?3
                           WHERE kid_id = ?1 AND activity_id = ?2"#,
                        params![kid_id, activity_id, now],
                    )?;
                }
                Some(ProgressStatus::Locked) | None => {
                    if !predecessor_completed(&tx, kid_id, activity_id, &rewards)? {
                        return Err(CeriaError::ActivityLocked(activity_id.to_string()));
                    }
                    tx.execute(
                        r#"INSERT INTO kid_progress (kid_id, activity_id, status, attempts, started_at, updated_at)
                           VALUES (?1, ?2, 'in_progress', 0, ?3, ?3)
                           ON CONFLICT(kid_id, activity_id) DO UPDATE SET status = 'in_progress',
                               started_at = excluded.started_at, updated_at = excluded.updated_at"#,
                        params![kid_id, activity_id, now],
                    )?;
                }
            }
            tx.commit()?;
        }

        debug!("Kid {} started activity {}", kid_id, activity_id);
        self.get_progress(kid_id, activity_id)?
            .ok_or_else(|| CeriaError::NotFound(format!("progress for activity {}", activity_id)))
    }

    /// Settle a finished activity: progress row, XP and level, equipment, theme pet.
    ///
    /// All writes share one transaction. A replay of a completed activity
    /// overwrites score and stars; it only earns XP again when `replay_xp`.
    pub fn complete_activity(
        &self,
        kid_id: &str,
        activity_id: &str,
        score: u32,
        replay_xp: bool,
    ) -> Result<Settlement> {
        if score > MAX_SCORE {
            return Err(CeriaError::Invalid(format!("score {} is outside 0-{}", score, MAX_SCORE)));
        }
        let stars = stars_for_score(score);

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let rewards = activity_rewards(&tx, activity_id)?;
        let now = now_ts();

        let (old_xp, previous_level): (i64, u32) = tx
            .query_row(
                "SELECT total_xp, level FROM kids WHERE id = ?1",
                params![kid_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| CeriaError::NotFound(format!("kid {}", kid_id)))?;

        let previous = stored_status(&tx, kid_id, activity_id)?;
        if previous.is_none() && !predecessor_completed(&tx, kid_id, activity_id, &rewards)? {
            return Err(CeriaError::ActivityLocked(activity_id.to_string()));
        }
        let first_completion = previous != Some(ProgressStatus::Completed);

        tx.execute(
            r#"INSERT INTO kid_progress
                   (kid_id, activity_id, status, score, stars, attempts, started_at, completed_at, updated_at)
               VALUES (?1, ?2, 'completed', ?3, ?4, 1, ?5, ?5, ?5)
               ON CONFLICT(kid_id, activity_id) DO UPDATE SET status = 'completed',
                   score = excluded.score, stars = excluded.stars, attempts = attempts + 1,
                   completed_at = excluded.completed_at, updated_at = excluded.updated_at"#,
            params![kid_id, activity_id, score, stars, now],
        )?;
        let attempts: u32 = tx.query_row(
            "SELECT attempts FROM kid_progress WHERE kid_id = ?1 AND activity_id = ?2",
            params![kid_id, activity_id],
            |row| row.get(0),
        )?;

        let xp_gained = if first_completion || replay_xp { rewards.xp_reward as u64 } else { 0 };
        let total_xp = old_xp.max(0) as u64 + xp_gained;
        let level = level_for_xp(total_xp);
        tx.execute(
            "UPDATE kids SET total_xp = ?1, level = ?2 WHERE id = ?3",
            params![total_xp as i64, level, kid_id],
        )?;

        let equipment_reward = match &rewards.equipment_reward_id {
            Some(equipment_id) => {
                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO kid_inventory (kid_id, equipment_id, acquired_at) VALUES (?1, ?2, ?3)",
                    params![kid_id, equipment_id, now],
                )?;
                (inserted == 1).then(|| equipment_id.clone())
            }
            None => None,
        };

        let remaining: i64 = tx.query_row(
            r#"SELECT COUNT(*) FROM activities a
               WHERE a.theme_id = ?1 AND NOT EXISTS (
                   SELECT 1 FROM kid_progress p
                   WHERE p.activity_id = a.id AND p.kid_id = ?2 AND p.status = 'completed')"#,
            params![rewards.theme_id, kid_id],
            |row| row.get(0),
        )?;
        let theme_completed = remaining == 0;

        let pet_reward = if theme_completed {
            let pet_id: Option<String> = tx.query_row(
                "SELECT pet_reward_id FROM themes WHERE id = ?1",
                params![rewards.theme_id],
                |row| row.get(0),
            )?;
            match pet_id {
                Some(pet_id) => {
                    let inserted = tx.execute(
                        "INSERT OR IGNORE INTO kid_pets (kid_id, pet_id, acquired_at) VALUES (?1, ?2, ?3)",
                        params![kid_id, pet_id, now],
                    )?;
                    (inserted == 1).then_some(pet_id)
                }
                None => None,
            }
        } else {
            None
        };

        tx.commit()?;

        let settlement = Settlement {
            activity_id: activity_id.to_string(),
            score,
            stars,
            attempts,
            first_completion,
            xp_gained,
            total_xp,
            previous_level,
            level,
            leveled_up: level > previous_level,
            equipment_reward,
            pet_reward,
            theme_completed,
        };

        info!(
            "Kid {} completed {} ({} stars, +{} XP, level {})",
            kid_id, activity_id, stars, xp_gained, level
        );
        if let Some(ref pet) = settlement.pet_reward {
            info!("Kid {} earned pet {} for theme {}", kid_id, pet, rewards.theme_id);
        }
        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seeded;
    use crate::db::{Activity, Kid};

    fn first_theme(db: &Database) -> (String, Vec<Activity>) {
        let theme = db.list_themes("bahasa-melayu").unwrap().remove(0);
        let activities = db.list_activities(&theme.id).unwrap();
        (theme.id, activities)
    }

    fn reload(db: &Database, kid: &Kid) -> Kid {
        db.get_kid(&kid.id).unwrap().unwrap()
    }

    #[test]
    fn test_resolve_status() {
        assert_eq!(resolve_status(true, None), ProgressStatus::Available);
        assert_eq!(resolve_status(false, None), ProgressStatus::Locked);
        assert_eq!(resolve_status(false, Some(ProgressStatus::Completed)), ProgressStatus::Completed);
    }

    #[test]
    fn test_start_creates_row_lazily() {
        let (db, _, kid) = seeded();
        let (_, activities) = first_theme(&db);
        assert!(db.get_progress(&kid.id, &activities[0].id).unwrap().is_none());

        let p = db.start_activity(&kid.id, &activities[0].id).unwrap();
        assert_eq!(p.status, ProgressStatus::InProgress);
        assert_eq!(p.attempts, 0);
        assert!(p.started_at.is_some());
    }

    #[test]
    fn test_locked_activity_cannot_start() {
        let (db, _, kid) = seeded();
        let (_, activities) = first_theme(&db);
        let err = db.start_activity(&kid.id, &activities[1].id).unwrap_err();
        assert!(matches!(err, CeriaError::ActivityLocked(_)));

        db.complete_activity(&kid.id, &activities[0].id, 70, false).unwrap();
        assert!(db.start_activity(&kid.id, &activities[1].id).is_ok());
    }

    #[test]
    fn test_completion_awards_xp_and_level() {
        let (db, _, kid) = seeded();
        let (_, activities) = first_theme(&db);
        let a = &activities[0];

        let s = db.complete_activity(&kid.id, &a.id, 85, false).unwrap();
        assert_eq!(s.stars, 3);
        assert!(s.first_completion);
        assert_eq!(s.xp_gained, a.xp_reward as u64);
        assert_eq!(s.total_xp, a.xp_reward as u64);
        assert_eq!(s.level, level_for_xp(s.total_xp));

        let k = reload(&db, &kid);
        assert_eq!(k.total_xp, s.total_xp);
        assert_eq!(k.level, s.level);

        let p = db.get_progress(&kid.id, &a.id).unwrap().unwrap();
        assert_eq!(p.status, ProgressStatus::Completed);
        assert_eq!(p.score, Some(85));
        assert_eq!(p.stars, Some(3));
        assert_eq!(p.attempts, 1);
    }

    #[test]
    fn test_replay_overwrites_score_without_xp() {
        let (db, _, kid) = seeded();
        let (_, activities) = first_theme(&db);
        let a = &activities[0];

        let first = db.complete_activity(&kid.id, &a.id, 90, false).unwrap();
        let replay = db.complete_activity(&kid.id, &a.id, 40, false).unwrap();

        assert!(!replay.first_completion);
        assert_eq!(replay.xp_gained, 0);
        assert_eq!(replay.total_xp, first.total_xp);
        assert_eq!(replay.stars, 1);
        assert_eq!(replay.attempts, 2);

        let p = db.get_progress(&kid.id, &a.id).unwrap().unwrap();
        assert_eq!(p.status, ProgressStatus::Completed);
        assert_eq!(p.score, Some(40));
    }

    #[test]
    fn test_replay_xp_when_enabled() {
        let (db, _, kid) = seeded();
        let (_, activities) = first_theme(&db);
        let a = &activities[0];

        db.complete_activity(&kid.id, &a.id, 90, true).unwrap();
        let replay = db.complete_activity(&kid.id, &a.id, 90, true).unwrap();
        assert_eq!(replay.xp_gained, a.xp_reward as u64);
        assert_eq!(replay.total_xp, 2 * a.xp_reward as u64);
    }

    #[test]
    fn test_xp_never_decreases() {
        let (db, _, kid) = seeded();
        let (_, activities) = first_theme(&db);
        let mut last = 0;
        for a in &activities {
            for score in [30, 100, 10] {
                let s = db.complete_activity(&kid.id, &a.id, score, false).unwrap();
                assert!(s.total_xp >= last);
                last = s.total_xp;
            }
        }
    }

    #[test]
    fn test_equipment_reward_granted_once() {
        let (db, _, kid) = seeded();
        let (_, activities) = first_theme(&db);
        let (idx, a) = activities
            .iter()
            .enumerate()
            .find(|(_, a)| a.equipment_reward_id.is_some())
            .expect("seed has an equipment reward in the first theme");
        for prev in &activities[..idx] {
            db.complete_activity(&kid.id, &prev.id, 80, false).unwrap();
        }

        let s = db.complete_activity(&kid.id, &a.id, 80, false).unwrap();
        assert_eq!(s.equipment_reward, a.equipment_reward_id);
        let again = db.complete_activity(&kid.id, &a.id, 80, false).unwrap();
        assert!(again.equipment_reward.is_none());
        assert_eq!(db.inventory(&kid.id).unwrap().len(), 1);
    }

    #[test]
    fn test_last_activity_grants_pet_exactly_once() {
        let (db, _, kid) = seeded();
        let (theme_id, activities) = first_theme(&db);
        let pet = db.get_theme(&theme_id).unwrap().unwrap().pet_reward_id.unwrap();

        let (last, rest) = activities.split_last().unwrap();
        for a in rest {
            let s = db.complete_activity(&kid.id, &a.id, 65, false).unwrap();
            assert!(s.pet_reward.is_none());
            assert!(!s.theme_completed);
        }

        let s = db.complete_activity(&kid.id, &last.id, 65, false).unwrap();
        assert!(s.theme_completed);
        assert_eq!(s.pet_reward.as_deref(), Some(pet.as_str()));

        let replay = db.complete_activity(&kid.id, &last.id, 100, false).unwrap();
        assert!(replay.theme_completed);
        assert!(replay.pet_reward.is_none());
        assert_eq!(db.kid_pets(&kid.id).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_score_and_unknown_activity() {
        let (db, _, kid) = seeded();
        let (_, activities) = first_theme(&db);
        assert!(matches!(
            db.complete_activity(&kid.id, &activities[0].id, 101, false),
            Err(CeriaError::Invalid(_))
        ));
        assert!(matches!(
            db.complete_activity(&kid.id, "no-such-activity", 50, false),
            Err(CeriaError::NotFound(_))
        ));
        assert!(db.progress_for_kid(&kid.id).unwrap().is_empty());
    }
}
