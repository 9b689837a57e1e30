// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Subject → theme → activity hierarchy

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::progress::{resolve_status, ProgressStatus};
use super::{localized_at, Database};
use crate::locale::{Locale, LocalizedText};
use crate::{CeriaError, Result};

/// Kind of exercise an activity presents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Alphabet,
    Matching,
    Syllable,
    Writing,
    Speaking,
    Singing,
    Dictation,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Alphabet => "alphabet",
            ActivityKind::Matching => "matching",
            ActivityKind::Syllable => "syllable",
            ActivityKind::Writing => "writing",
            ActivityKind::Speaking => "speaking",
            ActivityKind::Singing => "singing",
            ActivityKind::Dictation => "dictation",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = CeriaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "alphabet" => Ok(ActivityKind::Alphabet),
            "matching" => Ok(ActivityKind::Matching),
            "syllable" => Ok(ActivityKind::Syllable),
            "writing" => Ok(ActivityKind::Writing),
            "speaking" => Ok(ActivityKind::Speaking),
            "singing" => Ok(ActivityKind::Singing),
            "dictation" => Ok(ActivityKind::Dictation),
            other => Err(CeriaError::Invalid(format!("unknown activity kind '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub title: LocalizedText,
    pub icon: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub subject_id: String,
    pub title: LocalizedText,
    pub sort_order: i64,
    pub pet_reward_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub theme_id: String,
    pub kind: ActivityKind,
    pub title: LocalizedText,
    pub sort_order: i64,
    pub xp_reward: u32,
    pub equipment_reward_id: Option<String>,
    pub content: serde_json::Value,
}

/// A theme with the kid's completion count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSummary {
    pub id: String,
    pub title: String,
    pub sort_order: i64,
    pub total_activities: u32,
    pub completed_activities: u32,
    pub pet_reward_id: Option<String>,
}

/// An activity with the kid's effective status
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    pub id: String,
    pub kind: ActivityKind,
    pub title: String,
    pub xp_reward: u32,
    pub status: ProgressStatus,
    pub stars: Option<u8>,
    pub score: Option<u32>,
}

const ACTIVITY_COLUMNS: &str =
    "id, theme_id, kind, title_ms, title_zh, title_en, sort_order, xp_reward, equipment_reward_id, content";

fn activity_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Activity> {
    let content: String = row.get(9)?;
    Ok(Activity {
        id: row.get(0)?,
        theme_id: row.get(1)?,
        kind: row.get(2)?,
        title: localized_at(row, 3)?,
        sort_order: row.get(6)?,
        xp_reward: row.get(7)?,
        equipment_reward_id: row.get(8)?,
        content: serde_json::from_str(&content).unwrap_or(serde_json::json!({})),
    })
}

fn theme_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Theme> {
    Ok(Theme {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        title: localized_at(row, 2)?,
        sort_order: row.get(5)?,
        pet_reward_id: row.get(6)?,
    })
}

impl Database {
    pub fn upsert_subject(&self, subject: &Subject) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT INTO subjects (id, title_ms, title_zh, title_en, icon, sort_order)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(id) DO UPDATE SET title_ms = excluded.title_ms, title_zh = excluded.title_zh,
                   title_en = excluded.title_en, icon = excluded.icon, sort_order = excluded.sort_order"#,
            params![
                subject.id,
                subject.title.ms,
                subject.title.zh,
                subject.title.en,
                subject.icon,
                subject.sort_order
            ],
        )?;
        Ok(())
    }

    pub fn upsert_theme(&self, theme: &Theme) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT INTO themes (id, subject_id, title_ms, title_zh, title_en, sort_order, pet_reward_id)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
               ON CONFLICT(id) DO UPDATE SET subject_id = excluded.subject_id, title_ms = excluded.title_ms,
                   title_zh = excluded.title_zh, title_en = excluded.title_en,
                   sort_order = excluded.sort_order, pet_reward_id = excluded.pet_reward_id"#,
            params![
                theme.id,
                theme.subject_id,
                theme.title.ms,
                theme.title.zh,
                theme.title.en,
                theme.sort_order,
                theme.pet_reward_id
            ],
        )?;
        Ok(())
    }

    pub fn upsert_activity(&self, activity: &Activity) -> Result<()> {
        let conn = self.lock_conn()?;
        let content = serde_json::to_string(&activity.content)?;
        conn.execute(
            r#"INSERT INTO activities (id, theme_id, kind, title_ms, title_zh, title_en, sort_order, xp_reward,
                   equipment_reward_id, content)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
               ON CONFLICT(id) DO UPDATE SET theme_id = excluded.theme_id, kind = excluded.kind,
                   title_ms = excluded.title_ms, title_zh = excluded.title_zh, title_en = excluded.title_en,
                   sort_order = excluded.sort_order, xp_reward = excluded.xp_reward,
                   equipment_reward_id = excluded.equipment_reward_id, content = excluded.content"#,
            params![
                activity.id,
                activity.theme_id,
                activity.kind,
                activity.title.ms,
                activity.title.zh,
                activity.title.en,
                activity.sort_order,
                activity.xp_reward,
                activity.equipment_reward_id,
                content
            ],
        )?;
        Ok(())
    }

    pub fn list_subjects(&self) -> Result<Vec<Subject>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title_ms, title_zh, title_en, icon, sort_order FROM subjects ORDER BY sort_order, id",
        )?;
        let subjects = stmt
            .query_map([], |row| {
                Ok(Subject {
                    id: row.get(0)?,
                    title: localized_at(row, 1)?,
                    icon: row.get(4)?,
                    sort_order: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(subjects)
    }

    pub fn subject_exists(&self, subject_id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM subjects WHERE id = ?1)",
            params![subject_id],
            |row| row.get(0),
        )
        .map_err(Into::into)
    }

    pub fn list_themes(&self, subject_id: &str) -> Result<Vec<Theme>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, subject_id, title_ms, title_zh, title_en, sort_order, pet_reward_id
               FROM themes WHERE subject_id = ?1 ORDER BY sort_order, id"#,
        )?;
        let themes = stmt
            .query_map(params![subject_id], theme_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(themes)
    }

    pub fn get_theme(&self, theme_id: &str) -> Result<Option<Theme>> {
        let conn = self.lock_conn()?;
        conn.query_row(
            r#"SELECT id, subject_id, title_ms, title_zh, title_en, sort_order, pet_reward_id
               FROM themes WHERE id = ?1"#,
            params![theme_id],
            theme_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Activities of a theme in play order
    pub fn list_activities(&self, theme_id: &str) -> Result<Vec<Activity>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM activities WHERE theme_id = ?1 ORDER BY sort_order, id",
            ACTIVITY_COLUMNS
        ))?;
        let activities = stmt
            .query_map(params![theme_id], activity_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(activities)
    }

    pub fn get_activity(&self, activity_id: &str) -> Result<Option<Activity>> {
        let conn = self.lock_conn()?;
        conn.query_row(
            &format!("SELECT {} FROM activities WHERE id = ?1", ACTIVITY_COLUMNS),
            params![activity_id],
            activity_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Themes of a subject with the kid's completion counts
    pub fn theme_summaries(&self, subject_id: &str, kid_id: &str, locale: Locale) -> Result<Vec<ThemeSummary>> {
        let themes = self.list_themes(subject_id)?;
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT COUNT(a.id),
                      COALESCE(SUM(CASE WHEN p.status = 'completed' THEN 1 ELSE 0 END), 0)
               FROM activities a
               LEFT JOIN kid_progress p ON p.activity_id = a.id AND p.kid_id = ?2
               WHERE a.theme_id = ?1"#,
        )?;

        let mut summaries = Vec::with_capacity(themes.len());
        for theme in themes {
            let (total, completed): (u32, u32) =
                stmt.query_row(params![theme.id, kid_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
            summaries.push(ThemeSummary {
                title: theme.title.get(locale).to_string(),
                id: theme.id,
                sort_order: theme.sort_order,
                total_activities: total,
                completed_activities: completed,
                pet_reward_id: theme.pet_reward_id,
            });
        }
        Ok(summaries)
    }

    /// Activities of a theme with the kid's effective status
    pub fn activity_views(&self, theme_id: &str, kid_id: &str, locale: Locale) -> Result<Vec<ActivityView>> {
        let activities = self.list_activities(theme_id)?;
        let progress: HashMap<String, super::KidProgress> = self
            .progress_for_theme(kid_id, theme_id)?
            .into_iter()
            .map(|p| (p.activity_id.clone(), p))
            .collect();

        let mut previous_completed = true;
        let mut views = Vec::with_capacity(activities.len());
        for activity in activities {
            let row = progress.get(&activity.id);
            let status = resolve_status(previous_completed, row.map(|p| p.status));
            previous_completed = status == ProgressStatus::Completed;
            views.push(ActivityView {
                title: activity.title.get(locale).to_string(),
                id: activity.id,
                kind: activity.kind,
                xp_reward: activity.xp_reward,
                status,
                stars: row.and_then(|p| p.stars),
                score: row.and_then(|p| p.score),
            });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::seeded;

    #[test]
    fn test_kind_roundtrip_names() {
        for kind in [
            ActivityKind::Alphabet,
            ActivityKind::Matching,
            ActivityKind::Syllable,
            ActivityKind::Writing,
            ActivityKind::Speaking,
            ActivityKind::Singing,
            ActivityKind::Dictation,
        ] {
            assert_eq!(kind.as_str().parse::<ActivityKind>().unwrap(), kind);
        }
        assert!("painting".parse::<ActivityKind>().is_err());
    }

    #[test]
    fn test_hierarchy_is_ordered() {
        let (db, _, _) = seeded();
        let subjects = db.list_subjects().unwrap();
        assert_eq!(subjects[0].id, "bahasa-melayu");

        let themes = db.list_themes("bahasa-melayu").unwrap();
        assert!(!themes.is_empty());
        let activities = db.list_activities(&themes[0].id).unwrap();
        let orders: Vec<_> = activities.iter().map(|a| a.sort_order).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted);
    }

    #[test]
    fn test_fresh_kid_sees_first_activity_available() {
        let (db, _, kid) = seeded();
        let theme = &db.list_themes("bahasa-melayu").unwrap()[0];
        let views = db.activity_views(&theme.id, &kid.id, Locale::En).unwrap();

        assert_eq!(views[0].status, ProgressStatus::Available);
        assert!(views[1..].iter().all(|v| v.status == ProgressStatus::Locked));
    }

    #[test]
    fn test_theme_summary_counts() {
        let (db, _, kid) = seeded();
        let theme = &db.list_themes("bahasa-melayu").unwrap()[0];
        let first = &db.list_activities(&theme.id).unwrap()[0];
        db.complete_activity(&kid.id, &first.id, 90, false).unwrap();

        let summaries = db.theme_summaries("bahasa-melayu", &kid.id, Locale::Ms).unwrap();
        let s = summaries.iter().find(|s| s.id == theme.id).unwrap();
        assert_eq!(s.completed_activities, 1);
        assert!(s.total_activities > 1);
        assert_eq!(s.title, theme.title.ms);
    }
}
