// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Registry of generated media files

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{now_ts, parse_ts, Database};
use crate::locale::Locale;
use crate::{CeriaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Audio,
    VocabImage,
    AlphabetImage,
    EquipmentImage,
    PetImage,
    Avatar,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Audio => "audio",
            AssetKind::VocabImage => "vocab_image",
            AssetKind::AlphabetImage => "alphabet_image",
            AssetKind::EquipmentImage => "equipment_image",
            AssetKind::PetImage => "pet_image",
            AssetKind::Avatar => "avatar",
        }
    }

    /// Sub-directory of the media root
    pub fn directory(&self) -> &'static str {
        match self {
            AssetKind::Audio => "audio",
            AssetKind::VocabImage => "vocab",
            AssetKind::AlphabetImage => "alphabet",
            AssetKind::EquipmentImage => "equipment",
            AssetKind::PetImage => "pets",
            AssetKind::Avatar => "avatars",
        }
    }
}

impl FromStr for AssetKind {
    type Err = CeriaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "audio" => Ok(AssetKind::Audio),
            "vocab_image" => Ok(AssetKind::VocabImage),
            "alphabet_image" => Ok(AssetKind::AlphabetImage),
            "equipment_image" => Ok(AssetKind::EquipmentImage),
            "pet_image" => Ok(AssetKind::PetImage),
            "avatar" => Ok(AssetKind::Avatar),
            other => Err(CeriaError::Invalid(format!("unknown asset kind '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub kind: AssetKind,
    pub key: String,
    pub locale: Option<Locale>,
    pub url: String,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

fn locale_column(locale: Option<Locale>) -> &'static str {
    locale.map(Locale::code).unwrap_or("")
}

fn asset_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediaAsset> {
    let locale: String = row.get(2)?;
    let created: String = row.get(5)?;
    Ok(MediaAsset {
        kind: row.get(0)?,
        key: row.get(1)?,
        locale: locale.parse().ok(),
        url: row.get(3)?,
        mime_type: row.get(4)?,
        created_at: parse_ts(&created),
    })
}

impl Database {
    /// Insert or replace the asset for `(kind, key, locale)`
    pub fn record_asset(
        &self,
        kind: AssetKind,
        key: &str,
        locale: Option<Locale>,
        url: &str,
        mime_type: &str,
    ) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT INTO media_assets (kind, asset_key, locale, url, mime_type, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(kind, asset_key, locale) DO UPDATE SET url = excluded.url,
                   mime_type = excluded.mime_type, created_at = excluded.created_at"#,
            params![kind, key, locale_column(locale), url, mime_type, now_ts()],
        )?;
        Ok(())
    }

    pub fn find_asset(&self, kind: AssetKind, key: &str, locale: Option<Locale>) -> Result<Option<MediaAsset>> {
        let conn = self.lock_conn()?;
        conn.query_row(
            r#"SELECT kind, asset_key, locale, url, mime_type, created_at FROM media_assets
               WHERE kind = ?1 AND asset_key = ?2 AND locale = ?3"#,
            params![kind, key, locale_column(locale)],
            asset_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_assets(&self, kind: AssetKind) -> Result<Vec<MediaAsset>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT kind, asset_key, locale, url, mime_type, created_at FROM media_assets
               WHERE kind = ?1 ORDER BY asset_key, locale"#,
        )?;
        let assets = stmt
            .query_map(params![kind], asset_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(assets)
    }
}
