// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! On-disk store for generated audio and images

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::MediaConfig;
use crate::db::AssetKind;
use crate::locale::Locale;
use crate::Result;

/// A file written by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub path: PathBuf,
    pub url: String,
}

/// Writes generated files under the media root and maps them to public URLs
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

/// Turn an arbitrary key into a safe file stem
pub fn slugify(raw: &str) -> String {
    let mut slug = raw
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == ' ')
        .collect::<String>()
        .replace(' ', "-")
        .to_lowercase();

    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }

    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "asset".to_string()
    } else {
        slug
    }
}

/// File extension for the mime types we write
pub fn extension_for(mime: &str) -> &'static str {
    match mime.split(';').next().unwrap_or("").trim() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        _ => "bin",
    }
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(&config.dir, &config.url_prefix)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name for a key, with the locale appended when the asset is per-language
    pub fn file_name(key: &str, locale: Option<Locale>, mime: &str) -> String {
        match locale {
            Some(locale) => format!("{}-{}.{}", slugify(key), locale.code(), extension_for(mime)),
            None => format!("{}.{}", slugify(key), extension_for(mime)),
        }
    }

    /// Write bytes for `(kind, key, locale)`, replacing any previous file
    pub async fn save(
        &self,
        kind: AssetKind,
        key: &str,
        locale: Option<Locale>,
        mime: &str,
        bytes: &[u8],
    ) -> Result<StoredMedia> {
        let dir = self.root.join(kind.directory());
        tokio::fs::create_dir_all(&dir).await?;

        let name = Self::file_name(key, locale, mime);
        let path = dir.join(&name);
        tokio::fs::write(&path, bytes).await?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(StoredMedia {
            url: format!("{}/{}/{}", self.url_prefix, kind.directory(), name),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Diamond Sword!"), "diamond-sword");
        assert_eq!(slugify("  word -- cat "), "word-cat");
        assert_eq!(slugify("???"), "asset");
        assert_eq!(slugify("猫"), "猫");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(MediaStore::file_name("word-cat", Some(Locale::Zh), "audio/wav"), "word-cat-zh.wav");
        assert_eq!(MediaStore::file_name("A", None, "image/png"), "a.png");
        assert_eq!(MediaStore::file_name("x", None, "application/octet-stream"), "x.bin");
    }

    #[test]
    fn test_save_writes_under_kind_directory() {
        let temp = TempDir::new().unwrap();
        let store = MediaStore::new(temp.path(), "/media/");

        let stored = tokio_test::block_on(store.save(
            AssetKind::PetImage,
            "kitten",
            None,
            "image/png",
            b"png-bytes",
        ))
        .unwrap();

        assert_eq!(stored.url, "/media/pets/kitten.png");
        assert_eq!(stored.path, temp.path().join("pets").join("kitten.png"));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"png-bytes");
    }
}
