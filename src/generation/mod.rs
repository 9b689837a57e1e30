// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Batch asset generation (speech, picture cards, item art, avatars)
//!
//! Batches walk a fixed list one item at a time with a pause between
//! upstream calls. A rate-limited call is retried once after a linear
//! backoff. Callers resume with the returned `nextIndex`.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::ops::Range;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::ai::GenerativeAi;
use crate::audio;
use crate::catalog::{self, ALPHABET, VOCABULARY};
use crate::config::AppConfig;
use crate::db::{AssetKind, Database, Kid};
use crate::locale::Locale;
use crate::media::{slugify, MediaStore};
use crate::prompts::Prompts;
use crate::{CeriaError, Result};

/// Items per request when the caller does not say
pub const DEFAULT_BATCH_COUNT: usize = 5;

/// Slice of `total` items to process and the index to resume from
pub fn batch_window(total: usize, start: usize, count: usize) -> (Range<usize>, Option<usize>) {
    let start = start.min(total);
    let end = start.saturating_add(count).min(total);
    let next = (end < total).then_some(end);
    (start..end, next)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub start_index: usize,
    pub count: Option<usize>,
    pub locale: Option<Locale>,
    #[serde(default)]
    pub skip_existing: bool,
}

impl BatchRequest {
    /// Requested count, defaulted and clamped to `1..=max_batch`
    pub fn effective_count(&self, max_batch: usize) -> usize {
        self.count.unwrap_or(DEFAULT_BATCH_COUNT).clamp(1, max_batch.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Generated,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub index: usize,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub results: Vec<BatchItem>,
    pub processed: usize,
    pub total: usize,
    pub next_index: Option<usize>,
}

impl BatchResponse {
    pub fn count(&self, status: ItemStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// A single generated file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAsset {
    pub key: String,
    pub url: String,
    pub mime_type: String,
}

enum Payload {
    Speech { text: String, voice: String },
    Image { prompt: String },
}

/// Catalog row to point at the new file
enum Link {
    Nothing,
    Equipment(String),
    Pet(String),
    Kid(String),
}

struct Job {
    index: usize,
    kind: AssetKind,
    key: String,
    locale: Option<Locale>,
    payload: Payload,
    existing: Option<String>,
    link: Link,
}

/// Drives generation against a provider, writing files and registry rows
pub struct Generator<'a> {
    ai: &'a dyn GenerativeAi,
    db: &'a Database,
    media: &'a MediaStore,
    prompts: &'a Prompts,
    config: &'a AppConfig,
}

impl<'a> Generator<'a> {
    pub fn new(
        ai: &'a dyn GenerativeAi,
        db: &'a Database,
        media: &'a MediaStore,
        prompts: &'a Prompts,
        config: &'a AppConfig,
    ) -> Self {
        Self { ai, db, media, prompts, config }
    }

    /// Run `op`, and once more after a backoff if it was rate limited
    async fn with_retry<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u64 = 1;
        loop {
            match op().await {
                Err(e) if e.is_rate_limited() && attempt == 1 => {
                    let wait = self.config.generation.retry_backoff_ms * attempt;
                    warn!("Rate limited, retrying in {} ms", wait);
                    pause(wait).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn fetch(&self, payload: &Payload) -> Result<(Vec<u8>, String)> {
        match payload {
            Payload::Speech { text, voice } => {
                let speech = self.with_retry(|| self.ai.synthesize_speech(text, voice)).await?;
                Ok((audio::to_wav(speech.data, &speech.mime_type), "audio/wav".to_string()))
            }
            Payload::Image { prompt } => {
                let image = self.with_retry(|| self.ai.generate_image(prompt)).await?;
                Ok((image.data, image.mime_type))
            }
        }
    }

    /// Generate, store and register one job; bookkeeping failures are only logged
    async fn execute(&self, job: &Job) -> Result<GeneratedAsset> {
        let (bytes, mime) = self.fetch(&job.payload).await?;
        let stored = self.media.save(job.kind, &job.key, job.locale, &mime, &bytes).await?;

        if let Err(e) = self.db.record_asset(job.kind, &job.key, job.locale, &stored.url, &mime) {
            warn!("Generated {} but could not record it: {}", stored.url, e);
        }
        let linked = match &job.link {
            Link::Nothing => Ok(()),
            Link::Equipment(id) => self.db.set_equipment_image(id, &stored.url),
            Link::Pet(id) => self.db.set_pet_image(id, &stored.url),
            Link::Kid(id) => self.db.set_kid_avatar(id, &stored.url),
        };
        if let Err(e) = linked {
            warn!("Generated {} but could not link it: {}", stored.url, e);
        }

        Ok(GeneratedAsset { key: job.key.clone(), url: stored.url, mime_type: mime })
    }

    async fn run(&self, total: usize, next_index: Option<usize>, jobs: Vec<Job>, skip_existing: bool) -> BatchResponse {
        let mut results = Vec::with_capacity(jobs.len());
        let mut called = false;

        for job in jobs {
            if skip_existing {
                if let Some(url) = &job.existing {
                    debug!("Skipping {} (already at {})", job.key, url);
                    results.push(BatchItem {
                        index: job.index,
                        key: job.key,
                        locale: job.locale,
                        status: ItemStatus::Skipped,
                        url: Some(url.clone()),
                        error: None,
                    });
                    continue;
                }
            }

            if called {
                pause(self.config.generation.delay_ms).await;
            }
            called = true;

            let (status, url, error) = match self.execute(&job).await {
                Ok(asset) => (ItemStatus::Generated, Some(asset.url), None),
                Err(e) => {
                    warn!("Generation failed for {}: {}", job.key, e);
                    (ItemStatus::Failed, None, Some(e.to_string()))
                }
            };
            results.push(BatchItem { index: job.index, key: job.key, locale: job.locale, status, url, error });
        }

        let response = BatchResponse { processed: results.len(), results, total, next_index };
        info!(
            "Batch done: {} generated, {} skipped, {} failed, next index {:?}",
            response.count(ItemStatus::Generated),
            response.count(ItemStatus::Skipped),
            response.count(ItemStatus::Failed),
            response.next_index
        );
        response
    }

    fn window(&self, total: usize, request: &BatchRequest) -> (Range<usize>, Option<usize>) {
        batch_window(total, request.start_index, request.effective_count(self.config.generation.max_batch))
    }

    fn existing_asset(&self, kind: AssetKind, key: &str, locale: Option<Locale>) -> Option<String> {
        match self.db.find_asset(kind, key, locale) {
            Ok(found) => found.map(|a| a.url),
            Err(e) => {
                warn!("Asset lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Speak the vocabulary (and Malay syllables) for one locale
    pub async fn audio_batch(&self, request: &BatchRequest) -> Result<BatchResponse> {
        let locale = request.locale.unwrap_or_default();
        let items = catalog::audio_items(locale);
        let (range, next) = self.window(items.len(), request);
        let voice = self.config.ai.voices.for_locale(locale).to_string();

        let jobs = items[range.clone()]
            .iter()
            .zip(range)
            .map(|(item, index)| Job {
                index,
                kind: AssetKind::Audio,
                existing: self.existing_asset(AssetKind::Audio, &item.key, Some(locale)),
                key: item.key.clone(),
                locale: Some(locale),
                payload: Payload::Speech { text: item.text.clone(), voice: voice.clone() },
                link: Link::Nothing,
            })
            .collect();

        Ok(self.run(items.len(), next, jobs, request.skip_existing).await)
    }

    /// Speak arbitrary text and register it under `key` (defaults to a slug of the text)
    pub async fn single_audio(&self, text: &str, key: Option<&str>, locale: Locale) -> Result<GeneratedAsset> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CeriaError::Invalid("text must not be empty".into()));
        }
        let job = Job {
            index: 0,
            kind: AssetKind::Audio,
            key: key.map(slugify).unwrap_or_else(|| slugify(text)),
            locale: Some(locale),
            payload: Payload::Speech {
                text: text.to_string(),
                voice: self.config.ai.voices.for_locale(locale).to_string(),
            },
            existing: None,
            link: Link::Nothing,
        };
        self.execute(&job).await
    }

    /// Picture cards for the vocabulary list (language-neutral images)
    pub async fn vocab_batch(&self, request: &BatchRequest) -> Result<BatchResponse> {
        let (range, next) = self.window(VOCABULARY.len(), request);
        let mut jobs = Vec::with_capacity(range.len());
        for index in range {
            let word = &VOCABULARY[index];
            jobs.push(Job {
                index,
                kind: AssetKind::VocabImage,
                key: word.key.to_string(),
                locale: None,
                payload: Payload::Image { prompt: self.prompts.vocab_image(word.en)? },
                existing: self.existing_asset(AssetKind::VocabImage, word.key, None),
                link: Link::Nothing,
            });
        }
        Ok(self.run(VOCABULARY.len(), next, jobs, request.skip_existing).await)
    }

    /// One picture card; known vocabulary keys use their English word
    pub async fn vocab_image(&self, word: &str) -> Result<GeneratedAsset> {
        let word = word.trim();
        if word.is_empty() {
            return Err(CeriaError::Invalid("word must not be empty".into()));
        }
        let (key, subject) = match catalog::find_vocab(word) {
            Some(known) => (known.key.to_string(), known.en),
            None => (slugify(word), word),
        };
        let job = Job {
            index: 0,
            kind: AssetKind::VocabImage,
            key,
            locale: None,
            payload: Payload::Image { prompt: self.prompts.vocab_image(subject)? },
            existing: None,
            link: Link::Nothing,
        };
        self.execute(&job).await
    }

    /// (Re)draw the Malay alphabet chart pictures
    pub async fn alphabet_batch(&self, request: &BatchRequest) -> Result<BatchResponse> {
        let (range, next) = self.window(ALPHABET.len(), request);
        let mut jobs = Vec::with_capacity(range.len());
        for index in range {
            let entry = &ALPHABET[index];
            let key = entry.letter.to_string();
            jobs.push(Job {
                index,
                kind: AssetKind::AlphabetImage,
                existing: self.existing_asset(AssetKind::AlphabetImage, &key, None),
                key,
                locale: None,
                payload: Payload::Image {
                    prompt: self.prompts.alphabet_image(entry.letter, entry.word_en, entry.word_ms)?,
                },
                link: Link::Nothing,
            });
        }
        Ok(self.run(ALPHABET.len(), next, jobs, request.skip_existing).await)
    }

    pub async fn equipment_batch(&self, request: &BatchRequest) -> Result<BatchResponse> {
        let items = self.db.list_equipment()?;
        let (range, next) = self.window(items.len(), request);
        let mut jobs = Vec::with_capacity(range.len());
        for index in range {
            let item = &items[index];
            jobs.push(Job {
                index,
                kind: AssetKind::EquipmentImage,
                key: item.id.clone(),
                locale: None,
                payload: Payload::Image { prompt: self.prompts.equipment_image(&item.image_prompt, &item.rarity)? },
                existing: item.image_url.clone(),
                link: Link::Equipment(item.id.clone()),
            });
        }
        Ok(self.run(items.len(), next, jobs, request.skip_existing).await)
    }

    pub async fn pets_batch(&self, request: &BatchRequest) -> Result<BatchResponse> {
        let pets = self.db.list_pets()?;
        let (range, next) = self.window(pets.len(), request);
        let mut jobs = Vec::with_capacity(range.len());
        for index in range {
            let pet = &pets[index];
            jobs.push(Job {
                index,
                kind: AssetKind::PetImage,
                key: pet.id.clone(),
                locale: None,
                payload: Payload::Image { prompt: self.prompts.pet_image(&pet.image_prompt)? },
                existing: pet.image_url.clone(),
                link: Link::Pet(pet.id.clone()),
            });
        }
        Ok(self.run(pets.len(), next, jobs, request.skip_existing).await)
    }

    /// Draw a kid's avatar and make it their profile picture
    pub async fn avatar(&self, kid: &Kid, description: Option<&str>) -> Result<GeneratedAsset> {
        let description = description.map(str::trim).filter(|d| !d.is_empty());
        let job = Job {
            index: 0,
            kind: AssetKind::Avatar,
            key: kid.id.clone(),
            locale: None,
            payload: Payload::Image { prompt: self.prompts.avatar(&kid.name, description)? },
            existing: None,
            link: Link::Kid(kid.id.clone()),
        };
        self.execute(&job).await
    }
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
