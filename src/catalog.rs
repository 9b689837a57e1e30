// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Fixed content lists that batch generation walks through

use crate::locale::Locale;

/// A picture word taught in every language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabWord {
    pub key: &'static str,
    pub ms: &'static str,
    pub zh: &'static str,
    pub en: &'static str,
}

impl VocabWord {
    pub fn word(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::Ms => self.ms,
            Locale::Zh => self.zh,
            Locale::En => self.en,
        }
    }
}

/// One letter of the alphabet chart with its picture word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlphabetEntry {
    pub letter: char,
    pub word_ms: &'static str,
    pub word_en: &'static str,
}

/// Something to speak, keyed for the asset registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioItem {
    pub key: String,
    pub text: String,
}

pub const VOCABULARY: &[VocabWord] = &[
    VocabWord { key: "cat", ms: "kucing", zh: "猫", en: "cat" },
    VocabWord { key: "dog", ms: "anjing", zh: "狗", en: "dog" },
    VocabWord { key: "fish", ms: "ikan", zh: "鱼", en: "fish" },
    VocabWord { key: "bird", ms: "burung", zh: "鸟", en: "bird" },
    VocabWord { key: "house", ms: "rumah", zh: "房子", en: "house" },
    VocabWord { key: "book", ms: "buku", zh: "书", en: "book" },
    VocabWord { key: "ball", ms: "bola", zh: "球", en: "ball" },
    VocabWord { key: "flower", ms: "bunga", zh: "花", en: "flower" },
    VocabWord { key: "tree", ms: "pokok", zh: "树", en: "tree" },
    VocabWord { key: "car", ms: "kereta", zh: "汽车", en: "car" },
    VocabWord { key: "sun", ms: "matahari", zh: "太阳", en: "sun" },
    VocabWord { key: "moon", ms: "bulan", zh: "月亮", en: "moon" },
    VocabWord { key: "water", ms: "air", zh: "水", en: "water" },
    VocabWord { key: "apple", ms: "epal", zh: "苹果", en: "apple" },
    VocabWord { key: "banana", ms: "pisang", zh: "香蕉", en: "banana" },
];

pub const ALPHABET: &[AlphabetEntry] = &[
    AlphabetEntry { letter: 'A', word_ms: "ayam", word_en: "chicken" },
    AlphabetEntry { letter: 'B', word_ms: "bola", word_en: "ball" },
    AlphabetEntry { letter: 'C', word_ms: "cawan", word_en: "cup" },
    AlphabetEntry { letter: 'D', word_ms: "durian", word_en: "durian" },
    AlphabetEntry { letter: 'E', word_ms: "epal", word_en: "apple" },
    AlphabetEntry { letter: 'F', word_ms: "feri", word_en: "ferry" },
    AlphabetEntry { letter: 'G', word_ms: "gajah", word_en: "elephant" },
    AlphabetEntry { letter: 'H', word_ms: "harimau", word_en: "tiger" },
    AlphabetEntry { letter: 'I', word_ms: "ikan", word_en: "fish" },
    AlphabetEntry { letter: 'J', word_ms: "jam", word_en: "clock" },
    AlphabetEntry { letter: 'K', word_ms: "kucing", word_en: "cat" },
    AlphabetEntry { letter: 'L', word_ms: "lembu", word_en: "cow" },
    AlphabetEntry { letter: 'M', word_ms: "monyet", word_en: "monkey" },
    AlphabetEntry { letter: 'N', word_ms: "nanas", word_en: "pineapple" },
    AlphabetEntry { letter: 'O', word_ms: "oren", word_en: "orange" },
    AlphabetEntry { letter: 'P', word_ms: "pisang", word_en: "banana" },
    AlphabetEntry { letter: 'Q', word_ms: "quran", word_en: "holy book" },
    AlphabetEntry { letter: 'R', word_ms: "rumah", word_en: "house" },
    AlphabetEntry { letter: 'S', word_ms: "susu", word_en: "milk" },
    AlphabetEntry { letter: 'T', word_ms: "tikus", word_en: "mouse" },
    AlphabetEntry { letter: 'U', word_ms: "ular", word_en: "snake" },
    AlphabetEntry { letter: 'V', word_ms: "van", word_en: "van" },
    AlphabetEntry { letter: 'W', word_ms: "wau", word_en: "traditional kite" },
    AlphabetEntry { letter: 'X', word_ms: "xilofon", word_en: "xylophone" },
    AlphabetEntry { letter: 'Y', word_ms: "yoyo", word_en: "yo-yo" },
    AlphabetEntry { letter: 'Z', word_ms: "zirafah", word_en: "giraffe" },
];

/// Malay open syllables (suku kata) used by the syllable reading activities
pub const SYLLABLES_MS: &[&str] = &[
    "ba", "bi", "bu", "be", "bo",
    "ca", "ci", "cu", "ce", "co",
    "da", "di", "du", "de", "do",
    "ma", "mi", "mu", "me", "mo",
];

/// Everything the audio batch speaks for a locale, in batch order
pub fn audio_items(locale: Locale) -> Vec<AudioItem> {
    let mut items: Vec<AudioItem> = VOCABULARY
        .iter()
        .map(|w| AudioItem {
            key: format!("word-{}", w.key),
            text: w.word(locale).to_string(),
        })
        .collect();

    if locale == Locale::Ms {
        items.extend(SYLLABLES_MS.iter().map(|s| AudioItem {
            key: format!("syllable-{}", s),
            text: s.to_string(),
        }));
    }
    items
}

pub fn find_vocab(key: &str) -> Option<&'static VocabWord> {
    VOCABULARY.iter().find(|w| w.key == key)
}
