// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Supported languages and canned localized messages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CeriaError;

/// Content language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ms,
    Zh,
    En,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Ms, Locale::Zh, Locale::En];

    pub fn code(self) -> &'static str {
        match self {
            Locale::Ms => "ms",
            Locale::Zh => "zh",
            Locale::En => "en",
        }
    }

    /// Language name used inside prompts
    pub fn language_name(self) -> &'static str {
        match self {
            Locale::Ms => "Bahasa Melayu (Malaysian Malay)",
            Locale::Zh => "Simplified Chinese (Mandarin)",
            Locale::En => "English",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = CeriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ms" | "my" | "ms-my" | "malay" => Ok(Locale::Ms),
            "zh" | "zh-cn" | "zh-my" | "chinese" => Ok(Locale::Zh),
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            other => Err(CeriaError::Invalid(format!("unsupported locale '{}'", other))),
        }
    }
}

/// A string available in every supported language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub ms: String,
    pub zh: String,
    pub en: String,
}

impl LocalizedText {
    pub fn new(ms: &str, zh: &str, en: &str) -> Self {
        Self {
            ms: ms.to_string(),
            zh: zh.to_string(),
            en: en.to_string(),
        }
    }

    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ms => &self.ms,
            Locale::Zh => &self.zh,
            Locale::En => &self.en,
        }
    }
}

/// Canned messages returned when the AI service cannot answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Unavailable,
    HandwritingRetry,
    PronunciationRetry,
    TutorEncourage,
}

impl Fallback {
    pub fn text(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Fallback::Unavailable, Locale::Ms) => "Maaf, cikgu suara sedang berehat. Cuba lagi nanti!",
            (Fallback::Unavailable, Locale::Zh) => "对不起，语音老师正在休息，请稍后再试！",
            (Fallback::Unavailable, Locale::En) => "Sorry, the voice teacher is resting. Please try again later!",
            (Fallback::HandwritingRetry, Locale::Ms) => "Tulisan kamu belum dapat dibaca. Cuba tulis sekali lagi!",
            (Fallback::HandwritingRetry, Locale::Zh) => "老师看不清楚你的字，请再写一次！",
            (Fallback::HandwritingRetry, Locale::En) => "I couldn't read that yet. Try writing it once more!",
            (Fallback::PronunciationRetry, Locale::Ms) => "Cikgu tidak dapat mendengar dengan jelas. Cuba sebut sekali lagi!",
            (Fallback::PronunciationRetry, Locale::Zh) => "老师听不清楚，请再说一次！",
            (Fallback::PronunciationRetry, Locale::En) => "I couldn't hear that clearly. Try saying it again!",
            (Fallback::TutorEncourage, Locale::Ms) => "Bagus! Mari kita belajar bersama-sama.",
            (Fallback::TutorEncourage, Locale::Zh) => "很好！我们一起学习吧。",
            (Fallback::TutorEncourage, Locale::En) => "Great! Let's learn together.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale_aliases() {
        assert_eq!("MS".parse::<Locale>().unwrap(), Locale::Ms);
        assert_eq!("zh-CN".parse::<Locale>().unwrap(), Locale::Zh);
        assert_eq!(" en ".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Locale::Zh).unwrap(), "\"zh\"");
        let l: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(l, Locale::En);
    }

    #[test]
    fn test_fallbacks_exist_for_every_locale() {
        for locale in Locale::ALL {
            for fb in [
                Fallback::Unavailable,
                Fallback::HandwritingRetry,
                Fallback::PronunciationRetry,
                Fallback::TutorEncourage,
            ] {
                assert!(!fb.text(locale).is_empty());
            }
        }
    }
}
