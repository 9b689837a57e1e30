// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Prompt templates sent to the generative model

use minijinja::{context, Environment};

use crate::locale::Locale;
use crate::Result;

const HANDWRITING: &str = r#"You are checking handwriting practice by a young child learning {{ language }}.
The child was asked to write: "{{ expected }}".
Look at the image and identify the single letter or character that was written.
Be encouraging; children's handwriting is often wobbly.
Reply with JSON only:
{"recognizedLetter": "<what you see>", "isCorrect": <true|false>, "confidence": <0.0-1.0>, "feedback": "<one short encouraging sentence in {{ language }}>"}"#;

const PRONUNCIATION: &str = r#"You are a patient {{ language }} teacher listening to a young child.
The child was asked to say: "{{ expected }}".
Listen to the recording, transcribe what was said and judge the pronunciation.
Reply with JSON only:
{"transcription": "<what you heard>", "isCorrect": <true|false>, "score": <0-100>, "feedback": "<one short encouraging sentence in {{ language }}>"}"#;

const VOICE_TUTOR: &str = r#"You are a cheerful tutor for a primary-school child.
Explain the following {{ content_type }} in {{ language }} using at most three short, simple sentences.
Do not use markdown or emoji.

{{ content }}"#;

const VOCAB_IMAGE: &str = r#"A bright, friendly cartoon illustration of {{ word }} for a children's picture dictionary.
Single subject, centred, plain white background, no text or letters in the image."#;

const ALPHABET_IMAGE: &str = r#"A bright, friendly cartoon illustration of {{ word }} ({{ word_ms }}) for the letter {{ letter }} of a Malay alphabet chart.
Single subject, centred, plain white background, no text or letters in the image."#;

const EQUIPMENT_IMAGE: &str = r#"Game item icon in a blocky voxel style: {{ description }}.
Rarity {{ rarity }}. Isometric view, transparent or plain background, no text."#;

const PET_IMAGE: &str = r#"A cute companion pet for a children's learning game in a blocky voxel style: {{ description }}.
Full body, friendly expression, plain background, no text."#;

const AVATAR: &str = r#"A friendly blocky voxel-style game avatar portrait of a child named {{ name }}.
{% if description %}{{ description }}.{% endif %}
Cheerful, colourful, plain background, no text."#;

/// Rendered prompt catalogue
pub struct Prompts {
    env: Environment<'static>,
}

impl Prompts {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("handwriting", HANDWRITING)?;
        env.add_template("pronunciation", PRONUNCIATION)?;
        env.add_template("voice_tutor", VOICE_TUTOR)?;
        env.add_template("vocab_image", VOCAB_IMAGE)?;
        env.add_template("alphabet_image", ALPHABET_IMAGE)?;
        env.add_template("equipment_image", EQUIPMENT_IMAGE)?;
        env.add_template("pet_image", PET_IMAGE)?;
        env.add_template("avatar", AVATAR)?;
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }

    pub fn handwriting(&self, expected: &str, locale: Locale) -> Result<String> {
        self.render("handwriting", context! { expected, language => locale.language_name() })
    }

    pub fn pronunciation(&self, expected: &str, locale: Locale) -> Result<String> {
        self.render("pronunciation", context! { expected, language => locale.language_name() })
    }

    pub fn voice_tutor(&self, content: &str, content_type: &str, locale: Locale) -> Result<String> {
        self.render(
            "voice_tutor",
            context! { content, content_type, language => locale.language_name() },
        )
    }

    pub fn vocab_image(&self, word: &str) -> Result<String> {
        self.render("vocab_image", context! { word })
    }

    pub fn alphabet_image(&self, letter: char, word: &str, word_ms: &str) -> Result<String> {
        self.render("alphabet_image", context! { letter => letter.to_string(), word, word_ms })
    }

    pub fn equipment_image(&self, description: &str, rarity: &str) -> Result<String> {
        self.render("equipment_image", context! { description, rarity })
    }

    pub fn pet_image(&self, description: &str) -> Result<String> {
        self.render("pet_image", context! { description })
    }

    pub fn avatar(&self, name: &str, description: Option<&str>) -> Result<String> {
        self.render("avatar", context! { name, description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handwriting_prompt_mentions_language_and_letter() {
        let prompts = Prompts::new().unwrap();
        let text = prompts.handwriting("B", Locale::Ms).unwrap();
        assert!(text.contains("\"B\""));
        assert!(text.contains(Locale::Ms.language_name()));
        assert!(text.contains("recognizedLetter"));
    }

    #[test]
    fn test_avatar_description_is_optional() {
        let prompts = Prompts::new().unwrap();
        let plain = prompts.avatar("Aisyah", None).unwrap();
        let styled = prompts.avatar("Aisyah", Some("wearing a red tudung")).unwrap();
        assert!(!plain.contains("tudung"));
        assert!(styled.contains("wearing a red tudung."));
    }

    #[test]
    fn test_alphabet_prompt() {
        let prompts = Prompts::new().unwrap();
        let text = prompts.alphabet_image('G', "elephant", "gajah").unwrap();
        assert!(text.contains("letter G"));
        assert!(text.contains("elephant (gajah)"));
    }
}
