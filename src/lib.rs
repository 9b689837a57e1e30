// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Ceria: gamified multilingual learning backend
//!
//! Parents register children who work through subjects, themes and
//! activities in Malay, Chinese and English, earning XP, levels,
//! equipment and pets. Speech, recognition and artwork come from a
//! generative AI service.

pub mod ai;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod locale;
pub mod media;
pub mod progression;
pub mod prompts;
pub mod recognition;
pub mod seed;
pub mod web;

pub use config::AppConfig;
pub use error::{CeriaError, Result};
