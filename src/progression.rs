// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Levelling and scoring rules
//!
//! Level is a pure function of total XP. Level `L` starts at
//! `50 * L * (L - 1)` XP, i.e. each level costs 100 XP more than the last.

use serde::{Deserialize, Serialize};

/// Highest accepted raw activity score
pub const MAX_SCORE: u32 = 100;

/// Level for a total XP amount: `floor((1 + sqrt(1 + 8 * xp / 100)) / 2)`
pub fn level_for_xp(xp: u64) -> u32 {
    let estimate = ((1.0 + (1.0 + 8.0 * xp as f64 / 100.0).sqrt()) / 2.0).floor() as u64;
    let mut level = estimate.max(1);

    // Correct float rounding at exact thresholds
    while level > 1 && xp_for_level(level) > xp {
        level -= 1;
    }
    while xp_for_level(level + 1) <= xp {
        level += 1;
    }
    level as u32
}

/// Total XP at which `level` is reached
pub fn xp_for_level(level: u64) -> u64 {
    if level <= 1 {
        return 0;
    }
    50 * level * (level - 1)
}

/// Stars for a raw score: 80+ is three, 60+ is two, anything else one
pub fn stars_for_score(score: u32) -> u8 {
    match score {
        s if s >= 80 => 3,
        s if s >= 60 => 2,
        _ => 1,
    }
}

/// Where a kid stands inside the current level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level: u32,
    pub total_xp: u64,
    pub xp_into_level: u64,
    pub xp_for_next_level: u64,
}

impl LevelProgress {
    pub fn from_xp(total_xp: u64) -> Self {
        let level = level_for_xp(total_xp);
        let floor = xp_for_level(level as u64);
        let next = xp_for_level(level as u64 + 1);
        Self {
            level,
            total_xp,
            xp_into_level: total_xp - floor,
            xp_for_next_level: next - floor,
        }
    }
}
