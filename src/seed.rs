// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Starter curriculum and reward catalogs

use serde_json::json;
use tracing::info;

use crate::db::{Activity, ActivityKind, Database, Equipment, Pet, Slot, Subject, Theme};
use crate::locale::LocalizedText;
use crate::Result;

/// Counts of rows written by a seed run
#[derive(Debug, Default, Clone, Copy)]
pub struct SeedReport {
    pub subjects: usize,
    pub themes: usize,
    pub activities: usize,
    pub equipment: usize,
    pub pets: usize,
}

fn text(ms: &str, zh: &str, en: &str) -> LocalizedText {
    LocalizedText::new(ms, zh, en)
}

fn equipment_catalog() -> Vec<Equipment> {
    let item = |id: &str, slot: Slot, rarity: &str, name: LocalizedText, prompt: &str| Equipment {
        id: id.to_string(),
        slot,
        rarity: rarity.to_string(),
        name,
        image_prompt: prompt.to_string(),
        image_url: None,
    };

    vec![
        item("leather-helmet", Slot::Helmet, "common", text("Topi Kulit", "皮革头盔", "Leather Helmet"), "a brown leather helmet"),
        item("gold-helmet", Slot::Helmet, "rare", text("Topi Emas", "黄金头盔", "Golden Helmet"), "a shiny golden helmet"),
        item("iron-chestplate", Slot::Chestplate, "uncommon", text("Baju Besi", "铁胸甲", "Iron Chestplate"), "an iron chestplate"),
        item("chain-leggings", Slot::Leggings, "uncommon", text("Seluar Rantai", "锁链护腿", "Chain Leggings"), "chainmail leggings"),
        item("leather-boots", Slot::Boots, "common", text("Kasut Kulit", "皮靴", "Leather Boots"), "a pair of leather boots"),
        item("wooden-sword", Slot::Weapon, "common", text("Pedang Kayu", "木剑", "Wooden Sword"), "a wooden toy sword"),
        item("diamond-sword", Slot::Weapon, "epic", text("Pedang Berlian", "钻石剑", "Diamond Sword"), "a sparkling diamond sword"),
        item("stone-pickaxe", Slot::Tool, "common", text("Beliung Batu", "石镐", "Stone Pickaxe"), "a stone pickaxe"),
        item("hunting-bow", Slot::Ranged, "uncommon", text("Busur", "弓", "Bow"), "a wooden bow with a string"),
        item("wooden-shield", Slot::Shield, "common", text("Perisai Kayu", "木盾", "Wooden Shield"), "a round wooden shield"),
    ]
}

fn pet_catalog() -> Vec<Pet> {
    let pet = |id: &str, name: LocalizedText, prompt: &str| Pet {
        id: id.to_string(),
        name,
        image_prompt: prompt.to_string(),
        image_url: None,
    };

    vec![
        pet("kitten", text("Anak Kucing", "小猫", "Kitten"), "a playful orange kitten"),
        pet("parrot", text("Burung Kakak Tua", "鹦鹉", "Parrot"), "a colourful parrot"),
        pet("turtle", text("Penyu", "海龟", "Sea Turtle"), "a friendly green sea turtle"),
        pet("rabbit", text("Arnab", "兔子", "Rabbit"), "a fluffy white rabbit"),
        pet("fox", text("Musang", "狐狸", "Fox"), "a small red fox"),
        pet("panda", text("Panda", "熊猫", "Panda"), "a baby panda holding bamboo"),
    ]
}

struct ActivitySeed {
    id: &'static str,
    kind: ActivityKind,
    title: LocalizedText,
    xp: u32,
    equipment: Option<&'static str>,
    content: serde_json::Value,
}

struct ThemeSeed {
    id: &'static str,
    title: LocalizedText,
    pet: &'static str,
    activities: Vec<ActivitySeed>,
}

fn act(
    id: &'static str,
    kind: ActivityKind,
    title: LocalizedText,
    xp: u32,
    equipment: Option<&'static str>,
    content: serde_json::Value,
) -> ActivitySeed {
    ActivitySeed { id, kind, title, xp, equipment, content }
}

fn curriculum() -> Vec<(Subject, Vec<ThemeSeed>)> {
    use ActivityKind::*;

    let subject = |id: &str, title: LocalizedText, icon: &str, order: i64| Subject {
        id: id.to_string(),
        title,
        icon: Some(icon.to_string()),
        sort_order: order,
    };

    vec![
        (
            subject("bahasa-melayu", text("Bahasa Melayu", "马来文", "Malay"), "📗", 1),
            vec![
                ThemeSeed {
                    id: "bm-huruf",
                    title: text("Huruf", "字母", "Letters"),
                    pet: "kitten",
                    activities: vec![
                        act("bm-huruf-abjad", Alphabet, text("Kenal Abjad", "认识字母", "Meet the Alphabet"), 50, None,
                            json!({"letters": ["A", "B", "C", "D", "E"]})),
                        act("bm-huruf-tulis", Writing, text("Tulis Huruf", "写字母", "Write Letters"), 60, Some("leather-helmet"),
                            json!({"letters": ["A", "B", "C"]})),
                        act("bm-huruf-padan", Matching, text("Padankan Gambar", "配对图片", "Match Pictures"), 50, None,
                            json!({"pairs": [["A", "ayam"], ["B", "bola"], ["C", "cawan"]]})),
                    ],
                },
                ThemeSeed {
                    id: "bm-suku-kata",
                    title: text("Suku Kata", "音节", "Syllables"),
                    pet: "parrot",
                    activities: vec![
                        act("bm-suku-baca", Syllable, text("Baca Suku Kata", "读音节", "Read Syllables"), 60, None,
                            json!({"syllables": ["ba", "bi", "bu", "be", "bo"]})),
                        act("bm-suku-sebut", Speaking, text("Sebut Perkataan", "说词语", "Say the Word"), 70, Some("wooden-sword"),
                            json!({"words": ["bola", "buku", "bunga"]})),
                        act("bm-suku-lagu", Singing, text("Lagu Suku Kata", "音节歌", "Syllable Song"), 50, None,
                            json!({"song": "ba bi bu be bo"})),
                        act("bm-suku-imla", Dictation, text("Imlak", "听写", "Dictation"), 80, Some("leather-boots"),
                            json!({"words": ["buku", "bola"]})),
                    ],
                },
            ],
        ),
        (
            subject("huawen", text("Bahasa Cina", "华文", "Chinese"), "📕", 2),
            vec![
                ThemeSeed {
                    id: "hw-bihua",
                    title: text("Strok Asas", "基本笔画", "Basic Strokes"),
                    pet: "panda",
                    activities: vec![
                        act("hw-bihua-xie", Writing, text("Tulis Strok", "写笔画", "Write Strokes"), 60, None,
                            json!({"characters": ["一", "丨", "丿"]})),
                        act("hw-bihua-pei", Matching, text("Padankan Aksara", "配对汉字", "Match Characters"), 50, Some("stone-pickaxe"),
                            json!({"pairs": [["猫", "cat"], ["狗", "dog"]]})),
                        act("hw-bihua-shuo", Speaking, text("Sebut Aksara", "读汉字", "Say Characters"), 70, None,
                            json!({"characters": ["人", "口", "手"]})),
                    ],
                },
                ThemeSeed {
                    id: "hw-erge",
                    title: text("Lagu Kanak-kanak", "儿歌", "Nursery Rhymes"),
                    pet: "rabbit",
                    activities: vec![
                        act("hw-erge-chang", Singing, text("Nyanyi Bersama", "一起唱", "Sing Along"), 50, None,
                            json!({"song": "两只老虎"})),
                        act("hw-erge-tingxie", Dictation, text("Imlak Cina", "听写", "Chinese Dictation"), 80, Some("wooden-shield"),
                            json!({"words": ["老虎", "耳朵"]})),
                    ],
                },
            ],
        ),
        (
            subject("english", text("Bahasa Inggeris", "英文", "English"), "📘", 3),
            vec![
                ThemeSeed {
                    id: "en-phonics",
                    title: text("Fonik", "自然拼读", "Phonics"),
                    pet: "turtle",
                    activities: vec![
                        act("en-phonics-abc", Alphabet, text("ABC", "ABC", "ABC"), 50, None,
                            json!({"letters": ["a", "b", "c"]})),
                        act("en-phonics-say", Speaking, text("Sebut Bunyi", "读音", "Say the Sound"), 60, Some("hunting-bow"),
                            json!({"words": ["cat", "bat", "hat"]})),
                        act("en-phonics-write", Writing, text("Tulis Huruf Kecil", "写小写字母", "Write Small Letters"), 60, None,
                            json!({"letters": ["a", "b", "c"]})),
                    ],
                },
                ThemeSeed {
                    id: "en-words",
                    title: text("Perkataan Pertama", "第一批单词", "First Words"),
                    pet: "fox",
                    activities: vec![
                        act("en-words-match", Matching, text("Padankan Perkataan", "配对单词", "Match Words"), 50, Some("iron-chestplate"),
                            json!({"pairs": [["sun", "matahari"], ["moon", "bulan"]]})),
                        act("en-words-spell", Dictation, text("Eja", "拼写", "Spelling"), 80, Some("chain-leggings"),
                            json!({"words": ["sun", "moon", "tree"]})),
                        act("en-words-song", Singing, text("Lagu ABC", "ABC歌", "ABC Song"), 50, Some("gold-helmet"),
                            json!({"song": "ABC song"})),
                    ],
                },
            ],
        ),
    ]
}

/// Insert or refresh the full catalog; safe to run repeatedly
pub fn seed_all(db: &Database) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for item in equipment_catalog() {
        db.upsert_equipment(&item)?;
        report.equipment += 1;
    }
    for pet in pet_catalog() {
        db.upsert_pet(&pet)?;
        report.pets += 1;
    }

    for (subject, themes) in curriculum() {
        db.upsert_subject(&subject)?;
        report.subjects += 1;

        for (theme_idx, theme) in themes.into_iter().enumerate() {
            db.upsert_theme(&Theme {
                id: theme.id.to_string(),
                subject_id: subject.id.clone(),
                title: theme.title,
                sort_order: theme_idx as i64 + 1,
                pet_reward_id: Some(theme.pet.to_string()),
            })?;
            report.themes += 1;

            for (idx, a) in theme.activities.into_iter().enumerate() {
                db.upsert_activity(&Activity {
                    id: a.id.to_string(),
                    theme_id: theme.id.to_string(),
                    kind: a.kind,
                    title: a.title,
                    sort_order: idx as i64 + 1,
                    xp_reward: a.xp,
                    equipment_reward_id: a.equipment.map(String::from),
                    content: a.content,
                })?;
                report.activities += 1;
            }
        }
    }

    info!(
        "Seeded {} subjects, {} themes, {} activities, {} equipment, {} pets",
        report.subjects, report.themes, report.activities, report.equipment, report.pets
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let first = seed_all(&db).unwrap();
        seed_all(&db).unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.activities as usize, first.activities);
        assert_eq!(stats.equipment as usize, first.equipment);
    }

    #[test]
    fn test_every_activity_kind_is_seeded() {
        let kinds: HashSet<_> = curriculum()
            .into_iter()
            .flat_map(|(_, themes)| themes)
            .flat_map(|t| t.activities)
            .map(|a| a.kind)
            .collect();
        assert_eq!(kinds.len(), 7);
    }

    #[test]
    fn test_reward_references_resolve() {
        let equipment: HashSet<_> = equipment_catalog().into_iter().map(|e| e.id).collect();
        let pets: HashSet<_> = pet_catalog().into_iter().map(|p| p.id).collect();
        for (_, themes) in curriculum() {
            for theme in themes {
                assert!(pets.contains(theme.pet));
                for a in theme.activities {
                    if let Some(e) = a.equipment {
                        assert!(equipment.contains(e), "{} rewards unknown {}", a.id, e);
                    }
                }
            }
        }
    }

    #[test]
    fn test_existing_image_url_survives_reseed() {
        let db = Database::in_memory().unwrap();
        seed_all(&db).unwrap();
        db.set_pet_image("kitten", "/media/pets/kitten.png").unwrap();
        seed_all(&db).unwrap();
        let kitten = db.list_pets().unwrap().into_iter().find(|p| p.id == "kitten").unwrap();
        assert_eq!(kitten.image_url.as_deref(), Some("/media/pets/kitten.png"));
    }
}
