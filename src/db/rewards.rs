// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Equipment, pets, inventory and the equipped loadout

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{localized_at, now_ts, Database};
use crate::locale::LocalizedText;
use crate::{CeriaError, Result};

/// Loadout slot; each kid has at most one item per slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Helmet,
    Chestplate,
    Leggings,
    Boots,
    Weapon,
    Tool,
    Ranged,
    Shield,
    Pet,
}

impl Slot {
    pub const ALL: [Slot; 9] = [
        Slot::Helmet,
        Slot::Chestplate,
        Slot::Leggings,
        Slot::Boots,
        Slot::Weapon,
        Slot::Tool,
        Slot::Ranged,
        Slot::Shield,
        Slot::Pet,
    ];

    /// Also the `kid_equipped` column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Helmet => "helmet",
            Slot::Chestplate => "chestplate",
            Slot::Leggings => "leggings",
            Slot::Boots => "boots",
            Slot::Weapon => "weapon",
            Slot::Tool => "tool",
            Slot::Ranged => "ranged",
            Slot::Shield => "shield",
            Slot::Pet => "pet",
        }
    }
}

impl FromStr for Slot {
    type Err = CeriaError;

    fn from_str(s: &str) -> Result<Self> {
        Slot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| CeriaError::Invalid(format!("unknown slot '{}'", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: String,
    pub slot: Slot,
    pub rarity: String,
    pub name: LocalizedText,
    pub image_prompt: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: String,
    pub name: LocalizedText,
    pub image_prompt: String,
    pub image_url: Option<String>,
}

/// Current loadout keyed by slot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Equipped(pub BTreeMap<Slot, Option<String>>);

impl Equipped {
    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.0.get(&slot).and_then(|v| v.as_deref())
    }
}

fn equipment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Equipment> {
    Ok(Equipment {
        id: row.get(0)?,
        slot: row.get(1)?,
        rarity: row.get(2)?,
        name: localized_at(row, 3)?,
        image_prompt: row.get(6)?,
        image_url: row.get(7)?,
    })
}

fn pet_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Pet> {
    Ok(Pet {
        id: row.get(0)?,
        name: localized_at(row, 1)?,
        image_prompt: row.get(4)?,
        image_url: row.get(5)?,
    })
}

impl Database {
    pub fn upsert_equipment(&self, item: &Equipment) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT INTO equipment (id, slot, rarity, name_ms, name_zh, name_en, image_prompt, image_url)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
               ON CONFLICT(id) DO UPDATE SET slot = excluded.slot, rarity = excluded.rarity,
                   name_ms = excluded.name_ms, name_zh = excluded.name_zh, name_en = excluded.name_en,
                   image_prompt = excluded.image_prompt,
                   image_url = COALESCE(equipment.image_url, excluded.image_url)"#,
            params![
                item.id,
                item.slot,
                item.rarity,
                item.name.ms,
                item.name.zh,
                item.name.en,
                item.image_prompt,
                item.image_url
            ],
        )?;
        Ok(())
    }

    pub fn upsert_pet(&self, pet: &Pet) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"INSERT INTO pets (id, name_ms, name_zh, name_en, image_prompt, image_url)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(id) DO UPDATE SET name_ms = excluded.name_ms, name_zh = excluded.name_zh,
                   name_en = excluded.name_en, image_prompt = excluded.image_prompt,
                   image_url = COALESCE(pets.image_url, excluded.image_url)"#,
            params![pet.id, pet.name.ms, pet.name.zh, pet.name.en, pet.image_prompt, pet.image_url],
        )?;
        Ok(())
    }

    pub fn list_equipment(&self) -> Result<Vec<Equipment>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, slot, rarity, name_ms, name_zh, name_en, image_prompt, image_url
               FROM equipment ORDER BY slot, id"#,
        )?;
        let items = stmt
            .query_map([], equipment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn get_equipment(&self, equipment_id: &str) -> Result<Option<Equipment>> {
        let conn = self.lock_conn()?;
        conn.query_row(
            r#"SELECT id, slot, rarity, name_ms, name_zh, name_en, image_prompt, image_url
               FROM equipment WHERE id = ?1"#,
            params![equipment_id],
            equipment_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_pets(&self) -> Result<Vec<Pet>> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name_ms, name_zh, name_en, image_prompt, image_url FROM pets ORDER BY id")?;
        let pets = stmt
            .query_map([], pet_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pets)
    }

    pub fn set_equipment_image(&self, equipment_id: &str, url: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let updated = conn.execute("UPDATE equipment SET image_url = ?1 WHERE id = ?2", params![url, equipment_id])?;
        if updated == 0 {
            return Err(CeriaError::NotFound(format!("equipment {}", equipment_id)));
        }
        Ok(())
    }

    pub fn set_pet_image(&self, pet_id: &str, url: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let updated = conn.execute("UPDATE pets SET image_url = ?1 WHERE id = ?2", params![url, pet_id])?;
        if updated == 0 {
            return Err(CeriaError::NotFound(format!("pet {}", pet_id)));
        }
        Ok(())
    }

    /// Equipment owned by a kid
    pub fn inventory(&self, kid_id: &str) -> Result<Vec<Equipment>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT e.id, e.slot, e.rarity, e.name_ms, e.name_zh, e.name_en, e.image_prompt, e.image_url
               FROM kid_inventory i JOIN equipment e ON e.id = i.equipment_id
               WHERE i.kid_id = ?1 ORDER BY i.acquired_at, e.id"#,
        )?;
        let items = stmt
            .query_map(params![kid_id], equipment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Pets owned by a kid
    pub fn kid_pets(&self, kid_id: &str) -> Result<Vec<Pet>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT p.id, p.name_ms, p.name_zh, p.name_en, p.image_prompt, p.image_url
               FROM kid_pets k JOIN pets p ON p.id = k.pet_id
               WHERE k.kid_id = ?1 ORDER BY k.acquired_at, p.id"#,
        )?;
        let pets = stmt
            .query_map(params![kid_id], pet_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pets)
    }

    pub fn equipped(&self, kid_id: &str) -> Result<Equipped> {
        let conn = self.lock_conn()?;
        let row: Option<Vec<Option<String>>> = conn
            .query_row(
                r#"SELECT helmet, chestplate, leggings, boots, weapon, tool, ranged, shield, pet
                   FROM kid_equipped WHERE kid_id = ?1"#,
                params![kid_id],
                |row| {
                    (0..Slot::ALL.len())
                        .map(|i| row.get::<_, Option<String>>(i))
                        .collect::<rusqlite::Result<Vec<_>>>()
                },
            )
            .optional()?;

        let values = row.unwrap_or_else(|| vec![None; Slot::ALL.len()]);
        Ok(Equipped(Slot::ALL.into_iter().zip(values).collect()))
    }

    /// Put an owned item into a slot, or clear the slot with `None`
    pub fn set_equipped(&self, kid_id: &str, slot: Slot, item_id: Option<&str>) -> Result<Equipped> {
        if let Some(item_id) = item_id {
            let conn = self.lock_conn()?;
            let owned: bool = if slot == Slot::Pet {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM kid_pets WHERE kid_id = ?1 AND pet_id = ?2)",
                    params![kid_id, item_id],
                    |row| row.get(0),
                )?
            } else {
                let item_slot: Option<Slot> = conn
                    .query_row(
                        r#"SELECT e.slot FROM kid_inventory i JOIN equipment e ON e.id = i.equipment_id
                           WHERE i.kid_id = ?1 AND i.equipment_id = ?2"#,
                        params![kid_id, item_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                match item_slot {
                    Some(s) if s != slot => {
                        return Err(CeriaError::Invalid(format!(
                            "{} belongs in the {} slot, not {}",
                            item_id,
                            s.as_str(),
                            slot.as_str()
                        )));
                    }
                    Some(_) => true,
                    None => false,
                }
            };
            if !owned {
                return Err(CeriaError::NotFound(format!("{} is not owned by this kid", item_id)));
            }
        }

        {
            let conn = self.lock_conn()?;
            conn.execute(
                &format!(
                    r#"INSERT INTO kid_equipped (kid_id, {col}, updated_at) VALUES (?1, ?2, ?3)
                       ON CONFLICT(kid_id) DO UPDATE SET {col} = excluded.{col}, updated_at = excluded.updated_at"#,
                    col = slot.as_str()
                ),
                params![kid_id, item_id, now_ts()],
            )?;
        }
        self.equipped(kid_id)
    }
}
