// ═══════════════════════════════════════════════════════════════════════
// Faction data — decoded shape of the faction JSON documents
//
// The loader itself is external; this module owns the decoded structures
// and the token parse tables. Field names mirror the JSON (camelCase).
// ═══════════════════════════════════════════════════════════════════════

use crate::board::mm_to_inches;
use crate::model::{Keyword, Spell, SpellEffect, UnitStats, Weapon, WeaponAbilities};
use serde::Deserialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FactionData {
    pub id: String,
    pub name: String,
    pub grand_alliance: String,
    pub battle_traits: Vec<String>,
    pub spell_lore: Vec<SpellData>,
    pub prayer_lore: Vec<SpellData>,
    pub formations: Vec<FormationData>,
    pub heroic_traits: Vec<EnhancementData>,
    pub artefacts: Vec<EnhancementData>,
    pub warscrolls: Vec<WarscrollData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormationData {
    pub name: String,
    pub description: String,
    pub effects: Vec<FormationEffectData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormationEffectData {
    pub description: String,
    pub target_tag: String,
    pub effect: String,
    pub value: u32,
    pub condition: String,
}

/// A heroic trait or artefact row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnhancementData {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub effect: String,
    pub value: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpellData {
    pub name: String,
    pub casting_value: u8,
    pub range: f64,
    pub effect: String,
    pub value: u32,
    pub targets_friendly: bool,
    pub unlimited: bool,
}

impl SpellData {
    pub fn to_spell(&self) -> Spell {
        Spell {
            name: self.name.clone(),
            threshold: self.casting_value,
            range: self.range,
            effect: SpellEffect::parse(&self.effect),
            value: self.value,
            targets_friendly: self.targets_friendly,
            unlimited: self.unlimited,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsData {
    #[serde(rename = "move")]
    pub move_: f64,
    pub save: u8,
    pub control: u8,
    pub health: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeaponData {
    pub name: String,
    pub range: f64,
    pub attacks: u32,
    pub hit: u8,
    pub wound: u8,
    pub rend: u8,
    pub damage: u32,
    pub abilities: Vec<String>,
}

impl WeaponData {
    pub fn to_weapon(&self) -> Weapon {
        Weapon {
            name: self.name.clone(),
            range: self.range,
            attacks: self.attacks,
            to_hit: self.hit,
            to_wound: self.wound,
            rend: self.rend,
            damage: self.damage,
            abilities: WeaponAbilities::from_tokens(&self.abilities),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbilityData {
    pub name: String,
    pub description: String,
    pub phase: String,
    pub effect: String,
    pub value: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarscrollData {
    pub id: String,
    pub name: String,
    /// Back-filled from the enclosing document when absent.
    pub faction: String,
    pub points: u32,
    pub unit_size: u32,
    /// 0 = cannot be reinforced.
    pub max_size: u32,
    #[serde(rename = "baseSizeMM")]
    pub base_size_mm: f64,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub unique: bool,
    pub stats: StatsData,
    pub weapons: Vec<WeaponData>,
    pub ward_save: u8,
    pub power_level: u8,
    pub spells: Vec<SpellData>,
    pub prayers: Vec<SpellData>,
    pub abilities: Vec<AbilityData>,
}

impl WarscrollData {
    /// Split the keyword strings into the recognised closed set and the
    /// leftover tag strings, merged with the explicit tags.
    pub fn parse_keywords(&self) -> (BTreeSet<Keyword>, Vec<String>) {
        let mut keywords = BTreeSet::new();
        let mut tags = Vec::new();
        for token in &self.keywords {
            match Keyword::parse(token) {
                Some(kw) => {
                    keywords.insert(kw);
                }
                None => tags.push(token.clone()),
            }
        }
        for t in &self.tags {
            if !tags.contains(t) {
                tags.push(t.clone());
            }
        }
        (keywords, tags)
    }

    pub fn unit_stats(&self) -> UnitStats {
        UnitStats {
            move_: self.stats.move_,
            save: self.stats.save,
            control: self.stats.control,
            health: self.stats.health,
        }
    }

    pub fn base_diameter_inches(&self) -> f64 {
        mm_to_inches(self.base_size_mm)
    }
}

impl FactionData {
    /// Decode a faction document. Warscrolls missing a `faction` field
    /// inherit the document's id.
    pub fn from_json(json: &str) -> Result<FactionData, serde_json::Error> {
        let mut faction: FactionData = serde_json::from_str(json)?;
        for ws in &mut faction.warscrolls {
            if ws.faction.is_empty() {
                ws.faction = faction.id.clone();
            }
        }
        Ok(faction)
    }

    pub fn warscroll(&self, id: &str) -> Option<&WarscrollData> {
        self.warscrolls.iter().find(|w| w.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "seraphon",
        "name": "Seraphon",
        "grandAlliance": "Order",
        "battleTraits": ["Scaly Skin", "Predatory Fighters", "Cold-blooded"],
        "formations": [
            {"name": "Sunclaw Temple-host", "description": "", "effects": [
                {"description": "+1 rend on the charge", "targetTag": "Saurus",
                 "effect": "bonusRend", "value": 1, "condition": "charged"}
            ]}
        ],
        "heroicTraits": [
            {"name": "Thickly Scaled Hide", "description": "", "type": "heroicTrait",
             "effect": "minusOneToBeHit", "value": 1}
        ],
        "artefacts": [],
        "warscrolls": [
            {
                "id": "saurus-warriors",
                "name": "Saurus Warriors",
                "points": 100,
                "unitSize": 10,
                "maxSize": 20,
                "baseSizeMM": 32,
                "keywords": ["Infantry", "Saurus", "Seraphon"],
                "unique": false,
                "stats": {"move": 5, "save": 4, "control": 1, "health": 2},
                "weapons": [
                    {"name": "Celestite Weapons", "range": 0, "attacks": 2,
                     "hit": 4, "wound": 3, "rend": 1, "damage": 1,
                     "abilities": ["Crit(Mortal)", "Bogus Token"]}
                ],
                "wardSave": 0,
                "powerLevel": 1,
                "abilities": [
                    {"name": "Ordered Cohort", "description": "", "phase": "charge",
                     "effect": "bonusChargeAttacks", "value": 2}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_faction_decodes() {
        let faction = FactionData::from_json(SAMPLE).unwrap();
        assert_eq!(faction.id, "seraphon");
        assert_eq!(faction.grand_alliance, "Order");
        assert_eq!(faction.battle_traits.len(), 3);
        assert_eq!(faction.formations[0].name, "Sunclaw Temple-host");
        assert_eq!(faction.heroic_traits[0].kind, "heroicTrait");
    }

    #[test]
    fn test_warscroll_faction_backfill() {
        let faction = FactionData::from_json(SAMPLE).unwrap();
        assert_eq!(faction.warscrolls[0].faction, "seraphon");
    }

    #[test]
    fn test_keyword_split() {
        let faction = FactionData::from_json(SAMPLE).unwrap();
        let (keywords, tags) = faction.warscrolls[0].parse_keywords();
        assert!(keywords.contains(&Keyword::Infantry));
        assert!(tags.contains(&"Saurus".to_string()));
        assert!(tags.contains(&"Seraphon".to_string()));
    }

    #[test]
    fn test_weapon_conversion_ignores_unknown_tokens() {
        let faction = FactionData::from_json(SAMPLE).unwrap();
        let weapon = faction.warscrolls[0].weapons[0].to_weapon();
        assert!(weapon.abilities.has(WeaponAbilities::CRIT_MORTAL));
        assert!(weapon.is_melee());
        assert_eq!(weapon.attacks, 2);
    }

    #[test]
    fn test_base_size_conversion() {
        let faction = FactionData::from_json(SAMPLE).unwrap();
        let d = faction.warscrolls[0].base_diameter_inches();
        assert!((d - 1.2598425196850394).abs() < 1e-9);
    }

    #[test]
    fn test_warscroll_lookup() {
        let faction = FactionData::from_json(SAMPLE).unwrap();
        assert!(faction.warscroll("saurus-warriors").is_some());
        assert!(faction.warscroll("skink-skirmishers").is_none());
    }
}
