// ═══════════════════════════════════════════════════════════════════════
// Core domain model — units, models, weapons, spells, keywords
// ═══════════════════════════════════════════════════════════════════════

use crate::geometry::{distance, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ── Identifiers ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.0)
    }
}

// ── Keywords ───────────────────────────────────────────────────────────

/// The closed keyword set that participates in targeting and rules.
/// Any other keyword string on a warscroll is retained as a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Keyword {
    Hero,
    Infantry,
    Cavalry,
    Monster,
    WarMachine,
    Wizard,
    Priest,
    Fly,
    Manifestation,
}

impl Keyword {
    pub fn parse(token: &str) -> Option<Keyword> {
        match token {
            "Hero" => Some(Keyword::Hero),
            "Infantry" => Some(Keyword::Infantry),
            "Cavalry" => Some(Keyword::Cavalry),
            "Monster" => Some(Keyword::Monster),
            "War Machine" => Some(Keyword::WarMachine),
            "Wizard" => Some(Keyword::Wizard),
            "Priest" => Some(Keyword::Priest),
            "Fly" => Some(Keyword::Fly),
            "Manifestation" => Some(Keyword::Manifestation),
            _ => None,
        }
    }
}

// ── Weapon abilities ───────────────────────────────────────────────────

/// Dense flag set for the eleven weapon-ability tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeaponAbilities(pub u16);

impl WeaponAbilities {
    pub const NONE: WeaponAbilities = WeaponAbilities(0);
    pub const ANTI_INFANTRY: WeaponAbilities = WeaponAbilities(1 << 0);
    pub const ANTI_CAVALRY: WeaponAbilities = WeaponAbilities(1 << 1);
    pub const ANTI_HERO: WeaponAbilities = WeaponAbilities(1 << 2);
    pub const ANTI_MONSTER: WeaponAbilities = WeaponAbilities(1 << 3);
    pub const ANTI_CHARGE: WeaponAbilities = WeaponAbilities(1 << 4);
    pub const CHARGE: WeaponAbilities = WeaponAbilities(1 << 5);
    pub const CRIT_TWO_HITS: WeaponAbilities = WeaponAbilities(1 << 6);
    pub const CRIT_AUTO_WOUND: WeaponAbilities = WeaponAbilities(1 << 7);
    pub const CRIT_MORTAL: WeaponAbilities = WeaponAbilities(1 << 8);
    pub const COMPANION: WeaponAbilities = WeaponAbilities(1 << 9);
    pub const SHOOT_IN_COMBAT: WeaponAbilities = WeaponAbilities(1 << 10);

    pub fn has(self, flag: WeaponAbilities) -> bool {
        self.0 & flag.0 != 0
    }

    pub fn insert(&mut self, flag: WeaponAbilities) {
        self.0 |= flag.0;
    }

    /// Parse one ability token. Unknown tokens are silently ignored.
    pub fn parse_token(token: &str) -> Option<WeaponAbilities> {
        match token {
            "Anti-Infantry" => Some(Self::ANTI_INFANTRY),
            "Anti-Cavalry" => Some(Self::ANTI_CAVALRY),
            "Anti-Hero" => Some(Self::ANTI_HERO),
            "Anti-Monster" => Some(Self::ANTI_MONSTER),
            "Anti-charge" => Some(Self::ANTI_CHARGE),
            "Charge" => Some(Self::CHARGE),
            "Crit(2 Hits)" => Some(Self::CRIT_TWO_HITS),
            "Crit(Auto-wound)" => Some(Self::CRIT_AUTO_WOUND),
            "Crit(Mortal)" => Some(Self::CRIT_MORTAL),
            "Companion" => Some(Self::COMPANION),
            "Shoot in Combat" => Some(Self::SHOOT_IN_COMBAT),
            _ => None,
        }
    }

    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> WeaponAbilities {
        let mut flags = WeaponAbilities::NONE;
        for t in tokens {
            if let Some(f) = Self::parse_token(t.as_ref()) {
                flags.insert(f);
            }
        }
        flags
    }
}

// ── Weapon ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    /// Range in inches; 0 = melee.
    pub range: f64,
    pub attacks: u32,
    pub to_hit: u8,
    pub to_wound: u8,
    /// Non-negative; raises the enemy save threshold.
    pub rend: u8,
    pub damage: u32,
    pub abilities: WeaponAbilities,
}

impl Weapon {
    pub fn is_melee(&self) -> bool {
        self.range == 0.0
    }
}

// ── Spells & prayers ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellEffect {
    Damage,
    Heal,
    Buff,
}

impl SpellEffect {
    /// Unknown effect tokens are treated as damage.
    pub fn parse(token: &str) -> SpellEffect {
        match token {
            "heal" => SpellEffect::Heal,
            "buff" => SpellEffect::Buff,
            _ => SpellEffect::Damage,
        }
    }
}

/// A castable spell. Prayers share the shape: `threshold` is the chanting
/// value and `unlimited` lifts the one-resolution-per-turn restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    pub threshold: u8,
    pub range: f64,
    pub effect: SpellEffect,
    pub value: u32,
    pub targets_friendly: bool,
    pub unlimited: bool,
}

pub type Prayer = Spell;

// ── Strike order ───────────────────────────────────────────────────────

/// Activation tier in the combat phase. Derived ordering drives the
/// first → normal → last sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrikeOrder {
    First,
    Normal,
    Last,
}

// ── Model ──────────────────────────────────────────────────────────────

/// A single miniature in a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: u8,
    pub position: Position,
    /// Base diameter in inches.
    pub base_diameter: f64,
    pub current_health: i32,
    pub max_health: i32,
    pub alive: bool,
}

impl Model {
    pub fn new(id: u8, position: Position, base_diameter: f64, health: i32) -> Self {
        Model {
            id,
            position,
            base_diameter,
            current_health: health,
            max_health: health,
            alive: health > 0,
        }
    }

    /// Apply up to `amount` damage; returns how much was absorbed.
    /// Dead models absorb nothing.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        if !self.alive || amount <= 0 {
            return 0;
        }
        let absorbed = amount.min(self.current_health);
        self.current_health -= absorbed;
        self.alive = self.current_health > 0;
        absorbed
    }

    /// Restore up to `amount` health; returns how much was restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if !self.alive || amount <= 0 {
            return 0;
        }
        let restored = amount.min(self.max_health - self.current_health);
        self.current_health += restored;
        restored
    }
}

// ── Unit ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Movement allowance in inches.
    pub move_: f64,
    /// Save threshold (e.g. 4 = 4+); 7 = no save.
    pub save: u8,
    /// Objective-control value per model.
    pub control: u8,
    /// Health characteristic per model.
    pub health: i32,
}

/// Per-phase action flags, packed. Reset every battle round; the
/// magic counters additionally reset at the start of each hero phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFlags {
    bits: u16,
    pub casts: u8,
    pub chants: u8,
    pub unbinds: u8,
}

impl ActionFlags {
    const MOVED: u16 = 1 << 0;
    const RUN: u16 = 1 << 1;
    const RETREATED: u16 = 1 << 2;
    const SHOT: u16 = 1 << 3;
    const FOUGHT: u16 = 1 << 4;
    const CHARGED: u16 = 1 << 5;
    const PILED_IN: u16 = 1 << 6;
    const MISCAST: u16 = 1 << 7;

    fn get(&self, bit: u16) -> bool {
        self.bits & bit != 0
    }
    fn set(&mut self, bit: u16, value: bool) {
        if value {
            self.bits |= bit;
        } else {
            self.bits &= !bit;
        }
    }

    pub fn moved(&self) -> bool { self.get(Self::MOVED) }
    pub fn ran(&self) -> bool { self.get(Self::RUN) }
    pub fn retreated(&self) -> bool { self.get(Self::RETREATED) }
    pub fn shot(&self) -> bool { self.get(Self::SHOT) }
    pub fn fought(&self) -> bool { self.get(Self::FOUGHT) }
    pub fn charged(&self) -> bool { self.get(Self::CHARGED) }
    pub fn piled_in(&self) -> bool { self.get(Self::PILED_IN) }
    pub fn miscast(&self) -> bool { self.get(Self::MISCAST) }

    pub fn set_moved(&mut self) { self.set(Self::MOVED, true) }
    pub fn set_ran(&mut self) { self.set(Self::RUN, true) }
    pub fn set_retreated(&mut self) { self.set(Self::RETREATED, true) }
    pub fn set_shot(&mut self) { self.set(Self::SHOT, true) }
    pub fn set_fought(&mut self) { self.set(Self::FOUGHT, true) }
    pub fn set_charged(&mut self) { self.set(Self::CHARGED, true) }
    pub fn set_piled_in(&mut self) { self.set(Self::PILED_IN, true) }
    pub fn set_miscast(&mut self) { self.set(Self::MISCAST, true) }

    /// Zero every flag and counter. Ritual points live on the unit and
    /// survive this.
    pub fn reset(&mut self) {
        *self = ActionFlags::default();
    }

    /// Hero-phase reset: the casting/chanting/unbinding budget only.
    pub fn reset_magic(&mut self) {
        self.casts = 0;
        self.chants = 0;
        self.unbinds = 0;
        self.set(Self::MISCAST, false);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub owner: PlayerId,
    pub stats: UnitStats,
    pub models: Vec<Model>,
    pub weapons: Vec<Weapon>,
    pub keywords: BTreeSet<Keyword>,
    /// Faction-specific tag strings (e.g. "Saurus", "Daemon").
    pub tags: Vec<String>,
    /// Ward-save threshold; 0 = none.
    pub ward: u8,
    pub strike_order: StrikeOrder,
    pub spells: Vec<Spell>,
    pub prayers: Vec<Prayer>,
    /// Wizard(X)/Priest(X) level: abilities usable per hero phase.
    pub power_level: u8,
    /// Priests' persistent accumulator; survives flag resets.
    pub ritual_points: u8,
    pub flags: ActionFlags,
}

impl Unit {
    pub fn has_keyword(&self, kw: Keyword) -> bool {
        self.keywords.contains(&kw)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn alive_models(&self) -> u32 {
        self.models.iter().filter(|m| m.alive).count() as u32
    }

    pub fn total_models(&self) -> u32 {
        self.models.len() as u32
    }

    /// Sum of current health across alive models.
    pub fn total_health(&self) -> i32 {
        self.models
            .iter()
            .filter(|m| m.alive)
            .map(|m| m.current_health)
            .sum()
    }

    pub fn max_health(&self) -> i32 {
        self.models.iter().map(|m| m.max_health).sum()
    }

    pub fn is_destroyed(&self) -> bool {
        self.models.iter().all(|m| !m.alive)
    }

    /// Position of the first still-alive model; None once destroyed.
    pub fn leader_position(&self) -> Option<Position> {
        self.models.iter().find(|m| m.alive).map(|m| m.position)
    }

    pub fn melee_weapons(&self) -> impl Iterator<Item = &Weapon> {
        self.weapons.iter().filter(|w| w.is_melee())
    }

    pub fn ranged_weapons(&self) -> impl Iterator<Item = &Weapon> {
        self.weapons.iter().filter(|w| !w.is_melee())
    }

    /// Move the whole unit to a destination (unit-as-point simplification;
    /// per-model positions are retained in the schema for later refinement).
    pub fn translate_to(&mut self, dest: Position) {
        for m in self.models.iter_mut().filter(|m| m.alive) {
            m.position = dest;
        }
    }

    /// Distribute healing over alive models, most wounded first.
    pub fn heal(&mut self, mut amount: i32) -> i32 {
        let mut restored = 0;
        while amount > 0 {
            let target = self
                .models
                .iter_mut()
                .filter(|m| m.alive && m.current_health < m.max_health)
                .min_by_key(|m| m.current_health);
            match target {
                Some(m) => {
                    let r = m.heal(amount);
                    restored += r;
                    amount -= r;
                }
                None => break,
            }
        }
        restored
    }
}

/// Symmetric leader-to-leader distance; infinite once either is destroyed.
pub fn unit_distance(a: &Unit, b: &Unit) -> f64 {
    match (a.leader_position(), b.leader_position()) {
        (Some(pa), Some(pb)) => distance(pa, pb),
        _ => f64::INFINITY,
    }
}

// ── Unit table ─────────────────────────────────────────────────────────

/// All units in the game, keyed by id. Destroyed units stay in the table;
/// destruction is a state, not deletion. BTreeMap keeps iteration order
/// deterministic for replay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitTable {
    units: BTreeMap<UnitId, Unit>,
}

impl UnitTable {
    pub fn insert(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units_of(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.owner == owner)
    }

    pub fn enemies_of(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        self.units.values().filter(move |u| u.owner != owner)
    }

    /// Alive units of `owner` within `range` of `pos` that satisfy `pred`.
    pub fn any_friendly_within<F>(&self, owner: PlayerId, pos: Position, range: f64, pred: F) -> bool
    where
        F: Fn(&Unit) -> bool,
    {
        self.units.values().any(|u| {
            u.owner == owner
                && !u.is_destroyed()
                && pred(u)
                && u.leader_position()
                    .map_or(false, |p| crate::geometry::in_range(pos, p, range))
        })
    }

    /// Position of the nearest alive enemy model to `pos`.
    pub fn nearest_enemy_model(&self, owner: PlayerId, pos: Position) -> Option<Position> {
        self.units
            .values()
            .filter(|u| u.owner != owner)
            .flat_map(|u| u.models.iter().filter(|m| m.alive))
            .map(|m| m.position)
            .min_by(|a, b| {
                distance(pos, *a)
                    .partial_cmp(&distance(pos, *b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Whether any alive enemy model stands within engagement range of the
    /// unit's leader.
    pub fn in_combat(&self, unit: &Unit, engagement: f64) -> bool {
        let Some(pos) = unit.leader_position() else {
            return false;
        };
        self.units
            .values()
            .filter(|u| u.owner != unit.owner)
            .flat_map(|u| u.models.iter().filter(|m| m.alive))
            .any(|m| crate::geometry::in_range(pos, m.position, engagement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_unit(id: u32, owner: u8, models: usize, health: i32) -> Unit {
        Unit {
            id: UnitId(id),
            name: format!("Test Unit {id}"),
            owner: PlayerId(owner),
            stats: UnitStats { move_: 5.0, save: 4, control: 1, health },
            models: (0..models)
                .map(|i| Model::new(i as u8, Position::new(10.0, 10.0), 1.0, health))
                .collect(),
            weapons: Vec::new(),
            keywords: BTreeSet::new(),
            tags: Vec::new(),
            ward: 0,
            strike_order: StrikeOrder::Normal,
            spells: Vec::new(),
            prayers: Vec::new(),
            power_level: 1,
            ritual_points: 0,
            flags: ActionFlags::default(),
        }
    }

    #[test]
    fn test_alive_tracks_health() {
        let mut m = Model::new(0, Position::new(0.0, 0.0), 1.0, 2);
        assert!(m.alive);
        assert_eq!(m.take_damage(1), 1);
        assert!(m.alive);
        assert_eq!(m.take_damage(5), 1);
        assert!(!m.alive);
        // Dead models absorb nothing further
        assert_eq!(m.take_damage(3), 0);
    }

    #[test]
    fn test_unit_totals() {
        let mut u = sample_unit(1, 0, 3, 2);
        assert_eq!(u.alive_models(), 3);
        assert_eq!(u.total_health(), 6);
        u.models[0].take_damage(2);
        assert_eq!(u.alive_models(), 2);
        assert_eq!(u.total_health(), 4);
        assert!(!u.is_destroyed());
    }

    #[test]
    fn test_leader_position_skips_dead() {
        let mut u = sample_unit(1, 0, 2, 1);
        u.models[0].position = Position::new(1.0, 1.0);
        u.models[1].position = Position::new(2.0, 2.0);
        u.models[0].take_damage(1);
        let lead = u.leader_position().unwrap();
        assert!((lead.x - 2.0).abs() < 1e-9);
        u.models[1].take_damage(1);
        assert!(u.leader_position().is_none());
        assert!(u.is_destroyed());
    }

    #[test]
    fn test_weapon_ability_tokens() {
        let flags = WeaponAbilities::from_tokens(&[
            "Anti-Hero",
            "Crit(Mortal)",
            "Companion",
            "Not A Real Token",
        ]);
        assert!(flags.has(WeaponAbilities::ANTI_HERO));
        assert!(flags.has(WeaponAbilities::CRIT_MORTAL));
        assert!(flags.has(WeaponAbilities::COMPANION));
        assert!(!flags.has(WeaponAbilities::CHARGE));
    }

    #[test]
    fn test_keyword_parse() {
        assert_eq!(Keyword::parse("War Machine"), Some(Keyword::WarMachine));
        assert_eq!(Keyword::parse("Wizard"), Some(Keyword::Wizard));
        assert_eq!(Keyword::parse("Sneaky"), None);
    }

    #[test]
    fn test_spell_effect_parse() {
        assert_eq!(SpellEffect::parse("heal"), SpellEffect::Heal);
        assert_eq!(SpellEffect::parse("buff"), SpellEffect::Buff);
        assert_eq!(SpellEffect::parse("damage"), SpellEffect::Damage);
        assert_eq!(SpellEffect::parse("???"), SpellEffect::Damage);
    }

    #[test]
    fn test_action_flags_reset() {
        let mut f = ActionFlags::default();
        f.set_moved();
        f.set_charged();
        f.casts = 2;
        assert!(f.moved() && f.charged());
        f.reset();
        assert!(!f.moved() && !f.charged());
        assert_eq!(f.casts, 0);
    }

    #[test]
    fn test_unit_distance_symmetry() {
        let mut a = sample_unit(1, 0, 1, 2);
        let mut b = sample_unit(2, 1, 1, 2);
        a.models[0].position = Position::new(0.0, 0.0);
        b.models[0].position = Position::new(6.0, 8.0);
        assert!((unit_distance(&a, &b) - 10.0).abs() < 1e-9);
        assert!((unit_distance(&a, &b) - unit_distance(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn test_heal_most_wounded_first() {
        let mut u = sample_unit(1, 0, 2, 3);
        u.models[0].take_damage(2);
        u.models[1].take_damage(1);
        u.heal(2);
        // Model 0 was at 1/3; healing goes there first
        assert_eq!(u.models[0].current_health, 3);
        assert_eq!(u.models[1].current_health, 2);
    }

    #[test]
    fn test_table_in_combat() {
        let mut table = UnitTable::default();
        let a = sample_unit(1, 0, 1, 2);
        let mut b = sample_unit(2, 1, 1, 2);
        b.models[0].position = Position::new(12.0, 10.0);
        table.insert(a);
        table.insert(b);
        let a_ref = table.get(UnitId(1)).unwrap().clone();
        assert!(!table.in_combat(&a_ref, 1.0));
        assert!(table.in_combat(&a_ref, 3.0));
    }
}
