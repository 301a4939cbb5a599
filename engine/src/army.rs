// ═══════════════════════════════════════════════════════════════════════
// Army building — roster legality and unit instantiation
// ═══════════════════════════════════════════════════════════════════════

use crate::data::{FactionData, WarscrollData};
use crate::faction_rules::{ability_rule, battle_trait_rules, formation_rules, FACTION_TZEENTCH};
use crate::game::Game;
use crate::geometry::Position;
use crate::magic::DestinyPool;
use crate::model::{ActionFlags, Keyword, Model, PlayerId, StrikeOrder, Unit, UnitId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const MAX_HEROES: usize = 6;

// ── Roster ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub warscroll: String,
    pub general: bool,
    pub reinforced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmyRoster {
    pub faction: String,
    pub points_limit: u32,
    pub entries: Vec<RosterEntry>,
    pub formation: Option<usize>,
    pub heroic_trait: Option<usize>,
    pub artefact: Option<usize>,
    /// Index into `entries` of the unit carrying the artefact.
    pub artefact_bearer: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("roster totals {total} points over a limit of {limit}")]
    OverPointsLimit { total: u32, limit: u32 },
    #[error("roster has no general")]
    NoGeneral,
    #[error("roster has more than one general")]
    MultipleGenerals,
    #[error("roster musters {count} heroes; at most 6 are allowed")]
    TooManyHeroes { count: usize },
    #[error("unique warscroll '{0}' appears more than once")]
    DuplicateUnique(String),
    #[error("warscroll '{0}' cannot be reinforced")]
    NotReinforceable(String),
    #[error("warscroll '{0}' does not exist in faction '{1}'")]
    UnknownWarscroll(String, String),
    #[error("enhancement selection '{0}' is out of range")]
    InvalidEnhancement(String),
    #[error("expected {expected} deployment positions, got {got}")]
    DeploymentMismatch { expected: usize, got: usize },
}

/// Cost of one entry: reinforcing doubles both cost and model count.
fn entry_cost(ws: &WarscrollData, entry: &RosterEntry) -> u32 {
    if entry.reinforced {
        ws.points * 2
    } else {
        ws.points
    }
}

/// Pure legality check; reports the first violated rule.
pub fn validate(roster: &ArmyRoster, faction: &FactionData) -> Result<(), RosterError> {
    let mut total = 0u32;
    let mut generals = 0usize;
    let mut heroes = 0usize;
    let mut seen_unique: Vec<&str> = Vec::new();

    for entry in &roster.entries {
        let ws = faction
            .warscroll(&entry.warscroll)
            .ok_or_else(|| {
                RosterError::UnknownWarscroll(entry.warscroll.clone(), roster.faction.clone())
            })?;

        total += entry_cost(ws, entry);
        if entry.general {
            generals += 1;
        }
        if ws.keywords.iter().any(|k| k == "Hero") {
            heroes += 1;
        }
        if ws.unique {
            if seen_unique.contains(&entry.warscroll.as_str()) {
                return Err(RosterError::DuplicateUnique(entry.warscroll.clone()));
            }
            seen_unique.push(&entry.warscroll);
        }
        if entry.reinforced && ws.max_size == 0 {
            return Err(RosterError::NotReinforceable(entry.warscroll.clone()));
        }
    }

    if total > roster.points_limit {
        return Err(RosterError::OverPointsLimit { total, limit: roster.points_limit });
    }
    match generals {
        0 => return Err(RosterError::NoGeneral),
        1 => {}
        _ => return Err(RosterError::MultipleGenerals),
    }
    if heroes > MAX_HEROES {
        return Err(RosterError::TooManyHeroes { count: heroes });
    }

    if let Some(i) = roster.formation {
        if i >= faction.formations.len() {
            return Err(RosterError::InvalidEnhancement(format!("formation {i}")));
        }
    }
    if let Some(i) = roster.heroic_trait {
        if i >= faction.heroic_traits.len() {
            return Err(RosterError::InvalidEnhancement(format!("heroic trait {i}")));
        }
    }
    if let Some(i) = roster.artefact {
        if i >= faction.artefacts.len() {
            return Err(RosterError::InvalidEnhancement(format!("artefact {i}")));
        }
        match roster.artefact_bearer {
            Some(b) if b < roster.entries.len() => {}
            _ => return Err(RosterError::InvalidEnhancement("artefact bearer".into())),
        }
    }

    Ok(())
}

/// Total roster cost in points.
pub fn total_points(roster: &ArmyRoster, faction: &FactionData) -> u32 {
    roster
        .entries
        .iter()
        .filter_map(|e| faction.warscroll(&e.warscroll).map(|ws| entry_cost(ws, e)))
        .sum()
}

// ── Instantiation ──────────────────────────────────────────────────────

fn instantiate(ws: &WarscrollData, owner: PlayerId, position: Position, reinforced: bool) -> Unit {
    let model_count = if reinforced { ws.unit_size * 2 } else { ws.unit_size };
    let (mut keywords, tags) = ws.parse_keywords();
    let base = ws.base_diameter_inches();

    // The `fly` ability key is consumed here as the Fly keyword.
    if ws.abilities.iter().any(|a| a.effect == "fly") {
        keywords.insert(Keyword::Fly);
    }

    Unit {
        id: UnitId(0), // assigned by the game on insertion
        name: ws.name.clone(),
        owner,
        stats: ws.unit_stats(),
        models: (0..model_count)
            .map(|i| Model::new(i as u8, position, base, ws.stats.health))
            .collect(),
        weapons: ws.weapons.iter().map(|w| w.to_weapon()).collect(),
        keywords,
        tags,
        ward: ws.ward_save,
        strike_order: StrikeOrder::Normal,
        spells: ws.spells.iter().map(|s| s.to_spell()).collect(),
        prayers: ws.prayers.iter().map(|p| p.to_spell()).collect(),
        power_level: ws.power_level.max(1),
        ritual_points: 0,
        flags: ActionFlags::default(),
    }
}

/// Validate a roster, place its units at the given deployment positions,
/// and register every rule the army brings: battle traits, the chosen
/// formation, warscroll abilities, and the general's/bearer's enhancements.
pub fn build_army(
    game: &mut Game,
    faction: &FactionData,
    roster: &ArmyRoster,
    owner: PlayerId,
    positions: &[Position],
) -> Result<Vec<UnitId>, RosterError> {
    validate(roster, faction)?;
    if positions.len() != roster.entries.len() {
        return Err(RosterError::DeploymentMismatch {
            expected: roster.entries.len(),
            got: positions.len(),
        });
    }

    let mut ids = Vec::with_capacity(roster.entries.len());
    for (entry, &pos) in roster.entries.iter().zip(positions) {
        let ws = faction
            .warscroll(&entry.warscroll)
            .ok_or_else(|| {
                RosterError::UnknownWarscroll(entry.warscroll.clone(), roster.faction.clone())
            })?;
        let unit = instantiate(ws, owner, pos, entry.reinforced);
        let id = game.create_unit(unit);
        ids.push(id);

        for ability in &ws.abilities {
            if let Some(rule) = ability_rule(&ability.effect, ability.value, id, owner) {
                game.engine.add(rule);
            }
        }
        if entry.general {
            if let Some(trait_idx) = roster.heroic_trait {
                let t = &faction.heroic_traits[trait_idx];
                if let Some(rule) = ability_rule(&t.effect, t.value, id, owner) {
                    game.engine.add(rule);
                }
            }
        }
    }

    if let (Some(a), Some(b)) = (roster.artefact, roster.artefact_bearer) {
        let artefact = &faction.artefacts[a];
        let bearer = ids[b];
        if let Some(rule) = ability_rule(&artefact.effect, artefact.value, bearer, owner) {
            game.engine.add(rule);
        }
    }

    game.engine.add_all(battle_trait_rules(&faction.id, owner));
    if let Some(i) = roster.formation {
        game.engine
            .add_all(formation_rules(&faction.id, &faction.formations[i].name, owner));
    }

    // Masters of Destiny: Tzeentch armies pre-roll their fate.
    if faction.id == FACTION_TZEENTCH {
        let pool = DestinyPool::roll_initial(&mut game.dice);
        game.destiny.insert(owner, pool);
    }

    info!(
        faction = %faction.id,
        %owner,
        units = ids.len(),
        points = total_points(roster, faction),
        "army deployed"
    );
    Ok(ids)
}
