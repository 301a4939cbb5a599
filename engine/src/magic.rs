// ═══════════════════════════════════════════════════════════════════════
// Magic — casting, unbinding, miscasts, prayers, destiny dice
// ═══════════════════════════════════════════════════════════════════════

use crate::board::UNBIND_RANGE;
use crate::combat::resolve_mortal_wounds;
use crate::commands::{CommandError, Outcome};
use crate::events::GameEvent;
use crate::game::Game;
use crate::geometry::in_range;
use crate::model::{Keyword, Spell, SpellEffect, UnitId};
use crate::rules::{Rule, RuleSource, Trigger};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ── Destiny dice ───────────────────────────────────────────────────────

/// A pool of pre-rolled d6 faces (Masters of Destiny). The pool only
/// produces faces; feeding one into `Dice::queue_face` is the caller's
/// decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinyPool {
    faces: Vec<u8>,
}

impl DestinyPool {
    pub const INITIAL_DICE: usize = 9;

    pub fn roll_initial(dice: &mut crate::dice::Dice) -> Self {
        let faces = (0..Self::INITIAL_DICE).map(|_| dice.roll_d6()).collect();
        DestinyPool { faces }
    }

    pub fn from_faces(faces: Vec<u8>) -> Self {
        DestinyPool { faces }
    }

    pub fn count(&self) -> usize {
        self.faces.len()
    }

    pub fn has_value(&self, value: u8) -> bool {
        self.faces.contains(&value)
    }

    /// Remove one die showing `value`; false if none is available.
    pub fn use_value(&mut self, value: u8) -> bool {
        if let Some(idx) = self.faces.iter().position(|&f| f == value) {
            self.faces.remove(idx);
            true
        } else {
            false
        }
    }

    pub fn use_best(&mut self) -> Option<u8> {
        let best = *self.faces.iter().max()?;
        self.use_value(best);
        Some(best)
    }

    pub fn use_worst(&mut self) -> Option<u8> {
        let worst = *self.faces.iter().min()?;
        self.use_value(worst);
        Some(worst)
    }

    pub fn add_die(&mut self, value: u8) {
        self.faces.push(value.clamp(1, 6));
    }
}

// ── Casting ────────────────────────────────────────────────────────────

/// Attempt to cast a named spell. `roll_mod` is applied to the 2d6 sum
/// (magical intervention passes -1); doubles are read from the natural
/// faces.
pub fn cast(
    game: &mut Game,
    caster_id: UnitId,
    spell_name: &str,
    target_id: UnitId,
    roll_mod: i32,
) -> Result<Outcome, CommandError> {
    let caster = game.unit(caster_id)?;
    if !caster.has_keyword(Keyword::Wizard) {
        return Err(CommandError::NotACaster(caster_id));
    }
    if caster.flags.casts >= caster.power_level {
        return Err(CommandError::AlreadyActed("cast"));
    }
    let spell = caster
        .spells
        .iter()
        .find(|s| s.name == spell_name)
        .cloned()
        .ok_or_else(|| CommandError::UnknownAbility(spell_name.to_string()))?;
    if game.resolved_spells.contains(spell_name) && !spell.unlimited {
        return Err(CommandError::SpellAlreadyCast(spell_name.to_string()));
    }

    let caster = game.unit(caster_id)?;
    let target = game.unit(target_id)?;
    if target.is_destroyed() {
        return Err(CommandError::TargetDestroyed(target_id));
    }
    let friendly = target.owner == caster.owner;
    if spell.targets_friendly != friendly {
        return Err(CommandError::TargetFriendly(target_id));
    }
    let (Some(cp), Some(tp)) = (caster.leader_position(), target.leader_position()) else {
        return Err(CommandError::UnitDestroyed(caster_id));
    };
    if !in_range(cp, tp, spell.range) {
        return Err(CommandError::OutOfRange {
            required: spell.range,
            actual: crate::geometry::distance(cp, tp),
        });
    }

    // A miscast earlier this phase silences the wizard; this is a rule
    // failure, not a structural one.
    if caster.flags.miscast() {
        return Ok(Outcome::failure(format!(
            "{} reels from a miscast and cannot cast again this phase",
            caster.name
        )));
    }

    let caster_owner = caster.owner;
    if let Some(u) = game.units.get_mut(caster_id) {
        u.flags.casts += 1;
    }

    let (a, b) = game.dice.roll_2d6();
    let total = a as i32 + b as i32 + roll_mod;
    debug!(spell = spell_name, a, b, roll_mod, "cast roll");

    // Double 1: miscast
    if a == 1 && b == 1 {
        let d3 = game.dice.roll_d3() as u32;
        let report =
            resolve_mortal_wounds(&mut game.units, &game.engine, &mut game.dice, caster_id, d3);
        if let Some(u) = game.units.get_mut(caster_id) {
            u.flags.set_miscast();
        }
        game.log.push(GameEvent::Miscast {
            caster: caster_id,
            spell: spell_name.to_string(),
            self_damage: report.total_damage,
        });
        return Ok(Outcome::failure(format!(
            "miscast! the spell collapses for {} mortal wounds",
            report.total_damage
        )));
    }

    let empowered = a == b;

    if !empowered && total < spell.threshold as i32 {
        game.log.push(GameEvent::CastFailed {
            caster: caster_id,
            spell: spell_name.to_string(),
            roll: total,
        });
        return Ok(Outcome::failure(format!(
            "casting roll of {total} fails against a value of {}",
            spell.threshold
        )));
    }

    // Unbinding window — skipped for empowered casts.
    if !empowered {
        let unbinders: Vec<UnitId> = game
            .units
            .iter()
            .filter(|u| {
                u.owner != caster_owner
                    && !u.is_destroyed()
                    && u.has_keyword(Keyword::Wizard)
                    && u.flags.unbinds < u.power_level
                    && u.leader_position().map_or(false, |p| in_range(p, cp, UNBIND_RANGE))
            })
            .map(|u| u.id)
            .collect();
        for wizard_id in unbinders {
            let (ua, ub) = game.dice.roll_2d6();
            let unbind_roll = ua as i32 + ub as i32;
            if let Some(w) = game.units.get_mut(wizard_id) {
                w.flags.unbinds += 1;
            }
            if unbind_roll > total {
                game.log.push(GameEvent::SpellUnbound {
                    caster: caster_id,
                    unbinder: wizard_id,
                    spell: spell_name.to_string(),
                    cast_roll: total,
                    unbind_roll,
                });
                return Ok(Outcome::failure(format!(
                    "spell unbound ({unbind_roll} over {total})"
                )));
            }
        }
    }

    if !spell.unlimited {
        game.resolved_spells.insert(spell_name.to_string());
    }

    let description = apply_effect(game, &spell, target_id);
    game.log.push(GameEvent::SpellCast {
        caster: caster_id,
        target: target_id,
        spell: spell_name.to_string(),
        roll: total,
        empowered,
    });
    Ok(Outcome::success(if empowered {
        format!("empowered cast: {description}")
    } else {
        description
    }))
}

// ── Chanting ───────────────────────────────────────────────────────────

/// Attempt a prayer. `bank = true` stockpiles the face as ritual points;
/// `bank = false` spends the accumulated points toward the chanting value.
pub fn chant(
    game: &mut Game,
    priest_id: UnitId,
    prayer_name: &str,
    target_id: UnitId,
    bank: bool,
    roll_mod: i32,
) -> Result<Outcome, CommandError> {
    let priest = game.unit(priest_id)?;
    if !priest.has_keyword(Keyword::Priest) {
        return Err(CommandError::NotAPriest(priest_id));
    }
    if priest.flags.chants >= priest.power_level {
        return Err(CommandError::AlreadyActed("chant"));
    }
    let prayer = priest
        .prayers
        .iter()
        .find(|p| p.name == prayer_name)
        .cloned()
        .ok_or_else(|| CommandError::UnknownAbility(prayer_name.to_string()))?;
    if game.resolved_spells.contains(prayer_name) && !prayer.unlimited {
        return Err(CommandError::SpellAlreadyCast(prayer_name.to_string()));
    }

    // Spending requires a legal target; banking asks nothing of the world.
    if !bank {
        let priest = game.unit(priest_id)?;
        let target = game.unit(target_id)?;
        if target.is_destroyed() {
            return Err(CommandError::TargetDestroyed(target_id));
        }
        if prayer.targets_friendly != (target.owner == priest.owner) {
            return Err(CommandError::TargetFriendly(target_id));
        }
        let (Some(pp), Some(tp)) = (priest.leader_position(), target.leader_position()) else {
            return Err(CommandError::UnitDestroyed(priest_id));
        };
        if !in_range(pp, tp, prayer.range) {
            return Err(CommandError::OutOfRange {
                required: prayer.range,
                actual: crate::geometry::distance(pp, tp),
            });
        }
    }

    if let Some(u) = game.units.get_mut(priest_id) {
        u.flags.chants += 1;
    }

    let face = game.dice.roll_d6();
    debug!(prayer = prayer_name, face, bank, "chant roll");

    if face == 1 {
        let d3 = game.dice.roll_d3();
        let priest = game.units.get_mut(priest_id).ok_or(CommandError::UnknownUnit(priest_id))?;
        let lost = priest.ritual_points.min(d3);
        priest.ritual_points -= lost;
        game.log.push(GameEvent::PrayerFailed {
            priest: priest_id,
            prayer: prayer_name.to_string(),
            ritual_points_lost: lost,
        });
        return Ok(Outcome::failure(format!(
            "the prayer falters; {lost} ritual points scatter"
        )));
    }

    if bank {
        let priest = game.units.get_mut(priest_id).ok_or(CommandError::UnknownUnit(priest_id))?;
        priest.ritual_points = priest.ritual_points.saturating_add(face);
        let banked = priest.ritual_points;
        game.log.push(GameEvent::RitualPointsBanked {
            priest: priest_id,
            prayer: prayer_name.to_string(),
            face,
            total: banked,
        });
        return Ok(Outcome::success(format!(
            "banked {face}, ritual points now {banked}"
        )));
    }

    // Spend: points fuel the chant and are consumed either way.
    let ritual = game.unit(priest_id)?.ritual_points;
    let chant_total = face as i32 + ritual as i32 + roll_mod;
    if let Some(u) = game.units.get_mut(priest_id) {
        u.ritual_points = 0;
    }

    if chant_total < prayer.threshold as i32 {
        game.log.push(GameEvent::PrayerFailed {
            priest: priest_id,
            prayer: prayer_name.to_string(),
            ritual_points_lost: ritual,
        });
        return Ok(Outcome::failure(format!(
            "chant of {chant_total} falls short of {}; ritual points spent",
            prayer.threshold
        )));
    }

    if !prayer.unlimited {
        game.resolved_spells.insert(prayer_name.to_string());
    }
    let description = apply_effect(game, &prayer, target_id);
    game.log.push(GameEvent::PrayerAnswered {
        priest: priest_id,
        target: target_id,
        prayer: prayer_name.to_string(),
        roll: chant_total,
    });
    Ok(Outcome::success(description))
}

// ── Effects ────────────────────────────────────────────────────────────

/// Apply a successful spell/prayer effect and describe what happened.
fn apply_effect(game: &mut Game, spell: &Spell, target_id: UnitId) -> String {
    match spell.effect {
        SpellEffect::Damage => {
            let n = game.dice.roll_d3() as u32 + spell.value;
            let report =
                resolve_mortal_wounds(&mut game.units, &game.engine, &mut game.dice, target_id, n);
            if report.models_slain > 0 {
                game.log.push(GameEvent::ModelsSlain {
                    unit: target_id,
                    count: report.models_slain,
                });
            }
            if report.defender_destroyed {
                game.log.push(GameEvent::UnitDestroyed { unit: target_id });
            }
            format!(
                "{} deals {} mortal wounds",
                spell.name, report.total_damage
            )
        }
        SpellEffect::Heal => {
            let n = game.dice.roll_d3() as i32 + spell.value as i32;
            let restored = game
                .units
                .get_mut(target_id)
                .map_or(0, |u| u.heal(n));
            format!("{} restores {restored} health", spell.name)
        }
        SpellEffect::Buff => {
            // A transient save bonus, registered as a Global rule and torn
            // down at the end of the round. The unit's save stat is never
            // touched.
            let bonus = spell.value.max(1) as i32;
            let name = format!("{}:{}:r{}", spell.name, target_id, game.round);
            game.engine.add(
                Rule::new(name.clone(), Trigger::BeforeSaveRoll, RuleSource::Global, move |ctx, _| {
                    ctx.mods.save += bonus;
                })
                .with_predicate(move |ctx, _| ctx.defender == Some(target_id)),
            );
            game.transient_rules.push(name);
            format!("{} wards the target (+{bonus} save) until end of round", spell.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::Dice;

    #[test]
    fn test_destiny_pool_operations() {
        let mut pool = DestinyPool::from_faces(vec![2, 4, 6, 1, 3]);
        assert_eq!(pool.count(), 5);
        assert!(pool.has_value(4));
        assert!(!pool.has_value(5));

        assert_eq!(pool.use_best(), Some(6));
        assert_eq!(pool.count(), 4);

        let mut pool = DestinyPool::from_faces(vec![2, 4, 6, 1, 3]);
        assert_eq!(pool.use_worst(), Some(1));
        assert_eq!(pool.count(), 4);

        assert!(pool.use_value(4));
        assert!(!pool.use_value(4));

        pool.add_die(5);
        assert!(pool.has_value(5));
    }

    #[test]
    fn test_destiny_pool_initial_roll() {
        let mut d1 = Dice::new(77);
        let mut d2 = Dice::new(77);
        let p1 = DestinyPool::roll_initial(&mut d1);
        let p2 = DestinyPool::roll_initial(&mut d2);
        assert_eq!(p1.count(), DestinyPool::INITIAL_DICE);
        assert_eq!(p1, p2);
    }

    #[test]
    fn test_empty_pool() {
        let mut pool = DestinyPool::default();
        assert_eq!(pool.use_best(), None);
        assert_eq!(pool.use_worst(), None);
        assert!(!pool.use_value(3));
    }
}
