// ═══════════════════════════════════════════════════════════════════════
// Heuristic player — makes decisions using simple battlefield heuristics.
// Significantly stronger than RandomPlayer.
// ═══════════════════════════════════════════════════════════════════════

use crate::player::Player;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use warhost_engine::commands::Command;
use warhost_engine::game::CommandSource;
use warhost_engine::geometry::{distance, step_toward, Position};
use warhost_engine::model::{PlayerId, UnitId};
use warhost_engine::phases::Phase;
use warhost_engine::view::{PlayerView, UnitView, WeaponView};

const CHARGE_REACH: f64 = 12.0;
const MELEE_REACH: f64 = 3.0;

pub struct HeuristicPlayer {
    id: PlayerId,
    rng: ChaCha8Rng,
    attempted: HashSet<(u32, Phase, UnitId, &'static str)>,
}

impl HeuristicPlayer {
    pub fn new(id: PlayerId, seed: u64) -> Self {
        HeuristicPlayer {
            id,
            rng: ChaCha8Rng::seed_from_u64(seed),
            attempted: HashSet::new(),
        }
    }

    fn try_once(&mut self, view: &PlayerView, unit: UnitId, action: &'static str) -> bool {
        self.attempted.insert((view.round, view.phase, unit, action))
    }

    /// Rough killing power of a weapon profile against an average save.
    fn weapon_threat(w: &WeaponView) -> f64 {
        let hit_p = (7.0 - w.to_hit as f64).max(0.0) / 6.0;
        let wound_p = (7.0 - w.to_wound as f64).max(0.0) / 6.0;
        w.attacks as f64 * hit_p * wound_p * (w.damage as f64 + w.rend as f64 * 0.5)
    }

    /// How dangerous an enemy unit still is.
    fn unit_threat(u: &UnitView) -> f64 {
        let per_model: f64 = u.weapons.iter().map(Self::weapon_threat).sum();
        per_model * u.models_alive as f64
    }

    /// The enemy most worth removing: highest threat per remaining health.
    fn priority_target(&self, view: &PlayerView, from: Position, reach: f64) -> Option<(UnitId, Position)> {
        view.units
            .iter()
            .filter(|u| u.owner != self.id && u.position.is_some())
            .filter(|u| distance(from, u.position.unwrap()) <= reach)
            .max_by(|a, b| {
                let score = |u: &UnitView| Self::unit_threat(u) / (u.total_health.max(1) as f64);
                score(a)
                    .partial_cmp(&score(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|u| (u.id, u.position.unwrap()))
    }

    fn nearest_enemy(&self, view: &PlayerView, from: Position) -> Option<(UnitId, Position)> {
        view.units
            .iter()
            .filter(|u| u.owner != self.id && u.position.is_some())
            .map(|u| (u.id, u.position.unwrap()))
            .min_by(|a, b| {
                distance(from, a.1)
                    .partial_cmp(&distance(from, b.1))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Badly hurt units fall back instead of pressing on.
    fn should_withdraw(u: &UnitView) -> bool {
        u.total_health * 3 < u.max_health
    }

    fn decide_for_unit(&mut self, view: &PlayerView, u: &UnitView) -> Option<Command> {
        let pos = u.position?;
        let (nearest, nearest_pos) = self.nearest_enemy(view, pos)?;
        let dist = distance(pos, nearest_pos);

        match view.phase {
            Phase::Hero => {
                if u.can_cast && !u.spells.is_empty() && self.try_once(view, u.id, "cast") {
                    // Throw the first spell at the juiciest target in range
                    let spell = u.spells[0].clone();
                    let target = self
                        .priority_target(view, pos, 18.0)
                        .map(|(id, _)| id)
                        .unwrap_or(nearest);
                    return Some(Command::Cast { unit: u.id, spell, target });
                }
                if u.can_chant && !u.prayers.is_empty() && self.try_once(view, u.id, "chant") {
                    let prayer = u.prayers[0].clone();
                    // Build a reserve first, spend once the chant is likely
                    let bank = u.ritual_points < 4;
                    return Some(Command::Chant { unit: u.id, prayer, target: nearest, bank });
                }
                if Self::should_withdraw(u)
                    && dist > MELEE_REACH
                    && u.models_alive < u.models_total
                    && self.try_once(view, u.id, "rally")
                {
                    return Some(Command::Rally { unit: u.id });
                }
                None
            }

            Phase::Movement => {
                if u.flags.moved() || u.flags.retreated() {
                    return None;
                }
                let engaged = dist <= MELEE_REACH;
                if engaged {
                    // Crippled units slip out of combat and regroup
                    if Self::should_withdraw(u) && self.try_once(view, u.id, "retreat") {
                        let len = dist.max(0.1);
                        let reach = u.move_.min(6.0);
                        let to = Position::new(
                            (pos.x + (pos.x - nearest_pos.x) / len * reach)
                                .clamp(0.0, view.board_width),
                            (pos.y + (pos.y - nearest_pos.y) / len * reach)
                                .clamp(0.0, view.board_height),
                        );
                        return Some(Command::Retreat { unit: u.id, to });
                    }
                    return None;
                }
                if !self.try_once(view, u.id, "move") {
                    return None;
                }
                // Shooters keep their distance; everyone else closes
                let has_ranged = u.weapons.iter().any(|w| w.range > 0.0);
                let standoff = if has_ranged { 9.0 } else { 1.0 };
                if dist <= standoff {
                    return None;
                }
                let reach = u.move_.min(dist - standoff);
                let to = step_toward(pos, nearest_pos, reach);
                // Run when far out of contact, walk when closing for a charge
                if dist > CHARGE_REACH + u.move_ && self.rng.gen_bool(0.8) {
                    Some(Command::Run { unit: u.id, to })
                } else {
                    Some(Command::Move { unit: u.id, to })
                }
            }

            Phase::Shooting => {
                if u.flags.shot() || u.flags.ran() || u.flags.retreated() {
                    return None;
                }
                let min_range = u
                    .weapons
                    .iter()
                    .filter(|w| w.range > 0.0)
                    .map(|w| w.range)
                    .fold(f64::INFINITY, f64::min);
                if !min_range.is_finite() {
                    return None;
                }
                if let Some((target, _)) = self.priority_target(view, pos, min_range) {
                    if self.try_once(view, u.id, "shoot") {
                        return Some(Command::Shoot { unit: u.id, target });
                    }
                }
                None
            }

            Phase::Charge => {
                if u.flags.charged() || u.flags.ran() || u.flags.retreated() {
                    return None;
                }
                if Self::should_withdraw(u) {
                    return None;
                }
                let has_melee = u.weapons.iter().any(|w| w.range == 0.0);
                if has_melee
                    && dist > MELEE_REACH
                    && dist <= CHARGE_REACH
                    && self.try_once(view, u.id, "charge")
                {
                    let target = self
                        .priority_target(view, pos, CHARGE_REACH)
                        .map(|(id, _)| id)
                        .unwrap_or(nearest);
                    return Some(Command::Charge { unit: u.id, target });
                }
                None
            }

            Phase::Combat => {
                let has_melee = u.weapons.iter().any(|w| w.range == 0.0);
                if has_melee && !u.flags.fought() {
                    if let Some((target, _)) = self.priority_target(view, pos, MELEE_REACH) {
                        if self.try_once(view, u.id, "fight") {
                            return Some(Command::Fight { unit: u.id, target });
                        }
                    }
                }
                if dist > MELEE_REACH
                    && dist <= 6.0
                    && !u.flags.piled_in()
                    && self.try_once(view, u.id, "pilein")
                {
                    return Some(Command::PileIn { unit: u.id });
                }
                None
            }

            Phase::RoundStart | Phase::End => None,
        }
    }
}

impl CommandSource for HeuristicPlayer {
    fn next_command(&mut self, view: &PlayerView) -> Option<Command> {
        if view.is_over {
            return None;
        }
        let mine: Vec<UnitView> = view
            .units
            .iter()
            .filter(|u| u.owner == self.id && u.position.is_some())
            .cloned()
            .collect();
        for u in &mine {
            if let Some(cmd) = self.decide_for_unit(view, u) {
                return Some(cmd);
            }
        }
        None
    }
}

impl Player for HeuristicPlayer {
    fn name(&self) -> &str {
        "Heuristic"
    }

    fn id(&self) -> PlayerId {
        self.id
    }
}
