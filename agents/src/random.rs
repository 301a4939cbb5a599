// ═══════════════════════════════════════════════════════════════════════
// Random player — closes with the enemy and picks actions with a
// seeded RNG. Baseline strategy and engine-stability workhorse.
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
use warhost_engine::view::{PlayerView, UnitView};

const CHARGE_REACH: f64 = 12.0;
const MELEE_REACH: f64 = 3.0;

pub struct RandomPlayer {
    id: PlayerId,
    rng: ChaCha8Rng,
    /// Actions already attempted this phase, so a rejected command is not
    /// retried forever: (round, phase, unit, action tag).
    attempted: HashSet<(u32, Phase, UnitId, &'static str)>,
}

impl RandomPlayer {
    pub fn new(id: PlayerId, seed: u64) -> Self {
        RandomPlayer {
            id,
            rng: ChaCha8Rng::seed_from_u64(seed),
            attempted: HashSet::new(),
        }
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

    fn try_once(
        &mut self,
        view: &PlayerView,
        unit: UnitId,
        action: &'static str,
    ) -> bool {
        self.attempted.insert((view.round, view.phase, unit, action))
    }

    fn decide_for_unit(&mut self, view: &PlayerView, u: &UnitView) -> Option<Command> {
        let pos = u.position?;
        let (enemy, enemy_pos) = self.nearest_enemy(view, pos)?;
        let dist = distance(pos, enemy_pos);

        match view.phase {
            Phase::Hero => {
                if u.can_cast && !u.spells.is_empty() && self.try_once(view, u.id, "cast") {
                    let spell = u.spells[self.rng.gen_range(0..u.spells.len())].clone();
                    return Some(Command::Cast { unit: u.id, spell, target: enemy });
                }
                if u.can_chant && !u.prayers.is_empty() && self.try_once(view, u.id, "chant") {
                    let prayer = u.prayers[self.rng.gen_range(0..u.prayers.len())].clone();
                    // Bank early, spend once a reserve has built up
                    let bank = u.ritual_points < 3 && self.rng.gen_bool(0.7);
                    return Some(Command::Chant { unit: u.id, prayer, target: enemy, bank });
                }
                if u.total_health < u.max_health
                    && dist > MELEE_REACH
                    && self.rng.gen_bool(0.3)
                    && self.try_once(view, u.id, "rally")
                {
                    return Some(Command::Rally { unit: u.id });
                }
                None
            }

            Phase::Movement => {
                if u.flags.moved() || u.flags.retreated() || dist <= MELEE_REACH {
                    return None;
                }
                if !self.try_once(view, u.id, "move") {
                    return None;
                }
                // Close most of the gap, stopping just outside engagement
                let reach = u.move_.min((dist - 1.0).max(0.0));
                let to = step_toward(pos, enemy_pos, reach);
                if self.rng.gen_bool(0.25) {
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
                if min_range.is_finite() && dist <= min_range && self.try_once(view, u.id, "shoot") {
                    return Some(Command::Shoot { unit: u.id, target: enemy });
                }
                None
            }

            Phase::Charge => {
                if u.flags.charged() || u.flags.ran() || u.flags.retreated() {
                    return None;
                }
                if dist > MELEE_REACH && dist <= CHARGE_REACH && self.try_once(view, u.id, "charge") {
                    return Some(Command::Charge { unit: u.id, target: enemy });
                }
                None
            }

            Phase::Combat => {
                let has_melee = u.weapons.iter().any(|w| w.range == 0.0);
                if dist <= MELEE_REACH && has_melee && !u.flags.fought()
                    && self.try_once(view, u.id, "fight")
                {
                    return Some(Command::Fight { unit: u.id, target: enemy });
                }
                if dist > MELEE_REACH && dist <= 6.0 && !u.flags.piled_in()
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

impl CommandSource for RandomPlayer {
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

impl Player for RandomPlayer {
    fn name(&self) -> &str {
        "Random"
    }

    fn id(&self) -> PlayerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warhost_engine::board::Board;
    use warhost_engine::game::Game;
    use warhost_engine::model::{
        ActionFlags, Model, StrikeOrder, Unit, UnitStats, Weapon, WeaponAbilities,
    };
    use std::collections::BTreeSet;

    fn grunt(owner: u8, pos: Position) -> Unit {
        Unit {
            id: UnitId(0),
            name: format!("grunt-{owner}"),
            owner: PlayerId(owner),
            stats: UnitStats { move_: 6.0, save: 4, control: 1, health: 2 },
            models: (0..5).map(|i| Model::new(i, pos, 1.0, 2)).collect(),
            weapons: vec![Weapon {
                name: "Blade".into(),
                range: 0.0,
                attacks: 2,
                to_hit: 3,
                to_wound: 3,
                rend: 1,
                damage: 1,
                abilities: WeaponAbilities::NONE,
            }],
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
    fn test_random_players_finish_a_game() {
        let mut game = Game::new(Board::standard(), 99);
        game.create_unit(grunt(0, Position::new(20.0, 22.0)));
        game.create_unit(grunt(1, Position::new(40.0, 22.0)));

        let mut p0 = RandomPlayer::new(PlayerId(0), 1);
        let mut p1 = RandomPlayer::new(PlayerId(1), 2);
        game.run(&mut [&mut p0, &mut p1], 20);
        assert!(game.is_over);
    }

    #[test]
    fn test_random_play_is_deterministic() {
        let play = || {
            let mut game = Game::new(Board::standard(), 7);
            game.create_unit(grunt(0, Position::new(20.0, 22.0)));
            game.create_unit(grunt(1, Position::new(40.0, 22.0)));
            let mut p0 = RandomPlayer::new(PlayerId(0), 11);
            let mut p1 = RandomPlayer::new(PlayerId(1), 12);
            game.run(&mut [&mut p0, &mut p1], 20);
            (game.winner, game.round, game.log.len())
        };
        assert_eq!(play(), play());
    }
}
