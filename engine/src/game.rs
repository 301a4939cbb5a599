// ═══════════════════════════════════════════════════════════════════════
// Game orchestrator — command dispatch, phase loop, victory, log
//
// Architecture:
//   Pure state machine. Never does I/O or talks to strategies directly.
//   `execute` validates and applies one command; `run` drives the round
//   loop, pulling commands from CommandSource implementations.
// ═══════════════════════════════════════════════════════════════════════

use crate::board::{Board, CHARGE_RANGE, ENGAGEMENT_RANGE};
use crate::combat::{resolve_combat, resolve_mortal_wounds, resolve_shooting, CombatReport};
use crate::commands::{Command, CommandError, Outcome};
use crate::dice::Dice;
use crate::events::GameEvent;
use crate::geometry::{distance, step_toward, Position, EPS};
use crate::magic::{self, DestinyPool};
use crate::model::{PlayerId, Unit, UnitId, UnitTable};
use crate::phases::{current_strike_tier, Phase};
use crate::rules::{RuleContext, RuleSource, RulesEngine, Trigger};
use crate::terrain_rules::terrain_rules;
use crate::view::{player_view, PlayerView};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const RALLY_DICE: u32 = 6;
const RALLY_THRESHOLD: u8 = 4;
const PILE_IN_RANGE: f64 = 3.0;
const CHARGE_GAP: f64 = 0.5;
const MAX_COMMANDS_PER_SLOT: usize = 1_000;

/// A source of commands for one player: the read-only view goes in, a
/// command (or None, meaning EndPhase) comes out.
pub trait CommandSource {
    fn next_command(&mut self, view: &PlayerView) -> Option<Command>;
}

// ── Game state ─────────────────────────────────────────────────────────

pub struct Game {
    pub units: UnitTable,
    pub board: Board,
    pub engine: RulesEngine,
    pub dice: Dice,
    pub round: u32,
    pub phase: Phase,
    pub active_player: PlayerId,
    pub command_points: BTreeMap<PlayerId, u8>,
    /// Spell/prayer names resolved this round (uniqueness restriction).
    pub resolved_spells: BTreeSet<String>,
    /// Pre-rolled destiny pools per player (Masters of Destiny).
    pub destiny: BTreeMap<PlayerId, DestinyPool>,
    /// Names of Global rules that expire at the end of the round.
    pub transient_rules: Vec<String>,
    pub log: Vec<GameEvent>,
    pub winner: Option<PlayerId>,
    pub is_over: bool,
    next_unit_id: u32,
}

impl Game {
    /// A fresh game on the given board. Terrain rules register up front.
    pub fn new(board: Board, seed: u64) -> Self {
        let mut engine = RulesEngine::new();
        engine.add_all(terrain_rules(&board));
        Game {
            units: UnitTable::default(),
            board,
            engine,
            dice: Dice::new(seed),
            round: 0,
            phase: Phase::RoundStart,
            active_player: PlayerId(0),
            command_points: BTreeMap::new(),
            resolved_spells: BTreeSet::new(),
            destiny: BTreeMap::new(),
            transient_rules: Vec::new(),
            log: Vec::new(),
            winner: None,
            is_over: false,
            next_unit_id: 1,
        }
    }

    // ── Unit access ────────────────────────────────────────────────────

    /// Insert a unit, assigning the next monotonically increasing id.
    pub fn create_unit(&mut self, mut unit: Unit) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        unit.id = id;
        self.units.insert(unit);
        id
    }

    pub fn unit(&self, id: UnitId) -> Result<&Unit, CommandError> {
        self.units.get(id).ok_or(CommandError::UnknownUnit(id))
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Result<&mut Unit, CommandError> {
        self.units.get_mut(id).ok_or(CommandError::UnknownUnit(id))
    }

    /// A live enemy target for `player`.
    fn enemy_target(&self, player: PlayerId, id: UnitId) -> Result<&Unit, CommandError> {
        let target = self.unit(id)?;
        if target.owner == player {
            return Err(CommandError::TargetFriendly(id));
        }
        if target.is_destroyed() {
            return Err(CommandError::TargetDestroyed(id));
        }
        Ok(target)
    }

    pub fn command_points(&self, player: PlayerId) -> u8 {
        self.command_points.get(&player).copied().unwrap_or(0)
    }

    pub fn destiny_pool(&self, player: PlayerId) -> Option<&DestinyPool> {
        self.destiny.get(&player)
    }

    /// Spend one destiny die showing `face`: it is pulled from the pool
    /// and pinned as the next d6 result. Returns false if no such die.
    pub fn spend_destiny(&mut self, player: PlayerId, face: u8) -> bool {
        let Some(pool) = self.destiny.get_mut(&player) else {
            return false;
        };
        if pool.use_value(face) {
            self.dice.queue_face(face);
            true
        } else {
            false
        }
    }

    // ── Command execution ──────────────────────────────────────────────

    /// Validate and apply one command for `player`. Structural errors
    /// reject without mutating; rule failures return an unsuccessful
    /// Outcome with whatever partial effects the rules dictate.
    pub fn execute(&mut self, player: PlayerId, command: &Command) -> Result<Outcome, CommandError> {
        if self.is_over {
            return Err(CommandError::GameOver);
        }
        if !self.phase.allows(command) {
            return Err(CommandError::WrongPhase { command: command.tag(), phase: self.phase });
        }
        if let Some(id) = command.unit() {
            let unit = self.units.get(id).ok_or(CommandError::UnknownUnit(id))?;
            if unit.owner != player {
                return Err(CommandError::WrongOwner { unit: id, owner: unit.owner });
            }
            if unit.is_destroyed() {
                return Err(CommandError::UnitDestroyed(id));
            }
        }

        debug!(%player, command = command.tag(), "executing");
        let result = match command.clone() {
            Command::Move { unit, to } => self.handle_move(unit, to, MoveKind::Normal),
            Command::Run { unit, to } => self.handle_move(unit, to, MoveKind::Run),
            Command::Retreat { unit, to } => self.handle_move(unit, to, MoveKind::Retreat),
            Command::Shoot { unit, target } => self.handle_shoot(player, unit, target),
            Command::Charge { unit, target } => self.handle_charge(player, unit, target),
            Command::Fight { unit, target } => self.handle_fight(player, unit, target),
            Command::PileIn { unit } => self.handle_pile_in(unit),
            Command::Cast { unit, spell, target } => magic::cast(self, unit, &spell, target, 0),
            Command::Chant { unit, prayer, target, bank } => {
                magic::chant(self, unit, &prayer, target, bank, 0)
            }
            Command::Rally { unit } => self.handle_rally(unit),
            Command::MagicalIntervention { unit, ability, target } => {
                self.handle_intervention(player, unit, &ability, target)
            }
            Command::EndPhase => Ok(Outcome::success("phase ended")),
        };

        match &result {
            Ok(outcome) => self.log.push(GameEvent::CommandResolved {
                player,
                command: command.tag().to_string(),
                success: outcome.success,
                description: outcome.description.clone(),
            }),
            Err(err) => self.log.push(GameEvent::CommandRejected {
                player,
                command: command.tag().to_string(),
                error: err.to_string(),
            }),
        }

        self.check_victory();
        result
    }

    // ── Movement ───────────────────────────────────────────────────────

    fn handle_move(
        &mut self,
        unit_id: UnitId,
        to: Position,
        kind: MoveKind,
    ) -> Result<Outcome, CommandError> {
        let (origin, move_stat, flags) = {
            let u = self.unit(unit_id)?;
            (
                u.leader_position().ok_or(CommandError::UnitDestroyed(unit_id))?,
                u.stats.move_,
                u.flags,
            )
        };
        if flags.moved() || flags.retreated() {
            return Err(CommandError::AlreadyActed("move"));
        }
        if !self.board.in_bounds(to) {
            return Err(CommandError::OutOfBounds);
        }
        if kind != MoveKind::Retreat {
            let u = self.unit(unit_id)?;
            if self.units.in_combat(u, ENGAGEMENT_RANGE) {
                return Err(CommandError::UnitInCombat);
            }
        }

        let mut ctx = RuleContext::movement(unit_id, origin, to);
        self.engine.evaluate(Trigger::BeforeMove, &mut ctx, &self.units);
        if let Some(msg) = ctx.block_message() {
            return Ok(Outcome::failure(msg.to_string()));
        }

        let run_roll = if kind == MoveKind::Run { self.dice.roll_d6() } else { 0 };
        let budget = move_stat + run_roll as f64 + ctx.mods.move_ as f64;
        let dist = distance(origin, to);
        if dist > budget + EPS {
            return Err(CommandError::OutOfRange { required: budget, actual: dist });
        }

        if let Some(u) = self.units.get_mut(unit_id) {
            u.translate_to(to);
            match kind {
                MoveKind::Normal => u.flags.set_moved(),
                MoveKind::Run => {
                    u.flags.set_moved();
                    u.flags.set_ran();
                }
                MoveKind::Retreat => u.flags.set_retreated(),
            }
        }
        self.log.push(GameEvent::UnitMoved { unit: unit_id, x: to.x, y: to.y });

        let mut after = RuleContext::movement(unit_id, origin, to);
        self.engine.evaluate(Trigger::AfterMove, &mut after, &self.units);

        match kind {
            MoveKind::Normal => Ok(Outcome::success(format!(
                "moved {dist:.1}\" to ({:.1}, {:.1})",
                to.x, to.y
            ))),
            MoveKind::Run => Ok(Outcome::success(format!(
                "ran {dist:.1}\" (rolled {run_roll}) to ({:.1}, {:.1})",
                to.x, to.y
            ))),
            MoveKind::Retreat => {
                let d3 = self.dice.roll_d3() as u32;
                let report = resolve_mortal_wounds(
                    &mut self.units,
                    &self.engine,
                    &mut self.dice,
                    unit_id,
                    d3,
                );
                self.push_casualties(unit_id, &report);
                Ok(Outcome::success(format!(
                    "retreated {dist:.1}\", suffering {} mortal wounds",
                    report.total_damage
                )))
            }
        }
    }

    // ── Shooting ───────────────────────────────────────────────────────

    fn handle_shoot(
        &mut self,
        player: PlayerId,
        unit_id: UnitId,
        target_id: UnitId,
    ) -> Result<Outcome, CommandError> {
        let (shooter_pos, flags) = {
            let u = self.unit(unit_id)?;
            (
                u.leader_position().ok_or(CommandError::UnitDestroyed(unit_id))?,
                u.flags,
            )
        };
        if flags.shot() {
            return Err(CommandError::AlreadyActed("shoot"));
        }
        if flags.ran() || flags.retreated() {
            return Err(CommandError::RanOrRetreated);
        }
        let target = self.enemy_target(player, target_id)?;
        let target_pos = target.leader_position().ok_or(CommandError::TargetDestroyed(target_id))?;

        let ranges: Vec<f64> = self.unit(unit_id)?.ranged_weapons().map(|w| w.range).collect();
        if ranges.is_empty() {
            return Err(CommandError::NoWeaponsOfType);
        }
        let dist = distance(shooter_pos, target_pos);
        for range in ranges {
            if dist > range + EPS {
                return Err(CommandError::OutOfRange { required: range, actual: dist });
            }
        }

        let mut ctx = RuleContext::default();
        ctx.attacker = Some(unit_id);
        ctx.defender = Some(target_id);
        ctx.shooting = true;
        self.engine.evaluate(Trigger::BeforeShoot, &mut ctx, &self.units);
        if let Some(msg) = ctx.block_message() {
            return Ok(Outcome::failure(msg.to_string()));
        }

        let report =
            resolve_shooting(&mut self.units, &self.engine, &mut self.dice, unit_id, target_id);
        if let Some(u) = self.units.get_mut(unit_id) {
            u.flags.set_shot();
        }
        self.log.push(GameEvent::CombatResolved {
            attacker: unit_id,
            defender: target_id,
            shooting: true,
            damage: report.total_damage,
        });
        self.push_casualties(target_id, &report);
        Ok(Outcome::success(format!(
            "shooting deals {} damage, slaying {} models",
            report.total_damage, report.models_slain
        )))
    }

    // ── Charging ───────────────────────────────────────────────────────

    fn handle_charge(
        &mut self,
        player: PlayerId,
        unit_id: UnitId,
        target_id: UnitId,
    ) -> Result<Outcome, CommandError> {
        let (origin, flags) = {
            let u = self.unit(unit_id)?;
            (
                u.leader_position().ok_or(CommandError::UnitDestroyed(unit_id))?,
                u.flags,
            )
        };
        if flags.charged() {
            return Err(CommandError::AlreadyActed("charge"));
        }
        if flags.ran() || flags.retreated() {
            return Err(CommandError::RanOrRetreated);
        }
        let target = self.enemy_target(player, target_id)?;
        let target_pos = target.leader_position().ok_or(CommandError::TargetDestroyed(target_id))?;
        let dist = distance(origin, target_pos);
        if dist > CHARGE_RANGE + EPS {
            return Err(CommandError::OutOfRange { required: CHARGE_RANGE, actual: dist });
        }

        let mut ctx = RuleContext::charge(unit_id, target_id);
        self.engine.evaluate(Trigger::BeforeCharge, &mut ctx, &self.units);
        if let Some(msg) = ctx.block_message() {
            return Ok(Outcome::failure(msg.to_string()));
        }

        let (a, b) = self.dice.roll_2d6();
        let roll = a as i32 + b as i32 + ctx.mods.charge;

        // The attempt is spent whatever happens next.
        if let Some(u) = self.units.get_mut(unit_id) {
            u.flags.set_charged();
        }

        let success = roll as f64 + EPS >= dist;
        self.log.push(GameEvent::ChargeResolved {
            unit: unit_id,
            target: target_id,
            roll,
            needed: dist,
            success,
        });
        if !success {
            return Ok(Outcome::failure(format!(
                "charge roll of {roll} fails to cover {dist:.1}\""
            )));
        }

        // Slam into contact, half an inch from the target.
        let dest = crate::geometry::clamp(
            step_toward(origin, target_pos, (dist - CHARGE_GAP).max(0.0)),
            self.board.width,
            self.board.height,
        );
        if let Some(u) = self.units.get_mut(unit_id) {
            u.translate_to(dest);
        }

        // Charge-triggered mortal wounds land after the charger arrives.
        if ctx.mods.mortal_wounds > 0 {
            let report = resolve_mortal_wounds(
                &mut self.units,
                &self.engine,
                &mut self.dice,
                target_id,
                ctx.mods.mortal_wounds as u32,
            );
            self.push_casualties(target_id, &report);
        }

        Ok(Outcome::success(format!(
            "charge roll of {roll} carries {dist:.1}\" into combat"
        )))
    }

    // ── Fighting ───────────────────────────────────────────────────────

    fn handle_fight(
        &mut self,
        player: PlayerId,
        unit_id: UnitId,
        target_id: UnitId,
    ) -> Result<Outcome, CommandError> {
        let (attacker_pos, flags, strike) = {
            let u = self.unit(unit_id)?;
            (
                u.leader_position().ok_or(CommandError::UnitDestroyed(unit_id))?,
                u.flags,
                u.strike_order,
            )
        };
        if flags.fought() {
            return Err(CommandError::AlreadyActed("fight"));
        }
        if self.unit(unit_id)?.melee_weapons().next().is_none() {
            return Err(CommandError::NoWeaponsOfType);
        }
        let target = self.enemy_target(player, target_id)?;
        let target_pos = target.leader_position().ok_or(CommandError::TargetDestroyed(target_id))?;
        let dist = distance(attacker_pos, target_pos);
        if dist > ENGAGEMENT_RANGE + EPS {
            return Err(CommandError::OutOfRange { required: ENGAGEMENT_RANGE, actual: dist });
        }

        // Strike-First activates before Normal, Normal before Strike-Last.
        if let Some(tier) = current_strike_tier(&self.units) {
            if strike > tier {
                return Err(CommandError::StrikeOrderViolation);
            }
        }

        let report =
            resolve_combat(&mut self.units, &self.engine, &mut self.dice, unit_id, target_id);
        if let Some(u) = self.units.get_mut(unit_id) {
            u.flags.set_fought();
        }
        self.log.push(GameEvent::CombatResolved {
            attacker: unit_id,
            defender: target_id,
            shooting: false,
            damage: report.total_damage,
        });
        self.push_casualties(target_id, &report);
        Ok(Outcome::success(format!(
            "fighting deals {} damage, slaying {} models",
            report.total_damage, report.models_slain
        )))
    }

    fn handle_pile_in(&mut self, unit_id: UnitId) -> Result<Outcome, CommandError> {
        let (pos, owner, flags) = {
            let u = self.unit(unit_id)?;
            (
                u.leader_position().ok_or(CommandError::UnitDestroyed(unit_id))?,
                u.owner,
                u.flags,
            )
        };
        if flags.piled_in() {
            return Err(CommandError::AlreadyActed("pile in"));
        }

        let mut ctx = RuleContext::default();
        ctx.attacker = Some(unit_id);
        ctx.origin = Some(pos);
        self.engine.evaluate(Trigger::BeforePileIn, &mut ctx, &self.units);
        if let Some(msg) = ctx.block_message() {
            return Ok(Outcome::failure(msg.to_string()));
        }
        let cap = (PILE_IN_RANGE + ctx.mods.pile_in as f64).max(0.0);

        let Some(nearest) = self.units.nearest_enemy_model(owner, pos) else {
            return Ok(Outcome::failure("no enemy left to pile in toward"));
        };
        let gap = (distance(pos, nearest) - CHARGE_GAP).max(0.0);
        let dest = step_toward(pos, nearest, cap.min(gap));
        if let Some(u) = self.units.get_mut(unit_id) {
            u.translate_to(dest);
            u.flags.set_piled_in();
        }
        self.log.push(GameEvent::UnitMoved { unit: unit_id, x: dest.x, y: dest.y });
        Ok(Outcome::success(format!(
            "piled in {:.1}\" toward the enemy",
            distance(pos, dest)
        )))
    }

    // ── Rallying ───────────────────────────────────────────────────────

    fn handle_rally(&mut self, unit_id: UnitId) -> Result<Outcome, CommandError> {
        {
            let u = self.unit(unit_id)?;
            if self.units.in_combat(u, ENGAGEMENT_RANGE) {
                return Err(CommandError::UnitInCombat);
            }
        }

        let mut points: u32 = 0;
        for _ in 0..RALLY_DICE {
            let (_, success) = self.dice.roll_with_threshold(RALLY_THRESHOLD);
            if success {
                points += 1;
            }
        }

        let unit = self.units.get_mut(unit_id).ok_or(CommandError::UnknownUnit(unit_id))?;
        let health_stat = unit.stats.health.max(1) as u32;
        let mut models_returned: u32 = 0;

        // Returning slain models costs the health characteristic apiece.
        // Large units need at least two survivors to anchor coherency.
        let can_revive = unit.total_models() < 7 || unit.alive_models() >= 2;
        if can_revive {
            while points >= health_stat {
                let leader = unit.leader_position();
                let Some(dead) = unit.models.iter_mut().find(|m| !m.alive) else {
                    break;
                };
                dead.current_health = dead.max_health;
                dead.alive = true;
                if let Some(p) = leader {
                    dead.position = p;
                }
                points -= health_stat;
                models_returned += 1;
            }
        }

        // Remaining points heal one health each.
        let healed = unit.heal(points as i32);

        self.log.push(GameEvent::Rallied {
            unit: unit_id,
            points: points + models_returned * health_stat,
            healed,
            models_returned,
        });
        Ok(Outcome::success(format!(
            "rally returns {models_returned} models and heals {healed} health"
        )))
    }

    // ── Magical intervention ───────────────────────────────────────────

    fn handle_intervention(
        &mut self,
        player: PlayerId,
        unit_id: UnitId,
        ability: &str,
        target_id: UnitId,
    ) -> Result<Outcome, CommandError> {
        if self.active_player == player {
            return Err(CommandError::WrongPhase {
                command: "MagicalIntervention",
                phase: self.phase,
            });
        }
        if self.command_points(player) == 0 {
            return Err(CommandError::NoCommandPoints);
        }

        let unit = self.unit(unit_id)?;
        let is_spell = unit.spells.iter().any(|s| s.name == ability);
        let is_prayer = unit.prayers.iter().any(|p| p.name == ability);

        let result = if is_spell {
            magic::cast(self, unit_id, ability, target_id, -1)
        } else if is_prayer {
            magic::chant(self, unit_id, ability, target_id, false, -1)
        } else {
            Err(CommandError::UnknownAbility(ability.to_string()))
        };

        if result.is_ok() {
            if let Some(cp) = self.command_points.get_mut(&player) {
                *cp = cp.saturating_sub(1);
            }
        }
        result
    }

    fn push_casualties(&mut self, unit_id: UnitId, report: &CombatReport) {
        if report.models_slain > 0 {
            self.log.push(GameEvent::ModelsSlain { unit: unit_id, count: report.models_slain });
        }
        if report.defender_destroyed {
            self.log.push(GameEvent::UnitDestroyed { unit: unit_id });
        }
    }

    // ── Round & phase machinery ────────────────────────────────────────

    /// Advance to the next battle round: reset per-phase flags, grant a
    /// command point per player, clear the per-round spell registry, and
    /// fire the round-start rules.
    pub fn start_round(&mut self) {
        self.round += 1;
        self.phase = Phase::RoundStart;
        self.active_player = PlayerId(((self.round - 1) % 2) as u8);
        for unit in self.units.iter_mut() {
            unit.flags.reset();
        }
        for p in [PlayerId(0), PlayerId(1)] {
            *self.command_points.entry(p).or_insert(0) += 1;
        }
        self.resolved_spells.clear();
        self.log.push(GameEvent::RoundStarted { round: self.round });

        let mut ctx = RuleContext::for_phase(Phase::RoundStart);
        self.engine.evaluate(Trigger::OnBattleRoundStart, &mut ctx, &self.units);
    }

    pub fn begin_phase(&mut self, phase: Phase) {
        self.phase = phase;
        if phase == Phase::Hero {
            for unit in self.units.iter_mut() {
                unit.flags.reset_magic();
            }
        }
        self.log.push(GameEvent::PhaseStarted {
            round: self.round,
            phase,
            player: self.active_player,
        });
        let mut ctx = RuleContext::for_phase(phase);
        self.engine.evaluate(Trigger::OnPhaseStart, &mut ctx, &self.units);
    }

    pub fn end_phase(&mut self) {
        let mut ctx = RuleContext::for_phase(self.phase);
        self.engine.evaluate(Trigger::OnPhaseEnd, &mut ctx, &self.units);

        // Transient buffs die with the round.
        if self.phase == Phase::End {
            let expiring: Vec<String> = self.transient_rules.drain(..).collect();
            for name in expiring {
                self.engine.remove_by_source(RuleSource::Global, &name);
            }
        }
    }

    // ── Victory ────────────────────────────────────────────────────────

    /// A player with zero alive units has lost; both at zero is a draw.
    pub fn check_victory(&mut self) {
        if self.is_over {
            return;
        }
        let mut deployed = [false; 2];
        let mut alive = [false; 2];
        for u in self.units.iter() {
            let idx = (u.owner.0 as usize).min(1);
            deployed[idx] = true;
            if !u.is_destroyed() {
                alive[idx] = true;
            }
        }
        if !(deployed[0] && deployed[1]) {
            return;
        }
        self.winner = match (alive[0], alive[1]) {
            (true, true) => return,
            (true, false) => Some(PlayerId(0)),
            (false, true) => Some(PlayerId(1)),
            (false, false) => None, // mutual annihilation
        };
        self.is_over = true;
        self.log.push(GameEvent::GameEnded { winner: self.winner, round: self.round });
    }

    // ── Main loop ──────────────────────────────────────────────────────

    pub fn view(&self, player: PlayerId) -> PlayerView {
        player_view(self, player)
    }

    /// Play up to `rounds` battle rounds, pulling commands from the two
    /// sources (indexed by player id). A source returning None yields the
    /// rest of its phase.
    pub fn run(&mut self, players: &mut [&mut dyn CommandSource; 2], rounds: u32) {
        for _ in 0..rounds {
            if self.is_over {
                break;
            }
            self.start_round();
            for phase in Phase::COMMAND_PHASES {
                self.begin_phase(phase);
                let first = self.active_player;
                let order = [first, PlayerId(1 - first.0)];
                'players: for p in order {
                    for _ in 0..MAX_COMMANDS_PER_SLOT {
                        if self.is_over {
                            break 'players;
                        }
                        let view = self.view(p);
                        let Some(command) = players[p.0 as usize].next_command(&view) else {
                            break;
                        };
                        let ended = matches!(command, Command::EndPhase);
                        let _ = self.execute(p, &command);
                        if ended {
                            break;
                        }
                    }
                }
                self.end_phase();
                if self.is_over {
                    break;
                }
            }
        }
        if !self.is_over {
            self.is_over = true;
            self.log.push(GameEvent::GameEnded { winner: self.winner, round: self.round });
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveKind {
    Normal,
    Run,
    Retreat,
}
