// ═══════════════════════════════════════════════════════════════════════
// Events — the append-only game log
//
// Everything observable that happens during a game lands here, in order.
// The log plus the seed is the audit trail for deterministic replay.
// ═══════════════════════════════════════════════════════════════════════

use crate::model::{PlayerId, UnitId};
use crate::phases::Phase;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    RoundStarted {
        round: u32,
    },
    PhaseStarted {
        round: u32,
        phase: Phase,
        player: PlayerId,
    },
    CommandResolved {
        player: PlayerId,
        command: String,
        success: bool,
        description: String,
    },
    CommandRejected {
        player: PlayerId,
        command: String,
        error: String,
    },
    UnitMoved {
        unit: UnitId,
        x: f64,
        y: f64,
    },
    ChargeResolved {
        unit: UnitId,
        target: UnitId,
        roll: i32,
        needed: f64,
        success: bool,
    },
    CombatResolved {
        attacker: UnitId,
        defender: UnitId,
        shooting: bool,
        damage: i32,
    },
    ModelsSlain {
        unit: UnitId,
        count: u32,
    },
    UnitDestroyed {
        unit: UnitId,
    },
    SpellCast {
        caster: UnitId,
        target: UnitId,
        spell: String,
        roll: i32,
        empowered: bool,
    },
    CastFailed {
        caster: UnitId,
        spell: String,
        roll: i32,
    },
    SpellUnbound {
        caster: UnitId,
        unbinder: UnitId,
        spell: String,
        cast_roll: i32,
        unbind_roll: i32,
    },
    Miscast {
        caster: UnitId,
        spell: String,
        self_damage: i32,
    },
    PrayerAnswered {
        priest: UnitId,
        target: UnitId,
        prayer: String,
        roll: i32,
    },
    PrayerFailed {
        priest: UnitId,
        prayer: String,
        ritual_points_lost: u8,
    },
    RitualPointsBanked {
        priest: UnitId,
        prayer: String,
        face: u8,
        total: u8,
    },
    Rallied {
        unit: UnitId,
        points: u32,
        healed: i32,
        models_returned: u32,
    },
    GameEnded {
        winner: Option<PlayerId>,
        round: u32,
    },
}
