// ═══════════════════════════════════════════════════════════════════════
// Phase state machine — fixed per-round phase order and command legality
// ═══════════════════════════════════════════════════════════════════════

use crate::board::ENGAGEMENT_RANGE;
use crate::commands::Command;
use crate::model::{StrikeOrder, UnitId, UnitTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    RoundStart,
    Hero,
    Movement,
    Shooting,
    Charge,
    Combat,
    End,
}

impl Phase {
    pub const SEQUENCE: [Phase; 7] = [
        Phase::RoundStart,
        Phase::Hero,
        Phase::Movement,
        Phase::Shooting,
        Phase::Charge,
        Phase::Combat,
        Phase::End,
    ];

    /// The phases during which players issue commands.
    pub const COMMAND_PHASES: [Phase; 6] = [
        Phase::Hero,
        Phase::Movement,
        Phase::Shooting,
        Phase::Charge,
        Phase::Combat,
        Phase::End,
    ];

    pub fn next(self) -> Option<Phase> {
        let idx = Phase::SEQUENCE.iter().position(|&p| p == self)?;
        Phase::SEQUENCE.get(idx + 1).copied()
    }

    /// Per-phase command legality. EndPhase is always legal.
    pub fn allows(self, command: &Command) -> bool {
        match command {
            Command::EndPhase => true,
            Command::Move { .. } | Command::Run { .. } | Command::Retreat { .. } => {
                self == Phase::Movement
            }
            Command::Shoot { .. } => self == Phase::Shooting,
            Command::Charge { .. } => self == Phase::Charge,
            Command::Fight { .. } | Command::PileIn { .. } => self == Phase::Combat,
            Command::Cast { .. }
            | Command::Chant { .. }
            | Command::Rally { .. }
            | Command::MagicalIntervention { .. } => self == Phase::Hero,
        }
    }
}

// ── Combat activation order ────────────────────────────────────────────

/// Units eligible to be activated in the combat phase: alive, engaged,
/// and not yet fought. Ordered Strike-First → Normal → Strike-Last, ties
/// broken by unit id. Within a tier the active player chooses freely; the
/// tier boundary itself is enforced.
pub fn combat_activation_order(units: &UnitTable) -> Vec<UnitId> {
    let mut eligible: Vec<(StrikeOrder, UnitId)> = units
        .iter()
        .filter(|u| !u.is_destroyed() && !u.flags.fought() && units.in_combat(u, ENGAGEMENT_RANGE))
        .map(|u| (u.strike_order, u.id))
        .collect();
    eligible.sort();
    eligible.into_iter().map(|(_, id)| id).collect()
}

/// The strike tier whose turn it is: the earliest tier with an eligible
/// unfought unit.
pub fn current_strike_tier(units: &UnitTable) -> Option<StrikeOrder> {
    units
        .iter()
        .filter(|u| !u.is_destroyed() && !u.flags.fought() && units.in_combat(u, ENGAGEMENT_RANGE))
        .map(|u| u.strike_order)
        .min()
}
