// ═══════════════════════════════════════════════════════════════════════
// Commands — the messages players send, and how they can fail
//
// Structural errors reject a command before any state mutates.
// Game-rule failures come back as an unsuccessful Outcome, possibly
// with partial effects (a failed charge still spends the attempt).
// ═══════════════════════════════════════════════════════════════════════

use crate::geometry::Position;
use crate::model::{PlayerId, UnitId};
use crate::phases::Phase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Command messages ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Move { unit: UnitId, to: Position },
    Run { unit: UnitId, to: Position },
    Retreat { unit: UnitId, to: Position },
    Shoot { unit: UnitId, target: UnitId },
    Charge { unit: UnitId, target: UnitId },
    Fight { unit: UnitId, target: UnitId },
    PileIn { unit: UnitId },
    Cast { unit: UnitId, spell: String, target: UnitId },
    Chant { unit: UnitId, prayer: String, target: UnitId, bank: bool },
    Rally { unit: UnitId },
    /// Out-of-turn cast/chant during the enemy hero phase; costs one
    /// command point and takes -1 to the roll.
    MagicalIntervention { unit: UnitId, ability: String, target: UnitId },
    EndPhase,
}

impl Command {
    /// The unit a command acts through, if any.
    pub fn unit(&self) -> Option<UnitId> {
        match self {
            Command::Move { unit, .. }
            | Command::Run { unit, .. }
            | Command::Retreat { unit, .. }
            | Command::Shoot { unit, .. }
            | Command::Charge { unit, .. }
            | Command::Fight { unit, .. }
            | Command::PileIn { unit }
            | Command::Cast { unit, .. }
            | Command::Chant { unit, .. }
            | Command::Rally { unit }
            | Command::MagicalIntervention { unit, .. } => Some(*unit),
            Command::EndPhase => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Command::Move { .. } => "Move",
            Command::Run { .. } => "Run",
            Command::Retreat { .. } => "Retreat",
            Command::Shoot { .. } => "Shoot",
            Command::Charge { .. } => "Charge",
            Command::Fight { .. } => "Fight",
            Command::PileIn { .. } => "PileIn",
            Command::Cast { .. } => "Cast",
            Command::Chant { .. } => "Chant",
            Command::Rally { .. } => "Rally",
            Command::MagicalIntervention { .. } => "MagicalIntervention",
            Command::EndPhase => "EndPhase",
        }
    }
}

// ── Structural errors ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("no such unit: {0}")]
    UnknownUnit(UnitId),
    #[error("{unit} belongs to {owner}, not the commanding player")]
    WrongOwner { unit: UnitId, owner: PlayerId },
    #[error("{command} is not legal during the {phase:?} phase")]
    WrongPhase { command: &'static str, phase: Phase },
    #[error("destination lies outside the battlefield")]
    OutOfBounds,
    #[error("target out of range: needs {required}\", actual {actual:.1}\"")]
    OutOfRange { required: f64, actual: f64 },
    #[error("unit has already performed this action ({0}) this turn")]
    AlreadyActed(&'static str),
    #[error("unit has no weapons of the required kind")]
    NoWeaponsOfType,
    #[error("cannot target {0}: wrong side for this action")]
    TargetFriendly(UnitId),
    #[error("target {0} is already destroyed")]
    TargetDestroyed(UnitId),
    #[error("{0} is destroyed and cannot act")]
    UnitDestroyed(UnitId),
    #[error("{0} is not a wizard")]
    NotACaster(UnitId),
    #[error("{0} is not a priest")]
    NotAPriest(UnitId),
    #[error("'{0}' has already been resolved this turn")]
    SpellAlreadyCast(String),
    #[error("unit does not know '{0}'")]
    UnknownAbility(String),
    #[error("unit is locked in combat")]
    UnitInCombat,
    #[error("unit ran or retreated this turn and cannot do that")]
    RanOrRetreated,
    #[error("a unit with an earlier strike order must fight first")]
    StrikeOrderViolation,
    #[error("no command points remaining")]
    NoCommandPoints,
    #[error("the game is over")]
    GameOver,
}

// ── Outcomes ───────────────────────────────────────────────────────────

/// Result of a legal command: whether the in-game attempt worked, and a
/// human-readable account for the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub description: String,
}

impl Outcome {
    pub fn success(description: impl Into<String>) -> Self {
        Outcome { success: true, description: description.into() }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Outcome { success: false, description: description.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_unit_extraction() {
        let c = Command::Move { unit: UnitId(3), to: Position::new(1.0, 2.0) };
        assert_eq!(c.unit(), Some(UnitId(3)));
        assert_eq!(Command::EndPhase.unit(), None);
    }

    #[test]
    fn test_error_messages_render() {
        let e = CommandError::OutOfRange { required: 12.0, actual: 14.25 };
        assert!(e.to_string().contains("12"));
        let e = CommandError::WrongPhase { command: "Move", phase: Phase::Hero };
        assert!(e.to_string().contains("Move"));
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(Outcome::success("ok").success);
        assert!(!Outcome::failure("no").success);
    }
}
