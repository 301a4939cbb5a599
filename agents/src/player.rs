// ═══════════════════════════════════════════════════════════════════════
// Player trait — interface every strategy implements
//
// KEY DESIGN PRINCIPLE:
//   Players receive a `PlayerView` (not the raw Game), the read-only
//   projection the core is willing to show them. They answer with
//   commands; returning None yields the rest of the current phase.
// ═══════════════════════════════════════════════════════════════════════

use warhost_engine::game::CommandSource;
use warhost_engine::model::PlayerId;

/// A command-issuing strategy for one side of the battle.
/// `CommandSource` supplies the decision loop; this adds identity.
pub trait Player: CommandSource {
    /// Human-readable name for this strategy (e.g. "Random", "Turtle").
    fn name(&self) -> &str;

    /// The side this player commands.
    fn id(&self) -> PlayerId;
}
