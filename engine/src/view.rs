// ═══════════════════════════════════════════════════════════════════════
// Player view — the read-only projection handed to strategies
//
// v1 hides nothing (both players see the full battlefield), but all
// access goes through this projection so fog-of-war can be layered in
// without touching the player interface.
// ═══════════════════════════════════════════════════════════════════════

use crate::game::Game;
use crate::geometry::Position;
use crate::model::{ActionFlags, Keyword, PlayerId, StrikeOrder, UnitId};
use crate::phases::Phase;
use serde::{Deserialize, Serialize};

/// The game as one player is allowed to see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub viewer: PlayerId,
    pub round: u32,
    pub phase: Phase,
    pub active_player: PlayerId,
    pub board_width: f64,
    pub board_height: f64,
    pub units: Vec<UnitView>,
    pub command_points: u8,
    pub winner: Option<PlayerId>,
    pub is_over: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitView {
    pub id: UnitId,
    pub name: String,
    pub owner: PlayerId,
    /// Leader position; None once the unit is destroyed.
    pub position: Option<Position>,
    pub models_alive: u32,
    pub models_total: u32,
    pub total_health: i32,
    pub max_health: i32,
    pub move_: f64,
    pub save: u8,
    pub strike_order: StrikeOrder,
    pub weapons: Vec<WeaponView>,
    pub flags: ActionFlags,
    pub spells: Vec<String>,
    pub prayers: Vec<String>,
    pub ritual_points: u8,
    pub can_cast: bool,
    pub can_chant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponView {
    pub name: String,
    pub range: f64,
    pub attacks: u32,
    pub to_hit: u8,
    pub to_wound: u8,
    pub rend: u8,
    pub damage: u32,
}

/// Project the game state for one player.
pub fn player_view(game: &Game, viewer: PlayerId) -> PlayerView {
    let units = game
        .units
        .iter()
        .map(|u| UnitView {
            id: u.id,
            name: u.name.clone(),
            owner: u.owner,
            position: u.leader_position(),
            models_alive: u.alive_models(),
            models_total: u.total_models(),
            total_health: u.total_health(),
            max_health: u.max_health(),
            move_: u.stats.move_,
            save: u.stats.save,
            strike_order: u.strike_order,
            weapons: u
                .weapons
                .iter()
                .map(|w| WeaponView {
                    name: w.name.clone(),
                    range: w.range,
                    attacks: w.attacks,
                    to_hit: w.to_hit,
                    to_wound: w.to_wound,
                    rend: w.rend,
                    damage: w.damage,
                })
                .collect(),
            flags: u.flags,
            spells: u.spells.iter().map(|s| s.name.clone()).collect(),
            prayers: u.prayers.iter().map(|p| p.name.clone()).collect(),
            ritual_points: u.ritual_points,
            can_cast: u.has_keyword(Keyword::Wizard)
                && !u.is_destroyed()
                && u.flags.casts < u.power_level
                && !u.flags.miscast(),
            can_chant: u.has_keyword(Keyword::Priest)
                && !u.is_destroyed()
                && u.flags.chants < u.power_level,
        })
        .collect();

    PlayerView {
        viewer,
        round: game.round,
        phase: game.phase,
        active_player: game.active_player,
        board_width: game.board.width,
        board_height: game.board.height,
        units,
        command_points: game.command_points(viewer),
        winner: game.winner,
        is_over: game.is_over,
    }
}
