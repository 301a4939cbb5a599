// ═══════════════════════════════════════════════════════════════════════
// Board — battlefield rectangle, terrain features, objectives
// ═══════════════════════════════════════════════════════════════════════

use crate::geometry::{Position, EPS};
use serde::{Deserialize, Serialize};

// ── Standard table constants ───────────────────────────────────────────

pub const BOARD_WIDTH: f64 = 60.0;
pub const BOARD_HEIGHT: f64 = 44.0;
pub const DEPLOY_DEPTH_SHORT: f64 = 9.0;
pub const DEPLOY_DEPTH_LONG: f64 = 12.0;
pub const CHARGE_RANGE: f64 = 12.0;
pub const ENGAGEMENT_RANGE: f64 = 3.0;
pub const UNBIND_RANGE: f64 = 30.0;
pub const GHYRANITE_RADIUS: f64 = 3.0;
pub const MM_PER_INCH: f64 = 25.4;

/// Convert a base size in millimetres to inches.
pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

// ── Rectangles ─────────────────────────────────────────────────────────

/// Axis-aligned rectangle in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x - EPS
            && pos.x <= self.x + self.width + EPS
            && pos.y >= self.y - EPS
            && pos.y <= self.y + self.height + EPS
    }
}

// ── Terrain ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    Obstacle,
    Obscuring,
    Area,
    PlaceOfPower,
    Impassable,
    Open,
}

impl TerrainKind {
    /// Kinds that grant cover to units standing inside them.
    pub fn grants_cover(self) -> bool {
        matches!(
            self,
            TerrainKind::Obstacle
                | TerrainKind::Obscuring
                | TerrainKind::Area
                | TerrainKind::PlaceOfPower
        )
    }

    /// Kinds that cannot be ended on by a normal move.
    pub fn is_unstable(self) -> bool {
        matches!(
            self,
            TerrainKind::Obstacle | TerrainKind::Obscuring | TerrainKind::PlaceOfPower
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainFeature {
    pub name: String,
    pub rect: Rect,
    pub kind: TerrainKind,
}

// ── Objectives ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhyraniteKind {
    None,
    Oakenbrow,
    Gnarlroot,
    Winterleaf,
    Heartwood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub position: Position,
    pub radius: f64,
    pub ghyranite: GhyraniteKind,
    /// Objectives sharing a non-zero pair id form a pair.
    pub pair: u8,
}

// ── Board ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub width: f64,
    pub height: f64,
    pub terrain: Vec<TerrainFeature>,
    pub objectives: Vec<Objective>,
}

impl Board {
    /// An empty standard-size table.
    pub fn standard() -> Self {
        Board {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            terrain: Vec::new(),
            objectives: Vec::new(),
        }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= -EPS && pos.x <= self.width + EPS && pos.y >= -EPS && pos.y <= self.height + EPS
    }

    /// All terrain features whose footprint contains `pos`.
    pub fn features_at(&self, pos: Position) -> impl Iterator<Item = &TerrainFeature> {
        self.terrain.iter().filter(move |f| f.rect.contains(pos))
    }

    /// Remove a terrain feature by name, e.g. after it is destroyed.
    /// The matching rules must be dropped separately via the rules engine.
    pub fn remove_feature(&mut self, name: &str) -> bool {
        let before = self.terrain.len();
        self.terrain.retain(|f| f.name != name);
        self.terrain.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(r.contains(Position::new(12.0, 12.0)));
        assert!(r.contains(Position::new(10.0, 10.0))); // edge inclusive
        assert!(r.contains(Position::new(15.0, 15.0)));
        assert!(!r.contains(Position::new(15.1, 12.0)));
    }

    #[test]
    fn test_board_bounds() {
        let board = Board::standard();
        assert!(board.in_bounds(Position::new(0.0, 0.0)));
        assert!(board.in_bounds(Position::new(60.0, 44.0)));
        assert!(!board.in_bounds(Position::new(60.5, 10.0)));
        assert!(!board.in_bounds(Position::new(10.0, -1.0)));
    }

    #[test]
    fn test_terrain_cover_table() {
        assert!(TerrainKind::Obstacle.grants_cover());
        assert!(TerrainKind::PlaceOfPower.grants_cover());
        assert!(!TerrainKind::Impassable.grants_cover());
        assert!(!TerrainKind::Open.grants_cover());
        assert!(TerrainKind::PlaceOfPower.is_unstable());
        assert!(!TerrainKind::Area.is_unstable());
    }

    #[test]
    fn test_remove_feature() {
        let mut board = Board::standard();
        board.terrain.push(TerrainFeature {
            name: "Ruined Shrine".into(),
            rect: Rect::new(20.0, 20.0, 6.0, 4.0),
            kind: TerrainKind::Obstacle,
        });
        assert!(board.remove_feature("Ruined Shrine"));
        assert!(!board.remove_feature("Ruined Shrine"));
        assert!(board.terrain.is_empty());
    }

    #[test]
    fn test_mm_conversion() {
        assert!((mm_to_inches(25.4) - 1.0).abs() < 1e-9);
        assert!((mm_to_inches(32.0) - 1.2598425196850394).abs() < 1e-9);
    }
}
