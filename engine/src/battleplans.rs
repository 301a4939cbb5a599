// ═══════════════════════════════════════════════════════════════════════
// Battleplans — the 12 fixed scenarios (2 tables × 6 rolls)
// Static scenario data that never changes during a game.
// ═══════════════════════════════════════════════════════════════════════

use crate::board::{
    Board, GhyraniteKind, Objective, Rect, TerrainFeature, TerrainKind, BOARD_HEIGHT, BOARD_WIDTH,
    DEPLOY_DEPTH_LONG, DEPLOY_DEPTH_SHORT, GHYRANITE_RADIUS,
};
use crate::dice::Dice;
use crate::geometry::Position;

/// One objective row of a battleplan.
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveConfig {
    pub x: f64,
    pub y: f64,
    pub ghyranite: GhyraniteKind,
    pub pair: u8,
}

/// One terrain piece of a battleplan.
#[derive(Debug, Clone, Copy)]
pub struct TerrainConfig {
    pub name: &'static str,
    pub kind: TerrainKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Static description of a scenario (compile-time constant).
#[derive(Debug, Clone)]
pub struct Battleplan {
    pub name: &'static str,
    /// Battleplan table, 1 or 2.
    pub table: u8,
    /// The d6 roll selecting this plan within its table.
    pub roll: u8,
    pub width: f64,
    pub height: f64,
    pub territories: [Rect; 2],
    pub objectives: [ObjectiveConfig; 6],
    pub terrain: &'static [TerrainConfig],
}

// Table 1 deploys on the short edges, table 2 on the long edges.
const TERRITORIES_SHORT: [Rect; 2] = [
    Rect { x: 0.0, y: 0.0, width: DEPLOY_DEPTH_SHORT, height: BOARD_HEIGHT },
    Rect {
        x: BOARD_WIDTH - DEPLOY_DEPTH_SHORT,
        y: 0.0,
        width: DEPLOY_DEPTH_SHORT,
        height: BOARD_HEIGHT,
    },
];
const TERRITORIES_LONG: [Rect; 2] = [
    Rect { x: 0.0, y: 0.0, width: BOARD_WIDTH, height: DEPLOY_DEPTH_LONG },
    Rect {
        x: 0.0,
        y: BOARD_HEIGHT - DEPLOY_DEPTH_LONG,
        width: BOARD_WIDTH,
        height: DEPLOY_DEPTH_LONG,
    },
];

macro_rules! obj {
    ($x:expr, $y:expr, $kind:ident, $pair:expr) => {
        ObjectiveConfig { x: $x, y: $y, ghyranite: GhyraniteKind::$kind, pair: $pair }
    };
}

macro_rules! terrain {
    ($name:expr, $kind:ident, $x:expr, $y:expr, $w:expr, $h:expr) => {
        TerrainConfig { name: $name, kind: TerrainKind::$kind, x: $x, y: $y, width: $w, height: $h }
    };
}

macro_rules! plan {
    ($name:expr, table: 1, roll: $roll:expr,
     objectives: [$($obj:expr),* $(,)?], terrain: $terrain:expr) => {
        Battleplan {
            name: $name,
            table: 1,
            roll: $roll,
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            territories: TERRITORIES_SHORT,
            objectives: [$($obj),*],
            terrain: $terrain,
        }
    };
    ($name:expr, table: 2, roll: $roll:expr,
     objectives: [$($obj:expr),* $(,)?], terrain: $terrain:expr) => {
        Battleplan {
            name: $name,
            table: 2,
            roll: $roll,
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            territories: TERRITORIES_LONG,
            objectives: [$($obj),*],
            terrain: $terrain,
        }
    };
}

pub static BATTLEPLANS: [Battleplan; 12] = [
    // ═══ TABLE 1 — short-edge deployment ═══
    plan!("Border Clash", table: 1, roll: 1,
        objectives: [
            obj!(30.0,  8.0, Oakenbrow,  1), obj!(30.0, 36.0, Oakenbrow,  1),
            obj!(18.0, 22.0, Gnarlroot,  2), obj!(42.0, 22.0, Gnarlroot,  2),
            obj!(12.0, 12.0, Winterleaf, 3), obj!(48.0, 32.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Fallen Watchtower", Obstacle, 26.0, 18.0, 8.0, 4.0),
            terrain!("Mistwood", Obscuring, 12.0, 28.0, 6.0, 6.0),
        ]),
    plan!("The Vice", table: 1, roll: 2,
        objectives: [
            obj!(20.0, 12.0, Oakenbrow,  1), obj!(40.0, 32.0, Oakenbrow,  1),
            obj!(20.0, 32.0, Gnarlroot,  2), obj!(40.0, 12.0, Gnarlroot,  2),
            obj!(14.0, 22.0, Winterleaf, 3), obj!(46.0, 22.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Shattered Aqueduct", Impassable, 28.0, 20.0, 4.0, 4.0),
            terrain!("Bramble Field", Area, 40.0, 20.0, 8.0, 8.0),
        ]),
    plan!("Shifting Front", table: 1, roll: 3,
        objectives: [
            obj!(24.0, 10.0, Oakenbrow,  1), obj!(36.0, 34.0, Oakenbrow,  1),
            obj!(14.0, 28.0, Gnarlroot,  2), obj!(46.0, 16.0, Gnarlroot,  2),
            obj!(30.0,  6.0, Winterleaf, 3), obj!(30.0, 38.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Sunken Obelisk", PlaceOfPower, 28.0, 20.0, 4.0, 4.0),
            terrain!("Old Palisade", Obstacle, 14.0, 10.0, 6.0, 3.0),
        ]),
    plan!("Forbidden Ground", table: 1, roll: 4,
        objectives: [
            obj!(16.0, 16.0, Oakenbrow,  1), obj!(44.0, 28.0, Oakenbrow,  1),
            obj!(16.0, 28.0, Gnarlroot,  2), obj!(44.0, 16.0, Gnarlroot,  2),
            obj!(30.0, 12.0, Winterleaf, 3), obj!(30.0, 32.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Cursed Mere", Impassable, 26.0, 18.0, 8.0, 8.0),
            terrain!("Thornhedge", Area, 10.0, 32.0, 8.0, 5.0),
        ]),
    plan!("Broken Causeway", table: 1, roll: 5,
        objectives: [
            obj!(22.0, 22.0, Oakenbrow,  1), obj!(38.0, 22.0, Oakenbrow,  1),
            obj!(30.0, 10.0, Gnarlroot,  2), obj!(30.0, 34.0, Gnarlroot,  2),
            obj!(12.0, 34.0, Winterleaf, 3), obj!(48.0, 10.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Collapsed Span", Obstacle, 28.0, 16.0, 4.0, 12.0),
            terrain!("Reedbank", Obscuring, 44.0, 28.0, 7.0, 5.0),
        ]),
    plan!("Silent Vigil", table: 1, roll: 6,
        objectives: [
            obj!(12.0, 22.0, Oakenbrow,  1), obj!(48.0, 22.0, Oakenbrow,  1),
            obj!(30.0, 16.0, Gnarlroot,  2), obj!(30.0, 28.0, Gnarlroot,  2),
            obj!(20.0, 36.0, Winterleaf, 3), obj!(40.0,  8.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Barrow Stones", PlaceOfPower, 18.0, 18.0, 5.0, 5.0),
            terrain!("Watcher's Copse", Obscuring, 36.0, 30.0, 6.0, 6.0),
        ]),

    // ═══ TABLE 2 — long-edge deployment ═══
    plan!("Passing Seasons", table: 2, roll: 1,
        objectives: [
            obj!(15.0, 22.0, Oakenbrow,  1), obj!(45.0, 22.0, Oakenbrow,  1),
            obj!(25.0, 14.0, Gnarlroot,  2), obj!(35.0, 30.0, Gnarlroot,  2),
            obj!(10.0, 30.0, Winterleaf, 3), obj!(50.0, 14.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Ancient Oak Stand", Obscuring, 27.0, 19.0, 6.0, 6.0),
            terrain!("Drystone Wall", Obstacle, 10.0, 14.0, 8.0, 2.0),
        ]),
    plan!("Roots of Ruin", table: 2, roll: 2,
        objectives: [
            obj!(20.0, 18.0, Oakenbrow,  1), obj!(40.0, 26.0, Oakenbrow,  1),
            obj!(12.0, 26.0, Gnarlroot,  2), obj!(48.0, 18.0, Gnarlroot,  2),
            obj!(30.0, 22.0, Winterleaf, 3), obj!(30.0, 36.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Strangle-root Grove", Area, 24.0, 28.0, 10.0, 6.0),
            terrain!("Toppled Idol", Obstacle, 42.0, 14.0, 5.0, 3.0),
        ]),
    plan!("The Verdant Ring", table: 2, roll: 3,
        objectives: [
            obj!(30.0, 34.0, Oakenbrow,  1), obj!(30.0, 10.0, Oakenbrow,  1),
            obj!(18.0, 22.0, Gnarlroot,  2), obj!(42.0, 22.0, Gnarlroot,  2),
            obj!(22.0, 30.0, Winterleaf, 3), obj!(38.0, 14.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Ring Stones", PlaceOfPower, 27.0, 19.0, 6.0, 6.0),
            terrain!("Hollow Way", Impassable, 8.0, 20.0, 4.0, 4.0),
        ]),
    plan!("Falling Stars", table: 2, roll: 4,
        objectives: [
            obj!(14.0, 16.0, Oakenbrow,  1), obj!(46.0, 28.0, Oakenbrow,  1),
            obj!(14.0, 28.0, Gnarlroot,  2), obj!(46.0, 16.0, Gnarlroot,  2),
            obj!(24.0, 22.0, Winterleaf, 3), obj!(36.0, 22.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Meteor Scar", Area, 28.0, 16.0, 8.0, 4.0),
            terrain!("Seared Pines", Obscuring, 40.0, 32.0, 6.0, 5.0),
        ]),
    plan!("Twin Harvests", table: 2, roll: 5,
        objectives: [
            obj!(22.0, 14.0, Oakenbrow,  1), obj!(38.0, 30.0, Oakenbrow,  1),
            obj!(22.0, 30.0, Gnarlroot,  2), obj!(38.0, 14.0, Gnarlroot,  2),
            obj!(10.0, 22.0, Winterleaf, 3), obj!(50.0, 22.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Granary Ruin", Obstacle, 28.0, 20.0, 4.0, 4.0),
            terrain!("Fieldstone Fence", Obstacle, 14.0, 32.0, 10.0, 2.0),
        ]),
    plan!("Last Bloom", table: 2, roll: 6,
        objectives: [
            obj!(16.0, 20.0, Oakenbrow,  1), obj!(44.0, 24.0, Oakenbrow,  1),
            obj!(28.0, 32.0, Gnarlroot,  2), obj!(32.0, 12.0, Gnarlroot,  2),
            obj!(20.0, 28.0, Winterleaf, 3), obj!(40.0, 16.0, Heartwood,  3),
        ],
        terrain: &[
            terrain!("Withered Arbor", PlaceOfPower, 26.0, 20.0, 5.0, 5.0),
            terrain!("Petal Drifts", Area, 38.0, 28.0, 8.0, 6.0),
        ]),
];

/// Look up a battleplan by table (1 or 2) and d6 roll.
pub fn battleplan(table: u8, roll: u8) -> Option<&'static Battleplan> {
    BATTLEPLANS.iter().find(|p| p.table == table && p.roll == roll)
}

pub fn battleplan_by_name(name: &str) -> Option<&'static Battleplan> {
    BATTLEPLANS.iter().find(|p| p.name == name)
}

/// Roll a d6 against the given table and return the selected plan.
pub fn roll_battleplan(table: u8, dice: &mut Dice) -> &'static Battleplan {
    let roll = dice.roll_d6();
    battleplan(table, roll).unwrap_or(&BATTLEPLANS[0])
}

/// Materialise a battleplan into a playable board: terrain placed,
/// six ghyranite objectives in three pairs.
pub fn setup(plan: &Battleplan) -> Board {
    let terrain = plan
        .terrain
        .iter()
        .map(|t| TerrainFeature {
            name: t.name.to_string(),
            rect: Rect::new(t.x, t.y, t.width, t.height),
            kind: t.kind,
        })
        .collect();
    let objectives = plan
        .objectives
        .iter()
        .map(|o| Objective {
            position: Position::new(o.x, o.y),
            radius: GHYRANITE_RADIUS,
            ghyranite: o.ghyranite,
            pair: o.pair,
        })
        .collect();
    Board {
        width: plan.width,
        height: plan.height,
        terrain,
        objectives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twelve_plans() {
        assert_eq!(BATTLEPLANS.len(), 12);
        for table in [1u8, 2] {
            let mut rolls: Vec<u8> = BATTLEPLANS
                .iter()
                .filter(|p| p.table == table)
                .map(|p| p.roll)
                .collect();
            rolls.sort_unstable();
            assert_eq!(rolls, vec![1, 2, 3, 4, 5, 6], "table {table} rolls");
        }
    }

    #[test]
    fn test_every_plan_is_well_formed() {
        for plan in &BATTLEPLANS {
            assert!((plan.width - 60.0).abs() < 1e-9);
            assert!((plan.height - 44.0).abs() < 1e-9);
            let board = setup(plan);
            assert_eq!(board.objectives.len(), 6, "{}", plan.name);

            let count = |kind| board.objectives.iter().filter(|o| o.ghyranite == kind).count();
            assert_eq!(count(GhyraniteKind::Oakenbrow), 2, "{}", plan.name);
            assert_eq!(count(GhyraniteKind::Gnarlroot), 2, "{}", plan.name);
            assert_eq!(count(GhyraniteKind::Winterleaf), 1, "{}", plan.name);
            assert_eq!(count(GhyraniteKind::Heartwood), 1, "{}", plan.name);

            // Exactly three pairs of two
            let mut pairs: Vec<u8> = board.objectives.iter().map(|o| o.pair).collect();
            pairs.sort_unstable();
            assert_eq!(pairs, vec![1, 1, 2, 2, 3, 3], "{}", plan.name);

            for o in &board.objectives {
                assert!(board.in_bounds(o.position), "{} objective off-board", plan.name);
                assert!((o.radius - GHYRANITE_RADIUS).abs() < 1e-9);
            }
            for t in &plan.territories {
                assert!(t.x >= 0.0 && t.x + t.width <= plan.width);
                assert!(t.y >= 0.0 && t.y + t.height <= plan.height);
            }
        }
    }

    #[test]
    fn test_passing_seasons() {
        let plan = battleplan_by_name("Passing Seasons").unwrap();
        assert_eq!(plan.table, 2);
        // Long-edge deployment, 12" deep
        assert!((plan.territories[0].height - 12.0).abs() < 1e-9);
        assert!((plan.territories[1].y - 32.0).abs() < 1e-9);
        assert!((plan.territories[0].width - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_lookup_by_table_and_roll() {
        assert_eq!(battleplan(1, 3).unwrap().name, "Shifting Front");
        assert_eq!(battleplan(2, 6).unwrap().name, "Last Bloom");
        assert!(battleplan(3, 1).is_none());
        assert!(battleplan(1, 7).is_none());
    }

    #[test]
    fn test_roll_battleplan_deterministic() {
        let mut d1 = Dice::new(9);
        let mut d2 = Dice::new(9);
        assert_eq!(
            roll_battleplan(1, &mut d1).name,
            roll_battleplan(1, &mut d2).name
        );
    }
}
