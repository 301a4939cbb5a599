// ═══════════════════════════════════════════════════════════════════════
// Terrain rules — translate board features into engine rules
//
// Rule names follow "<terrain-name>:<effect>" so a destroyed feature's
// rules can be dropped with remove_by_source.
// ═══════════════════════════════════════════════════════════════════════

use crate::board::{Board, TerrainKind};
use crate::geometry::{distance, EPS};
use crate::model::Keyword;
use crate::rules::{Rule, RuleSource, Trigger};

const OBSCURING_GRACE: f64 = 3.0;

/// Build the full rule set implied by a board's terrain.
pub fn terrain_rules(board: &Board) -> Vec<Rule> {
    let mut rules = Vec::new();

    for feature in &board.terrain {
        let rect = feature.rect;
        let kind = feature.kind;

        // Cover: -1 to hit against units sheltering inside, unless they
        // charged in or can fly over it.
        if kind.grants_cover() {
            rules.push(
                Rule::new(
                    format!("{}:cover", feature.name),
                    Trigger::BeforeHitRoll,
                    RuleSource::Terrain,
                    |ctx, _| ctx.mods.hit -= 1,
                )
                .with_predicate(move |ctx, units| {
                    ctx.defender
                        .and_then(|id| units.get(id))
                        .map_or(false, |d| {
                            d.leader_position().map_or(false, |p| rect.contains(p))
                                && !d.flags.charged()
                                && !d.has_keyword(Keyword::Fly)
                        })
                }),
            );
        }

        if kind == TerrainKind::Obscuring {
            let name = feature.name.clone();
            rules.push(
                Rule::new(
                    format!("{}:obscuring", feature.name),
                    Trigger::BeforeShoot,
                    RuleSource::Terrain,
                    move |ctx, _| ctx.block(format!("{name} obscures the target")),
                )
                .with_predicate(move |ctx, units| {
                    let Some(d) = ctx.defender.and_then(|id| units.get(id)) else {
                        return false;
                    };
                    let Some(dp) = d.leader_position() else {
                        return false;
                    };
                    let Some(ap) = ctx
                        .attacker
                        .and_then(|id| units.get(id))
                        .and_then(|a| a.leader_position())
                    else {
                        return false;
                    };
                    rect.contains(dp)
                        && !d.has_keyword(Keyword::Fly)
                        && distance(ap, dp) > OBSCURING_GRACE + EPS
                }),
            );
        }

        if kind.is_unstable() {
            let name = feature.name.clone();
            rules.push(
                Rule::new(
                    format!("{}:unstable", feature.name),
                    Trigger::BeforeMove,
                    RuleSource::Terrain,
                    move |ctx, _| ctx.block(format!("cannot end a move atop {name}")),
                )
                .with_predicate(move |ctx, _| {
                    ctx.destination.map_or(false, |d| rect.contains(d))
                }),
            );
        }

        if kind == TerrainKind::Impassable {
            let name = feature.name.clone();
            rules.push(
                Rule::new(
                    format!("{}:impassable", feature.name),
                    Trigger::BeforeMove,
                    RuleSource::Terrain,
                    move |ctx, _| ctx.block(format!("{name} is impassable")),
                )
                .with_predicate(move |ctx, _| {
                    ctx.destination.map_or(false, |d| rect.contains(d))
                }),
            );
            let name = feature.name.clone();
            rules.push(
                Rule::new(
                    format!("{}:impassable", feature.name),
                    Trigger::BeforeCharge,
                    RuleSource::Terrain,
                    move |ctx, _| ctx.block(format!("cannot charge into {name}")),
                )
                .with_predicate(move |ctx, units| {
                    ctx.defender
                        .and_then(|id| units.get(id))
                        .and_then(|d| d.leader_position())
                        .map_or(false, |p| rect.contains(p))
                }),
            );
        }

        // TerrainKind::Open contributes nothing.
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Rect, TerrainFeature};
    use crate::geometry::Position;
    use crate::model::{
        ActionFlags, Model, PlayerId, StrikeOrder, Unit, UnitId, UnitStats, UnitTable,
    };
    use crate::rules::{RuleContext, RulesEngine};
    use std::collections::BTreeSet;

    fn unit_at(id: u32, owner: u8, pos: Position) -> Unit {
        Unit {
            id: UnitId(id),
            name: format!("u{id}"),
            owner: PlayerId(owner),
            stats: UnitStats { move_: 5.0, save: 4, control: 1, health: 2 },
            models: vec![Model::new(0, pos, 1.0, 2)],
            weapons: Vec::new(),
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

    fn board_with(kind: TerrainKind) -> Board {
        let mut board = Board::standard();
        board.terrain.push(TerrainFeature {
            name: "Testwood".into(),
            rect: Rect::new(20.0, 20.0, 10.0, 10.0),
            kind,
        });
        board
    }

    fn engine_for(board: &Board) -> RulesEngine {
        let mut engine = RulesEngine::new();
        engine.add_all(terrain_rules(board));
        engine
    }

    #[test]
    fn test_cover_penalises_hit() {
        let board = board_with(TerrainKind::Area);
        let engine = engine_for(&board);
        let mut units = UnitTable::default();
        units.insert(unit_at(1, 0, Position::new(5.0, 5.0)));
        units.insert(unit_at(2, 1, Position::new(25.0, 25.0))); // inside

        let mut ctx = RuleContext::default();
        ctx.attacker = Some(UnitId(1));
        ctx.defender = Some(UnitId(2));
        engine.evaluate(Trigger::BeforeHitRoll, &mut ctx, &units);
        assert_eq!(ctx.mods.hit, -1);
    }

    #[test]
    fn test_cover_denied_to_chargers_and_flyers() {
        let board = board_with(TerrainKind::Obstacle);
        let engine = engine_for(&board);

        let mut units = UnitTable::default();
        units.insert(unit_at(1, 0, Position::new(5.0, 5.0)));
        let mut charger = unit_at(2, 1, Position::new(25.0, 25.0));
        charger.flags.set_charged();
        units.insert(charger);
        let mut ctx = RuleContext::default();
        ctx.attacker = Some(UnitId(1));
        ctx.defender = Some(UnitId(2));
        engine.evaluate(Trigger::BeforeHitRoll, &mut ctx, &units);
        assert_eq!(ctx.mods.hit, 0);

        let mut units = UnitTable::default();
        units.insert(unit_at(1, 0, Position::new(5.0, 5.0)));
        let mut flyer = unit_at(2, 1, Position::new(25.0, 25.0));
        flyer.keywords.insert(Keyword::Fly);
        units.insert(flyer);
        let mut ctx = RuleContext::default();
        ctx.attacker = Some(UnitId(1));
        ctx.defender = Some(UnitId(2));
        engine.evaluate(Trigger::BeforeHitRoll, &mut ctx, &units);
        assert_eq!(ctx.mods.hit, 0);
    }

    #[test]
    fn test_obscuring_blocks_long_range_shots() {
        let board = board_with(TerrainKind::Obscuring);
        let engine = engine_for(&board);
        let mut units = UnitTable::default();
        units.insert(unit_at(1, 0, Position::new(5.0, 25.0)));
        units.insert(unit_at(2, 1, Position::new(25.0, 25.0)));

        let mut ctx = RuleContext::default();
        ctx.attacker = Some(UnitId(1));
        ctx.defender = Some(UnitId(2));
        ctx.shooting = true;
        engine.evaluate(Trigger::BeforeShoot, &mut ctx, &units);
        assert!(ctx.is_blocked());
    }

    #[test]
    fn test_obscuring_allows_point_blank() {
        let board = board_with(TerrainKind::Obscuring);
        let engine = engine_for(&board);
        let mut units = UnitTable::default();
        units.insert(unit_at(1, 0, Position::new(23.0, 25.0))); // 2" away
        units.insert(unit_at(2, 1, Position::new(25.0, 25.0)));

        let mut ctx = RuleContext::default();
        ctx.attacker = Some(UnitId(1));
        ctx.defender = Some(UnitId(2));
        ctx.shooting = true;
        engine.evaluate(Trigger::BeforeShoot, &mut ctx, &units);
        assert!(!ctx.is_blocked());
    }

    #[test]
    fn test_unstable_blocks_move_in() {
        let board = board_with(TerrainKind::PlaceOfPower);
        let engine = engine_for(&board);
        let units = UnitTable::default();

        let mut ctx = RuleContext::movement(
            UnitId(1),
            Position::new(5.0, 5.0),
            Position::new(25.0, 25.0),
        );
        engine.evaluate(Trigger::BeforeMove, &mut ctx, &units);
        assert!(ctx.is_blocked());

        let mut ctx = RuleContext::movement(
            UnitId(1),
            Position::new(5.0, 5.0),
            Position::new(10.0, 10.0),
        );
        engine.evaluate(Trigger::BeforeMove, &mut ctx, &units);
        assert!(!ctx.is_blocked());
    }

    #[test]
    fn test_impassable_blocks_move_and_charge() {
        let board = board_with(TerrainKind::Impassable);
        let engine = engine_for(&board);
        let mut units = UnitTable::default();
        units.insert(unit_at(1, 0, Position::new(5.0, 5.0)));
        units.insert(unit_at(2, 1, Position::new(25.0, 25.0))); // inside

        let mut ctx = RuleContext::movement(
            UnitId(1),
            Position::new(5.0, 5.0),
            Position::new(25.0, 25.0),
        );
        engine.evaluate(Trigger::BeforeMove, &mut ctx, &units);
        assert!(ctx.is_blocked());

        let mut ctx = RuleContext::charge(UnitId(1), UnitId(2));
        engine.evaluate(Trigger::BeforeCharge, &mut ctx, &units);
        assert!(ctx.is_blocked());
    }

    #[test]
    fn test_open_terrain_is_inert() {
        let board = board_with(TerrainKind::Open);
        assert!(terrain_rules(&board).is_empty());
    }

    #[test]
    fn test_rules_removable_by_feature_name() {
        let board = board_with(TerrainKind::Obscuring);
        let mut engine = engine_for(&board);
        let total = engine.rule_count();
        assert!(total >= 2); // cover + obscuring
        engine.remove_by_source(RuleSource::Terrain, "Testwood:cover");
        engine.remove_by_source(RuleSource::Terrain, "Testwood:obscuring");
        assert_eq!(engine.rule_count(), total - 2);
    }
}
