// ═══════════════════════════════════════════════════════════════════════
// Faction rules — battle traits, formation effects, warscroll abilities
//
// Dispatch on faction id and formation name. Every generated rule
// captures the owning player (and unit id, where bound) by value.
// ═══════════════════════════════════════════════════════════════════════

use crate::model::{Keyword, PlayerId, Unit, UnitId, UnitTable};
use crate::rules::{Rule, RuleContext, RuleSource, Trigger, UnitOp};

pub const FACTION_SERAPHON: &str = "seraphon";
pub const FACTION_TZEENTCH: &str = "tzeentch";

const COLD_BLOODED_RANGE: f64 = 12.0;
const LOCUS_RANGE: f64 = 9.0;
const STARBORNE_RANGE: f64 = 12.0;
const CABAL_RANGE: f64 = 12.0;

fn attacker_of<'a>(ctx: &RuleContext, units: &'a UnitTable) -> Option<&'a Unit> {
    ctx.attacker.and_then(|id| units.get(id))
}

fn defender_of<'a>(ctx: &RuleContext, units: &'a UnitTable) -> Option<&'a Unit> {
    ctx.defender.and_then(|id| units.get(id))
}

fn near_friendly(units: &UnitTable, unit: &Unit, range: f64, keyword: Keyword) -> bool {
    let Some(pos) = unit.leader_position() else {
        return false;
    };
    units.any_friendly_within(unit.owner, pos, range, |u| {
        u.id != unit.id && u.has_keyword(keyword)
    })
}

// ── Battle traits ──────────────────────────────────────────────────────

/// Rules granted by an army's faction, bound to its owner.
pub fn battle_trait_rules(faction_id: &str, owner: PlayerId) -> Vec<Rule> {
    match faction_id {
        FACTION_SERAPHON => seraphon_battle_traits(owner),
        FACTION_TZEENTCH => tzeentch_battle_traits(owner),
        _ => Vec::new(),
    }
}

fn seraphon_battle_traits(owner: PlayerId) -> Vec<Rule> {
    let mut rules = Vec::new();

    // Scaly Skin: saurus hide counts as a 6+ ward when nothing better applies.
    rules.push(
        Rule::new("Scaly Skin", Trigger::BeforeWardSave, RuleSource::Faction, |ctx, _| {
            ctx.ward_override = Some(6);
        })
        .with_predicate(move |ctx, units| {
            defender_of(ctx, units).map_or(false, |d| {
                d.owner == owner && d.has_tag("Saurus") && (d.ward == 0 || d.ward > 6)
            })
        }),
    );

    // Predatory Fighters: every surviving saurus snaps its jaws on the charge.
    rules.push(
        Rule::new("Predatory Fighters", Trigger::BeforeAttackCount, RuleSource::Faction, |ctx, units| {
            if let Some(a) = attacker_of(ctx, units) {
                ctx.mods.attacks += a.alive_models() as i32;
            }
        })
        .with_predicate(move |ctx, units| {
            let melee = ctx.weapon.as_ref().map_or(false, |w| w.is_melee());
            melee
                && attacker_of(ctx, units).map_or(false, |a| {
                    a.owner == owner && a.has_tag("Saurus") && a.flags.charged()
                })
        }),
    );

    // Cold-blooded: a nearby hero steadies the line; negative hit/wound
    // modifiers are clamped away.
    let cold_blooded = move |ctx: &RuleContext, units: &UnitTable| {
        attacker_of(ctx, units).map_or(false, |a| {
            a.owner == owner && near_friendly(units, a, COLD_BLOODED_RANGE, Keyword::Hero)
        })
    };
    rules.push(
        Rule::new("Cold-blooded", Trigger::BeforeHitRoll, RuleSource::Faction, |ctx, _| {
            if ctx.mods.hit < 0 {
                ctx.mods.hit = 0;
            }
        })
        .with_predicate(cold_blooded),
    );
    rules.push(
        Rule::new("Cold-blooded", Trigger::BeforeWoundRoll, RuleSource::Faction, |ctx, _| {
            if ctx.mods.wound < 0 {
                ctx.mods.wound = 0;
            }
        })
        .with_predicate(cold_blooded),
    );

    rules
}

fn tzeentch_battle_traits(owner: PlayerId) -> Vec<Rule> {
    // Locus of Change: daemons shimmer near their heralds; -1 to wound them.
    vec![Rule::new("Locus of Change", Trigger::BeforeWoundRoll, RuleSource::Faction, |ctx, _| {
        ctx.mods.wound -= 1;
    })
    .with_predicate(move |ctx, units| {
        defender_of(ctx, units).map_or(false, |d| {
            d.owner == owner
                && d.has_tag("Daemon")
                && near_friendly(units, d, LOCUS_RANGE, Keyword::Hero)
        })
    })]
}

// ── Formations ─────────────────────────────────────────────────────────

/// Rules granted by the chosen formation, bound to the owner.
/// Unknown names produce no rules; "Omniscient Oracles" is handled by the
/// magic subsystem (destiny dice), not here.
pub fn formation_rules(faction_id: &str, formation: &str, owner: PlayerId) -> Vec<Rule> {
    match (faction_id, formation) {
        (FACTION_SERAPHON, "Sunclaw Temple-host") => vec![Rule::new(
            "Sunclaw Temple-host",
            Trigger::BeforeSaveRoll,
            RuleSource::Formation,
            |ctx, _| ctx.mods.rend += 1,
        )
        .with_predicate(move |ctx, units| {
            let melee = ctx.weapon.as_ref().map_or(false, |w| w.is_melee());
            melee
                && attacker_of(ctx, units).map_or(false, |a| {
                    a.owner == owner && a.has_tag("Saurus") && a.flags.charged()
                })
        })],

        (FACTION_SERAPHON, "Starborne Host") => vec![Rule::new(
            "Starborne Host",
            Trigger::BeforeWardSave,
            RuleSource::Formation,
            |ctx, _| ctx.ward_override = Some(6),
        )
        .with_predicate(move |ctx, units| {
            defender_of(ctx, units).map_or(false, |d| {
                d.owner == owner && near_friendly(units, d, STARBORNE_RANGE, Keyword::Wizard)
            })
        })],

        (FACTION_SERAPHON, "Shadowstrike Starhost") => vec![Rule::new(
            "Shadowstrike Starhost",
            Trigger::BeforeCharge,
            RuleSource::Formation,
            |ctx, _| ctx.mods.charge += 1,
        )
        .with_predicate(move |ctx, units| {
            attacker_of(ctx, units).map_or(false, |a| a.owner == owner && a.has_tag("Skink"))
        })],

        (FACTION_TZEENTCH, "Wyrdflame Host") => vec![Rule::new(
            "Wyrdflame Host",
            Trigger::BeforeSaveRoll,
            RuleSource::Formation,
            |ctx, _| ctx.mods.rend += 1,
        )
        .with_predicate(move |ctx, units| {
            ctx.shooting
                && attacker_of(ctx, units)
                    .map_or(false, |a| a.owner == owner && a.has_tag("Flamer"))
        })],

        (FACTION_TZEENTCH, "Arcanite Cabal") => vec![Rule::new(
            "Arcanite Cabal",
            Trigger::BeforeHitRoll,
            RuleSource::Formation,
            |ctx, _| ctx.mods.hit += 1,
        )
        .with_predicate(move |ctx, units| {
            ctx.shooting
                && attacker_of(ctx, units).map_or(false, |a| {
                    a.owner == owner
                        && a.has_tag("Arcanite")
                        && near_friendly(units, a, CABAL_RANGE, Keyword::Hero)
                })
        })],

        _ => Vec::new(),
    }
}

// ── Warscroll ability keys ─────────────────────────────────────────────

/// Translate one machine-readable warscroll ability into a rule bound to
/// a specific unit. `fly` and `shootInCombat` carry no rule (they are
/// consumed as keyword/ability flags); unknown keys are ignored.
pub fn ability_rule(key: &str, value: u32, unit: UnitId, _owner: PlayerId) -> Option<Rule> {
    let v = value as i32;
    match key {
        "bonusChargeAttacks" => Some(
            Rule::new(
                format!("bonus-charge-attacks:{unit}"),
                Trigger::BeforeAttackCount,
                RuleSource::UnitAbility,
                move |ctx, _| ctx.mods.attacks += v,
            )
            .with_predicate(move |ctx, units| {
                ctx.attacker == Some(unit)
                    && units.get(unit).map_or(false, |u| u.flags.charged())
            }),
        ),
        // No reroll machinery; represented as a flat +2 to the charge roll.
        "rerollCharges" => Some(
            Rule::new(
                format!("reroll-charges:{unit}"),
                Trigger::BeforeCharge,
                RuleSource::UnitAbility,
                |ctx, _| ctx.mods.charge += 2,
            )
            .with_predicate(move |ctx, _| ctx.attacker == Some(unit)),
        ),
        "mortalOnCharge" => Some(
            Rule::new(
                format!("mortal-on-charge:{unit}"),
                Trigger::BeforeCharge,
                RuleSource::UnitAbility,
                move |ctx, _| ctx.mods.mortal_wounds += v,
            )
            .with_predicate(move |ctx, _| ctx.attacker == Some(unit)),
        ),
        "healOnKill" => Some(
            Rule::new(
                format!("heal-on-kill:{unit}"),
                Trigger::OnModelSlain,
                RuleSource::UnitAbility,
                move |ctx, _| ctx.deferred.push(UnitOp::Heal { unit, amount: v }),
            )
            .with_predicate(move |ctx, _| ctx.attacker == Some(unit)),
        ),
        "minusOneToBeHit" => Some(
            Rule::new(
                format!("minus-one-to-be-hit:{unit}"),
                Trigger::BeforeHitRoll,
                RuleSource::UnitAbility,
                |ctx, _| ctx.mods.hit -= 1,
            )
            .with_predicate(move |ctx, _| ctx.defender == Some(unit)),
        ),
        "fly" | "shootInCombat" => None,
        _ => None,
    }
}
