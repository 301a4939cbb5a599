// ═══════════════════════════════════════════════════════════════════════
// Rules engine — trigger-indexed pluggable modifier/blocker pipeline
//
// A Rule is a single data variant: predicate + effect closures over an
// evaluation context. Terrain, factions, formations, and warscroll
// abilities all register through the same shape, which keeps bulk
// removal by source possible.
// ═══════════════════════════════════════════════════════════════════════

use crate::geometry::Position;
use crate::model::{UnitId, UnitTable, Weapon};
use crate::phases::Phase;
use std::collections::HashMap;

// ── Triggers ───────────────────────────────────────────────────────────

/// The closed set of hook points rules may attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    BeforeAttackCount,
    BeforeHitRoll,
    BeforeWoundRoll,
    BeforeSaveRoll,
    BeforeDamage,
    AfterCombatResolve,
    BeforeMove,
    AfterMove,
    BeforePileIn,
    BeforeCharge,
    BeforeShoot,
    BeforeWardSave,
    OnPhaseStart,
    OnPhaseEnd,
    OnModelSlain,
    OnUnitDestroyed,
    OnBattleRoundStart,
}

/// Where a rule came from; drives bulk removal when a terrain piece is
/// destroyed or a buff expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSource {
    Terrain,
    UnitAbility,
    Weapon,
    Faction,
    Formation,
    Global,
}

// ── Modifier accumulator ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub attacks: i32,
    pub hit: i32,
    pub wound: i32,
    pub save: i32,
    pub rend: i32,
    pub damage: i32,
    pub move_: i32,
    pub charge: i32,
    pub pile_in: i32,
    pub mortal_wounds: i32,
}

// ── Deferred unit mutations ────────────────────────────────────────────

/// Mutations a rule effect wants applied to a specific unit. Effects
/// cannot touch the table directly while it is borrowed for evaluation,
/// so they queue ops here and the caller applies them afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOp {
    Heal { unit: UnitId, amount: i32 },
}

// ── Context ────────────────────────────────────────────────────────────

/// Scratch state for one trigger evaluation. Lives only for the duration
/// of that evaluation.
#[derive(Debug, Default)]
pub struct RuleContext {
    pub attacker: Option<UnitId>,
    pub defender: Option<UnitId>,
    pub weapon: Option<Weapon>,
    pub phase: Option<Phase>,
    pub origin: Option<Position>,
    pub destination: Option<Position>,
    pub shooting: bool,
    pub mods: Modifiers,
    blocked: Option<String>,
    pub ward_override: Option<u8>,
    /// Total damage dealt, carried into AfterCombatResolve.
    pub damage_done: i32,
    /// Models slain, carried into OnModelSlain.
    pub slain: u32,
    pub deferred: Vec<UnitOp>,
}

impl RuleContext {
    pub fn attack(attacker: UnitId, defender: UnitId, weapon: &Weapon, shooting: bool) -> Self {
        RuleContext {
            attacker: Some(attacker),
            defender: Some(defender),
            weapon: Some(weapon.clone()),
            shooting,
            ..Default::default()
        }
    }

    pub fn movement(unit: UnitId, origin: Position, destination: Position) -> Self {
        RuleContext {
            attacker: Some(unit),
            origin: Some(origin),
            destination: Some(destination),
            ..Default::default()
        }
    }

    pub fn charge(attacker: UnitId, defender: UnitId) -> Self {
        RuleContext {
            attacker: Some(attacker),
            defender: Some(defender),
            ..Default::default()
        }
    }

    pub fn for_phase(phase: Phase) -> Self {
        RuleContext {
            phase: Some(phase),
            ..Default::default()
        }
    }

    /// Mark the action as blocked. The first message wins; later rules
    /// still run and may keep accumulating modifiers.
    pub fn block(&mut self, message: impl Into<String>) {
        if self.blocked.is_none() {
            self.blocked = Some(message.into());
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.is_some()
    }

    pub fn block_message(&self) -> Option<&str> {
        self.blocked.as_deref()
    }
}

// ── Rule ───────────────────────────────────────────────────────────────

pub type RulePredicate = Box<dyn Fn(&RuleContext, &UnitTable) -> bool>;
pub type RuleEffect = Box<dyn Fn(&mut RuleContext, &UnitTable)>;

pub struct Rule {
    pub name: String,
    pub trigger: Trigger,
    pub source: RuleSource,
    pub predicate: Option<RulePredicate>,
    pub effect: RuleEffect,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        trigger: Trigger,
        source: RuleSource,
        effect: impl Fn(&mut RuleContext, &UnitTable) + 'static,
    ) -> Self {
        Rule {
            name: name.into(),
            trigger,
            source,
            predicate: None,
            effect: Box::new(effect),
        }
    }

    pub fn with_predicate(
        mut self,
        predicate: impl Fn(&RuleContext, &UnitTable) -> bool + 'static,
    ) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("trigger", &self.trigger)
            .field("source", &self.source)
            .finish()
    }
}

// ── Engine ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RulesEngine {
    rules: HashMap<Trigger, Vec<Rule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        RulesEngine::default()
    }

    /// Append a rule to its trigger's sequence. Evaluation order is
    /// insertion order.
    pub fn add(&mut self, rule: Rule) {
        self.rules.entry(rule.trigger).or_default().push(rule);
    }

    pub fn add_all(&mut self, rules: Vec<Rule>) {
        for r in rules {
            self.add(r);
        }
    }

    /// Drop every rule matching source + name across all triggers.
    /// Returns how many were removed.
    pub fn remove_by_source(&mut self, source: RuleSource, name: &str) -> usize {
        let mut removed = 0;
        for seq in self.rules.values_mut() {
            let before = seq.len();
            seq.retain(|r| !(r.source == source && r.name == name));
            removed += before - seq.len();
        }
        removed
    }

    /// Run every rule registered for `trigger` against the context, in
    /// insertion order. A blocked context does not short-circuit: later
    /// rules still observe it and may accumulate further modifiers.
    pub fn evaluate(&self, trigger: Trigger, ctx: &mut RuleContext, units: &UnitTable) {
        let Some(seq) = self.rules.get(&trigger) else {
            return;
        };
        for rule in seq {
            let applies = rule
                .predicate
                .as_ref()
                .map_or(true, |p| p(ctx, units));
            if applies {
                (rule.effect)(ctx, units);
            }
        }
    }

    pub fn has_rules_for(&self, trigger: Trigger) -> bool {
        self.rules.get(&trigger).map_or(false, |s| !s.is_empty())
    }

    pub fn rule_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let mut engine = RulesEngine::new();
        engine.add(Rule::new("first", Trigger::BeforeHitRoll, RuleSource::Global, |ctx, _| {
            ctx.mods.hit = 5;
        }));
        engine.add(Rule::new("second", Trigger::BeforeHitRoll, RuleSource::Global, |ctx, _| {
            // Overwrites whatever came before, proving it runs later
            ctx.mods.hit = 1;
        }));
        let units = UnitTable::default();
        let mut ctx = RuleContext::default();
        engine.evaluate(Trigger::BeforeHitRoll, &mut ctx, &units);
        assert_eq!(ctx.mods.hit, 1);
    }

    #[test]
    fn test_predicate_gates_effect() {
        let mut engine = RulesEngine::new();
        engine.add(
            Rule::new("gated", Trigger::BeforeWoundRoll, RuleSource::Faction, |ctx, _| {
                ctx.mods.wound += 1;
            })
            .with_predicate(|ctx, _| ctx.shooting),
        );
        let units = UnitTable::default();
        let mut ctx = RuleContext::default();
        engine.evaluate(Trigger::BeforeWoundRoll, &mut ctx, &units);
        assert_eq!(ctx.mods.wound, 0);
        ctx.shooting = true;
        engine.evaluate(Trigger::BeforeWoundRoll, &mut ctx, &units);
        assert_eq!(ctx.mods.wound, 1);
    }

    #[test]
    fn test_blocked_does_not_short_circuit() {
        let mut engine = RulesEngine::new();
        engine.add(Rule::new("blocker", Trigger::BeforeMove, RuleSource::Terrain, |ctx, _| {
            ctx.block("no entry");
        }));
        engine.add(Rule::new("late", Trigger::BeforeMove, RuleSource::Global, |ctx, _| {
            ctx.mods.move_ += 2;
        }));
        let units = UnitTable::default();
        let mut ctx = RuleContext::default();
        engine.evaluate(Trigger::BeforeMove, &mut ctx, &units);
        assert!(ctx.is_blocked());
        assert_eq!(ctx.block_message(), Some("no entry"));
        // Later rule still ran
        assert_eq!(ctx.mods.move_, 2);
    }

    #[test]
    fn test_first_block_message_wins() {
        let mut ctx = RuleContext::default();
        ctx.block("first");
        ctx.block("second");
        assert_eq!(ctx.block_message(), Some("first"));
    }

    #[test]
    fn test_remove_by_source() {
        let mut engine = RulesEngine::new();
        engine.add(Rule::new("Mistwood:cover", Trigger::BeforeHitRoll, RuleSource::Terrain, |_, _| {}));
        engine.add(Rule::new("Mistwood:cover", Trigger::BeforeShoot, RuleSource::Terrain, |_, _| {}));
        engine.add(Rule::new("Mistwood:cover", Trigger::BeforeHitRoll, RuleSource::Global, |_, _| {}));
        assert_eq!(engine.rule_count(), 3);
        let removed = engine.remove_by_source(RuleSource::Terrain, "Mistwood:cover");
        assert_eq!(removed, 2);
        // The Global rule with the same name survives
        assert_eq!(engine.rule_count(), 1);
        assert!(engine.has_rules_for(Trigger::BeforeHitRoll));
        assert!(!engine.has_rules_for(Trigger::BeforeShoot));
    }

    #[test]
    fn test_introspection() {
        let engine = RulesEngine::new();
        assert_eq!(engine.rule_count(), 0);
        assert!(!engine.has_rules_for(Trigger::OnBattleRoundStart));
    }
}
