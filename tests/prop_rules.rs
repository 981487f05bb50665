//! Property-based tests for the rules engine and the action queue.

use std::collections::BTreeMap;

use proptest::prelude::*;

use kriegsrat::combat::conditions::Duration;
use kriegsrat::combat::context::CombatContext;
use kriegsrat::combat::damage::DamageExpr;
use kriegsrat::combat::modifiers::Modifiers;
use kriegsrat::core::types::Stat;
use kriegsrat::dice::{ScriptedDice, SeededDice};
use kriegsrat::orchestrator::queue::{merge_lists, neighborhood_sort};
use kriegsrat::units::{Arbiter, Battlefield, Troop};

fn damage_text() -> impl Strategy<Value = String> {
    (
        1u32..5,
        prop::sample::select(vec![2u32, 3, 4, 6, 8, 10, 12, 20]),
        prop::option::of((any::<bool>(), 0u32..10)),
    )
        .prop_map(|(count, sides, flat)| match flat {
            None => format!("{}W{}", count, sides),
            Some((true, n)) => format!("{}W{}+{}", count, sides, n),
            Some((false, n)) => format!("{}W{}-{}", count, sides, n),
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Rolled damage stays inside the expression's range.
    #[test]
    fn prop_damage_within_bounds(text in damage_text(), seed in any::<u64>()) {
        let expr = DamageExpr::parse(&text).unwrap();
        let mut dice = SeededDice::new(seed);
        let value = expr.evaluate(&mut dice);
        prop_assert!(value >= expr.min_value());
        prop_assert!(value <= expr.max_value());
        prop_assert_eq!(DamageExpr::parse(&expr.to_string()).unwrap(), expr);
    }

    /// Relaxing moves each modifier one step toward zero and never past it.
    #[test]
    fn prop_relax_moves_toward_zero(values in prop::collection::vec(-20i32..20, 12)) {
        let mut mods = Modifiers::new();
        for (&stat, &value) in Stat::all().iter().zip(values.iter()) {
            mods.set(stat, value);
        }
        let before = mods;
        mods.relax();

        for &stat in Stat::all() {
            let old = before.get(stat);
            let new = mods.get(stat);
            prop_assert!(new.abs() <= old.abs());
            prop_assert!(old - new == old.signum() || new == 0);
            prop_assert!(new == 0 || new.signum() == old.signum());
        }
        prop_assert_eq!(mods.get(Stat::Tp), 0);
        prop_assert_eq!(mods.get(Stat::ActionCount), 0);
    }

    /// Health drops by exactly the damage reported as applied.
    #[test]
    fn prop_damage_accounting(
        max_health in 1i32..100,
        armor in 0i32..6,
        amount in 0i32..200,
        true_damage in any::<bool>(),
    ) {
        let mut bf = Battlefield::new();
        bf.add_troop(Troop::new("Ziel", "Blau").with_health(max_health).with_armor(armor)).unwrap();
        let mut dice = ScriptedDice::repeating(1);
        let mut sink: Vec<String> = Vec::new();
        let mut arb = Arbiter::new(&mut dice, &mut sink);
        let ctx = CombatContext { true_damage, ..CombatContext::default() };

        let before = bf.troop("Ziel").unwrap().health;
        let applied = bf.deal_damage("Ziel", amount, &ctx, &mut arb).unwrap();
        let after = bf.troop("Ziel").unwrap().health;

        prop_assert!(applied >= 0);
        prop_assert!(applied <= amount);
        prop_assert_eq!(before - after, applied);
    }

    /// Merging keeps every entry and each party's own order.
    #[test]
    fn prop_merge_preserves_party_order(
        lengths in prop::collection::vec(0usize..8, 1..4),
        chunk in 1usize..5,
    ) {
        let parties: Vec<String> = (0..lengths.len()).map(|i| format!("P{}", i)).collect();
        let map: BTreeMap<String, Vec<(String, usize)>> = parties
            .iter()
            .zip(lengths.iter())
            .map(|(party, &len)| (party.clone(), (0..len).map(|i| (party.clone(), i)).collect()))
            .collect();

        let merged = merge_lists(&map, &parties, chunk);
        prop_assert_eq!(merged.len(), lengths.iter().sum::<usize>());
        for party in &parties {
            let own: Vec<usize> = merged.iter().filter(|(p, _)| p == party).map(|(_, i)| *i).collect();
            let expected: Vec<usize> = (0..own.len()).collect();
            prop_assert_eq!(own, expected);
        }
    }

    /// Neighborhood sorting only reorders.
    #[test]
    fn prop_neighborhood_sort_is_permutation(
        list in prop::collection::vec(0u8..10, 0..12),
        reference in prop::collection::vec(0u8..10, 0..12),
    ) {
        let list: Vec<String> = list.iter().map(|n| format!("u{}", n)).collect();
        let reference: Vec<String> = reference.iter().map(|n| format!("u{}", n)).collect();

        let mut sorted = neighborhood_sort(list.clone(), &reference, |item| item.as_str());
        let mut original = list;
        prop_assert!(sorted.iter().take_while(|item| !reference.contains(item)).count()
            == sorted.iter().filter(|item| !reference.contains(item)).count());
        sorted.sort();
        original.sort();
        prop_assert_eq!(sorted, original);
    }

    /// Durations persist as a positive count or -1.
    #[test]
    fn prop_duration_serializes_as_integer(rounds in 0u32..1000, indefinite in any::<bool>()) {
        let duration = if indefinite { Duration::Indefinite } else { Duration::rounds(rounds) };
        let json = serde_json::to_value(duration).unwrap();
        let back: Duration = serde_json::from_value(json.clone()).unwrap();
        prop_assert_eq!(back, duration);
        if indefinite {
            prop_assert_eq!(json, serde_json::json!(-1));
        } else {
            prop_assert_eq!(json, serde_json::json!(rounds.max(1)));
        }
    }
}
