//! Combat rules integration tests
//!
//! Abilities resolved against a small battlefield with scripted dice.

use kriegsrat::abilities::{Ability, Action, Maneuver, Rule};
use kriegsrat::combat::conditions::{keys, Duration};
use kriegsrat::combat::context::CombatContext;
use kriegsrat::combat::damage::DamageExpr;
use kriegsrat::combat::weapons::Weapon;
use kriegsrat::core::types::Stat;
use kriegsrat::dice::ScriptedDice;
use kriegsrat::units::{Arbiter, Battlefield, Troop};

fn axe() -> Weapon {
    Weapon::new("Streitaxt", DamageExpr::parse("1W6+2").unwrap())
}

fn bow() -> Weapon {
    Weapon::new("Langbogen", DamageExpr::parse("1W6+4").unwrap()).with_reload(1)
}

fn field() -> Battlefield {
    let mut bf = Battlefield::new();
    bf.add_troop(Troop::new("Axtkämpfer", "Rot").with_weapons(vec![axe()]))
        .unwrap();
    bf.add_troop(Troop::new("Schützen", "Rot").with_weapons(vec![bow()]))
        .unwrap();
    bf.add_troop(Troop::new("Feind", "Blau").with_armor(2)).unwrap();
    bf
}

fn targets(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn test_melee_and_ranged_eligibility() {
    let bf = field();
    let attack = Ability::Action(Action::Attack);
    let volley = Ability::Action(Action::Volley);

    assert!(attack.check(&bf, "Axtkämpfer"));
    assert!(!volley.check(&bf, "Axtkämpfer"));
    assert!(volley.check(&bf, "Schützen"));
    assert!(!attack.check(&bf, "Schützen"));
}

#[test]
fn test_attack_damages_and_engages() {
    let mut bf = field();
    // AT hits, PA fails, W6 shows 4, the counter attack misses
    let mut dice = ScriptedDice::new([1, 20, 4, 20]).with_fallback(20);
    let mut sink: Vec<String> = Vec::new();
    let mut arb = Arbiter::new(&mut dice, &mut sink);

    let outcome = Ability::Action(Action::Attack).perform(
        &mut bf,
        "Axtkämpfer",
        &targets(&["Feind"]),
        &mut arb,
    );

    // 4 + 2 + TP 3 - RS 2
    let enemy = bf.troop("Feind").unwrap();
    assert_eq!(enemy.health, 23);
    assert_eq!(enemy.melee_target.as_deref(), Some("Axtkämpfer"));
    assert_eq!(
        bf.troop("Axtkämpfer").unwrap().melee_target.as_deref(),
        Some("Feind")
    );
    assert_eq!(outcome.short_log, vec!["Angriff → Feind: 7 Schaden".to_string()]);
    assert!(outcome.log.iter().any(|line| line.contains("schlägt zurück")));
}

#[test]
fn test_engaged_troop_cannot_shoot_or_march() {
    let mut bf = field();
    bf.troop_mut("Schützen").unwrap().melee_target = Some("Feind".into());

    assert!(!Ability::Action(Action::Volley).check(&bf, "Schützen"));
    assert!(!Ability::Maneuver(Maneuver::March).check(&bf, "Schützen"));
    assert!(Ability::Maneuver(Maneuver::Retreat).check(&bf, "Schützen"));
}

#[test]
fn test_volley_starts_reload() {
    let mut bf = field();
    // FK hits, W6 shows 4, the morale probe passes
    let mut dice = ScriptedDice::new([1, 4]).with_fallback(1);
    let mut sink: Vec<String> = Vec::new();
    let mut arb = Arbiter::new(&mut dice, &mut sink);

    Ability::Action(Action::Volley).perform(&mut bf, "Schützen", &targets(&["Feind"]), &mut arb);

    // 4 + 4 + TP 3 - RS 2
    assert_eq!(bf.troop("Feind").unwrap().health, 21);
    let archers = bf.troop("Schützen").unwrap();
    assert_eq!(archers.reload, 1);
    assert_eq!(archers.range_target.as_deref(), Some("Feind"));
    assert!(!Ability::Action(Action::Volley).check(&bf, "Schützen"));
}

#[test]
fn test_cover_blocks_suppression() {
    let mut bf = field();
    let mut dice = ScriptedDice::repeating(1);
    let mut sink: Vec<String> = Vec::new();
    let mut arb = Arbiter::new(&mut dice, &mut sink);

    assert!(bf.add_condition("Feind", keys::COVER, Duration::rounds(1), &mut arb));
    assert!(!bf.add_condition("Feind", keys::UNDER_FIRE, Duration::rounds(1), &mut arb));
    assert!(!bf.troop("Feind").unwrap().has_condition(keys::UNDER_FIRE));
    assert!(sink.iter().any(|line| line.contains("kann nicht")));
}

#[test]
fn test_barrage_suppresses_targets() {
    let mut bf = field();
    bf.add_troop(Troop::new("Feind 2", "Blau")).unwrap();
    let mut dice = ScriptedDice::repeating(1);
    let mut sink: Vec<String> = Vec::new();
    let mut arb = Arbiter::new(&mut dice, &mut sink);

    let barrage = Ability::Action(Action::Barrage);
    let chosen = targets(&["Feind", "Feind 2"]);
    assert!(barrage.check_targeted(&bf, "Schützen", &chosen));
    barrage.perform(&mut bf, "Schützen", &chosen, &mut arb);

    assert!(bf.troop("Feind").unwrap().has_condition(keys::UNDER_FIRE));
    assert!(bf.troop("Feind 2").unwrap().has_condition(keys::UNDER_FIRE));
}

#[test]
fn test_shield_wall_replaces_pike_wall() {
    let mut bf = field();
    let mut dice = ScriptedDice::repeating(1);
    let mut sink: Vec<String> = Vec::new();
    let mut arb = Arbiter::new(&mut dice, &mut sink);

    bf.add_condition("Axtkämpfer", keys::PIKE_WALL, Duration::Indefinite, &mut arb);
    bf.add_condition("Axtkämpfer", keys::SHIELD_WALL, Duration::Indefinite, &mut arb);

    let troop = bf.troop("Axtkämpfer").unwrap();
    assert!(troop.has_condition(keys::SHIELD_WALL));
    assert!(!troop.has_condition(keys::PIKE_WALL));
    assert_eq!(troop.stance(), Some(keys::SHIELD_WALL));
}

#[test]
fn test_heavy_loss_marks_critical_health() {
    let mut bf = field();
    let mut dice = ScriptedDice::repeating(1);
    let mut sink: Vec<String> = Vec::new();
    let mut arb = Arbiter::new(&mut dice, &mut sink);

    let ctx = CombatContext {
        true_damage: true,
        ..Default::default()
    };
    assert_eq!(bf.deal_damage("Feind", 24, &ctx, &mut arb), Some(24));

    let enemy = bf.troop("Feind").unwrap();
    assert!(enemy.has_condition(keys::CRITICAL_HEALTH));
    assert!(!enemy.has_condition(keys::LOW_HEALTH));
}

#[test]
fn test_dead_troop_is_forgotten() {
    let mut bf = field();
    bf.troop_mut("Axtkämpfer").unwrap().melee_target = Some("Feind".into());
    let mut dice = ScriptedDice::repeating(1);
    let mut sink: Vec<String> = Vec::new();
    let mut arb = Arbiter::new(&mut dice, &mut sink);

    let ctx = CombatContext {
        true_damage: true,
        ..Default::default()
    };
    bf.deal_damage("Feind", 100, &ctx, &mut arb);

    assert!(!bf.troop("Feind").unwrap().is_alive());
    assert!(bf.troop("Axtkämpfer").unwrap().melee_target.is_none());
    assert!(!Ability::Action(Action::Attack).check_targeted(
        &bf,
        "Axtkämpfer",
        &targets(&["Feind"])
    ));
}

#[test]
fn test_cover_masks_under_fire_in_melee() {
    let mut bf = field();
    let mut dice = ScriptedDice::repeating(1);
    let mut sink: Vec<String> = Vec::new();
    let mut arb = Arbiter::new(&mut dice, &mut sink);
    let melee = CombatContext::melee();

    let base = bf.stat("Feind", Stat::Pa, &melee).unwrap();
    bf.add_condition("Feind", keys::UNDER_FIRE, Duration::rounds(2), &mut arb);
    assert_eq!(bf.stat("Feind", Stat::Pa, &melee), Some(base - 2));

    bf.add_condition("Feind", keys::COVER, Duration::rounds(2), &mut arb);
    let troop = bf.troop("Feind").unwrap();
    assert!(troop.has_condition(keys::UNDER_FIRE));
    assert_eq!(bf.stat("Feind", Stat::Pa, &melee), Some(base + 2));
}

#[test]
fn test_modifiers_relax_each_round() {
    let mut bf = field();
    {
        let troop = bf.troop_mut("Feind").unwrap();
        troop.mods.at = 3;
        troop.mods.pa = -2;
    }
    let mut dice = ScriptedDice::repeating(1);
    let mut sink: Vec<String> = Vec::new();
    let mut arb = Arbiter::new(&mut dice, &mut sink);

    let mut seen = Vec::new();
    for _ in 0..4 {
        bf.end_of_round(&mut arb);
        let mods = bf.troop("Feind").unwrap().mods;
        seen.push((mods.at, mods.pa));
    }
    assert_eq!(seen, vec![(2, -1), (1, 0), (0, 0), (0, 0)]);
}
