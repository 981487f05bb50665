//! Kriegsrat - Entry Point
//!
//! Interactive console for the game master. Loads or creates a workspace and
//! maps typed lines to orchestrator commands.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use kriegsrat::combat::damage::DamageExpr;
use kriegsrat::combat::weapons::Weapon;
use kriegsrat::core::config::GameConfig;
use kriegsrat::core::error::Result;
use kriegsrat::orchestrator::{Command, Orchestrator, Phase, StepResult, SubState};
use kriegsrat::persistence::{JsonFileGateway, PersistenceGateway};
use kriegsrat::units::{Battlefield, Leader, Troop};

/// Kriegsrat - game master assistant
#[derive(Parser, Debug)]
#[command(name = "kriegsrat")]
#[command(about = "Turn and combat bookkeeping for tabletop wargames")]
struct Args {
    /// Game configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Workspace directory; overrides the configured one
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Dice seed for reproducible sessions
    #[arg(long)]
    seed: Option<u64>,

    /// Start with a small demo roster when no workspace exists
    #[arg(long)]
    demo: bool,
}

/// A parsed console line
enum Input {
    Command(Command),
    Run,
    Status,
    Help,
    Quit,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kriegsrat=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(dir) = args.workspace {
        config.workspace = dir;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let gateway = JsonFileGateway::new(&config.workspace);
    let orchestrator = match gateway.load()? {
        Some(mut workspace) => {
            workspace.config = config;
            Orchestrator::from_workspace(workspace)?
        }
        None => {
            let battlefield = if args.demo {
                demo_battlefield()?
            } else {
                Battlefield::new()
            };
            Orchestrator::new(config, battlefield)?
        }
    };
    let mut orchestrator = orchestrator.with_gateway(Box::new(gateway));
    orchestrator
        .log_mut()
        .register(Box::new(|line: &str| println!("  {}", line)));

    tracing::info!("Kriegsrat bereit");
    print_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print_status(&orchestrator);
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let Some(input) = parse_input(line.trim()) else {
            println!("Unbekannter Befehl. '?' zeigt die Hilfe.");
            continue;
        };

        match input {
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Status => print_roster(&orchestrator),
            Input::Run => autoplay(&mut orchestrator),
            Input::Command(command) => {
                if let Err(err) = orchestrator.apply(command) {
                    println!("Fehler: {}", err);
                }
            }
        }
    }

    orchestrator.save()?;
    Ok(())
}

/// Step through the action queue with a delay between actions
fn autoplay(orchestrator: &mut Orchestrator) {
    let delay = Duration::from_millis(orchestrator.config().action_delay_ms);
    let mut result = if orchestrator.state().phase == Phase::ActionPhaseDefaults {
        orchestrator.begin_action_execution()
    } else {
        orchestrator.advance()
    };
    while result == StepResult::Performed {
        thread::sleep(delay);
        result = orchestrator.advance();
    }
    orchestrator.publish();
}

fn parse_input(line: &str) -> Option<Input> {
    let (word, rest) = match line.split_once(' ') {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let input = match word {
        "" | "w" | "weiter" => Input::Command(Command::Continue),
        "q" | "ende" => Input::Quit,
        "?" | "hilfe" => Input::Help,
        "s" | "status" => Input::Status,
        "run" | "auto" => Input::Run,
        "z" | "zurück" => Input::Command(Command::Undo),
        "ok" => Input::Command(Command::ConfirmSelection),
        "x" | "abbruch" => Input::Command(Command::Cancel),
        "m" | "menü" => Input::Command(Command::OpenAbilityMenu),
        "del" => Input::Command(Command::DeleteSelectedUnit),
        "save" => Input::Command(Command::Save),
        "a" => Input::Command(Command::SelectUnit(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),
        "f" => Input::Command(Command::ChooseAbility(rest.to_string())),
        "c" => Input::Command(Command::ToggleQuickCondition(rest.to_string())),
        "p" => {
            let mut parts = rest.rsplitn(3, ' ');
            let y = parts.next()?.parse().ok()?;
            let x = parts.next()?.parse().ok()?;
            let name = parts.next()?.to_string();
            Input::Command(Command::PlaceToken { name, x, y })
        }
        "mv" => {
            let mut parts = rest.rsplitn(3, ' ');
            let to = parts.next()?.parse().ok()?;
            let from = parts.next()?.parse().ok()?;
            let party = parts.next()?.to_string();
            Input::Command(Command::MoveQueuedAction { party, from, to })
        }
        _ => return None,
    };
    Some(input)
}

fn print_help() {
    println!();
    println!("=== KRIEGSRAT ===");
    println!("  w               - Weiter");
    println!("  a <Einheit>     - Einheit auswählen (ohne Name: abwählen)");
    println!("  m               - Fähigkeiten anzeigen");
    println!("  f <Fähigkeit>   - Fähigkeit wählen");
    println!("  ok / x          - Zielauswahl bestätigen / abbrechen");
    println!("  z               - Rückgängig");
    println!("  c <Schlüssel>   - Zustand umschalten");
    println!("  p <Einheit> x y - Marker setzen");
    println!("  mv <Partei> i j - Aktion in der Reihenfolge verschieben");
    println!("  del             - Ausgewählte Einheit entfernen");
    println!("  run             - Aktionen automatisch ausführen");
    println!("  s / save / q    - Übersicht / Speichern / Beenden");
    println!();
}

fn print_status(orchestrator: &Orchestrator) {
    let state = orchestrator.state();
    print!("[Runde {} | {}", state.round, state.phase);
    if state.sub_state != SubState::Free {
        print!(" | {:?}", state.sub_state);
    }
    if let Some(active) = &state.active_entity {
        print!(" | {}", active);
    }
    println!("]");
    if !state.display_text.is_empty() {
        println!("{}", state.display_text);
    }
    if !state.menu.is_empty() {
        println!("Fähigkeiten: {}", state.menu.join(", "));
    }
}

fn print_roster(orchestrator: &Orchestrator) {
    let battlefield = orchestrator.battlefield();
    for troop in &battlefield.troops {
        let conditions: Vec<&str> = troop.conditions.iter().map(|c| c.name.as_str()).collect();
        println!(
            "  {:<20} {:<6} LE {:>3}/{:<3} MO {:>2} [{}]",
            troop.name,
            troop.party,
            troop.health,
            troop.max_health,
            troop.morale,
            conditions.join(", ")
        );
    }
    for leader in &battlefield.leaders {
        println!(
            "  {:<20} {:<6} LE {:>3}/{:<3} Befehl: {}",
            leader.name,
            leader.party,
            leader.health,
            leader.max_health,
            leader.action.map_or("-", |order| order.name())
        );
    }
    for (party, queued) in &orchestrator.state().action_map {
        for (index, record) in queued.iter().enumerate() {
            println!("  {} #{}: {} {} {:?}", party, index, record.source, record.ability, record.targets);
        }
    }
}

fn demo_battlefield() -> Result<Battlefield> {
    let mut battlefield = Battlefield::new();
    let sword = Weapon::new("Schwert und Schild", DamageExpr::parse("1W6+3")?).with_shield();
    let pike = Weapon::new("Pike", DamageExpr::parse("1W6+4")?)
        .with_mods(0, -1, 0)
        .with_reach(2);
    let bow = Weapon::new("Langbogen", DamageExpr::parse("1W6+4")?)
        .with_mods(0, 0, 2)
        .with_reload(1);
    battlefield.armory = vec![sword.clone(), pike.clone(), bow.clone()];

    battlefield.add_troop(
        Troop::new("Rot Schildwache", "Rot")
            .with_weapons(vec![sword.clone()])
            .with_armor(3),
    )?;
    battlefield.add_troop(Troop::new("Rot Pikeniere", "Rot").with_weapons(vec![pike]).with_ek(4))?;
    battlefield.add_troop(Troop::new("Blau Bogenschützen", "Blau").with_weapons(vec![bow]))?;
    battlefield.add_troop(
        Troop::new("Blau Fußvolk", "Blau")
            .with_weapons(vec![sword])
            .with_ek(2),
    )?;
    battlefield.add_leader(
        Leader::new("Hauptmann Rot", "Rot")
            .with_command(2, 12)
            .with_attributes(12, 13, 12),
    )?;
    battlefield.add_leader(
        Leader::new("Hauptfrau Blau", "Blau")
            .with_command(2, 11)
            .with_attributes(13, 12, 11),
    )?;

    let positions = [
        ("Rot Schildwache", 2.0, 2.0),
        ("Rot Pikeniere", 3.0, 2.0),
        ("Hauptmann Rot", 2.0, 1.0),
        ("Blau Bogenschützen", 8.0, 6.0),
        ("Blau Fußvolk", 7.0, 5.0),
        ("Hauptfrau Blau", 8.0, 7.0),
    ];
    for (name, x, y) in positions {
        battlefield.place_token(name, x, y)?;
    }
    Ok(battlefield)
}
