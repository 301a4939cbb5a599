// ═══════════════════════════════════════════════════════════════════════
// Runner — CLI entry point for seeded demo games
// ═══════════════════════════════════════════════════════════════════════

use clap::Parser;
use warhost_agents::{HeuristicPlayer, RandomPlayer};
use warhost_engine::army::{build_army, ArmyRoster, RosterEntry};
use warhost_engine::battleplans;
use warhost_engine::data::FactionData;
use warhost_engine::game::{CommandSource, Game};
use warhost_engine::geometry::Position;
use warhost_engine::model::PlayerId;

const SERAPHON_JSON: &str = include_str!("../data/seraphon.json");
const TZEENTCH_JSON: &str = include_str!("../data/tzeentch.json");

#[derive(Parser, Debug)]
#[command(name = "warhost", about = "Run a seeded warhost battle")]
struct Args {
    /// RNG seed; identical seeds replay identical games.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Maximum battle rounds to play.
    #[arg(long, default_value_t = 5)]
    rounds: u32,

    /// Battleplan table (1 or 2).
    #[arg(long, default_value_t = 2)]
    table: u8,

    /// Battleplan roll within the table (1-6).
    #[arg(long, default_value_t = 1)]
    roll: u8,

    /// Use the heuristic players instead of the random baseline.
    #[arg(long)]
    heuristic: bool,

    /// Print the full event log as JSON after the game.
    #[arg(long)]
    dump_log: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = Args::parse();

    let plan = battleplans::battleplan(args.table, args.roll)
        .ok_or("no such battleplan (table 1-2, roll 1-6)")?;
    println!("=== Warhost ===");
    println!("Battleplan: {} (table {}, roll {})", plan.name, plan.table, plan.roll);
    println!("Seed: {}\n", args.seed);

    let mut game = Game::new(battleplans::setup(plan), args.seed);

    let seraphon = FactionData::from_json(SERAPHON_JSON)?;
    let tzeentch = FactionData::from_json(TZEENTCH_JSON)?;

    let seraphon_roster = ArmyRoster {
        faction: "seraphon".into(),
        points_limit: 1000,
        entries: vec![
            RosterEntry { warscroll: "saurus-oldblood".into(), general: true, reinforced: false },
            RosterEntry { warscroll: "saurus-warriors".into(), general: false, reinforced: true },
            RosterEntry { warscroll: "skink-starpriest".into(), general: false, reinforced: false },
        ],
        formation: Some(0),
        heroic_trait: Some(0),
        artefact: None,
        artefact_bearer: None,
    };
    let tzeentch_roster = ArmyRoster {
        faction: "tzeentch".into(),
        points_limit: 1000,
        entries: vec![
            RosterEntry { warscroll: "changecaster".into(), general: true, reinforced: false },
            RosterEntry { warscroll: "pink-horrors".into(), general: false, reinforced: false },
            RosterEntry { warscroll: "flamers".into(), general: false, reinforced: false },
        ],
        formation: Some(0),
        heroic_trait: None,
        artefact: None,
        artefact_bearer: None,
    };

    // Deploy along each territory's centreline.
    let t0 = &plan.territories[0];
    let t1 = &plan.territories[1];
    let row = |t: &warhost_engine::board::Rect, i: f64| {
        Position::new(t.x + t.width * (0.3 + 0.2 * i), t.y + t.height / 2.0)
    };
    build_army(
        &mut game,
        &seraphon,
        &seraphon_roster,
        PlayerId(0),
        &[row(t0, 0.0), row(t0, 1.0), row(t0, 2.0)],
    )?;
    build_army(
        &mut game,
        &tzeentch,
        &tzeentch_roster,
        PlayerId(1),
        &[row(t1, 0.0), row(t1, 1.0), row(t1, 2.0)],
    )?;

    let make_player = |id: PlayerId, seed: u64| -> Box<dyn CommandSource> {
        if args.heuristic {
            Box::new(HeuristicPlayer::new(id, seed))
        } else {
            Box::new(RandomPlayer::new(id, seed))
        }
    };
    let mut p0 = make_player(PlayerId(0), args.seed.wrapping_add(1));
    let mut p1 = make_player(PlayerId(1), args.seed.wrapping_add(2));
    game.run(&mut [p0.as_mut(), p1.as_mut()], args.rounds);

    println!("Game finished after round {}.", game.round);
    match game.winner {
        Some(w) => println!("  Winner: {w}"),
        None => println!("  No winner (draw or round limit)"),
    }
    println!("\n  Final state:");
    for unit in game.units.iter() {
        println!(
            "    [{}] {:24} {:9} models {:2}/{:2}  health {:3}/{:3}",
            unit.owner,
            unit.name,
            if unit.is_destroyed() { "DESTROYED" } else { "fighting" },
            unit.alive_models(),
            unit.total_models(),
            unit.total_health(),
            unit.max_health(),
        );
    }
    println!("\n  Log entries: {}", game.log.len());

    if args.dump_log {
        println!("{}", serde_json::to_string_pretty(&game.log)?);
    }
    Ok(())
}
