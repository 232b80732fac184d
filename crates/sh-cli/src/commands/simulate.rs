use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use sh_core::component::{ComponentKind, Market, Planet, Resources};
use sh_core::EntityId;
use sh_simulation::{EconomyConfig, EngineState, SimConfig, SimEventKind, Simulation};

/// Options of the `simulate` command.
pub struct SimulateArgs {
    pub world: PathBuf,
    pub config: Option<PathBuf>,
    pub ticks: u64,
    pub seed: u64,
    pub hours: Option<f64>,
    pub verbose: bool,
    pub save_state: Option<PathBuf>,
    pub load_state: Option<PathBuf>,
    pub save_world: Option<PathBuf>,
}

pub fn run(args: &SimulateArgs) -> Result<(), String> {
    let world = super::load_world(&args.world)?;
    let economy = match &args.config {
        Some(path) => super::load_config(path)?,
        None => EconomyConfig::default(),
    };

    let mut config = SimConfig::default()
        .with_seed(args.seed)
        .with_economy(economy)
        .with_max_events(2_000);
    if let Some(hours) = args.hours {
        config = config.with_hours_per_tick(hours);
    }

    let mut sim = Simulation::from_config(world, config).map_err(|e| e.to_string())?;

    if let Some(path) = &args.load_state {
        let json = super::read_file(path)?;
        let state = EngineState::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))?;
        sim.load_engine_state(state)
            .map_err(|e| format!("{}: {e}", path.display()))?;
    }

    sim.init()
        .map_err(|e| format!("simulation init failed: {e}"))?;
    let opening = market_prices(&sim);
    let summaries = sim
        .run(args.ticks)
        .map_err(|e| format!("simulation error: {e}"))?;

    // Header
    let hours = sim.engine().config().tick_hours;
    println!(
        "  {} '{}' {}",
        "Simulation".bold(),
        sim.world().meta.name,
        format!(
            "({} ticks, seed={}, {hours}h/tick)",
            args.ticks, args.seed
        )
        .dimmed()
    );
    let produced: f64 = summaries.iter().map(|s| s.production.produced).sum();
    let consumed: f64 = summaries.iter().map(|s| s.consumption.consumed).sum();
    let shocks: usize = summaries.iter().map(|s| s.market.shocks).sum();
    println!(
        "  {produced:.1} units produced, {consumed:.1} consumed, {shocks} price shocks, {} events logged",
        sim.events().len()
    );
    println!("  In-world date: {}", sim.clock().current_date());
    println!();

    // Events
    if args.verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in sim.events().events() {
            let tick_label = format!("[tick {:>3}]", event.tick).dimmed();
            let desc = colorize_event(&event.kind, &event.description);
            println!("  {tick_label} {desc}");
        }
        if sim.events().is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    } else {
        let notable: Vec<_> = sim
            .events()
            .events()
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    SimEventKind::ResourceShortage { .. } | SimEventKind::PriceShock { .. }
                )
            })
            .collect();
        if !notable.is_empty() {
            println!("  {}", "Notable Events".bold().underline());
            for event in notable.iter().rev().take(10).rev() {
                let tag = match event.kind {
                    SimEventKind::ResourceShortage { .. } => "SHORT".red().bold(),
                    _ => "SHOCK".yellow().bold(),
                };
                println!("  {tag}  {}", event.description);
            }
            if notable.len() > 10 {
                println!("  {}", format!("... {} more", notable.len() - 10).dimmed());
            }
            println!();
        }
    }

    print_planets(&sim);
    print_markets(&sim, &opening);

    if let Some(path) = &args.save_state {
        let json = sim
            .engine()
            .get_state()
            .to_json()
            .map_err(|e| e.to_string())?;
        std::fs::write(path, json)
            .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
        println!("  Engine state saved to {}", path.display());
    }
    if let Some(path) = &args.save_world {
        let json = sim.world().snapshot().to_json().map_err(|e| e.to_string())?;
        std::fs::write(path, json)
            .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
        println!("  World saved to {}", path.display());
    }

    Ok(())
}

/// (market, good, price) for every priced good.
fn market_prices(sim: &Simulation) -> Vec<(EntityId, String, f64)> {
    let world = sim.world();
    world
        .entities_with(&[ComponentKind::Market])
        .into_iter()
        .filter_map(|id| world.get::<Market>(id).map(|m| (id, m)))
        .flat_map(|(id, market)| {
            market
                .prices
                .iter()
                .map(move |(good, price)| (id, good.clone(), *price))
        })
        .collect()
}

fn print_planets(sim: &Simulation) {
    let world = sim.world();
    let ids = world.entities_with(&[ComponentKind::Planet, ComponentKind::Resources]);
    if ids.is_empty() {
        return;
    }

    println!("  {}", "Planets".bold().underline());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Planet", "Kind", "Atmosphere", "Population", "Stock"]);

    for id in ids {
        let (Some(planet), Some(resources)) = (world.get::<Planet>(id), world.get::<Resources>(id))
        else {
            continue;
        };
        let stock = resources
            .stored()
            .iter()
            .filter(|(_, amount)| **amount > 0.0)
            .map(|(name, amount)| format!("{name} {amount:.1}"))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            world.label(id).to_string(),
            planet.kind.to_string(),
            planet.atmosphere.to_string(),
            planet.population.to_string(),
            if stock.is_empty() {
                "--".to_string()
            } else {
                stock
            },
        ]);
    }

    println!("{table}");
    println!();
}

fn print_markets(sim: &Simulation, opening: &[(EntityId, String, f64)]) {
    let closing = market_prices(sim);
    if closing.is_empty() {
        return;
    }

    println!("  {}", "Markets".bold().underline());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Market", "Good", "Base", "Price", "Change"]);

    let config = sim.engine().config();
    for (market, good, price) in &closing {
        let base = config
            .base_price(good)
            .map(|b| format!("{b:.2}"))
            .unwrap_or_else(|| "--".to_string());
        let change = opening
            .iter()
            .find(|(m, g, _)| m == market && g == good)
            .map(|(_, _, before)| format_change(*before, *price))
            .unwrap_or_else(|| "--".to_string());
        table.add_row(vec![
            sim.world().label(*market).to_string(),
            good.clone(),
            base,
            format!("{price:.2}"),
            change,
        ]);
    }

    println!("{table}");
    println!();
}

fn colorize_event(kind: &SimEventKind, description: &str) -> colored::ColoredString {
    match kind {
        SimEventKind::ResourceShortage { .. } => description.red(),
        SimEventKind::ProductionOverflow { .. } => description.yellow(),
        SimEventKind::PriceShock { .. } => description.yellow().bold(),
        SimEventKind::ProductionCompleted { .. } => description.green(),
        SimEventKind::MarketInitialized { .. } => description.cyan(),
        SimEventKind::RouteOpened { .. }
        | SimEventKind::RouteClosed { .. }
        | SimEventKind::TradeExecuted { .. } => description.blue(),
        SimEventKind::Custom { .. } => description.normal(),
    }
}

fn format_change(before: f64, after: f64) -> String {
    if before <= 0.0 {
        return "--".to_string();
    }
    let pct = (after - before) / before * 100.0;
    let text = format!("{pct:+.1}%");
    if pct > 0.05 {
        text.green().to_string()
    } else if pct < -0.05 {
        text.red().to_string()
    } else {
        text.normal().to_string()
    }
}
