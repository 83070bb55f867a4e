mod script;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sw_config::LoadedConfig;
use sw_core::{Point, Session, SessionEvent, export_json, to_polar};

#[derive(Parser)]
#[command(name = "sw", about = "Radial stat-allocation engine CLI")]
struct Cli {
    /// Config file (overrides SW_CONFIG and the default location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Named profile from the config file
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON gesture script against a fresh session
    Replay {
        /// Script file path
        script: PathBuf,

        /// Starting allocation, e.g. `int=2,dex=1`
        #[arg(long)]
        start: Option<String>,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,

        /// Also print the final shape vertices around the wheel center
        #[arg(long)]
        vertices: bool,
    },

    /// Show ring radius and resting value per level
    Rings,

    /// Map a point relative to the wheel center onto an axis
    Polar {
        #[arg(allow_hyphen_values = true)]
        x: f64,
        #[arg(allow_hyphen_values = true)]
        y: f64,
    },

    /// Random drag storm checking that values stay in range
    Soak {
        #[arg(long, default_value_t = 10_000)]
        iterations: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Print the resolved configuration as TOML
    Config,
}

fn load_config(cli: &Cli) -> Result<LoadedConfig> {
    sw_config::load(cli.config.as_deref(), cli.profile.as_deref())
        .context("failed to load configuration")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Replay {
            script,
            start,
            json,
            vertices,
        } => cmd_replay(&cli, script, start.as_deref(), *json, *vertices),
        Commands::Rings => cmd_rings(&cli),
        Commands::Polar { x, y } => cmd_polar(&cli, *x, *y),
        Commands::Soak { iterations, seed } => cmd_soak(&cli, *iterations, *seed),
        Commands::Config => cmd_config(&cli),
    }
}

/// `key=level` pairs in axis order.
fn format_levels(session: &Session) -> String {
    session
        .keys()
        .iter()
        .zip(session.floors())
        .map(|(key, level)| format!("{key}={level}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_event(session: &Session, event: &SessionEvent) {
    match event {
        SessionEvent::LevelCrossed(c) => {
            let key = session.keys().get(c.axis).map(String::as_str).unwrap_or("?");
            let arrow = if c.is_rising() { "up" } else { "down" };
            println!("crossed {key} {arrow}: {} -> {}", c.from, c.to);
        }
        SessionEvent::AllocationChanged { allocation } => {
            let levels: Vec<String> = session
                .keys()
                .iter()
                .filter_map(|k| allocation.get(k).map(|v| format!("{k}={v}")))
                .collect();
            println!("allocation: {}", levels.join(" "));
        }
    }
}

fn cmd_replay(
    cli: &Cli,
    path: &Path,
    start: Option<&str>,
    json: bool,
    vertices: bool,
) -> Result<()> {
    let loaded = load_config(cli)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let steps = script::parse_script(&content)
        .with_context(|| format!("invalid script {}", path.display()))?;

    let mut session = match start {
        Some(pairs) => {
            let allocation = script::parse_start(pairs).context("invalid --start")?;
            let keys = loaded.engine.keys();
            if let Some(unknown) = allocation.keys().find(|k| !keys.contains(k)) {
                bail!("unknown axis key '{unknown}' in --start");
            }
            Session::from_allocation(&loaded.engine, &allocation)
        }
        None => Session::new(&loaded.engine),
    };
    tracing::info!(
        "replaying {} steps in {} mode",
        steps.len(),
        session.strategy_name()
    );

    let events = script::run(&mut session, &steps);

    if json {
        let snapshot = export_json(&session.snapshot()).context("failed to serialize snapshot")?;
        println!("{snapshot}");
        return Ok(());
    }

    for event in &events {
        print_event(&session, event);
    }
    println!(
        "final: {} (settled: {})",
        format_levels(&session),
        session.is_settled()
    );
    if vertices {
        for (key, p) in session.keys().iter().zip(session.vertices(Point::new(0.0, 0.0))) {
            println!("vertex {key}: ({:.2}, {:.2})", p.x, p.y);
        }
    }
    Ok(())
}

fn cmd_rings(cli: &Cli) -> Result<()> {
    let loaded = load_config(cli)?;
    let session = Session::new(&loaded.engine);
    let rings = session.rings();
    let bounds = session.bounds();

    println!(
        "axes: {}, levels: {}..={}, mode: {}",
        session.values().len(),
        bounds.min,
        bounds.max,
        loaded.engine.mode
    );
    for level in bounds.min..=bounds.max {
        println!(
            "level {level}: radius {:.2}, rest {:.3}",
            rings.radius_for_level(level),
            rings.resting_value_for_floor(level)
        );
    }
    println!(
        "visual max {:.2} at radius {:.2}",
        bounds.visual_max,
        rings.max_radius()
    );
    Ok(())
}

fn cmd_polar(cli: &Cli, x: f64, y: f64) -> Result<()> {
    let loaded = load_config(cli)?;
    let session = Session::new(&loaded.engine);
    let axes = session.values().len();
    let polar = to_polar(Point::new(x, y), Point::new(0.0, 0.0), axes, session.rings().max_radius());
    let key = session.keys().get(polar.axis).map(String::as_str).unwrap_or("?");

    println!("axis:     {} ({key})", polar.axis);
    println!("distance: {:.2}", polar.distance);
    println!("value:    {:.3}", session.rings().distance_to_value(polar.distance));
    Ok(())
}

fn cmd_soak(cli: &Cli, iterations: usize, seed: u64) -> Result<()> {
    let loaded = load_config(cli)?;
    let mut session = Session::new(&loaded.engine);
    let mut rng = SmallRng::seed_from_u64(seed);
    let axes = session.values().len();
    let bounds = *session.bounds();
    let reach = session.rings().max_radius() * 1.5;
    let mut crossings = 0usize;

    for i in 0..iterations {
        let axis = rng.random_range(0..axes);
        let distance = rng.random_range(-0.1 * reach..reach);
        let events = match rng.random_range(0..4) {
            0 => session.begin(axis, distance),
            1 => session.update(axis, distance),
            2 => session.end(),
            _ => session.tick(),
        };
        crossings += events
            .iter()
            .filter(|e| matches!(e, SessionEvent::LevelCrossed(_)))
            .count();

        if let Some((axis, v)) = session
            .values()
            .iter()
            .copied()
            .enumerate()
            .find(|&(_, v)| !v.is_finite() || v < bounds.lower() || v > bounds.visual_max)
        {
            bail!("call {i}: axis {axis} left the range with value {v}");
        }
    }

    session.end();
    let (ticks, _) = session.settle(script::DEFAULT_SETTLE_TICKS);
    println!(
        "soak ok: {iterations} calls, {crossings} crossings, mode {}, seed {seed}",
        loaded.engine.mode
    );
    println!("final: {} (settled in {ticks} ticks)", format_levels(&session));
    Ok(())
}

fn cmd_config(cli: &Cli) -> Result<()> {
    let loaded = load_config(cli)?;
    let rendered = sw_config::to_toml(&loaded.engine).context("failed to render configuration")?;
    match &loaded.source {
        Some(path) => println!("# source: {}", path.display()),
        None => println!("# source: built-in defaults"),
    }
    if let Some(profile) = &loaded.profile {
        println!("# profile: {profile}");
    }
    print!("{rendered}");
    Ok(())
}
