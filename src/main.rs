use clap::Parser;
use panel_optimizer::api::OptimizeResponse;
use panel_optimizer::types::{Algorithm, BoardConfig, Options, PieceSpec, Verbosity};
use panel_optimizer::Optimizer;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "panel_optimizer",
    about = "Lays rectangular pieces out on stock boards with minimal waste"
)]
struct Cli {
    /// Stock board dimensions (WxH, e.g. 2440x1220)
    #[arg(long, value_parser = parse_dimensions)]
    board: (u32, u32),

    /// Pieces as [name=]WxH:qty[:norotate] (e.g. side=720x560:2 400x150:8:norotate)
    #[arg(long = "pieces", num_args = 1.., required = true)]
    pieces: Vec<String>,

    /// Margin trimmed from every board edge in mm
    #[arg(long, default_value_t = 10)]
    margin: u32,

    /// Blade kerf width in mm
    #[arg(long, default_value_t = 3)]
    kerf: u32,

    /// Algorithm: blf, bfdh, guillotine, genetic, or hybrid
    #[arg(long, default_value = "hybrid")]
    algorithm: Algorithm,

    /// Disable piece rotation
    #[arg(long)]
    no_rotate: bool,

    /// Seed for the genetic search
    #[arg(long)]
    seed: Option<u64>,

    /// Abort the optimization after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Warn when the layout needs more boards than this
    #[arg(long, default_value_t = 50)]
    max_boards: usize,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Log progress (-v) or every placement (-vv) to stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let width = parts[0]
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let height = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    if width == 0 || height == 0 {
        return Err(format!("dimensions must be non-zero in '{}'", s));
    }
    Ok((width, height))
}

fn parse_piece(s: &str, index: usize) -> Result<PieceSpec, String> {
    let (name, rest) = match s.split_once('=') {
        Some((name, rest)) => (name.to_string(), rest),
        None => (format!("piece{}", index + 1), s),
    };
    let parts: Vec<&str> = rest.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("invalid piece '{}', expected [name=]WxH:qty[:norotate]", s));
    }
    let (width, height) = parse_dimensions(parts[0])?;
    let qty = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    let mut spec = PieceSpec::new(name, width, height, qty);
    match parts.get(2) {
        None => {}
        Some(&"norotate") => spec = spec.fixed(),
        Some(flag) => return Err(format!("unknown flag '{}' in '{}'", flag, s)),
    }
    Ok(spec)
}

fn main() {
    let cli = Cli::parse();

    let (level, verbosity) = match cli.verbose {
        0 => (Level::WARN, Verbosity::Summary),
        1 => (Level::INFO, Verbosity::Summary),
        _ => (Level::DEBUG, Verbosity::Trace),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();

    let specs: Vec<PieceSpec> = cli
        .pieces
        .iter()
        .enumerate()
        .map(|(i, p)| parse_piece(p, i))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let board = BoardConfig::new(cli.board.0, cli.board.1)
        .with_margin(cli.margin)
        .with_kerf(cli.kerf);
    let options = Options {
        algorithm: cli.algorithm,
        max_boards: cli.max_boards,
        allow_rotation: !cli.no_rotate,
        seed: cli.seed,
        timeout_ms: cli.timeout_ms,
        verbosity,
        ..Options::default()
    };

    let solution = Optimizer::new(board, options)
        .optimize(&specs)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    if cli.json {
        let response = OptimizeResponse::from(&solution);
        match serde_json::to_string_pretty(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    for b in &solution.boards {
        println!("Board {} ({:.1}% used):", b.id, b.utilization());
        for piece in &b.pieces {
            if let Some(p) = piece.placement {
                let rot = if p.rotated { " [rotated]" } else { "" };
                println!("  {:<16} {} @ ({}, {}){}", piece.name, p.rect, p.x, p.y, rot);
            }
        }
        println!();
    }

    if !solution.unplaced.is_empty() {
        println!("Unplaced:");
        for piece in &solution.unplaced {
            println!("  {:<16} {}", piece.name, piece.size);
        }
        println!();
    }

    println!(
        "Summary: {} board{} used ({}), {} of {} pieces placed, {:.1}% waste",
        solution.board_count(),
        if solution.board_count() == 1 { "" } else { "s" },
        solution.algorithm,
        solution.placed_count(),
        solution.total_pieces(),
        solution.waste_percent(),
    );
}
