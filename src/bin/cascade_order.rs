//! CLI driver (§6): thin, ambient surface over the library. Not part of the
//! core subject of this specification, but wired up so the engine is
//! reachable end to end, the way the teacher's own binaries wrap its crate.

use std::io::{self, BufRead, Write};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cascade_order::emptiness::DEFAULT_K_MAX;

#[derive(Parser, Debug)]
#[command(name = "cascade-order", about = "Cascade-dependency model builder and selector overlap checker")]
struct Cli {
    /// Stylesheet to build a model for. With no file, reads selector pairs
    /// from standard input instead (§6).
    file: Option<String>,

    /// Overrides the emptiness decider's bounded-search depth.
    #[arg(long, default_value_t = DEFAULT_K_MAX)]
    k_max: u32,

    /// Log verbosity; falls back to `RUST_LOG` if unset.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());
    cascade_order::set_k_max(cli.k_max);

    let result = match &cli.file {
        Some(path) => run_file_mode(path),
        None => run_stdin_mode(),
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "cascade-order failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_file_mode(path: &str) -> Result<(), cascade_order::CascadeError> {
    let css = std::fs::read_to_string(path).unwrap_or_else(|err| {
        eprintln!("error: could not read {path}: {err}");
        std::process::exit(1);
    });
    let model = cascade_order::build_simple_css(&css)?;

    println!("edges:");
    for (i, edge) in model.edges.iter().enumerate() {
        println!("  [{i}] {} {{ {}: {} }} (line {})", edge.selector_text, edge.property, edge.value, edge.line);
    }
    println!("order:");
    for order in &model.order {
        println!("  [{}] before [{}]", order.before, order.after);
    }
    Ok(())
}

/// Reads selector pairs, one `E\tN` (tab-separated) pair per line, from
/// stdin; emits `E` for empty intersection or `N` for non-empty; a line
/// containing only `.` flushes stdout (§6).
fn run_stdin_mode() -> Result<(), cascade_order::CascadeError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.expect("reading stdin");
        let line = line.trim();
        if line == "." {
            out.flush().expect("flushing stdout");
            continue;
        }
        if line.is_empty() {
            continue;
        }
        let Some((left, right)) = line.split_once('\t') else {
            tracing::warn!(line, "expected two tab-separated selectors, skipping");
            continue;
        };
        let overlaps = cascade_order::selectors_overlap_str(left, right)?;
        writeln!(out, "{}", if overlaps { "N" } else { "E" }).expect("writing stdout");
    }
    out.flush().expect("flushing stdout");
    Ok(())
}
