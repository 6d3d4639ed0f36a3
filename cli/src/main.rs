//! fractal CLI binary: grow a bounded tree of thoughts for a query.
//!
//! Steps the root, then keeps stepping the best leaf, and prints the best path
//! (or the whole tree as JSON with `--json`).

mod log_format;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use cli::render;
use cli::{engine_config, offline_clients, remote_clients, run_search, CliError, SearchOptions};
use fractal::{CancellationToken, FractalEngine};
use tokio::sync::mpsc;

/// Max chars per printed thought; `0` disables truncation.
const DEFAULT_DISPLAY_LEN: usize = 160;

#[derive(Parser, Debug)]
#[command(name = "fractal")]
#[command(about = "fractal: bounded tree-of-thought search from the command line")]
struct Args {
    /// Query (or pass as positional arguments)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Positional args: query when -m/--message is not used
    #[arg(trailing_var_arg = true)]
    rest: Vec<String>,

    /// Total steps: one for the root, the rest on the best leaf
    #[arg(short, long, default_value_t = 3, env = "FRACTAL_STEPS")]
    steps: usize,

    /// Override FRACTAL_MAX_DEPTH
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Override FRACTAL_BRANCH_FACTOR
    #[arg(long, value_name = "N")]
    branch_factor: Option<usize>,

    /// Critic rubric (system instruction); default is a generic alignment rubric
    #[arg(long, value_name = "TEXT")]
    rubric: Option<String>,

    /// Use deterministic local explorer/critic instead of the remote model
    #[arg(long)]
    offline: bool,

    /// Print the whole tree instead of only the best path
    #[arg(long)]
    tree: bool,

    /// Output the tree as JSON (with best path and counts)
    #[arg(long)]
    json: bool,

    /// When using --json, write output to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// When using --json, pretty-print
    #[arg(long)]
    pretty: bool,

    /// Verbose: print engine events to stderr as they happen
    #[arg(short, long)]
    verbose: bool,
}

fn display_len() -> usize {
    std::env::var("FRACTAL_DISPLAY_LEN")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_DISPLAY_LEN)
}

async fn run(args: Args, query: String) -> Result<(), CliError> {
    let config = engine_config(args.max_depth, args.branch_factor, args.rubric.clone())?;
    let (explorer, critic) = if args.offline {
        offline_clients(config.branch_factor)
    } else {
        remote_clients()?
    };
    let mut engine = FractalEngine::new(explorer, critic, config);

    let printer = if args.verbose {
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine = engine.with_events(tx);
        Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                eprintln!("· {}", render::describe_event(&event));
            }
        }))
    } else {
        None
    };

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let opts = SearchOptions {
        query,
        steps: args.steps,
    };
    let report = run_search(&engine, &opts, &cancel).await?;
    // Dropping the engine closes the event channel so the printer can finish.
    drop(engine);
    if let Some(handle) = printer {
        let _ = handle.await;
    }

    if args.json {
        let value = serde_json::json!({
            "tree": report.tree_json(),
            "best_path": report.best_path.iter().map(|n| n.id.to_string()).collect::<Vec<_>>(),
            "expansions": report.expansions,
            "nodes": report.nodes,
            "cancelled": report.cancelled,
        });
        return render::write_json(&value, args.file.as_deref(), args.pretty);
    }

    let max_len = display_len();
    if args.tree {
        if let Some(tree) = &report.tree {
            print!("{}", render::render_tree(tree, max_len));
        }
    } else {
        print!("{}", render::render_path(&report.best_path, max_len));
    }
    if report.cancelled {
        eprintln!("fractal: cancelled, showing partial result");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = config::load_and_apply("fractal", None) {
        eprintln!("fractal: config: {}", e);
    }
    logging::init()?;

    let args = Args::parse();
    let query = args.message.clone().or_else(|| {
        if args.rest.is_empty() {
            None
        } else {
            Some(args.rest.join(" "))
        }
    });
    let Some(query) = query else {
        eprintln!("fractal: provide a query via -m/--message or positional args");
        std::process::exit(2);
    };

    if let Err(e) = run(args, query).await {
        eprintln!("fractal: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
