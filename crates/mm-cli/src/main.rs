#![forbid(unsafe_code)]

//! Mind-map CLI - turn anchored markdown notes into Excalidraw scenes.
//!
//! # Commands
//!
//! - `generate`: Write an Excalidraw scene, keeping saved node positions
//! - `lint`: Report parse warnings and errors
//! - `parse`: Output the parsed graph (or a summary) as JSON
//! - `sync-positions`: Pull hand-made moves from a scene into the sidecar

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mm_cli::config::load_config;
use mm_cli::positions::{positions_path, sync_positions_from_excalidraw};
use mm_cli::{AutoSync, GenerateOptions, generate, load_and_parse};
use mm_parser::{ParseWarning, parse, parse_summary_json};
use serde::Serialize;
use tracing::{info, warn};

/// Mind-map CLI - turn anchored markdown notes into Excalidraw scenes.
#[derive(Debug, Parser)]
#[command(
    name = "mindmap",
    version,
    about = "Turn anchored markdown notes into Excalidraw mind maps",
    long_about = "Parses markdown whose headings carry {#c-id} anchors into a concept graph,\n\
        lays out new nodes and writes an Excalidraw scene.\n\n\
        Node positions are kept in <name>.positions.json so regeneration never\n\
        moves what you have already arranged."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an Excalidraw scene from a markdown file.
    Generate {
        /// Markdown input file
        markdown: PathBuf,

        /// Config file (defaults to config.yaml next to the markdown, if any)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output path (defaults to <name>.excalidraw next to the markdown)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a markdown file and report warnings and errors.
    Lint {
        /// Markdown input file
        markdown: PathBuf,

        /// Config file (defaults to config.yaml next to the markdown, if any)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a markdown file and output JSON.
    Parse {
        /// Markdown input file
        markdown: PathBuf,

        /// Config file (defaults to config.yaml next to the markdown, if any)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output the full graph instead of a summary
        #[arg(long)]
        full: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Copy node positions from an edited Excalidraw scene into the sidecar.
    SyncPositions {
        /// Excalidraw scene
        excalidraw: PathBuf,

        /// Markdown file the scene was generated from
        markdown: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Generate {
            markdown,
            config,
            output,
        } => cmd_generate(&markdown, config.as_deref(), output.as_deref(), cli.quiet),

        Command::Lint {
            markdown,
            config,
            strict,
            json,
        } => cmd_lint(&markdown, config.as_deref(), strict, json),

        Command::Parse {
            markdown,
            config,
            full,
            pretty,
        } => cmd_parse(&markdown, config.as_deref(), full, pretty),

        Command::SyncPositions {
            excalidraw,
            markdown,
        } => cmd_sync_positions(&excalidraw, &markdown),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .try_init();
}

fn cmd_generate(
    markdown: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    quiet: bool,
) -> Result<()> {
    let report = generate(markdown, GenerateOptions { config, output })?;

    match &report.auto_sync {
        AutoSync::Skipped => {}
        AutoSync::Synced(count) => {
            if !quiet {
                println!("Synced {count} positions from {}", report.output.display());
            }
        }
        AutoSync::Failed(reason) => eprintln!("  Warning: could not sync positions: {reason}"),
    }
    for warning in &report.warnings {
        eprintln!("  Warning: {warning}");
    }

    info!(
        algorithm = report.layout.algorithm.as_str(),
        positioned = report.layout.positioned_nodes,
        iterations = report.layout.iterations,
        "layout finished"
    );

    if !quiet {
        println!("✓ Generated: {}", report.output.display());
        println!("  Nodes: {}", report.node_count);
        println!("  Edges: {}", report.edge_count);
        if report.new_nodes > 0 {
            println!("  New nodes laid out: {}", report.new_nodes);
        }
        println!("  Positions: {}", report.positions.display());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct LintResult {
    valid: bool,
    node_count: usize,
    edge_count: usize,
    warnings: Vec<ParseWarning>,
    errors: Vec<LintError>,
}

#[derive(Debug, Serialize)]
struct LintError {
    message: String,
    line: Option<usize>,
}

fn cmd_lint(markdown: &Path, config: Option<&Path>, strict: bool, json_output: bool) -> Result<()> {
    let config = load_config(config, markdown)?;
    let input = std::fs::read_to_string(markdown)
        .with_context(|| format!("Failed to read file: {}", markdown.display()))?;
    let source = markdown.display().to_string();

    let result = match parse(&input, &source, &config) {
        Ok(parsed) => LintResult {
            valid: !strict || parsed.warnings.is_empty(),
            node_count: parsed.graph.node_count(),
            edge_count: parsed.graph.edge_count(),
            warnings: parsed.warnings,
            errors: Vec::new(),
        },
        Err(err) => LintResult {
            valid: false,
            node_count: 0,
            edge_count: 0,
            warnings: Vec::new(),
            errors: vec![LintError {
                message: err.to_string(),
                line: Some(err.line()),
            }],
        },
    };

    if json_output {
        let output = serde_json::to_string_pretty(&result)?;
        println!("{output}");
    } else {
        if result.valid {
            println!("✓ {source}");
        } else {
            println!("✗ {source}");
        }

        println!("  Nodes: {}", result.node_count);
        println!("  Edges: {}", result.edge_count);

        if !result.errors.is_empty() {
            println!("\nErrors:");
            for err in &result.errors {
                println!("  {}", err.message);
            }
        }

        if !result.warnings.is_empty() {
            println!("\nWarnings:");
            for warning in &result.warnings {
                println!("  {warning}");
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_parse(markdown: &Path, config: Option<&Path>, full: bool, pretty: bool) -> Result<()> {
    let (_, parsed) = load_and_parse(markdown, config)?;

    let output = if full {
        if pretty {
            serde_json::to_string_pretty(&parsed.graph)?
        } else {
            serde_json::to_string(&parsed.graph)?
        }
    } else if pretty {
        let value: serde_json::Value = serde_json::from_str(&parse_summary_json(&parsed))?;
        serde_json::to_string_pretty(&value)?
    } else {
        parse_summary_json(&parsed)
    };

    println!("{output}");

    for warning in &parsed.warnings {
        warn!("Parse warning: {warning}");
    }

    Ok(())
}

fn cmd_sync_positions(excalidraw: &Path, markdown: &Path) -> Result<()> {
    let count = sync_positions_from_excalidraw(excalidraw, markdown)?;
    println!(
        "✓ Synced {count} positions to {}",
        positions_path(markdown).display()
    );
    Ok(())
}
