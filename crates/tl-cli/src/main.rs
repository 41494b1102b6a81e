//! TextLinks CLI
//!
//! CLI tool for running the text-link engine over HTML files.

mod page;
mod perf_budget;

use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};

use tl_core::marker::{count_marked, CONTROL_CLASS, HIGHLIGHT_CLASS};
use tl_core::{find, label_for};

use crate::page::PageOptions;
use crate::perf_budget::{run_perf_budget, PerfBudgetOptions};

#[derive(Parser)]
#[command(name = "tl-cli")]
#[command(about = "TextLinks engine runner and tools")]
struct Cli {
    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an HTML file and write the rewritten document
    Scan {
        /// Input HTML file
        #[arg(short, long)]
        input: String,

        /// Output HTML file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Hostname the page is served from
        #[arg(long)]
        host: Option<String>,

        /// JSON file with stored settings
        #[arg(long)]
        settings: Option<String>,

        /// Engine options as inline JSON
        #[arg(long)]
        options: Option<String>,
    },

    /// List URL matches in a text file
    Find {
        /// Input text file
        #[arg(short, long)]
        input: String,
    },

    /// Scan then roll back, and check the text is unchanged
    Roundtrip {
        /// Input HTML file
        #[arg(short, long)]
        input: String,
    },

    /// Run the performance budget check on a synthetic page
    Perf {
        /// Paragraphs in the synthetic page
        #[arg(long, default_value_t = 10_000)]
        paragraphs: usize,

        /// Fragments inserted after the initial scan
        #[arg(long, default_value_t = 500)]
        insertions: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let result = match cli.command {
        Commands::Scan {
            input,
            output,
            host,
            settings,
            options,
        } => cmd_scan(
            &PageOptions {
                input: &input,
                page_host: host.as_deref(),
                settings_path: settings.as_deref(),
                options_json: options.as_deref(),
            },
            output.as_deref(),
        ),
        Commands::Find { input } => cmd_find(&input),
        Commands::Roundtrip { input } => cmd_roundtrip(&input),
        Commands::Perf {
            paragraphs,
            insertions,
        } => run_perf_budget(PerfBudgetOptions {
            paragraphs,
            insertions,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_scan(opts: &PageOptions<'_>, output: Option<&str>) -> Result<(), String> {
    let mut engine = page::load_engine(opts)?;

    let start = Instant::now();
    let report = engine
        .start()
        .map_err(|e| format!("Scan failed: {}", e))?;
    let elapsed = start.elapsed();

    let html = tl_html::serialize(engine.document());
    match output {
        Some(path) => page::write_text(Path::new(path), &html)?,
        None => println!("{html}"),
    }

    // Keep stdout clean for the document when no output file is given.
    let doc = engine.document();
    match report {
        Some(report) => {
            eprintln!("Scanned '{}'", opts.input);
            eprintln!("  Visited:     {}", report.visited);
            eprintln!("  Rewritten:   {}", report.rewritten);
            eprintln!("  Highlights:  {}", count_marked(doc, HIGHLIGHT_CLASS));
            eprintln!("  Controls:    {}", count_marked(doc, CONTROL_CLASS));
            eprintln!("  Failed:      {}", report.failed);
            eprintln!("  Time:        {:.1}ms", elapsed.as_secs_f64() * 1000.0);
        }
        None => eprintln!("Skipped '{}': disabled for this site", opts.input),
    }

    Ok(())
}

fn cmd_find(input: &str) -> Result<(), String> {
    let text = page::read_text(input)?;
    let spans = find(&text);

    println!("{} URL(s) in '{}'", spans.len(), input);
    for span in &spans {
        println!("  {:>6}..{:<6} {:<8} {}", span.start, span.end, label_for(&span.text), span.text);
    }

    Ok(())
}

fn cmd_roundtrip(input: &str) -> Result<(), String> {
    let mut engine = page::load_engine(&PageOptions {
        input,
        page_host: None,
        settings_path: None,
        options_json: None,
    })?;
    let before = page::body_text(&engine);

    let report = engine
        .start()
        .map_err(|e| format!("Scan failed: {}", e))?
        .unwrap_or_default();
    let undone = engine.rollback();
    let after = page::body_text(&engine);

    println!("Round trip for '{}'", input);
    println!("  Rewritten:   {}", report.rewritten);
    println!("  Controls:    {} removed", undone.controls_removed);
    println!("  Highlights:  {} restored", undone.highlights_restored);

    if undone.failed > 0 {
        return Err(format!("Rollback skipped {} nodes", undone.failed));
    }
    if before != after {
        return Err("Text content differs after rollback".to_string());
    }

    println!("✓ Text content identical");
    Ok(())
}
