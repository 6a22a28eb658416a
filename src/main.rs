mod cli;
mod client;
mod config;
mod diff;
mod logging;
mod model;
mod pipeline;
mod review;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

/// Style names understood by the format collaborator, plus the local
/// "original" rendering
const KNOWN_STYLES: [&str; 8] = [
    "original",
    "apa",
    "mla",
    "ama",
    "nlm",
    "gb2015",
    "numeric",
    "author_year",
];

#[derive(Parser)]
#[command(name = "refmatch")]
#[command(about = "Reconcile free-text citations against candidate records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory for config discovery (defaults to current)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Suppress normal output
    #[arg(long, global = true)]
    quiet: bool,

    /// Also write logs to the default log file
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a block of citations and review the matches
    Review {
        /// File containing the citations (reads stdin if omitted)
        file: Option<PathBuf>,

        /// Target citation style for the output list
        #[arg(long)]
        style: Option<String>,

        /// Ask the search service for smarter matching
        #[arg(long)]
        smart: bool,

        /// Disable ANSI highlighting
        #[arg(long)]
        no_color: bool,
    },

    /// List known citation style names
    Styles,

    /// Check collaborator availability
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let log_file = if args.log {
        Some(logging::default_log_path()?)
    } else {
        None
    };
    let verbosity = logging::Verbosity::from_flags(args.debug, args.quiet);
    logging::init_logging(verbosity, log_file.as_deref())?;

    let config = config::RefmatchConfig::load(args.dir.as_deref())?;
    let collaborator = Arc::new(client::HttpCollaborator::from_config(&config.service));

    match args.command {
        Commands::Styles => {
            for style in KNOWN_STYLES {
                println!("{}", style);
            }
        }

        Commands::Doctor => {
            if collaborator.is_available().await {
                println!("✓ service reachable at {}", config.service.base_url);
            } else {
                eprintln!("✗ service unreachable at {}", config.service.base_url);
                std::process::exit(1);
            }
        }

        Commands::Review {
            file,
            style,
            smart,
            no_color,
        } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            if text.trim().is_empty() {
                anyhow::bail!("no citations provided");
            }

            let pipeline = pipeline::Pipeline::new(collaborator.clone(), collaborator.clone())
                .with_smart_matching(smart || config.defaults.use_smart_matching);
            let mut progress = cli::ConsoleProgress { quiet: args.quiet };
            let mut session = pipeline.run(&text, &mut progress).await?;

            if !args.quiet {
                cli::print_session(&session, !no_color);
            }

            let target = style.unwrap_or_else(|| session.detected_style().to_string());
            match session.set_style(&target, collaborator.as_ref()).await {
                Ok(rendered) => println!("{}", rendered),
                Err(e) => {
                    eprintln!("format conversion failed ({}); showing original", e);
                    println!("{}", session.render_original());
                }
            }
        }
    }

    Ok(())
}
