use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use importers::{ImportConfig, ImportOutcome, ImportSession, MissingReason, MissingReport};
use media_io::{MediaResolver, PathIndex, ResolverOptions};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

mod host;

use host::JsonTimelineHost;

#[derive(Parser)]
#[command(name = "fcpxml-import")]
#[command(about = "Import Final Cut Pro XML timelines and relink their media")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a project and place its clips on a recorded timeline
    Import {
        /// FCP XML document
        document: PathBuf,

        /// Extra directories to search for media (repeatable)
        #[arg(short, long = "search-dir")]
        search_dirs: Vec<PathBuf>,

        /// Write the placed timeline as JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON import config (search_dirs, fuzzy_match, trust_recorded_path)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check every resolved file with ffprobe before placing it
        #[arg(long)]
        probe: bool,

        /// Ask for another search folder while media is still missing
        #[arg(short, long)]
        interactive: bool,

        /// Disable the substring fallback when matching filenames
        #[arg(long)]
        no_fuzzy: bool,
    },

    /// Print the parsed sequences as JSON
    Inspect {
        /// FCP XML document
        document: PathBuf,
    },

    /// Look up media filenames in a set of directories
    Locate {
        /// Filenames or recorded paths to look up
        names: Vec<String>,

        /// Directories to index
        #[arg(short, long = "search-dir", required = true)]
        search_dirs: Vec<PathBuf>,

        /// Disable the substring fallback
        #[arg(long)]
        no_fuzzy: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Import {
            document,
            search_dirs,
            output,
            config,
            probe,
            interactive,
            no_fuzzy,
        } => import_command(
            document,
            search_dirs,
            output,
            config,
            probe,
            interactive,
            no_fuzzy,
        ),
        Commands::Inspect { document } => inspect_command(document),
        Commands::Locate {
            names,
            search_dirs,
            no_fuzzy,
        } => locate_command(names, search_dirs, no_fuzzy),
    }
}

fn import_command(
    document: PathBuf,
    search_dirs: Vec<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
    probe: bool,
    interactive: bool,
    no_fuzzy: bool,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => ImportConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ImportConfig::default(),
    };
    config.search_dirs.extend(search_dirs);
    if no_fuzzy {
        config.fuzzy_match = false;
    }

    let probe = if probe && !media_io::ffprobe_available() {
        warn!("ffprobe not found on PATH; placing media without probing");
        false
    } else {
        probe
    };

    info!("Importing {:?}", document);
    let mut session = ImportSession::open(&document, &config)
        .with_context(|| format!("importing {}", document.display()))?;
    let mut host = JsonTimelineHost::new(probe);

    let mut outcome = session.run(&mut host);
    while interactive && !outcome.missing.is_empty() {
        print_missing(&outcome.missing);
        let Some(dir) = prompt_search_dir()? else {
            info!("Search cancelled; keeping {} placed clips", session.placed_total());
            break;
        };
        outcome = session.retry_with(&[dir], &mut host);
    }

    if !interactive && !outcome.missing.is_empty() {
        print_missing(&outcome.missing);
    }

    write_result(&session, &host, &outcome, output.as_deref())?;
    info!(
        "Import completed: {} placed, {} media paths missing",
        session.placed_total(),
        outcome.missing.len()
    );
    Ok(())
}

fn print_missing(report: &MissingReport) {
    eprintln!("{} media path(s) could not be placed:", report.len());
    for entry in report.entries() {
        let contexts: Vec<String> = entry
            .contexts
            .iter()
            .map(|c| c.display().to_string())
            .collect();
        match &entry.reason {
            MissingReason::Unresolved => eprintln!(
                "  {} ({} clip(s), searched from {})",
                entry.raw_path,
                entry.clips.len(),
                contexts.join(", ")
            ),
            MissingReason::Rejected {
                resolved_path,
                message,
            } => eprintln!(
                "  {} -> {} rejected: {}",
                entry.raw_path,
                resolved_path.display(),
                message
            ),
        }
    }
}

/// `None` when the user enters nothing or stdin is closed.
fn prompt_search_dir() -> Result<Option<PathBuf>> {
    eprint!("Search folder for missing files (empty to stop): ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    let dir = line.trim();
    if read == 0 || dir.is_empty() {
        return Ok(None);
    }
    Ok(Some(PathBuf::from(dir)))
}

fn write_result(
    session: &ImportSession,
    host: &JsonTimelineHost,
    outcome: &ImportOutcome,
    output: Option<&Path>,
) -> Result<()> {
    let result = serde_json::json!({
        "document": session.document(),
        "imported_at": chrono::Utc::now().to_rfc3339(),
        "sequences": session.sequences().len(),
        "placed": session.placed_total(),
        "indexed_files": session.index().len(),
        "search_roots": session.index().roots(),
        "scenes": host.scenes(),
        "missing": outcome.missing.entries().collect::<Vec<_>>(),
    });
    let text = serde_json::to_string_pretty(&result)?;
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!("Timeline written to: {:?}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn inspect_command(document: PathBuf) -> Result<()> {
    let sequences = importers::parse_document(&document)
        .with_context(|| format!("parsing {}", document.display()))?;
    println!("{}", serde_json::to_string_pretty(&sequences)?);
    Ok(())
}

fn locate_command(names: Vec<String>, search_dirs: Vec<PathBuf>, no_fuzzy: bool) -> Result<()> {
    let index = PathIndex::build(search_dirs.as_slice());
    for warning in index.warnings() {
        warn!("{}", warning);
    }
    info!("Indexed {} files", index.len());

    let base_dir = std::env::current_dir()?;
    let resolver = MediaResolver::new(&index, &base_dir).with_options(ResolverOptions {
        fuzzy: !no_fuzzy,
        ..ResolverOptions::default()
    });

    let results: Vec<_> = names
        .iter()
        .map(|name| serde_json::json!({ "query": name, "result": resolver.resolve(name) }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
