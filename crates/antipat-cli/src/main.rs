use std::fs;
use std::path::PathBuf;

use antipat_core::scanner::language::census;
use antipat_core::scanner::walker::FileWalker;
use antipat_core::{
    render_mitigation, render_summary, DefaultScanner, Language, OutputFormat, RuleCatalogue,
    ScanOutcome, Scanner, StaticCatalogue, MITIGATION_FILE_NAME,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod settings;
use settings::ScanSettings;

#[derive(Parser, Debug)]
#[command(
    name = "antipat",
    author,
    version,
    about = "Anti-pattern scanner and mitigation reporter"
)]
struct Cli {
    /// Settings file layered under ANTIPAT_* environment variables
    #[arg(long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a directory and write the mitigation document
    Scan {
        /// Root directory to scan (defaults to the current directory)
        path: Option<PathBuf>,
        /// Summary output format
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
        /// Where to write the mitigation document
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Print the summary only; skip writing the mitigation document
        #[arg(long)]
        no_write: bool,
    },
    /// List catalogue rules
    ListRules {
        /// Restrict to one language (go, javascript, python, rust)
        #[arg(long)]
        language: Option<String>,
        /// Emit rules as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Report the language census without scanning
    Detect {
        /// Root directory to inspect (defaults to the current directory)
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Human,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Human => OutputFormat::Human,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = ScanSettings::load(cli.config.as_deref())?;
    match cli.command.unwrap_or(Commands::Scan {
        path: None,
        format: Format::Human,
        output: None,
        no_write: false,
    }) {
        Commands::Scan {
            path,
            format,
            output,
            no_write,
        } => run_scan(&settings, path, format, output, no_write).await?,
        Commands::ListRules { language, json } => list_rules(language.as_deref(), json).await?,
        Commands::Detect { path } => detect(&settings, path)?,
    }
    Ok(())
}

async fn run_scan(
    settings: &ScanSettings,
    path: Option<PathBuf>,
    format: Format,
    output: Option<PathBuf>,
    no_write: bool,
) -> Result<()> {
    let root = resolve_root(path)?;
    let scanner = DefaultScanner::builtin().with_walker_config(settings.walker_config());
    let outcome = scanner.scan(&root).await?;

    let summary = render_summary(&outcome, format.into())?;
    print!("{summary}");

    if let ScanOutcome::Report(report) = &outcome {
        if no_write {
            return Ok(());
        }
        let document = render_mitigation(report);
        let target = output.unwrap_or_else(|| root.join(MITIGATION_FILE_NAME));
        if let Err(err) = fs::write(&target, &document) {
            // The rendered document must still reach the user.
            println!("{document}");
            return Err(err).with_context(|| {
                format!(
                    "failed to write mitigation document to {}",
                    target.display()
                )
            });
        }
        eprintln!("Mitigation document written to {}", target.display());
    }
    Ok(())
}

async fn list_rules(language: Option<&str>, json: bool) -> Result<()> {
    let catalogue = StaticCatalogue::new();
    let mut rules = Vec::new();
    match language {
        Some(name) => {
            let language = parse_language(name)?;
            rules = catalogue.rules_for(language).await?;
        }
        None => {
            for language in Language::ALL {
                rules.extend(catalogue.rules_for(language).await?);
            }
        }
    }
    rules.sort_by(|a, b| a.language.cmp(&b.language).then_with(|| a.id.cmp(&b.id)));

    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    println!("{} rule(s) loaded", rules.len());
    for rule in rules {
        let mode = if rule.multiline { "multiline" } else { "line" };
        println!(
            "- {id:<20} [{language:<10}] {risk:<8} ({mode:<9}) :: {name}",
            id = rule.id,
            language = rule.language.name(),
            risk = rule.risk.to_string(),
            name = rule.display_name,
        );
    }
    Ok(())
}

fn detect(settings: &ScanSettings, path: Option<PathBuf>) -> Result<()> {
    let root = resolve_root(path)?;
    let listing = FileWalker::new(settings.walker_config()).walk(&root);
    let census = census(listing.files.iter().map(|file| file.path.as_path()));

    match census.selected {
        None => println!(
            "No supported language detected under {}.",
            root.display()
        ),
        Some(language) => {
            println!("Detected language: {language}");
            if census.ambiguous {
                println!("(file counts tied; selection is deterministic)");
            }
            for (language, count) in &census.counts {
                println!("  {language}: {count} file(s)");
            }
        }
    }
    Ok(())
}

fn resolve_root(path: Option<PathBuf>) -> Result<PathBuf> {
    let root = match path {
        Some(path) => path,
        None => std::env::current_dir().context("cannot resolve current directory")?,
    };
    let meta = fs::metadata(&root)
        .with_context(|| format!("cannot access scan root {}", root.display()))?;
    if !meta.is_dir() {
        bail!("scan root {} is not a directory", root.display());
    }
    Ok(root)
}

fn parse_language(name: &str) -> Result<Language> {
    let lowered = name.to_lowercase();
    Language::ALL
        .into_iter()
        .find(|language| language.name().to_lowercase() == lowered)
        .with_context(|| {
            format!(
                "unknown language `{name}` (expected one of: go, javascript, python, rust)"
            )
        })
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
