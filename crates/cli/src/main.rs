//! CLI tool for generating competition slide decks from roster documents.

use anyhow::{bail, Context, Result};
use clap::Parser;
use deck_core::{FieldMapping, Roster};
use deck_docx::DocxTableReader;
use deck_pptx::TemplatePackage;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Generate a slide deck from a roster document and a template slide.
#[derive(Parser, Debug)]
#[command(name = "deck-gen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Roster document (.docx) with one table row per team member
    roster: PathBuf,

    /// Template presentation (.pptx); its first slide is cloned per team
    template: PathBuf,

    /// Output presentation path (default: <roster>-deck.pptx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON field-mapping file overriding placeholder keys and header aliases
    #[arg(short, long)]
    mapping: Option<PathBuf>,

    /// Print the aggregated roster before generating
    #[arg(short, long)]
    print_roster: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mapping = load_mapping(args.mapping.as_deref())?;
    let roster = load_roster(&args.roster, &mapping)?;

    if roster.is_empty() {
        bail!("No team rows found in {}", args.roster.display());
    }

    if args.print_roster {
        print_roster(&roster);
    }

    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&args.roster),
    };

    let template_file = File::open(&args.template)
        .with_context(|| format!("Failed to open {}", args.template.display()))?;
    let mut package = TemplatePackage::open(BufReader::new(template_file))
        .with_context(|| format!("Failed to read template {}", args.template.display()))?;

    let out = File::create(&output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;

    let summary = deck_pptx::generate_deck(&mut package, &roster, &mapping, out)
        .with_context(|| "Failed to generate deck")?;

    for token in &summary.unresolved {
        eprintln!("warning: placeholder {} was never filled", token);
    }

    println!(
        "Generated {} slide(s) for {} team(s): {}",
        summary.slides,
        summary.teams,
        output_path.display()
    );

    Ok(())
}

/// Load the field mapping, or fall back to the defaults.
fn load_mapping(path: Option<&Path>) -> Result<FieldMapping> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open mapping {}", path.display()))?;
            let mapping: FieldMapping = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Invalid mapping file {}", path.display()))?;
            log::debug!("Loaded field mapping from {}", path.display());
            Ok(mapping)
        }
        None => Ok(FieldMapping::default()),
    }
}

/// Read the roster document and aggregate its first table.
fn load_roster(path: &Path, mapping: &FieldMapping) -> Result<Roster> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let tables = DocxTableReader::new()
        .read(BufReader::new(file))
        .with_context(|| format!("Failed to read tables from {}", path.display()))?;

    if tables.is_empty() {
        bail!("No tables found in {}", path.display());
    }
    if tables.len() > 1 {
        log::debug!(
            "Document has {} tables; using the first as the roster",
            tables.len()
        );
    }

    let roster = Roster::from_table(&tables[0], mapping)
        .with_context(|| format!("Failed to aggregate roster from {}", path.display()))?;

    log::debug!("Aggregated {} team(s)", roster.len());
    Ok(roster)
}

/// Print the aggregated roster, one line per team.
fn print_roster(roster: &Roster) {
    for (idx, team) in roster.teams.iter().enumerate() {
        let range = team
            .best_range_m
            .map(|m| format!("{:.2} m", m))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>3}. {} ({} member(s), best range {})",
            idx + 1,
            team.name,
            team.members.len(),
            range
        );
    }
}

/// Default output path: the roster path with a `-deck.pptx` suffix.
fn default_output_path(roster: &Path) -> PathBuf {
    let stem = roster
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("roster");

    let filename = format!("{}-deck.pptx", stem);
    match roster.parent() {
        Some(parent) => parent.join(filename),
        None => PathBuf::from(filename),
    }
}
