//! Score command - align system clusters to gold and write the six score tables

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use super::super::output::{check_paths, color};
use crate::eval::{Evaluator, ScoringConfig, SolverKind, TieBreak, DEFAULT_RUN_ID};
use crate::events::{EventCatalog, EventLog};
use crate::loader::AnnotationLoader;
use crate::report::{ScorePrinter, Separator};
use crate::types::Ontology;
use crate::validate::ALLOWED_MENTION_TYPES;

/// Score system output against gold annotations
#[derive(Parser, Debug)]
pub struct ScoreArgs {
    /// Event specification file (levels and message templates)
    #[arg(value_name = "LOG_SPECIFICATIONS")]
    pub log_specifications: PathBuf,

    /// Gold annotation file
    #[arg(value_name = "GOLD")]
    pub gold: PathBuf,

    /// System annotation file
    #[arg(value_name = "SYSTEM")]
    pub system: PathBuf,

    /// Output directory (must not exist)
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Run ID written to every row
    #[arg(short = 'r', long = "run", default_value = DEFAULT_RUN_ID)]
    pub run: String,

    /// Column separator of score files
    #[arg(short = 'S', long, default_value = "pretty")]
    pub separator: Separator,

    /// Closed list of allowed type labels, one per line
    #[arg(long, value_name = "PATH")]
    pub ontology: Option<PathBuf>,

    /// Keep only these mention types (comma-separated: NAM,NOM,PRO)
    #[arg(long, value_delimiter = ',', value_parser = parse_mention_type)]
    pub mention_types: Vec<String>,

    /// Assignment solver used for alignment
    #[arg(long, default_value = "hungarian")]
    pub solver: SolverKind,

    /// Order of equal-weight types in ranked metrics
    #[arg(long, default_value = "label-ascending")]
    pub tie_break: TieBreak,

    /// Also write all tables to scores.json in the output directory
    #[arg(long)]
    pub json: bool,
}

fn parse_mention_type(value: &str) -> Result<String, String> {
    let value = value.trim().to_uppercase();
    if ALLOWED_MENTION_TYPES.contains(&value.as_str()) {
        Ok(value)
    } else {
        Err(format!(
            "unknown mention type '{}' (expected one of {})",
            value,
            ALLOWED_MENTION_TYPES.join(", ")
        ))
    }
}

impl ScoreArgs {
    /// Inputs must exist and the output directory must not.
    pub fn check_paths(&self) -> Result<(), String> {
        let mut inputs = vec![self.log_specifications.as_path(), self.gold.as_path(), self.system.as_path()];
        if let Some(ontology) = &self.ontology {
            inputs.push(ontology.as_path());
        }
        check_paths(&inputs, &[self.output.as_path()])
    }

    /// Scoring configuration described by these arguments.
    #[must_use]
    pub fn config(&self) -> ScoringConfig {
        ScoringConfig::default()
            .with_run_id(self.run.clone())
            .with_tie_break(self.tie_break)
            .with_mention_types(self.mention_types.iter().cloned())
            .with_solver(self.solver)
    }
}

/// Execute the score command
///
/// Paths are checked by [`ScoreArgs::check_paths`] before logging starts.
pub fn run(args: ScoreArgs) -> Result<(), String> {
    let start = Instant::now();
    let catalog = EventCatalog::load(&args.log_specifications).map_err(|e| e.to_string())?;
    let events = EventLog::new(catalog);
    let config = args.config();
    log::info!("scoring configuration: {:?}", config);

    let ontology = match &args.ontology {
        Some(path) => Ontology::load(config.expander(), path),
        None => Ok(Ontology::open(config.expander())),
    }
    .map_err(|e| e.to_string())?;

    let loader = AnnotationLoader::new(&events)
        .with_type_separator(config.type_list_separator)
        .with_mention_types(config.mention_types.iter().cloned());
    let gold = loader.load(&args.gold).map_err(|e| e.to_string())?;
    let system = loader.load(&args.system).map_err(|e| e.to_string())?;
    log::info!("loaded {} gold and {} system mention(s)", gold.len(), system.len());

    let evaluator = Evaluator::new(config);
    let tables = evaluator
        .evaluate(gold, system, &ontology, &events)
        .map_err(|e| e.to_string())?;

    let printer = ScorePrinter::new(args.separator);
    let written = printer
        .write_all(&tables, &evaluator.config().run_id, &args.output)
        .map_err(|e| e.to_string())?;

    if args.json {
        let json = tables.to_json().map_err(|e| e.to_string())?;
        fs::write(args.output.join("scores.json"), json)
            .map_err(|e| format!("Failed to write scores.json: {}", e))?;
    }

    for table in tables.iter() {
        eprintln!(
            "{:<12} {:>6} row(s)  mean {:6.4}",
            table.metric().code(),
            table.len(),
            table.mean()
        );
    }
    let stats = events.stats();
    let summary = format!(
        "Wrote {} score file(s) to {} in {:.2}s ({})",
        written.len(),
        args.output.display(),
        start.elapsed().as_secs_f64(),
        stats
    );
    if stats.errors > 0 {
        eprintln!("{}", color("33", &summary));
    } else {
        eprintln!("{}", color("32", &summary));
    }
    Ok(())
}
