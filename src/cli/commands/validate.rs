//! Validate command - check an annotation file and keep its valid lines

use std::path::PathBuf;

use clap::Parser;

use super::super::output::{check_paths, color};
use crate::events::{EventCatalog, EventLog};
use crate::types::{Ontology, TypeExpander};
use crate::validate::{DocumentBoundaries, Validator};

/// Validate an annotation file against document boundaries and an ontology
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Event specification file (levels and message templates)
    #[arg(value_name = "LOG_SPECIFICATIONS")]
    pub log_specifications: PathBuf,

    /// Segment boundaries (document_id, start_char, end_char columns)
    #[arg(value_name = "SEGMENT_BOUNDARIES")]
    pub segment_boundaries: PathBuf,

    /// Allowed type labels, one per line
    #[arg(value_name = "ONTOLOGY_TYPES")]
    pub ontology_types: PathBuf,

    /// Annotation file to validate
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where valid lines are written (must not exist)
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}

impl ValidateArgs {
    /// Inputs must exist and the output file must not.
    pub fn check_paths(&self) -> Result<(), String> {
        check_paths(
            &[
                self.log_specifications.as_path(),
                self.segment_boundaries.as_path(),
                self.ontology_types.as_path(),
                self.input.as_path(),
            ],
            &[self.output.as_path()],
        )
    }
}

/// Execute the validate command
///
/// Paths are checked by [`ValidateArgs::check_paths`] before logging starts.
pub fn run(args: ValidateArgs) -> Result<(), String> {
    let catalog = EventCatalog::load(&args.log_specifications).map_err(|e| e.to_string())?;
    let events = EventLog::new(catalog);
    let boundaries = DocumentBoundaries::load(&args.segment_boundaries).map_err(|e| e.to_string())?;
    let ontology = Ontology::load(TypeExpander::default(), &args.ontology_types).map_err(|e| e.to_string())?;
    log::info!(
        "validating {} against {} document(s) and {} type(s)",
        args.input.display(),
        boundaries.len(),
        ontology.len()
    );

    let report = Validator::new(&boundaries, &ontology, &events)
        .validate_file(&args.input, &args.output)
        .map_err(|e| e.to_string())?;

    let summary = format!("{}: {}", args.input.display(), report);
    if report.is_valid() {
        eprintln!("{}", color("32", &summary));
    } else {
        eprintln!("{}", color("33", &summary));
    }
    Ok(())
}
