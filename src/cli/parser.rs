//! CLI argument parsing and structure definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::{ScoreArgs, ValidateArgs};

/// Type-metric scorer for entity clustering and typing output
#[derive(Parser, Debug)]
#[command(name = "typealign")]
#[command(
    author,
    version,
    about = "Score entity clustering and typing output against gold annotations",
    long_about = r#"
typealign - alignment-based scoring of entity clusters and their types

Gold and system entity clusters are aligned per document by shared mention
spans (optimal one-to-one matching), then each aligned pair is scored on its
hierarchical type assertions.

METRICS:
  cluster_v1 / mention_v1 : set precision, recall and F1 of expanded types
  cluster_v2 / mention_v2 : Average Precision, types ranked by mention count
  cluster_v3 / mention_v3 : Average Precision, types ranked by confidence

EXAMPLES:
  typealign score log_specs.txt gold.tab system.tab scores/
  typealign score -r run1 -S tab --ontology types.txt log_specs.txt gold.tab system.tab scores/
  typealign validate log_specs.txt segment_boundaries.txt types.txt input.tab output.tab
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// File to which log output is written
    #[arg(short = 'l', long = "log", global = true, default_value = "log.txt")]
    pub log: PathBuf,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands of the typealign CLI
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Align system output to gold annotations and write the six score tables
    #[command(visible_alias = "s")]
    Score(ScoreArgs),

    /// Validate an annotation file and write its valid lines
    #[command(visible_alias = "v")]
    Validate(ValidateArgs),
}

impl Commands {
    /// Check the command's input and output paths.
    pub fn check_paths(&self) -> Result<(), String> {
        match self {
            Self::Score(args) => args.check_paths(),
            Self::Validate(args) => args.check_paths(),
        }
    }

    /// Command name used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Score(_) => "score",
            Self::Validate(_) => "validate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{SolverKind, TieBreak};
    use crate::report::Separator;

    #[test]
    fn test_score_defaults() {
        let cli = Cli::try_parse_from(["typealign", "score", "specs", "gold", "sys", "out"]).unwrap();
        assert_eq!(cli.log, PathBuf::from("log.txt"));
        let Commands::Score(args) = cli.command else {
            panic!("expected score");
        };
        assert_eq!(args.run, "runID");
        assert_eq!(args.separator, Separator::Pretty);
        assert_eq!(args.solver, SolverKind::Hungarian);
        assert_eq!(args.tie_break, TieBreak::LabelAscending);
        assert!(args.mention_types.is_empty());
    }

    #[test]
    fn test_score_options() {
        let cli = Cli::try_parse_from([
            "typealign", "score", "-l", "run.log", "-r", "r7", "-S", "tab", "--mention-types", "NAM,NOM",
            "--solver", "greedy", "specs", "gold", "sys", "out",
        ])
        .unwrap();
        assert_eq!(cli.log, PathBuf::from("run.log"));
        let Commands::Score(args) = cli.command else {
            panic!("expected score");
        };
        assert_eq!(args.run, "r7");
        assert_eq!(args.separator, Separator::Tab);
        assert_eq!(args.mention_types, vec!["NAM".to_string(), "NOM".to_string()]);
        assert_eq!(args.solver, SolverKind::Greedy);
    }

    #[test]
    fn test_validate_positionals() {
        let cli = Cli::try_parse_from(["typealign", "validate", "specs", "bounds", "types", "in", "out"]).unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.output, PathBuf::from("out"));
    }

    #[test]
    fn test_check_paths_before_run() {
        let dir = tempfile::tempdir().unwrap();
        let specs = dir.path().join("specs");
        std::fs::write(&specs, "type code message\n").unwrap();
        let out = dir.path().join("out");
        let parse = |gold: &std::path::Path| {
            let specs = specs.to_str().unwrap();
            Cli::try_parse_from(["typealign", "score", specs, gold.to_str().unwrap(), specs, out.to_str().unwrap()])
                .unwrap()
        };
        let cli = parse(&specs);
        assert_eq!(cli.command.name(), "score");
        assert!(cli.command.check_paths().is_ok());
        let err = parse(&dir.path().join("missing")).command.check_paths().unwrap_err();
        assert!(err.contains("does not exist"));
    }

    #[test]
    fn test_missing_output_rejected() {
        assert!(Cli::try_parse_from(["typealign", "score", "specs", "gold", "sys"]).is_err());
    }
}
