//! Output helpers for CLI commands: colors, path checks, log file setup.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use is_terminal::IsTerminal;

/// Wrap `text` in an ANSI color when stderr is a terminal.
pub fn color(code: &str, text: &str) -> String {
    if io::stderr().is_terminal() {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Format error message for display
pub fn format_error(operation: &str, details: &str) -> String {
    format!("ERROR: {} - {}", operation, details)
}

/// Require every path in `exist` to exist and every path in `absent` not to.
pub fn check_paths(exist: &[&Path], absent: &[&Path]) -> Result<(), String> {
    if let Some(missing) = exist.iter().find(|p| !p.exists()) {
        return Err(format!("Path {} does not exist", missing.display()));
    }
    if let Some(present) = absent.iter().find(|p| p.exists()) {
        return Err(format!("Path {} exists", present.display()));
    }
    Ok(())
}

/// Send all `log` output to `path`, at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging(path: &Path) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("Failed to create log file {}: {}", path.display(), e))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        })
        .try_init()
        .map_err(|e| format!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_paths() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(check_paths(&[dir.path()], &[&missing]).is_ok());
        assert!(check_paths(&[&missing], &[]).unwrap_err().contains("does not exist"));
        assert!(check_paths(&[], &[dir.path()]).unwrap_err().contains("exists"));
    }

    #[test]
    fn test_format_error() {
        assert_eq!(format_error("score", "bad"), "ERROR: score - bad");
    }
}
