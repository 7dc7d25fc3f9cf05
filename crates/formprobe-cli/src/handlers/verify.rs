//! Verify command handler

use std::path::Path;

use formprobe::{preview_rows, CsvRow};
use tracing::debug;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::VerifyArgs;

/// Header line followed by the rows as pretty JSON, long fields truncated
pub fn render_preview(path: &Path, rows: &[CsvRow], width: usize) -> CliResult<String> {
    let short = preview_rows(rows, width);
    Ok(format!(
        "--- {} ---\n{}",
        path.display(),
        serde_json::to_string_pretty(&short)?
    ))
}

/// Execute the verify command
///
/// Every file is attempted; unreadable files are reported and make the
/// command fail once all files have been processed.
pub fn execute_verify(config: &CliConfig, args: &VerifyArgs) -> CliResult<()> {
    let resolver = config.load_probe_config()?.resolver()?;
    let mut unreadable = 0usize;

    for file in &args.files {
        match resolver.read_csv(file) {
            Ok(rows) => {
                debug!(file = %file.display(), rows = rows.len(), "parsed");
                println!("{}", render_preview(file, &rows, args.width)?);
            }
            Err(e) => {
                eprintln!("ERROR reading {}: {e}", file.display());
                unreadable += 1;
            }
        }
    }

    if unreadable > 0 {
        return Err(CliError::verification(format!(
            "{unreadable} of {} files could not be read",
            args.files.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use formprobe::parse_rows;

    #[test]
    fn test_render_preview_truncates() {
        let long = "x".repeat(70);
        let rows = parse_rows(&format!("valid,{long}\n"));
        let out = render_preview(Path::new("tests/data/numeprenume.csv"), &rows, 60).unwrap();
        assert!(out.starts_with("--- tests/data/numeprenume.csv ---\n"));
        assert!(out.contains(&format!("\"{}...\"", "x".repeat(60))));
        assert!(!out.contains(&long));
    }

    #[test]
    fn test_render_preview_keeps_whitespace() {
        let rows = parse_rows("invalid,space, \n");
        let out = render_preview(Path::new("a.csv"), &rows, 60).unwrap();
        assert!(out.contains("\" \""));
    }
}
