//! CSV scenario data parsing and file resolution.
//!
//! The dialect is deliberately small and permissive:
//!
//! - one record per line, `\n` or `\r\n` endings
//! - comma delimiter, optional double-quote quoting, `""` escapes a quote
//! - blank lines and lines starting with `#` (after trimming) are skipped
//! - no header row, no fixed column count
//! - field whitespace is preserved exactly
//!
//! Malformed input never fails: an unterminated quote absorbs the remainder
//! of its line into a single field.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::result::{FormprobeError, FormprobeResult};

/// One parsed CSV record
pub type CsvRow = Vec<String>;

/// Environment variable overriding the tests root used for path resolution
pub const TESTS_DIR_ENV: &str = "FORMPROBE_TESTS_DIR";

/// Default maximum field width for [`preview_rows`]
pub const DEFAULT_PREVIEW_WIDTH: usize = 60;

/// Parse CSV text into rows.
///
/// Fields are never trimmed, so `x, ,y` yields a middle field of exactly one
/// space.
#[must_use]
pub fn parse_rows(text: &str) -> Vec<CsvRow> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> CsvRow {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                let _ = chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Read and parse a CSV file using the default [`DataPathResolver`].
pub fn read_csv(path: impl AsRef<Path>) -> FormprobeResult<Vec<CsvRow>> {
    DataPathResolver::from_env()?.read_csv(path)
}

/// Locates scenario data files regardless of the working directory.
///
/// Candidates are tried in order:
///
/// 1. the path itself, when absolute
/// 2. relative to the working directory
/// 3. relative to the tests root, with a leading `tests/` stripped
/// 4. under `<tests root>/data`, with leading `tests/` and `data/` stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPathResolver {
    cwd: PathBuf,
    tests_root: PathBuf,
}

impl DataPathResolver {
    /// Create a resolver with explicit roots
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>, tests_root: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            tests_root: tests_root.into(),
        }
    }

    /// Create a resolver from the process working directory.
    ///
    /// The tests root is taken from `FORMPROBE_TESTS_DIR` when set (relative
    /// values resolve against the working directory), else `<cwd>/tests`.
    pub fn from_env() -> FormprobeResult<Self> {
        let cwd = env::current_dir()?;
        let tests_root = env::var_os(TESTS_DIR_ENV)
            .map(PathBuf::from)
            .map_or_else(|| cwd.join("tests"), |root| cwd.join(root));
        Ok(Self::new(cwd, tests_root))
    }

    /// Override the tests root
    #[must_use]
    pub fn with_tests_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.tests_root = root.into();
        self
    }

    /// Working directory used for relative resolution
    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Tests root used by the fallback strategies
    #[must_use]
    pub fn tests_root(&self) -> &Path {
        &self.tests_root
    }

    /// Every candidate path for `path`, in resolution order
    #[must_use]
    pub fn candidates(&self, path: &Path) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(4);
        if path.is_absolute() {
            candidates.push(path.to_path_buf());
        }
        candidates.push(self.cwd.join(path));

        let without_tests = strip_leading_dir(path, "tests");
        candidates.push(self.tests_root.join(&without_tests));

        let without_data = strip_leading_dir(&without_tests, "data");
        candidates.push(self.tests_root.join("data").join(without_data));
        candidates
    }

    /// Resolve `path` to the first existing candidate
    pub fn resolve(&self, path: impl AsRef<Path>) -> FormprobeResult<PathBuf> {
        let path = path.as_ref();
        let mut tried = Vec::new();
        for candidate in self.candidates(path) {
            debug!(candidate = %candidate.display(), "checking data path");
            if candidate.is_file() {
                return Ok(candidate);
            }
            tried.push(candidate);
        }
        Err(FormprobeError::ResourceNotFound {
            path: path.display().to_string(),
            tried,
        })
    }

    /// Resolve and parse a CSV file
    pub fn read_csv(&self, path: impl AsRef<Path>) -> FormprobeResult<Vec<CsvRow>> {
        let resolved = self.resolve(path)?;
        let text = fs::read_to_string(&resolved)?;
        let rows = parse_rows(&text);
        debug!(path = %resolved.display(), rows = rows.len(), "parsed csv");
        Ok(rows)
    }
}

fn strip_leading_dir(path: &Path, dir: &str) -> PathBuf {
    let mut components = path.components().peekable();
    while matches!(
        components.peek(),
        Some(std::path::Component::RootDir | std::path::Component::CurDir)
    ) {
        let _ = components.next();
    }
    match components.peek() {
        Some(std::path::Component::Normal(first)) if *first == dir => {
            let _ = components.next();
            components.collect()
        }
        _ => path.to_path_buf(),
    }
}

/// Shorten long fields for display, appending `...` to truncated ones.
#[must_use]
pub fn preview_rows(rows: &[CsvRow], max_chars: usize) -> Vec<CsvRow> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|field| {
                    if field.chars().count() > max_chars {
                        let mut short: String = field.chars().take(max_chars).collect();
                        short.push_str("...");
                        short
                    } else {
                        field.clone()
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> CsvRow {
        fields.iter().map(|f| (*f).to_string()).collect()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_simple_rows() {
            let rows = parse_rows("valid,Ana\ninvalid,digits,Ana2\n");
            assert_eq!(rows, vec![row(&["valid", "Ana"]), row(&["invalid", "digits", "Ana2"])]);
        }

        #[test]
        fn test_quoted_field_with_delimiter_and_escape() {
            let rows = parse_rows(r#"a,"b,c""d",e"#);
            assert_eq!(rows, vec![row(&["a", "b,c\"d", "e"])]);
        }

        #[test]
        fn test_whitespace_preserved() {
            let rows = parse_rows("x, ,y");
            assert_eq!(rows[0][1], " ");
            let rows = parse_rows("  lead,trail  ");
            assert_eq!(rows[0], row(&["  lead", "trail  "]));
        }

        #[test]
        fn test_comments_and_blank_lines_skipped() {
            let text = "# header comment\n\nvalid,a\n   \n   # indented comment\ninvalid,b,c\n";
            let rows = parse_rows(text);
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[1][0], "invalid");
        }

        #[test]
        fn test_crlf_line_endings() {
            let rows = parse_rows("valid,a\r\ninvalid,b\r\n");
            assert_eq!(rows, vec![row(&["valid", "a"]), row(&["invalid", "b"])]);
        }

        #[test]
        fn test_unterminated_quote_absorbs_line() {
            let rows = parse_rows("a,\"b,c,d\nnext,row");
            assert_eq!(rows[0], row(&["a", "b,c,d"]));
            assert_eq!(rows[1], row(&["next", "row"]));
        }

        #[test]
        fn test_trailing_comma_yields_empty_field() {
            let rows = parse_rows("invalid,empty,");
            assert_eq!(rows[0], row(&["invalid", "empty", ""]));
        }

        #[test]
        fn test_quoted_empty_field() {
            let rows = parse_rows(r#"invalid,empty,"""#);
            assert_eq!(rows[0], row(&["invalid", "empty", ""]));
        }

        #[test]
        fn test_multibyte_characters() {
            let rows = parse_rows("valid,Ștefan,\"Țară, ăî\"");
            assert_eq!(rows[0], row(&["valid", "Ștefan", "Țară, ăî"]));
        }
    }

    mod resolver_tests {
        use super::*;
        use tempfile::TempDir;

        #[test]
        fn test_candidates_order() {
            let resolver = DataPathResolver::new("/work", "/work/tests");
            let candidates = resolver.candidates(Path::new("tests/data/names.csv"));
            assert_eq!(
                candidates,
                vec![
                    PathBuf::from("/work/tests/data/names.csv"),
                    PathBuf::from("/work/tests/data/names.csv"),
                    PathBuf::from("/work/tests/data/names.csv"),
                ]
            );

            let candidates = resolver.candidates(Path::new("names.csv"));
            assert_eq!(
                candidates,
                vec![
                    PathBuf::from("/work/names.csv"),
                    PathBuf::from("/work/tests/names.csv"),
                    PathBuf::from("/work/tests/data/names.csv"),
                ]
            );
        }

        #[test]
        fn test_absolute_path_tried_first() {
            let resolver = DataPathResolver::new("/work", "/work/tests");
            let candidates = resolver.candidates(Path::new("/abs/names.csv"));
            assert_eq!(candidates[0], PathBuf::from("/abs/names.csv"));
            assert_eq!(candidates.len(), 4);
        }

        #[test]
        fn test_resolves_from_data_dir() {
            let dir = TempDir::new().unwrap();
            let data = dir.path().join("tests").join("data");
            fs::create_dir_all(&data).unwrap();
            fs::write(data.join("names.csv"), "valid,Ana\n").unwrap();

            let resolver = DataPathResolver::new(dir.path().join("elsewhere"), dir.path().join("tests"));
            let rows = resolver.read_csv("names.csv").unwrap();
            assert_eq!(rows, vec![row(&["valid", "Ana"])]);
        }

        #[test]
        fn test_resolves_from_cwd() {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("local.csv"), "invalid,x,y\n").unwrap();
            let resolver = DataPathResolver::new(dir.path(), dir.path().join("tests"));
            let resolved = resolver.resolve("local.csv").unwrap();
            assert_eq!(resolved, dir.path().join("local.csv"));
        }

        #[test]
        fn test_not_found_lists_every_attempt() {
            let dir = TempDir::new().unwrap();
            let resolver = DataPathResolver::new(dir.path(), dir.path().join("tests"));
            let err = resolver.read_csv("missing.csv").unwrap_err();
            match err {
                FormprobeError::ResourceNotFound { path, tried } => {
                    assert_eq!(path, "missing.csv");
                    assert_eq!(tried.len(), 3);
                    assert_eq!(tried[0], dir.path().join("missing.csv"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_strip_leading_dir() {
            assert_eq!(
                strip_leading_dir(Path::new("tests/data/a.csv"), "tests"),
                PathBuf::from("data/a.csv")
            );
            assert_eq!(
                strip_leading_dir(Path::new("./tests/a.csv"), "tests"),
                PathBuf::from("a.csv")
            );
            assert_eq!(
                strip_leading_dir(Path::new("fixtures/a.csv"), "tests"),
                PathBuf::from("fixtures/a.csv")
            );
        }
    }

    mod preview_tests {
        use super::*;

        #[test]
        fn test_long_fields_truncated() {
            let long = "A".repeat(300);
            let preview = preview_rows(&[row(&["invalid", "long", &long])], DEFAULT_PREVIEW_WIDTH);
            assert_eq!(preview[0][2].len(), 63);
            assert!(preview[0][2].ends_with("..."));
            assert_eq!(preview[0][1], "long");
        }

        #[test]
        fn test_exact_width_untouched() {
            let exact = "B".repeat(DEFAULT_PREVIEW_WIDTH);
            let preview = preview_rows(&[row(&[&exact])], DEFAULT_PREVIEW_WIDTH);
            assert_eq!(preview[0][0], exact);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_plain_rows_round_trip(
                rows in prop::collection::vec(
                    prop::collection::vec("[a-zA-Z0-9 ._-]{0,12}", 1..5),
                    1..8,
                )
            ) {
                // Skip rows that would be filtered as blank or comment lines
                let rows: Vec<CsvRow> = rows
                    .into_iter()
                    .filter(|r| {
                        let joined = r.join(",");
                        !joined.trim().is_empty()
                    })
                    .collect();
                let text = rows.iter().map(|r| r.join(",")).collect::<Vec<_>>().join("\n");
                prop_assert_eq!(parse_rows(&text), rows);
            }

            #[test]
            fn prop_quoted_fields_recoverable(field in "[a-z,\" ]{0,20}") {
                let quoted = format!("\"{}\"", field.replace('"', "\"\""));
                let text = format!("k,{quoted},z");
                let rows = parse_rows(&text);
                prop_assert_eq!(rows.len(), 1);
                prop_assert_eq!(&rows[0][1], &field);
                prop_assert_eq!(rows[0].len(), 3);
            }
        }
    }
}
