//! Sparse-checkout pattern codec
//!
//! Patterns live in two representations: a single space-delimited value on a
//! submodule's `sparse-checkout` manifest key, and the line-per-pattern file
//! git keeps under `.git/info/sparse-checkout`. Both encodings are lossless
//! only for patterns without embedded whitespace; anything else is rejected
//! rather than silently mangled.

use crate::error::SubmoduleError;
use anyhow::Result;

/// Default patterns applied by `add --sparse`: top-level files only,
/// no subdirectories.
pub const DEFAULT_PATTERNS: [&str; 2] = ["/*", "!/*/"];

/// The default pattern set as an owned list
#[must_use]
#[inline]
pub fn default_patterns() -> Vec<String> {
    DEFAULT_PATTERNS.iter().map(|p| (*p).to_owned()).collect()
}

/// Parse a manifest `sparse-checkout` value into an ordered pattern list
#[must_use]
pub fn parse_manifest_value(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_owned).collect()
}

/// Serialize a pattern list into the single-line manifest representation
#[must_use]
pub fn format_manifest_value(patterns: &[String]) -> String {
    patterns.join(" ")
}

/// Parse the multi-line pattern-file representation (as produced by
/// `git sparse-checkout list` or read from `.git/info/sparse-checkout`).
/// Blank lines and `#` comments are not patterns.
#[must_use]
pub fn parse_pattern_file(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

/// Serialize a pattern list into the multi-line pattern-file representation
#[must_use]
pub fn format_pattern_file(patterns: &[String]) -> String {
    let mut out = patterns.join("\n");
    out.push('\n');
    out
}

/// Validate that a pattern list can round-trip through the manifest encoding
///
/// # Errors
///
/// Returns an error if:
/// - The list is empty
/// - Any pattern contains embedded whitespace
pub fn validate(submodule_path: &str, patterns: &[String]) -> Result<()> {
    if patterns.is_empty() {
        return Err(SubmoduleError::invalid_pattern(
            submodule_path,
            "",
            "pattern list is empty",
        )
        .into());
    }

    for pattern in patterns {
        if pattern.chars().any(char::is_whitespace) {
            return Err(SubmoduleError::invalid_pattern(
                submodule_path,
                pattern.clone(),
                "patterns with embedded whitespace cannot be stored in .gitmodules",
            )
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|p| (*p).to_owned()).collect()
    }

    #[test]
    fn test_manifest_value_round_trip() {
        let patterns = owned(&["/*", "!/*/", "/docs/"]);
        let value = format_manifest_value(&patterns);
        assert_eq!(value, "/* !/*/ /docs/");
        assert_eq!(parse_manifest_value(&value), patterns);
    }

    #[test]
    fn test_manifest_value_reverse_round_trip() {
        let value = "/* !/*/";
        assert_eq!(
            format_manifest_value(&parse_manifest_value(value)),
            value
        );
    }

    #[test]
    fn test_parse_manifest_value_collapses_runs_of_whitespace() {
        assert_eq!(
            parse_manifest_value("  /*   !/*/ "),
            owned(&["/*", "!/*/"])
        );
    }

    #[test]
    fn test_pattern_file_round_trip() {
        let patterns = owned(&["/*", "!/*/", "/include/"]);
        let file = format_pattern_file(&patterns);
        assert_eq!(file, "/*\n!/*/\n/include/\n");
        assert_eq!(parse_pattern_file(&file), patterns);
    }

    #[test]
    fn test_parse_pattern_file_skips_blanks_and_comments() {
        let contents = "# comment\n\n/*\n  \n!/*/\n";
        assert_eq!(parse_pattern_file(contents), owned(&["/*", "!/*/"]));
    }

    #[test]
    fn test_default_patterns() {
        assert_eq!(default_patterns(), owned(&["/*", "!/*/"]));
    }

    #[test]
    fn test_validate_accepts_default_patterns() {
        assert!(validate("libs/foo", &default_patterns()).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_list() {
        let result = validate("libs/foo", &[]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_rejects_embedded_whitespace() {
        let result = validate("libs/foo", &owned(&["/*", "/my docs/"]));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("embedded whitespace")
        );
    }
}
