//! Reading and writing the `.gitmodules` manifest
//!
//! The manifest is parsed into a line-preserving document model: every source
//! line is kept verbatim, grouped into blocks (one per `[submodule "..."]`
//! section, plus a preamble). Edits rewrite only the lines of the targeted
//! section, so an update to one record leaves every other byte of the file
//! untouched. Writes go through a temp file in the manifest's directory and a
//! rename, so a concurrent reader can only ever observe the old or the new
//! contents.

use crate::error::SubmoduleError;
use crate::manifest::SubmoduleRecord;
use crate::sparse;
use anyhow::{Context as _, Result};
use regex::Regex;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const PATH_KEY: &str = "path";
const URL_KEY: &str = "url";
const BRANCH_KEY: &str = "branch";
const SPARSE_KEY: &str = "sparse-checkout";

/// One contiguous run of manifest lines: the preamble before the first
/// section header, or a whole section including its header line.
#[derive(Debug, Clone)]
struct Block {
    lines: Vec<String>,
    /// Section name for `[submodule "..."]` blocks, `None` for the preamble
    /// and for non-submodule sections (kept opaque).
    submodule_name: Option<String>,
}

impl Block {
    fn key_value(&self, key: &str) -> Option<String> {
        let re = key_line_regex(key);
        self.lines
            .iter()
            .find_map(|line| re.captures(line).map(|c| c[2].trim().to_owned()))
    }

    /// Replace the value on an existing key line (preserving its leading
    /// whitespace), or append a new `\tkey = value` line to the section.
    fn set_key(&mut self, key: &str, value: &str) {
        let re = key_line_regex(key);
        for line in &mut self.lines {
            if let Some(caps) = re.captures(line) {
                *line = format!("{}{key} = {value}", &caps[1]);
                return;
            }
        }

        // Insert after the last non-blank line so trailing blank separators
        // stay at the end of the section.
        let insert_at = self
            .lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(self.lines.len(), |i| i + 1);
        self.lines.insert(insert_at, format!("\t{key} = {value}"));
    }

    fn remove_key(&mut self, key: &str) {
        let re = key_line_regex(key);
        self.lines.retain(|line| !re.is_match(line));
    }
}

fn key_line_regex(key: &str) -> Regex {
    // Fixed template with an escaped key; cannot fail to compile.
    Regex::new(&format!(r"^(\s*){}\s*=\s*(.*?)\s*$", regex::escape(key))).unwrap()
}

/// Persistent store for the superproject's `.gitmodules` manifest
#[derive(Debug)]
pub struct ManifestStore {
    manifest_path: PathBuf,
    blocks: Vec<Block>,
    modified: bool,
}

impl ManifestStore {
    /// Load and parse the manifest
    ///
    /// # Errors
    ///
    /// Returns `ManifestCorrupt` if the file is missing, unreadable, or not
    /// valid git-config syntax, or if two records share a path.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(manifest_path).map_err(|e| {
            SubmoduleError::manifest_corrupt(format!(
                "could not read '{}': {e}",
                manifest_path.display()
            ))
        })?;

        let store = Self::parse(manifest_path, &contents)?;
        debug!(
            "parsed {} submodules from {}",
            store.submodule_count(),
            manifest_path.display()
        );
        Ok(store)
    }

    /// Load the manifest, treating a missing file as an empty manifest
    ///
    /// Used by `add`, which may create the first record.
    ///
    /// # Errors
    ///
    /// Returns `ManifestCorrupt` if an existing file cannot be parsed.
    pub fn load_or_default(manifest_path: &Path) -> Result<Self> {
        if manifest_path.exists() {
            Self::load(manifest_path)
        } else {
            Ok(Self {
                manifest_path: manifest_path.to_path_buf(),
                blocks: Vec::new(),
                modified: false,
            })
        }
    }

    fn parse(manifest_path: &Path, contents: &str) -> Result<Self> {
        let submodule_header = Regex::new(r#"^\s*\[submodule\s+"(.*)"\]\s*$"#).unwrap();
        let other_header = Regex::new(r"^\s*\[[^\]]*\]\s*$").unwrap();
        let key_value = Regex::new(r"^\s*[A-Za-z][A-Za-z0-9-]*\s*=.*$").unwrap();
        let ignorable = Regex::new(r"^\s*([#;].*)?$").unwrap();

        let mut blocks = vec![Block {
            lines: Vec::new(),
            submodule_name: None,
        }];
        let mut in_preamble = true;

        for (lineno, raw_line) in contents.split('\n').enumerate() {
            let line = raw_line.trim_end_matches('\r');

            if let Some(caps) = submodule_header.captures(line) {
                blocks.push(Block {
                    lines: vec![raw_line.to_owned()],
                    submodule_name: Some(caps[1].to_owned()),
                });
                in_preamble = false;
            } else if other_header.is_match(line) {
                blocks.push(Block {
                    lines: vec![raw_line.to_owned()],
                    submodule_name: None,
                });
                in_preamble = false;
            } else if key_value.is_match(line) || ignorable.is_match(line) {
                if in_preamble && key_value.is_match(line) {
                    return Err(SubmoduleError::manifest_corrupt(format!(
                        "'{}' line {}: key outside any section",
                        manifest_path.display(),
                        lineno + 1
                    ))
                    .into());
                }
                // blocks always holds at least the preamble
                blocks.last_mut().unwrap().lines.push(raw_line.to_owned());
            } else {
                return Err(SubmoduleError::manifest_corrupt(format!(
                    "'{}' line {}: unparsable line: {}",
                    manifest_path.display(),
                    lineno + 1,
                    line
                ))
                .into());
            }
        }

        let store = Self {
            manifest_path: manifest_path.to_path_buf(),
            blocks,
            modified: false,
        };

        // Duplicate paths would make path-keyed updates ambiguous.
        let mut seen = Vec::new();
        for block in &store.blocks {
            if block.submodule_name.is_none() {
                continue;
            }
            if let Some(path) = block.key_value(PATH_KEY) {
                if seen.contains(&path) {
                    return Err(SubmoduleError::manifest_corrupt(format!(
                        "'{}': duplicate submodule path '{path}'",
                        manifest_path.display()
                    ))
                    .into());
                }
                seen.push(path);
            }
        }

        Ok(store)
    }

    fn submodule_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.submodule_name.is_some())
            .count()
    }

    /// Whether any record has been created or updated since load
    #[must_use]
    #[inline]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// All records, in manifest order
    ///
    /// Sections without a `path` key carry no working-tree state and are
    /// skipped, matching git's own handling.
    ///
    /// # Errors
    ///
    /// Returns `ManifestCorrupt` if a record with a path has no url.
    pub fn records(&self) -> Result<Vec<SubmoduleRecord>> {
        self.blocks
            .iter()
            .filter(|b| b.submodule_name.is_some() && b.key_value(PATH_KEY).is_some())
            .map(|b| self.record_from_block(b))
            .collect()
    }

    /// Whether any record claims the given submodule path, malformed or not
    #[must_use]
    pub fn contains_path(&self, path: &str) -> bool {
        self.block_for_path(path).is_some()
    }

    /// The record for a given submodule path
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` for unknown paths and `ManifestCorrupt` for
    /// a malformed record.
    pub fn record_for_path(&self, path: &str) -> Result<SubmoduleRecord> {
        let block = self
            .block_for_path(path)
            .ok_or_else(|| SubmoduleError::record_not_found(path))?;
        self.record_from_block(block)
    }

    fn block_for_path(&self, path: &str) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|b| b.submodule_name.is_some() && b.key_value(PATH_KEY).as_deref() == Some(path))
    }

    fn record_from_block(&self, block: &Block) -> Result<SubmoduleRecord> {
        // Callers only hand us submodule blocks that have a path.
        let name = block.submodule_name.clone().unwrap_or_default();
        let path = block.key_value(PATH_KEY).unwrap_or_default();
        let url = block.key_value(URL_KEY).ok_or_else(|| {
            SubmoduleError::manifest_corrupt(format!(
                "'{}': submodule '{name}' has no url",
                self.manifest_path.display()
            ))
        })?;

        Ok(SubmoduleRecord {
            name,
            path,
            url,
            branch: block.key_value(BRANCH_KEY),
            sparse_patterns: block
                .key_value(SPARSE_KEY)
                .map(|v| sparse::parse_manifest_value(&v)),
        })
    }

    /// Append a record for a newly added submodule
    ///
    /// # Errors
    ///
    /// Returns `PathAlreadyManaged` if the path already has a record.
    pub fn create_record(&mut self, record: &SubmoduleRecord) -> Result<()> {
        if self.block_for_path(&record.path).is_some() {
            return Err(SubmoduleError::path_already_managed(&record.path).into());
        }

        let mut lines = vec![format!("[submodule \"{}\"]", record.name)];
        lines.push(format!("\t{PATH_KEY} = {}", record.path));
        lines.push(format!("\t{URL_KEY} = {}", record.url));
        if let Some(branch) = record.branch.as_ref() {
            lines.push(format!("\t{BRANCH_KEY} = {branch}"));
        }
        if let Some(patterns) = record.sparse_patterns.as_ref() {
            lines.push(format!(
                "\t{SPARSE_KEY} = {}",
                sparse::format_manifest_value(patterns)
            ));
        }

        self.blocks.push(Block {
            lines,
            submodule_name: Some(record.name.clone()),
        });
        self.modified = true;
        Ok(())
    }

    /// Update an existing record in place, preserving its position and any
    /// lines this tool does not manage
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the path has no record. Never creates.
    pub fn update_record(&mut self, record: &SubmoduleRecord) -> Result<()> {
        let block = self
            .blocks
            .iter_mut()
            .find(|b| {
                b.submodule_name.is_some() && b.key_value(PATH_KEY).as_deref() == Some(&record.path)
            })
            .ok_or_else(|| SubmoduleError::record_not_found(&record.path))?;

        block.set_key(URL_KEY, &record.url);
        match record.branch.as_ref() {
            Some(branch) => block.set_key(BRANCH_KEY, branch),
            None => block.remove_key(BRANCH_KEY),
        }
        match record.sparse_patterns.as_ref() {
            Some(patterns) => {
                block.set_key(SPARSE_KEY, &sparse::format_manifest_value(patterns));
            }
            None => block.remove_key(SPARSE_KEY),
        }

        self.modified = true;
        Ok(())
    }

    fn render(&self) -> String {
        let mut lines: Vec<&str> = Vec::new();
        for (index, block) in self.blocks.iter().enumerate() {
            // The parser's preamble block is empty for files that start with
            // a section header; skip it so we don't invent a blank line.
            if index == 0 && block.submodule_name.is_none() && block.lines.is_empty() {
                continue;
            }
            for line in &block.lines {
                lines.push(line);
            }
        }

        let mut out = lines.join("\n");
        // Blocks appended by create_record have no trailing empty segment,
        // so make sure a created file still ends with a newline.
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    /// Write the manifest back atomically (temp file + rename)
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be created, written, or
    /// renamed into place.
    pub fn save(&mut self) -> Result<()> {
        let dir = self
            .manifest_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)
            .context("Failed to create temporary file for .gitmodules")?;
        tmp.write_all(self.render().as_bytes())
            .context("Failed to write .gitmodules contents")?;
        tmp.persist(&self.manifest_path).with_context(|| {
            format!("Failed to replace '{}'", self.manifest_path.display())
        })?;

        self.modified = false;
        debug!("wrote {}", self.manifest_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "[submodule \"libs/alpha\"]\n\
\tpath = libs/alpha\n\
\turl = https://example.com/alpha.git\n\
\tbranch = main\n\
\tsparse-checkout = /* !/*/\n\
[submodule \"libs/beta\"]\n\
\tpath = libs/beta\n\
\turl = https://example.com/beta.git\n";

    fn store_from(contents: &str) -> (TempDir, ManifestStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gitmodules");
        fs::write(&path, contents).unwrap();
        let store = ManifestStore::load(&path).unwrap();
        (dir, store)
    }

    #[test]
    fn test_parse_records_in_manifest_order() {
        let (_dir, store) = store_from(SAMPLE);
        let records = store.records().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "libs/alpha");
        assert_eq!(records[0].url, "https://example.com/alpha.git");
        assert_eq!(records[0].branch.as_deref(), Some("main"));
        assert_eq!(
            records[0].sparse_patterns,
            Some(vec!["/*".to_owned(), "!/*/".to_owned()])
        );
        assert_eq!(records[1].path, "libs/beta");
        assert_eq!(records[1].branch, None);
        assert_eq!(records[1].sparse_patterns, None);
    }

    #[test]
    fn test_record_for_unknown_path() {
        let (_dir, store) = store_from(SAMPLE);
        let err = store.record_for_path("libs/gamma").unwrap_err();
        assert!(err.to_string().contains("libs/gamma"));
    }

    #[test]
    fn test_missing_manifest_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let result = ManifestStore::load(&dir.path().join(".gitmodules"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::load_or_default(&dir.path().join(".gitmodules")).unwrap();
        assert!(store.records().unwrap().is_empty());
    }

    #[test]
    fn test_unparsable_line_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gitmodules");
        fs::write(&path, "[submodule \"a\"]\n\tpath = a\n\t!!!\n").unwrap();
        let err = ManifestStore::load(&path).unwrap_err();
        assert!(err.to_string().contains("unparsable"));
    }

    #[test]
    fn test_duplicate_path_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gitmodules");
        fs::write(
            &path,
            "[submodule \"a\"]\n\tpath = same\n\turl = u\n\
             [submodule \"b\"]\n\tpath = same\n\turl = u\n",
        )
        .unwrap();
        let err = ManifestStore::load(&path).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_update_preserves_unrelated_records_byte_identically() {
        let (dir, mut store) = store_from(SAMPLE);
        let mut record = store.record_for_path("libs/beta").unwrap();
        record.sparse_patterns = Some(vec!["/src/".to_owned()]);
        store.update_record(&record).unwrap();
        store.save().unwrap();

        let written = fs::read_to_string(dir.path().join(".gitmodules")).unwrap();
        let alpha_section = "[submodule \"libs/alpha\"]\n\
\tpath = libs/alpha\n\
\turl = https://example.com/alpha.git\n\
\tbranch = main\n\
\tsparse-checkout = /* !/*/\n";
        assert!(written.starts_with(alpha_section));
        assert!(written.contains("\tsparse-checkout = /src/\n"));
    }

    #[test]
    fn test_update_replaces_value_in_place() {
        let (dir, mut store) = store_from(SAMPLE);
        let mut record = store.record_for_path("libs/alpha").unwrap();
        record.sparse_patterns = Some(vec!["/docs/".to_owned()]);
        store.update_record(&record).unwrap();
        store.save().unwrap();

        let written = fs::read_to_string(dir.path().join(".gitmodules")).unwrap();
        assert!(written.contains("\tsparse-checkout = /docs/\n"));
        assert!(!written.contains("/* !/*/"));
    }

    #[test]
    fn test_update_clears_sparse_key() {
        let (dir, mut store) = store_from(SAMPLE);
        let mut record = store.record_for_path("libs/alpha").unwrap();
        record.sparse_patterns = None;
        store.update_record(&record).unwrap();
        store.save().unwrap();

        let written = fs::read_to_string(dir.path().join(".gitmodules")).unwrap();
        assert!(!written.contains("sparse-checkout"));
        assert!(written.contains("\tbranch = main\n"));
    }

    #[test]
    fn test_update_unknown_path_never_creates() {
        let (_dir, mut store) = store_from(SAMPLE);
        let record = SubmoduleRecord::new("libs/gamma", "libs/gamma", "u");
        assert!(store.update_record(&record).is_err());
        assert_eq!(store.records().unwrap().len(), 2);
    }

    #[test]
    fn test_create_record_appends_at_end() {
        let (dir, mut store) = store_from(SAMPLE);
        let record = SubmoduleRecord::new("libs/gamma", "libs/gamma", "https://example.com/g.git")
            .with_branch(Some("dev".to_owned()))
            .with_sparse_patterns(Some(vec!["/*".to_owned(), "!/*/".to_owned()]));
        store.create_record(&record).unwrap();
        store.save().unwrap();

        let written = fs::read_to_string(dir.path().join(".gitmodules")).unwrap();
        assert!(written.starts_with(SAMPLE));
        assert!(written.ends_with(
            "[submodule \"libs/gamma\"]\n\
\tpath = libs/gamma\n\
\turl = https://example.com/g.git\n\
\tbranch = dev\n\
\tsparse-checkout = /* !/*/\n"
        ));
    }

    #[test]
    fn test_create_on_managed_path_fails() {
        let (_dir, mut store) = store_from(SAMPLE);
        let record = SubmoduleRecord::new("other-name", "libs/alpha", "u");
        let err = store.create_record(&record).unwrap_err();
        assert!(err.to_string().contains("already managed"));
    }

    #[test]
    fn test_create_into_empty_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".gitmodules");
        let mut store = ManifestStore::load_or_default(&path).unwrap();
        let record = SubmoduleRecord::new("a", "a", "https://example.com/a.git");
        store.create_record(&record).unwrap();
        store.save().unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "[submodule \"a\"]\n\tpath = a\n\turl = https://example.com/a.git\n"
        );
    }

    #[test]
    fn test_comments_and_blank_lines_survive_round_trip() {
        let contents = "# managed by git-partial-submodule\n\n\
[submodule \"a\"]\n\
\tpath = a\n\
\turl = u\n\
; trailing comment\n";
        let (dir, mut store) = store_from(contents);
        let mut record = store.record_for_path("a").unwrap();
        record.sparse_patterns = Some(vec!["/*".to_owned()]);
        store.update_record(&record).unwrap();
        store.save().unwrap();

        let written = fs::read_to_string(dir.path().join(".gitmodules")).unwrap();
        assert!(written.starts_with("# managed by git-partial-submodule\n\n"));
        assert!(written.contains("; trailing comment\n"));
        assert!(written.contains("\tsparse-checkout = /*\n"));
    }

    #[test]
    fn test_modified_flag() {
        let (_dir, mut store) = store_from(SAMPLE);
        assert!(!store.is_modified());
        let record = store.record_for_path("libs/beta").unwrap();
        store.update_record(&record).unwrap();
        assert!(store.is_modified());
        store.save().unwrap();
        assert!(!store.is_modified());
    }
}
