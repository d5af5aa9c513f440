//! Filepath: src/infra/exclude.rs
//! Inclusion/exclusion predicate over project-relative paths.
//! - Directory names: exact match against any path segment
//! - File names: exact match against the base name
//! - Extensions: lower-cased, compared with a leading dot (".pyc")
//! - Wildcard patterns: glob match against the base name
//!
//! Pure and infallible once built; only pattern compilation can fail.

use std::{
    collections::BTreeSet,
    path::{Component, Path},
};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Rule sets for one run. Replace wholesale between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionRules
{
    /// Directory names pruned anywhere in the tree
    #[serde(rename = "dirs")]
    pub dir_names: BTreeSet<String>,

    /// Exact base names
    #[serde(rename = "files")]
    pub file_names: BTreeSet<String>,

    /// Extensions, e.g. ".pyc"
    pub extensions: BTreeSet<String>,

    /// Glob patterns on the base name, e.g. "*tmp"
    #[serde(rename = "patterns")]
    pub wildcard_patterns: BTreeSet<String>,
}

impl Default for ExclusionRules
{
    fn default() -> Self
    {
        fn set(items: &[&str]) -> BTreeSet<String>
        {
            items
                .iter()
                .map(|s| s.to_string())
                .collect()
        }

        Self {
            dir_names: set(&[
                "venv",
                ".venv",
                "__pycache__",
                ".git",
                ".vscode",
                ".idea",
                "node_modules",
                "build",
                "dist",
                "models2",
                ".continue",
                ".vs",
                "target",
                "out",
                "bin",
                "obj",
                "packages",
                ".gradle",
                ".settings",
                ".metadata",
                ".recommenders",
                "gradle",
                "jvm",
            ]),
            file_names: set(&[
                "config.py",
                "settings.py",
                "local_settings.py",
                ".env",
                ".gitignore",
                ".gitattributes",
                ".env.local",
                ".env.production",
                "package-lock.json",
                "yarn.lock",
                "thumbs.db",
                ".DS_Store",
                "desktop.ini",
            ]),
            extensions: set(&[
                ".pyc",
                ".pyo",
                ".pyd",
                ".so",
                ".dll",
                ".exe",
                ".safetensors",
                ".bin",
                ".jpg",
                ".jpeg",
                ".png",
                ".gif",
                ".bmp",
                ".tiff",
                ".webp",
                ".ico",
                ".svg",
                ".pdf",
                ".doc",
                ".docx",
                ".xls",
                ".xlsx",
                ".ppt",
                ".pptx",
                ".zip",
                ".rar",
                ".7z",
                ".tar",
                ".gz",
                ".mp4",
                ".avi",
                ".mkv",
                ".mov",
                ".mp3",
                ".wav",
                ".flac",
                ".ogg",
                ".db",
                ".sqlite",
                ".sqlite3",
                ".mdb",
                ".accdb",
                ".pdb",
                ".idb",
                ".class",
                ".jar",
                ".war",
                ".ear",
                ".metadata",
            ]),
            wildcard_patterns: set(&["*tmp", "*temp"]),
        }
    }
}

impl ExclusionRules
{
    /// No exclusions at all
    pub fn empty() -> Self
    {
        Self {
            dir_names: BTreeSet::new(),
            file_names: BTreeSet::new(),
            extensions: BTreeSet::new(),
            wildcard_patterns: BTreeSet::new(),
        }
    }

    /// Canonical form: extensions lower-cased with a leading dot, and
    /// file-name entries containing glob metacharacters moved to patterns.
    pub fn normalized(mut self) -> Self
    {
        let (globs, names): (BTreeSet<String>, BTreeSet<String>) = self
            .file_names
            .into_iter()
            .partition(|n| n.contains(['*', '?', '[']));
        self.file_names = names;
        self.wildcard_patterns
            .extend(globs);

        self.extensions = self
            .extensions
            .into_iter()
            .filter(|e| !e.trim().is_empty())
            .map(|e| normalize_extension(&e))
            .collect();

        self
    }

    /// Add CLI-provided entries on top of the current sets
    pub fn extend(
        &mut self,
        dirs: &[String],
        files: &[String],
        extensions: &[String],
        patterns: &[String],
    )
    {
        self.dir_names
            .extend(dirs.iter().cloned());
        self.file_names
            .extend(files.iter().cloned());
        self.extensions
            .extend(extensions.iter().cloned());
        self.wildcard_patterns
            .extend(patterns.iter().cloned());
    }
}

fn normalize_extension(ext: &str) -> String
{
    let lower = ext
        .trim()
        .to_lowercase();
    if lower.starts_with('.') { lower } else { format!(".{lower}") }
}

/// Sorted listing used by the document's exclusions section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExclusionSummary
{
    pub dirs: Vec<String>,
    pub extensions: Vec<String>,
    pub files: Vec<String>,
}

/// Compiled predicate; cheap to clone into walker callbacks
#[derive(Debug, Clone)]
pub struct ExclusionFilter
{
    rules: ExclusionRules,
    patterns: GlobSet,
}

impl ExclusionFilter
{
    pub fn new(rules: ExclusionRules) -> Result<Self, CodecError>
    {
        let rules = rules.normalized();
        let mut builder = GlobSetBuilder::new();

        for pattern in &rules.wildcard_patterns
        {
            let glob = Glob::new(pattern).map_err(|source| CodecError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }

        let patterns = builder
            .build()
            .map_err(|source| CodecError::InvalidPattern {
                pattern: rules
                    .wildcard_patterns
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
                source,
            })?;

        Ok(Self { rules, patterns })
    }

    pub fn rules(&self) -> &ExclusionRules
    {
        &self.rules
    }

    /// Decide exclusion for one file. Never fails: names that are not valid
    /// UTF-8 are compared lossily, so odd paths stay included.
    pub fn should_exclude(
        &self,
        absolute_path: &Path,
        relative_path: &Path,
    ) -> bool
    {
        // Any segment naming an excluded directory
        let in_excluded_dir = relative_path
            .components()
            .filter_map(|c| match c
            {
                Component::Normal(s) => Some(s.to_string_lossy()),
                _ => None,
            })
            .any(|segment| {
                self.rules
                    .dir_names
                    .contains(segment.as_ref())
            });
        if in_excluded_dir
        {
            return true;
        }

        let base = absolute_path
            .file_name()
            .or_else(|| relative_path.file_name());

        if let Some(base) = base
        {
            let name = base.to_string_lossy();
            if self
                .rules
                .file_names
                .contains(name.as_ref())
            {
                return true;
            }
            if self
                .patterns
                .is_match(name.as_ref())
            {
                return true;
            }
        }

        if let Some(ext) = absolute_path
            .extension()
            .or_else(|| relative_path.extension())
        {
            let key = format!(
                ".{}",
                ext.to_string_lossy()
                    .to_lowercase()
            );
            if self
                .rules
                .extensions
                .contains(&key)
            {
                return true;
            }
        }

        false
    }

    /// Early pruning for directories met during traversal
    pub fn should_prune_dir(
        &self,
        name: &str,
    ) -> bool
    {
        self.rules
            .dir_names
            .contains(name)
    }

    pub fn summary(&self) -> ExclusionSummary
    {
        let mut files: Vec<String> = self
            .rules
            .file_names
            .iter()
            .chain(
                self.rules
                    .wildcard_patterns
                    .iter(),
            )
            .cloned()
            .collect();
        files.sort();

        ExclusionSummary {
            dirs: self
                .rules
                .dir_names
                .iter()
                .cloned()
                .collect(),
            extensions: self
                .rules
                .extensions
                .iter()
                .cloned()
                .collect(),
            files,
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::path::PathBuf;

    use super::*;

    fn check(
        filter: &ExclusionFilter,
        rel: &str,
    ) -> bool
    {
        let abs = PathBuf::from("/project").join(rel);
        filter.should_exclude(&abs, Path::new(rel))
    }

    #[test]
    fn test_default_rules_exclude_common_noise()
    {
        let filter = ExclusionFilter::new(ExclusionRules::default()).unwrap();

        assert!(check(&filter, "node_modules/pkg/index.js"));
        assert!(check(&filter, "src/__pycache__/mod.cpython-311.pyc"));
        assert!(check(&filter, ".env"));
        assert!(check(&filter, "assets/Logo.PNG"));
        assert!(check(&filter, "scratch.tmp"));
        assert!(check(&filter, "notes_temp"));

        assert!(!check(&filter, "src/main.py"));
        assert!(!check(&filter, "README.md"));
        assert!(!check(&filter, "Makefile"));
    }

    #[test]
    fn test_dir_names_match_whole_segments_only()
    {
        let mut rules = ExclusionRules::empty();
        rules
            .dir_names
            .insert("build".to_string());
        let filter = ExclusionFilter::new(rules).unwrap();

        assert!(check(&filter, "build/out.txt"));
        assert!(check(&filter, "a/b/build/c.rs"));
        assert!(!check(&filter, "builder/c.rs"));
        assert!(!check(&filter, "src/rebuild.rs"));
        assert!(filter.should_prune_dir("build"));
        assert!(!filter.should_prune_dir("Build"));
    }

    #[test]
    fn test_extensions_are_case_normalized()
    {
        let mut rules = ExclusionRules::empty();
        rules
            .extensions
            .insert("LOG".to_string());
        let filter = ExclusionFilter::new(rules).unwrap();

        assert!(check(&filter, "server.log"));
        assert!(check(&filter, "server.Log"));
        assert!(!check(&filter, "log.txt"));
        assert_eq!(filter.summary().extensions, vec![".log".to_string()]);
    }

    #[test]
    fn test_globbed_file_names_become_patterns()
    {
        let mut rules = ExclusionRules::empty();
        rules.extend(&[], &["*.bak".to_string(), "exact.txt".to_string()], &[], &[]);
        let filter = ExclusionFilter::new(rules).unwrap();

        assert!(check(&filter, "deep/dir/file.bak"));
        assert!(check(&filter, "exact.txt"));
        assert!(!check(&filter, "inexact.txt"));
        assert!(
            filter
                .rules()
                .wildcard_patterns
                .contains("*.bak")
        );
    }

    #[test]
    fn test_invalid_pattern_is_reported()
    {
        let mut rules = ExclusionRules::empty();
        rules
            .wildcard_patterns
            .insert("[unclosed".to_string());
        let err = ExclusionFilter::new(rules).unwrap_err();
        assert!(matches!(err, CodecError::InvalidPattern { .. }));
    }

    #[test]
    fn test_summary_lists_patterns_with_files_sorted()
    {
        let filter = ExclusionFilter::new(ExclusionRules::default()).unwrap();
        let summary = filter.summary();
        assert!(
            summary
                .files
                .contains(&"*tmp".to_string())
        );
        assert!(
            summary
                .files
                .windows(2)
                .all(|w| w[0] <= w[1])
        );
        assert!(
            summary
                .dirs
                .contains(&"node_modules".to_string())
        );
    }
}
