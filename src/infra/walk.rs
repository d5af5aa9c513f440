//! Filepath: src/infra/walk.rs
//! File enumerator for the encoder.
//! - Name-sorted per directory, so traversal order is deterministic
//! - Excluded directories are pruned before descent
//! - `.gitignore` rules apply only when asked for
//! - Symlinks to files are listed; broken links come back with `exists == false`
//! - Traversal errors are collected, never fatal
//!
//! Backed by ripgrep's `ignore` crate.

use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};

use crate::{error::Issue, infra::exclude::ExclusionFilter};

/// Ordered `(absolute path, exists)` pairs plus traversal issues
#[derive(Debug, Default)]
pub struct WalkOutcome
{
    pub entries: Vec<(PathBuf, bool)>,
    pub issues: Vec<Issue>,
}

/// Walker configured with the run's exclusion filter
pub struct FileWalker
{
    /// Compiled exclusion predicate
    filter: ExclusionFilter,

    /// Include hidden (dot) files; default true
    include_hidden: bool,

    /// Honour .gitignore / .ignore files; default false
    gitignore: bool,

    /// Maximum recursion depth; default None (unbounded)
    max_depth: Option<usize>,
}

impl FileWalker
{
    pub fn new(filter: ExclusionFilter) -> Self
    {
        Self {
            filter,
            include_hidden: true,
            gitignore: false,
            max_depth: None,
        }
    }

    /// When `include_hidden == true`, dotfiles are listed.
    pub fn with_include_hidden(
        mut self,
        include_hidden: bool,
    ) -> Self
    {
        self.include_hidden = include_hidden;
        self
    }

    pub fn with_gitignore(
        mut self,
        gitignore: bool,
    ) -> Self
    {
        self.gitignore = gitignore;
        self
    }

    pub fn with_max_depth(
        mut self,
        depth: Option<usize>,
    ) -> Self
    {
        self.max_depth = depth;
        self
    }

    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // WalkBuilder::hidden(true) skips dotfiles
        b.hidden(!self.include_hidden);

        b.ignore(self.gitignore);
        b.git_ignore(self.gitignore);
        b.git_global(self.gitignore);
        b.git_exclude(self.gitignore);
        b.parents(self.gitignore);
        b.require_git(false);

        b.follow_links(false);
        b.max_depth(self.max_depth);
        b.sort_by_file_name(|a, b| a.cmp(b));

        // Early prune of excluded directory names; never the root itself
        let filter = self
            .filter
            .clone();
        b.filter_entry(move |ent: &DirEntry| {
            if ent.depth() == 0
            {
                return true;
            }

            let is_dir = ent
                .file_type()
                .is_some_and(|ft| ft.is_dir());

            !(is_dir
                && filter.should_prune_dir(
                    ent.file_name()
                        .to_string_lossy()
                        .as_ref(),
                ))
        });

        b
    }

    /// Traverse `root` and return included files in traversal order.
    pub fn walk_files<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> WalkOutcome
    {
        let root_path = root.as_ref();
        let mut outcome = WalkOutcome::default();

        for result in self
            .build_walk(root_path)
            .build()
        {
            let entry = match result
            {
                Ok(entry) => entry,
                Err(err) =>
                {
                    let path = error_path(&err);
                    tracing::warn!(?path, "skipping unreadable entry: {err}");
                    outcome
                        .issues
                        .push(Issue::Enumeration { path, message: err.to_string() });
                    continue;
                }
            };

            let Some(file_type) = entry.file_type()
            else
            {
                continue;
            };

            let exists = if file_type.is_file()
            {
                true
            }
            else if file_type.is_symlink()
            {
                match std::fs::metadata(entry.path())
                {
                    Ok(meta) if meta.is_file() => true,
                    Ok(_) => continue,
                    Err(_) => false,
                }
            }
            else
            {
                continue;
            };

            let abs = entry.into_path();
            let rel = abs
                .strip_prefix(root_path)
                .unwrap_or(&abs);

            if self
                .filter
                .should_exclude(&abs, rel)
            {
                tracing::debug!(path = %rel.display(), "excluded");
                continue;
            }

            if !exists
            {
                outcome
                    .issues
                    .push(Issue::Enumeration {
                        path: Some(abs.clone()),
                        message: "broken symbolic link".to_string(),
                    });
            }

            outcome
                .entries
                .push((abs, exists));
        }

        outcome
    }
}

/// Best-effort path extraction from a nested walk error
fn error_path(err: &ignore::Error) -> Option<PathBuf>
{
    match err
    {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } =>
        {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.clone()),
        _ => None,
    }
}
