//! Filepath: src/infra/utils.rs
//! Utility helpers organized by small, focused structs.
//! All functions are associated fns to keep call sites
//! ergonomic, testable, and discoverable.

use std::path::{Component, Path, PathBuf};

/// Path conversions between the file system and the document
pub struct PathUtils;

impl PathUtils
{
    /// Forward-slash form used in `File:` headers
    pub fn to_document_path(rel: &Path) -> String
    {
        rel.components()
            .filter_map(|c| match c
            {
                Component::Normal(s) => Some(s.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Lower-cased extension with its dot, or None for bare names
    pub fn extension_key(path: &str) -> Option<String>
    {
        let name = path
            .rsplit('/')
            .next()
            .unwrap_or(path);

        Path::new(name)
            .extension()
            .map(|e| {
                format!(
                    ".{}",
                    e.to_string_lossy()
                        .to_lowercase()
                )
            })
    }

    /// Join a document path under `root`, refusing anything that could
    /// land outside it (absolute paths, drive prefixes, `..`).
    pub fn safe_join(
        root: &Path,
        document_path: &str,
    ) -> Result<PathBuf, String>
    {
        let normalized = document_path.replace('\\', "/");
        let rel = Path::new(&normalized);

        if normalized.starts_with('/') || rel.is_absolute()
        {
            return Err(format!("absolute path refused: {document_path}"));
        }

        let mut out = root.to_path_buf();
        let mut pushed = false;

        for component in rel.components()
        {
            match component
            {
                Component::Normal(part) =>
                {
                    out.push(part);
                    pushed = true;
                }
                Component::CurDir =>
                {}
                Component::ParentDir =>
                {
                    return Err(format!("parent traversal refused: {document_path}"));
                }
                Component::RootDir | Component::Prefix(_) =>
                {
                    return Err(format!("absolute path refused: {document_path}"));
                }
            }
        }

        if !pushed
        {
            return Err(format!("empty path refused: {document_path:?}"));
        }

        Ok(out)
    }
}

/// Small text measurements used by line reconstruction
pub struct TextUtils;

impl TextUtils
{
    /// Count of leading whitespace characters
    pub fn leading_width(s: &str) -> usize
    {
        s.chars()
            .take_while(|c| c.is_whitespace())
            .count()
    }

    /// Last character that is not whitespace
    pub fn last_non_space(s: &str) -> Option<char>
    {
        s.chars()
            .rev()
            .find(|c| !c.is_whitespace())
    }

    /// Odd number of double or single quotes
    pub fn has_unbalanced_quotes(s: &str) -> bool
    {
        let count = |q: char| {
            s.chars()
                .filter(|c| *c == q)
                .count()
        };

        count('"') % 2 == 1 || count('\'') % 2 == 1
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_document_paths_use_forward_slashes()
    {
        let rel: PathBuf = ["src", "core", "lib.rs"]
            .iter()
            .collect();
        assert_eq!(PathUtils::to_document_path(&rel), "src/core/lib.rs");
    }

    #[test]
    fn test_extension_key()
    {
        assert_eq!(PathUtils::extension_key("src/Main.RS"), Some(".rs".to_string()));
        assert_eq!(PathUtils::extension_key("Makefile"), None);
        assert_eq!(PathUtils::extension_key("dir.d/README"), None);
        assert_eq!(PathUtils::extension_key(".bashrc"), None);
    }

    #[test]
    fn test_safe_join_rejects_escapes()
    {
        let root = Path::new("/out");

        assert_eq!(PathUtils::safe_join(root, "a/b.txt").unwrap(), Path::new("/out/a/b.txt"));
        assert_eq!(PathUtils::safe_join(root, "./a.txt").unwrap(), Path::new("/out/a.txt"));
        assert!(PathUtils::safe_join(root, "../evil.txt").is_err());
        assert!(PathUtils::safe_join(root, "a/../../evil.txt").is_err());
        assert!(PathUtils::safe_join(root, "/etc/passwd").is_err());
        assert!(PathUtils::safe_join(root, "\\windows\\x").is_err());
        assert!(PathUtils::safe_join(root, ".").is_err());
    }

    #[test]
    fn test_text_measurements()
    {
        assert_eq!(TextUtils::leading_width("      tail"), 6);
        assert_eq!(TextUtils::leading_width("\t x"), 2);
        assert_eq!(TextUtils::last_non_space("a = b +  "), Some('+'));
        assert_eq!(TextUtils::last_non_space("   "), None);
        assert!(TextUtils::has_unbalanced_quotes("greeting = \"hello "));
        assert!(TextUtils::has_unbalanced_quotes("it's"));
        assert!(!TextUtils::has_unbalanced_quotes("x = \"ok\""));
    }
}
