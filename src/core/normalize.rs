//! Filepath: src/core/normalize.rs
//! Final cleanup of reconstructed file content.
//! Indentation is kept exactly as recovered; this pass only removes
//! extraction debris. Applying it twice changes nothing.

use crate::core::markers::TRUNCATION_MARKER;

const CONTROL_DEBRIS: [char; 3] = ['\r', '\0', '\x0c'];

#[derive(Debug, Clone, Copy, Default)]
pub struct IndentationNormalizer
{
    /// Right-trim every line
    pub trim_trailing: bool,
}

impl IndentationNormalizer
{
    pub fn new(trim_trailing: bool) -> Self
    {
        Self { trim_trailing }
    }

    pub fn normalize(
        &self,
        content: &str,
    ) -> String
    {
        content
            .split('\n')
            .map(|line| self.normalize_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn normalize_line(
        &self,
        line: &str,
    ) -> String
    {
        let mut out: String = line
            .chars()
            .filter(|c| !CONTROL_DEBRIS.contains(c))
            .collect();

        // Removing one marker can splice together another
        while out.contains(TRUNCATION_MARKER)
        {
            out = out.replace(TRUNCATION_MARKER, "");
        }

        if self.trim_trailing
        {
            out.truncate(
                out.trim_end()
                    .len(),
            );
        }

        out
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_debris_is_removed_indentation_kept()
    {
        let n = IndentationNormalizer::default();
        assert_eq!(
            n.normalize("    x = 1\r\n\tcall()... [troncato]\n\x0c\0end  "),
            "    x = 1\n\tcall()\nend  "
        );
    }

    #[test]
    fn test_trim_trailing_is_optional()
    {
        let n = IndentationNormalizer::new(true);
        assert_eq!(n.normalize("a  \n  b\t\n"), "a\n  b\n");
    }

    #[test]
    fn test_nested_markers_and_idempotence()
    {
        let n = IndentationNormalizer::new(true);
        let nested = "x... [tronc... [troncato]ato] y \r";
        let once = n.normalize(nested);
        assert_eq!(once, "x y");
        assert_eq!(n.normalize(&once), once);
    }
}
