//! Single-pass section scanner.
//!
//! Splits extracted document text into per-file sections. A section opens
//! at a `File:` header and closes at the next header or at one of the
//! fixed title/exclusion markers. Marker checks run before anything else,
//! and a numbered record never matches a marker because markers are
//! anchored at the start of the (trimmed) line.

use crate::core::markers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState
{
    ScanningForFile,
    InFileBody,
    Done,
}

/// Raw lines belonging to one `File:` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection
{
    pub header_path: String,
    pub raw_lines: Vec<String>,
}

impl FileSection
{
    /// True when no raw line is a numbered record
    pub fn has_records(&self) -> bool
    {
        self.raw_lines
            .iter()
            .any(|l| markers::match_numbered_record(l).is_some())
    }
}

pub struct SectionScanner
{
    state: ScanState,
    current: Option<FileSection>,
    finished: Vec<FileSection>,
}

impl Default for SectionScanner
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl SectionScanner
{
    pub fn new() -> Self
    {
        Self {
            state: ScanState::ScanningForFile,
            current: None,
            finished: Vec::new(),
        }
    }

    pub fn state(&self) -> ScanState
    {
        self.state
    }

    /// Feed one raw line
    pub fn feed(
        &mut self,
        line: &str,
    )
    {
        match self.state
        {
            ScanState::Done => (),
            ScanState::ScanningForFile =>
            {
                if let Some(path) = markers::match_file_header(line)
                {
                    self.open(path);
                }
            }
            ScanState::InFileBody =>
            {
                if let Some(path) = markers::match_file_header(line)
                {
                    self.close();
                    self.open(path);
                }
                else if markers::is_section_end(line)
                {
                    self.close();
                    self.state = ScanState::ScanningForFile;
                }
                else if let Some(section) = self.current.as_mut()
                {
                    section
                        .raw_lines
                        .push(line.to_string());
                }
            }
        }
    }

    /// Close any open section and return everything found, in order
    pub fn finish(mut self) -> Vec<FileSection>
    {
        self.close();
        self.state = ScanState::Done;
        self.finished
    }

    /// One-shot scan of a whole text
    pub fn scan(text: &str) -> Vec<FileSection>
    {
        let mut scanner = Self::new();
        for line in text.lines()
        {
            scanner.feed(line);
        }
        scanner.finish()
    }

    fn open(
        &mut self,
        path: &str,
    )
    {
        tracing::debug!(path, "section opened");
        self.current = Some(FileSection {
            header_path: path.to_string(),
            raw_lines: Vec::new(),
        });
        self.state = ScanState::InFileBody;
    }

    fn close(&mut self)
    {
        if let Some(section) = self
            .current
            .take()
        {
            self.finished
                .push(section);
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_sections_are_delimited_by_headers()
    {
        let text = "DOCUMENTAZIONE PROGETTO PYTHON\nProgetto: demo\n\nFile: a.py\n   1| x = 1\n\nFile: b.py\n   1| y = 2\n";
        let sections = SectionScanner::scan(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].header_path, "a.py");
        assert_eq!(sections[0].raw_lines, vec!["   1| x = 1", ""]);
        assert_eq!(sections[1].header_path, "b.py");
        assert_eq!(sections[1].raw_lines, vec!["   1| y = 2"]);
    }

    #[test]
    fn test_markers_close_without_being_content()
    {
        let text = "File: a.py\n   1| a\nCartelle escluse:\n - build\nFile: b.py\n   1| b";
        let sections = SectionScanner::scan(text);

        assert_eq!(sections[0].raw_lines, vec!["   1| a"]);
        assert_eq!(sections[1].raw_lines, vec!["   1| b"]);
    }

    #[test]
    fn test_numbered_file_line_stays_in_body()
    {
        let text = "File: notes.txt\n   1| intro\n   2| File: trap.txt\n   3| Progetto: fake\n   4| end";
        let sections = SectionScanner::scan(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(
            sections[0]
                .raw_lines
                .len(),
            4
        );
        assert_eq!(sections[0].raw_lines[1], "   2| File: trap.txt");
    }

    #[test]
    fn test_incremental_feed_tracks_state()
    {
        let mut scanner = SectionScanner::new();
        assert_eq!(scanner.state(), ScanState::ScanningForFile);

        scanner.feed("noise before any header");
        assert_eq!(scanner.state(), ScanState::ScanningForFile);

        scanner.feed("  File:  src/x.rs  ");
        assert_eq!(scanner.state(), ScanState::InFileBody);

        scanner.feed("   1| fn x() {}");
        scanner.feed("Estensioni escluse:");
        assert_eq!(scanner.state(), ScanState::ScanningForFile);

        let sections = scanner.finish();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].header_path, "src/x.rs");
        assert!(sections[0].has_records());
    }

    #[test]
    fn test_empty_section_is_still_reported()
    {
        let sections = SectionScanner::scan("File: empty.txt\nFile: next.txt\n   1| x");
        assert_eq!(sections.len(), 2);
        assert!(!sections[0].has_records());
    }
}
