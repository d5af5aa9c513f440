//! Paged text channels between the encoder and the decoder.
//!
//! A channel lays a `Document` out as text and later hands back one raw
//! text blob per page. The decoder never assumes the round trip through a
//! channel is lossless.

use serde::Serialize;

use crate::core::encode::Document;

/// Raw text of one extracted page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageBlock {
    pub page_index: usize,
    pub raw_text: String,
}

impl PageBlock {
    pub fn new(page_index: usize, raw_text: impl Into<String>) -> Self {
        Self { page_index, raw_text: raw_text.into() }
    }
}

pub trait PagedTextChannel {
    /// Lay out the document as one text stream
    fn render(&self, document: &Document) -> String;

    /// Recover per-page text from a rendered stream
    fn extract(&self, rendered: &str) -> Vec<PageBlock>;
}

const FORM_FEED: char = '\x0c';

/// Pages separated by form feeds, the layout `pdftotext` produces
#[derive(Debug, Clone, Copy, Default)]
pub struct FormFeedChannel;

impl PagedTextChannel for FormFeedChannel {
    fn render(&self, document: &Document) -> String {
        let mut out = String::with_capacity(document.line_count() * 48);
        for page in &document.pages {
            out.push_str(&page.lines.join("\n"));
            out.push('\n');
            out.push(FORM_FEED);
        }
        out
    }

    fn extract(&self, rendered: &str) -> Vec<PageBlock> {
        let mut pieces: Vec<&str> = rendered.split(FORM_FEED).collect();

        // Text after the final form feed is not a page unless it has content
        if pieces.last().is_some_and(|tail| tail.trim().is_empty()) {
            pieces.pop();
        }

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let text = text.strip_suffix('\n').unwrap_or(text);
                let text = text.strip_suffix('\r').unwrap_or(text);
                PageBlock::new(i, text)
            })
            .collect()
    }
}

/// Simulated extraction damage layered over another channel
#[derive(Debug, Clone, Default)]
pub struct LossyChannel<C = FormFeedChannel> {
    inner: C,
    /// Re-flow lines longer than this many characters at a word boundary
    pub reflow: Option<usize>,
    /// Collapse every run of spaces to one
    pub collapse_spaces: bool,
    /// Drop leading whitespace of every line
    pub strip_indent: bool,
    /// Insert a stray blank line at the top of every page after the first
    pub page_break_blanks: bool,
}

impl<C: PagedTextChannel> LossyChannel<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            reflow: None,
            collapse_spaces: false,
            strip_indent: false,
            page_break_blanks: false,
        }
    }

    pub fn with_reflow(mut self, columns: Option<usize>) -> Self {
        self.reflow = columns.filter(|c| *c > 0);
        self
    }

    pub fn with_collapse_spaces(mut self, on: bool) -> Self {
        self.collapse_spaces = on;
        self
    }

    pub fn with_strip_indent(mut self, on: bool) -> Self {
        self.strip_indent = on;
        self
    }

    pub fn with_page_break_blanks(mut self, on: bool) -> Self {
        self.page_break_blanks = on;
        self
    }

    fn damage(&self, page_index: usize, text: &str) -> String {
        let mut lines: Vec<String> = Vec::new();

        if self.page_break_blanks && page_index > 0 {
            lines.push(String::new());
        }

        for line in text.split('\n') {
            let pieces = match self.reflow {
                Some(cols) => reflow_line(line, cols),
                None => vec![line.to_string()],
            };
            for mut piece in pieces {
                if self.collapse_spaces {
                    piece = collapse_spaces(&piece);
                }
                if self.strip_indent {
                    piece = piece.trim_start().to_string();
                }
                lines.push(piece);
            }
        }

        lines.join("\n")
    }
}

impl<C: PagedTextChannel> PagedTextChannel for LossyChannel<C> {
    fn render(&self, document: &Document) -> String {
        self.inner.render(document)
    }

    fn extract(&self, rendered: &str) -> Vec<PageBlock> {
        self.inner
            .extract(rendered)
            .into_iter()
            .map(|page| {
                let raw_text = self.damage(page.page_index, &page.raw_text);
                PageBlock { raw_text, ..page }
            })
            .collect()
    }
}

/// Split at the last space at or before `cols`; the space itself is lost.
/// Hard-split at `cols` when there is no space to break at.
fn reflow_line(line: &str, cols: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest: Vec<char> = line.chars().collect();

    while rest.len() > cols {
        let leading = rest.iter().take_while(|c| c.is_whitespace()).count();
        let split = rest[..=cols]
            .iter()
            .rposition(|c| *c == ' ')
            .filter(|&at| at > leading);

        match split {
            Some(at) => {
                out.push(rest[..at].iter().collect());
                rest = rest[at + 1..].to_vec();
            }
            None => {
                out.push(rest[..cols].iter().collect());
                rest = rest[cols..].to_vec();
            }
        }
    }

    out.push(rest.into_iter().collect());
    out
}

fn collapse_spaces(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut prev_space = false;
    for c in line.chars() {
        if c == ' ' {
            if !prev_space {
                out.push(c);
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encode::{EncodeSummary, Page};

    fn doc(pages: &[&[&str]]) -> Document {
        Document {
            pages: pages
                .iter()
                .map(|lines| Page { lines: lines.iter().map(|l| l.to_string()).collect() })
                .collect(),
            summary: EncodeSummary::default(),
        }
    }

    #[test]
    fn form_feed_round_trip_keeps_page_text() {
        let document = doc(&[&["a", "", "b"], &["File: x", "   1| y"]]);
        let channel = FormFeedChannel;
        let rendered = channel.render(&document);
        assert_eq!(rendered, "a\n\nb\n\x0cFile: x\n   1| y\n\x0c");

        let pages = channel.extract(&rendered);
        assert_eq!(pages, vec![PageBlock::new(0, "a\n\nb"), PageBlock::new(1, "File: x\n   1| y")]);
    }

    #[test]
    fn form_feed_accepts_unterminated_text() {
        let pages = FormFeedChannel.extract("only page\nno feed");
        assert_eq!(pages, vec![PageBlock::new(0, "only page\nno feed")]);
        assert!(FormFeedChannel.extract("").is_empty());
    }

    #[test]
    fn reflow_breaks_at_word_boundary() {
        assert_eq!(reflow_line("alpha beta gamma", 10), vec!["alpha beta", "gamma"]);
        assert_eq!(reflow_line("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(reflow_line("short", 10), vec!["short"]);
    }

    #[test]
    fn lossy_channel_applies_damage_per_page() {
        let document = doc(&[&["   1| a   b"], &["      tail"]]);
        let channel = LossyChannel::new(FormFeedChannel)
            .with_collapse_spaces(true)
            .with_strip_indent(true)
            .with_page_break_blanks(true);

        let pages = channel.extract(&channel.render(&document));
        assert_eq!(pages[0].raw_text, "1| a b");
        assert_eq!(pages[1].raw_text, "\ntail");
    }
}
