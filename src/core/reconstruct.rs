//! Filepath: src/core/reconstruct.rs
//! Logical-line recovery for one file section.
//!
//! Every source line was written as a numbered record, so numbers anchor
//! the reconstruction. Unnumbered text is either a continuation of the
//! previous logical line (wrap or re-flow) or channel debris:
//! - Continuations merge into the previous line, with a confidence level
//!   that depends on the evidence (indentation vs. syntax vs. nothing)
//! - Unnumbered blanks survive only while the numbering leaves room for them
//! - Numbering gaps and repeats are reported, never repaired
//!
//! Reconstruction never fails; every decision that is not certain leaves a
//! `MergeEvent` behind.

use serde::{Deserialize, Serialize};

use crate::{
    core::markers,
    infra::utils::TextUtils,
};

/// Trailing characters that mark a line as syntactically unfinished
const CONTINUATION_OPERATORS: [char; 9] = ['\\', '+', '-', '*', '/', '=', '&', '|', ','];

/// How a continuation is glued onto the previous line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy
{
    /// Separator chosen from the previous line's syntax
    #[default]
    Heuristic,

    /// Strip the placeholder indent and concatenate; exact on lossless channels
    Verbatim,
}

/// What to do with unnumbered text that has no continuation evidence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguousPolicy
{
    #[default]
    Merge,
    Standalone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconstructOptions
{
    pub join_policy: JoinPolicy,
    pub ambiguous_policy: AmbiguousPolicy,

    /// Extra indentation (vs. the previous raw line) that counts as a wrap
    pub indent_threshold: usize,

    /// Width of the blank placeholder in front of continuation rows
    pub placeholder_width: usize,
}

impl Default for ReconstructOptions
{
    fn default() -> Self
    {
        Self {
            join_policy: JoinPolicy::Heuristic,
            ambiguous_policy: AmbiguousPolicy::Merge,
            indent_threshold: 10,
            placeholder_width: markers::PLACEHOLDER_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineOrigin
{
    Numbered,
    Blank,
    Unnumbered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogicalLine
{
    pub index: usize,
    pub text: String,
    pub origin: LineOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeKind
{
    OperatorContinuation,
    OpenQuote,
    PlainContinuation,
    Standalone,
    SequenceGap,
    SequenceRepeat,
    DroppedBlank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence
{
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeEvent
{
    pub line_index: usize,
    pub kind: MergeKind,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconstruction
{
    pub lines: Vec<LogicalLine>,
    pub events: Vec<MergeEvent>,
}

impl Reconstruction
{
    pub fn text(&self) -> String
    {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn low_confidence(&self) -> usize
    {
        self.events
            .iter()
            .filter(|e| e.confidence == Confidence::Low)
            .count()
    }
}

pub struct LineReconstructor
{
    options: ReconstructOptions,
}

/// Working state for one section
#[derive(Default)]
struct Pass
{
    out: Reconstruction,
    last_number: Option<usize>,
    pending_blanks: usize,
    prev_indent: usize,
}

impl Pass
{
    fn event(
        &mut self,
        line_index: usize,
        kind: MergeKind,
        confidence: Confidence,
    )
    {
        self.out
            .events
            .push(MergeEvent { line_index, kind, confidence });
    }

    fn next_index(&self) -> usize
    {
        self.out
            .lines
            .last()
            .map(|l| l.index + 1)
            .unwrap_or(1)
    }

    fn drop_pending_blanks(&mut self)
    {
        let at = self.next_index();
        for _ in 0..self.pending_blanks
        {
            tracing::debug!(line = at, "dropped page-break blank");
            self.event(at, MergeKind::DroppedBlank, Confidence::Low);
        }
        self.pending_blanks = 0;
    }
}

impl LineReconstructor
{
    pub fn new(options: ReconstructOptions) -> Self
    {
        Self { options }
    }

    pub fn reconstruct<S: AsRef<str>>(
        &self,
        raw_lines: &[S],
    ) -> Reconstruction
    {
        let mut pass = Pass::default();

        for raw in raw_lines
        {
            let raw = raw.as_ref();

            if let Some(number) = markers::match_numbered_record(raw)
            {
                self.numbered(&mut pass, number, record_content(raw));
                pass.prev_indent = TextUtils::leading_width(raw);
            }
            else if raw
                .trim()
                .is_empty()
            {
                pass.pending_blanks += 1;
            }
            else
            {
                self.unnumbered(&mut pass, raw);
                pass.prev_indent = TextUtils::leading_width(raw);
            }
        }

        pass.drop_pending_blanks();

        // Whitespace-only records stay raw until no continuation can follow
        for line in &mut pass
            .out
            .lines
        {
            if line
                .text
                .trim()
                .is_empty()
            {
                line.text
                    .clear();
            }
        }

        pass.out
    }

    fn numbered(
        &self,
        pass: &mut Pass,
        number: usize,
        content: &str,
    )
    {
        let base = pass
            .last_number
            .unwrap_or(0);

        // Blanks fill the numbering gap, any surplus is debris
        let room = number.saturating_sub(base + 1);
        let kept = pass
            .pending_blanks
            .min(room);
        for i in 0..kept
        {
            pass.out
                .lines
                .push(LogicalLine {
                    index: base + 1 + i,
                    text: String::new(),
                    origin: LineOrigin::Blank,
                });
        }
        pass.pending_blanks -= kept;
        pass.drop_pending_blanks();

        let expected = base + 1 + kept;
        if number > expected
        {
            tracing::debug!(expected, found = number, "line numbering gap");
            pass.event(number, MergeKind::SequenceGap, Confidence::Low);
        }
        else if number <= base
        {
            tracing::debug!(previous = base, found = number, "line numbering repeat");
            pass.event(number, MergeKind::SequenceRepeat, Confidence::Low);
        }

        pass.out
            .lines
            .push(LogicalLine {
                index: number,
                text: content.to_string(),
                origin: LineOrigin::Numbered,
            });
        pass.last_number = Some(number);
    }

    fn unnumbered(
        &self,
        pass: &mut Pass,
        raw: &str,
    )
    {
        // A real blank line would carry a number, so blanks between a
        // line and its continuation are debris
        pass.drop_pending_blanks();

        let indent = TextUtils::leading_width(raw);
        let strong = indent >= self.options.placeholder_width
            || indent
                > pass
                    .prev_indent
                    .saturating_add(self.options.indent_threshold);

        let Some((index, prev_text)) = pass
            .out
            .lines
            .last()
            .filter(|l| {
                !l.text
                    .trim()
                    .is_empty()
                    || (strong && l.origin == LineOrigin::Numbered)
            })
            .map(|l| (l.index, l.text.clone()))
        else
        {
            self.standalone(pass, raw);
            return;
        };

        let kind = merge_kind(&prev_text);
        let structural = kind != MergeKind::PlainContinuation;

        if !strong && !structural
        {
            match self
                .options
                .ambiguous_policy
            {
                AmbiguousPolicy::Merge =>
                {
                    tracing::debug!(line = index, "ambiguous continuation merged");
                }
                AmbiguousPolicy::Standalone =>
                {
                    self.standalone(pass, raw);
                    return;
                }
            }
        }

        let confidence = if strong { Confidence::High } else { Confidence::Low };
        let merged = match self
            .options
            .join_policy
        {
            JoinPolicy::Heuristic => join_heuristic(&prev_text, raw, kind),
            JoinPolicy::Verbatim =>
            {
                let strip = indent.min(self.options.placeholder_width);
                let tail: String = raw
                    .chars()
                    .skip(strip)
                    .collect();
                format!("{prev_text}{tail}")
            }
        };

        if let Some(last) = pass
            .out
            .lines
            .last_mut()
        {
            last.text = merged;
        }
        pass.event(index, kind, confidence);
    }

    fn standalone(
        &self,
        pass: &mut Pass,
        raw: &str,
    )
    {
        let index = pass.next_index();
        tracing::debug!(line = index, "unnumbered line kept standalone");
        pass.out
            .lines
            .push(LogicalLine {
                index,
                text: raw
                    .trim_start()
                    .to_string(),
                origin: LineOrigin::Unnumbered,
            });
        pass.event(index, MergeKind::Standalone, Confidence::Low);
    }
}

/// Text after the first `|`, minus one separator space
fn record_content(raw: &str) -> &str
{
    let after = raw
        .split_once('|')
        .map(|(_, rest)| rest)
        .unwrap_or("");
    after
        .strip_prefix(' ')
        .unwrap_or(after)
}

/// Evidence the previous line gives for gluing on more text
fn merge_kind(prev: &str) -> MergeKind
{
    if TextUtils::last_non_space(prev).is_some_and(|c| CONTINUATION_OPERATORS.contains(&c))
    {
        MergeKind::OperatorContinuation
    }
    else if TextUtils::has_unbalanced_quotes(prev)
    {
        MergeKind::OpenQuote
    }
    else
    {
        MergeKind::PlainContinuation
    }
}

fn join_heuristic(
    prev: &str,
    continuation: &str,
    kind: MergeKind,
) -> String
{
    let cont = continuation.trim_start();
    match kind
    {
        MergeKind::OperatorContinuation => format!("{} {}", prev.trim_end(), cont),
        MergeKind::OpenQuote => format!("{prev}{cont}"),
        _ => format!("{prev} {cont}"),
    }
}
