//! Paginated document back to a directory tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::{
    cli::{AppContext, DecodeArgs},
    core::{
        markers,
        normalize::IndentationNormalizer,
        progress::{CancelToken, ProgressSink},
        reconstruct::{Confidence, LineReconstructor, MergeEvent, ReconstructOptions},
        report::{DecodeReport, FileOutcome, REPORT_FILE_NAME, ReportWriter},
        scan::SectionScanner,
    },
    error::{CodecError, Issue},
    infra::{
        channel::{FormFeedChannel, PageBlock, PagedTextChannel},
        config::load_config,
        io::{read_document, write_with_parents},
        utils::PathUtils,
    },
};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DecodeOptions {
    pub reconstruct: ReconstructOptions,
    pub trim_trailing: bool,
    pub write_report: bool,
    pub dry_run: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            reconstruct: ReconstructOptions::default(),
            trim_trailing: false,
            write_report: true,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconstructedFile {
    pub relative_path: String,
    pub content: String,
    pub line_count: usize,
    pub events: Vec<MergeEvent>,
    /// Content is the unreadable-file sentinel
    pub placeholder: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Decoded {
    pub files: IndexMap<String, ReconstructedFile>,
    pub sections_found: usize,
    pub empty_sections: Vec<String>,
    pub duplicate_headers: Vec<String>,
    pub cancelled: bool,
}

impl Decoded {
    pub fn events(&self) -> impl Iterator<Item = &MergeEvent> {
        self.files.values().flat_map(|f| f.events.iter())
    }
}

pub struct Decoder {
    options: DecodeOptions,
    reconstructor: LineReconstructor,
    normalizer: IndentationNormalizer,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            reconstructor: LineReconstructor::new(options.reconstruct),
            normalizer: IndentationNormalizer::new(options.trim_trailing),
            options,
        }
    }

    pub fn decode(&self, pages: &[PageBlock]) -> Result<Decoded, CodecError> {
        self.decode_with(pages, &(), &CancelToken::new())
    }

    /// In-memory reconstruction; nothing touches the file system
    pub fn decode_with(
        &self,
        pages: &[PageBlock],
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Decoded, CodecError> {
        if pages.iter().all(|p| p.raw_text.is_empty()) {
            return Err(CodecError::EmptyDocument);
        }

        let text = pages.iter().map(|p| p.raw_text.as_str()).collect::<Vec<_>>().join("\n");
        let sections = SectionScanner::scan(&text);
        tracing::info!(sections = sections.len(), pages = pages.len(), "document scanned");

        let mut decoded = Decoded { sections_found: sections.len(), ..Default::default() };
        let total = sections.len();

        for (i, section) in sections.into_iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(decoded = i, total, "decode cancelled");
                decoded.cancelled = true;
                break;
            }

            let path = section.header_path.clone();

            if !section.has_records() {
                tracing::warn!(path = %path, "section has no line records, skipped");
                decoded.empty_sections.push(path);
                continue;
            }

            let rebuilt = self.reconstructor.reconstruct(&section.raw_lines);
            let content = self.normalizer.normalize(&rebuilt.text());
            let low = rebuilt.low_confidence();
            if low > 0 {
                tracing::debug!(path = %path, low, "low-confidence merges");
            }

            let file = ReconstructedFile {
                line_count: bytecount::count(content.as_bytes(), b'\n') + 1,
                placeholder: markers::is_unreadable_placeholder(&content),
                relative_path: path.clone(),
                content,
                events: rebuilt.events,
            };

            if decoded.files.insert(path.clone(), file).is_some() {
                tracing::warn!(path = %path, "duplicate header, keeping the last section");
                decoded.duplicate_headers.push(path.clone());
            }
            progress.item_done(i + 1, Some(total), &path);
        }

        Ok(decoded)
    }

    /// Reconstruct and write every file under `dest`
    pub fn decode_to_dir(
        &self,
        pages: &[PageBlock],
        dest: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<DecodeReport, CodecError> {
        let decoded = self.decode_with(pages, progress, cancel)?;

        let mut report = DecodeReport::new(dest);
        report.sections_found = decoded.sections_found;
        report.empty_sections = decoded.empty_sections.clone();
        report.duplicate_headers = decoded.duplicate_headers.clone();
        report.dry_run = self.options.dry_run;
        report.cancelled = decoded.cancelled;
        report.tally(decoded.events());

        for file in decoded.files.values() {
            if file.placeholder {
                report.errors.push(Issue::Encoding { path: PathBuf::from(&file.relative_path) });
            }

            let written = match self.write_file(dest, file) {
                Ok(()) => !self.options.dry_run,
                Err(message) => {
                    tracing::warn!(path = %file.relative_path, "{message}");
                    report.errors.push(Issue::Write {
                        path: PathBuf::from(&file.relative_path),
                        message,
                    });
                    false
                }
            };

            report.files.push(FileOutcome {
                path: file.relative_path.clone(),
                extension: PathUtils::extension_key(&file.relative_path),
                lines: file.line_count,
                chars: bytecount::num_chars(file.content.as_bytes()),
                written,
                placeholder: file.placeholder,
                low_confidence: file
                    .events
                    .iter()
                    .filter(|e| e.confidence == Confidence::Low)
                    .count(),
            });
        }

        if self.options.write_report && !self.options.dry_run {
            if let Err(err) = ReportWriter::write(&report, dest) {
                tracing::warn!("report not written: {err}");
                report.errors.push(Issue::Write {
                    path: dest.join(REPORT_FILE_NAME),
                    message: err.to_string(),
                });
            }
        }

        Ok(report)
    }

    fn write_file(&self, dest: &Path, file: &ReconstructedFile) -> Result<(), String> {
        let target = PathUtils::safe_join(dest, &file.relative_path)?;
        if self.options.dry_run {
            return Ok(());
        }
        write_with_parents(&target, &file.content).map_err(|e| e.to_string())?;
        tracing::info!(path = %file.relative_path, lines = file.line_count, "written");
        Ok(())
    }
}

/// One-shot in-memory decode
pub fn decode(pages: &[PageBlock], options: DecodeOptions) -> Result<Decoded, CodecError> {
    Decoder::new(options).decode(pages)
}

pub fn decode_to_dir(
    pages: &[PageBlock],
    dest: &Path,
    options: DecodeOptions,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<DecodeReport, CodecError> {
    Decoder::new(options).decode_to_dir(pages, dest, progress, cancel)
}

pub fn run(args: DecodeArgs, ctx: &AppContext) -> Result<()> {
    let cfg = load_config()?.decode;

    let options = DecodeOptions {
        reconstruct: ReconstructOptions {
            join_policy: args.join_policy.unwrap_or(cfg.join_policy),
            ambiguous_policy: args.ambiguous.unwrap_or(cfg.ambiguous_policy),
            indent_threshold: args.indent_threshold.unwrap_or(cfg.indent_threshold),
            ..Default::default()
        },
        trim_trailing: args.trim_trailing || cfg.trim_trailing,
        write_report: !args.no_report && cfg.write_report,
        dry_run: ctx.dry_run,
    };

    let text = read_document(&args.document)?;
    let pages = FormFeedChannel.extract(&text);

    let progress = if ctx.quiet || args.json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("progress template")?
                .progress_chars("#>-"),
        );
        pb
    };

    let cancel = CancelToken::new();
    if let Err(err) = cancel.install_ctrlc() {
        tracing::debug!("ctrl-c handler not installed: {err}");
    }

    if !ctx.dry_run {
        std::fs::create_dir_all(&args.out_dir)
            .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    }

    let report = Decoder::new(options)
        .decode_to_dir(&pages, &args.out_dir, &progress, &cancel)
        .with_context(|| format!("Failed to decode {}", args.document.display()))?;
    progress.finish_and_clear();

    if args.json {
        println!("{}", ReportWriter::render_json(&report)?);
        return Ok(());
    }

    if ctx.quiet {
        return Ok(());
    }

    if ctx.dry_run {
        println!("{}", "DRY RUN: Would write:".yellow());
        for file in &report.files {
            println!("  {} ({} lines)", file.path, file.lines);
        }
    } else {
        println!(
            "{} Rebuilt {} of {} files in {}",
            "✓".green(),
            report.files_written(),
            report.files.len(),
            args.out_dir.display()
        );
    }

    if report.low_confidence() > 0 {
        println!(
            "{} {} low-confidence decision(s); see {}",
            "!".yellow(),
            report.low_confidence(),
            REPORT_FILE_NAME
        );
    }
    for error in &report.errors {
        println!("  {} {error}", "-".red());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(text: &str) -> Vec<PageBlock> {
        FormFeedChannel.extract(text)
    }

    #[test]
    fn empty_documents_are_fatal() {
        let decoder = Decoder::new(DecodeOptions::default());
        assert!(matches!(decoder.decode(&[]), Err(CodecError::EmptyDocument)));
        assert!(matches!(
            decoder.decode(&[PageBlock::new(0, "")]),
            Err(CodecError::EmptyDocument)
        ));
    }

    #[test]
    fn progress_reports_only_finished_sections() {
        let seen = std::cell::RefCell::new(Vec::new());
        let sink = |done: usize, total: Option<usize>, label: &str| {
            seen.borrow_mut().push((done, total, label.to_string()));
        };

        let decoded = Decoder::new(DecodeOptions::default())
            .decode_with(
                &pages("File: a.txt\n   1| a\x0cFile: empty.txt\x0cFile: b.txt\n   1| b\x0c"),
                &sink,
                &CancelToken::new(),
            )
            .unwrap();

        assert_eq!(decoded.files.len(), 2);
        assert_eq!(
            seen.into_inner(),
            vec![(1, Some(3), "a.txt".to_string()), (3, Some(3), "b.txt".to_string())]
        );
    }

    #[test]
    fn duplicate_headers_keep_the_last_section() {
        let decoded = decode(
            &pages("File: a.txt\n   1| first\x0cFile: a.txt\n   1| second\x0c"),
            DecodeOptions::default(),
        )
        .unwrap();

        assert_eq!(decoded.sections_found, 2);
        assert_eq!(decoded.files.len(), 1);
        assert_eq!(decoded.files["a.txt"].content, "second");
        assert_eq!(decoded.duplicate_headers, vec!["a.txt"]);
    }

    #[test]
    fn sections_without_records_are_skipped() {
        let decoded =
            decode(&pages("File: ghost.txt\nFile: real.txt\n   1| x\n"), DecodeOptions::default())
                .unwrap();
        assert_eq!(decoded.empty_sections, vec!["ghost.txt"]);
        assert!(decoded.files.contains_key("real.txt"));
    }

    #[test]
    fn unsafe_paths_become_write_errors() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let report = decode_to_dir(
            &pages("File: ../escape.txt\n   1| x\nFile: ok.txt\n   1| y\n"),
            &out,
            DecodeOptions::default(),
            &(),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(report.files_written(), 1);
        assert!(matches!(report.errors[0], Issue::Write { .. }));
        assert!(!dir.path().join("escape.txt").exists());
        assert_eq!(std::fs::read_to_string(out.join("ok.txt")).unwrap(), "y");
        assert!(out.join(REPORT_FILE_NAME).exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let options = DecodeOptions { dry_run: true, ..Default::default() };
        let report = decode_to_dir(
            &pages("File: a/b.txt\n   1| y\n"),
            dir.path(),
            options,
            &(),
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files_written(), 0);
        assert!(!dir.path().join("a").exists());
        assert!(!dir.path().join(REPORT_FILE_NAME).exists());
    }

    #[test]
    fn placeholders_count_as_encoding_errors() {
        let sentinel = markers::unreadable_placeholder("blob.bin");
        let text = format!("File: blob.bin\n   1| {sentinel}\n");
        let dir = tempfile::tempdir().unwrap();
        let report =
            decode_to_dir(&pages(&text), dir.path(), DecodeOptions::default(), &(), &CancelToken::new())
                .unwrap();

        assert_eq!(report.encoding_errors(), 1);
        assert!(report.files[0].placeholder);
        assert!(report.files[0].written);
    }
}
