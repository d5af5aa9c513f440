//! Directory tree to paginated document.
//!
//! Layout: a title page (project name, folder, exclusion lists), then one
//! section per file starting on a fresh page. Every source line becomes a
//! numbered record; lines wider than the wrap width spill into
//! continuation rows indented by the record placeholder.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::{
    cli::{AppContext, EncodeArgs, ExclusionArgs, LayoutArgs},
    core::{
        markers,
        progress::{CancelToken, ProgressSink},
    },
    error::{CodecError, Issue},
    infra::{
        channel::{FormFeedChannel, PagedTextChannel},
        config::{Config, load_config},
        exclude::{ExclusionFilter, ExclusionRules},
        io::read_bytes_smart,
        text::{Sanitizer, TextDecoder},
        utils::PathUtils,
        walk::FileWalker,
    },
};

/// Extra characters a continuation row holds beyond `wrap_width - 5`
const CONTINUATION_SLACK: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodeOptions {
    pub wrap_width: usize,
    pub lines_per_page: usize,
    pub encodings: Vec<String>,
    pub follow_gitignore: bool,
    pub include_hidden: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            wrap_width: 100,
            lines_per_page: 66,
            encodings: vec!["utf-8".to_string(), "windows-1252".to_string()],
            follow_gitignore: false,
            include_hidden: true,
        }
    }
}

impl EncodeOptions {
    /// Characters per continuation row
    pub fn segment_width(&self) -> usize {
        (self.wrap_width.saturating_sub(markers::NUMBER_WIDTH + 1) + CONTINUATION_SLACK).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
}

impl SourceFile {
    pub fn document_path(&self) -> String {
        Sanitizer::clean(&PathUtils::to_document_path(&self.relative_path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLine {
    pub line_number: usize,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Page {
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EncodeSummary {
    /// Document paths in section order
    pub files: Vec<String>,
    pub files_encoded: usize,
    pub placeholders: usize,
    pub issues: Vec<Issue>,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    pub pages: Vec<Page>,
    pub summary: EncodeSummary,
}

impl Document {
    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| p.lines.iter().map(String::as_str))
    }
}

/// Sanitized text of one source file, as the document will carry it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceText {
    Text(String),
    /// No configured encoding could decode the bytes
    Placeholder(String),
    /// The file could not be read
    ReadError(String),
}

impl SourceText {
    pub fn as_str(&self) -> &str {
        match self {
            SourceText::Text(s) | SourceText::Placeholder(s) | SourceText::ReadError(s) => s,
        }
    }
}

pub struct Encoder {
    filter: ExclusionFilter,
    decoder: TextDecoder,
    options: EncodeOptions,
}

impl Encoder {
    pub fn new(rules: ExclusionRules, options: EncodeOptions) -> Result<Self, CodecError> {
        Ok(Self {
            filter: ExclusionFilter::new(rules)?,
            decoder: TextDecoder::from_labels(&options.encodings)?,
            options,
        })
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    pub fn filter(&self) -> &ExclusionFilter {
        &self.filter
    }

    pub fn encode(&self, root: &Path) -> Result<Document, CodecError> {
        self.encode_with(root, &(), &CancelToken::new())
    }

    /// Included files under `root`, in document order
    pub fn source_files(&self, root: &Path) -> Result<(Vec<SourceFile>, Vec<Issue>), CodecError> {
        check_root(root)?;

        let outcome = FileWalker::new(self.filter.clone())
            .with_include_hidden(self.options.include_hidden)
            .with_gitignore(self.options.follow_gitignore)
            .walk_files(root);

        let files = outcome
            .entries
            .into_iter()
            .filter(|(_, exists)| *exists)
            .map(|(absolute_path, _)| {
                let relative_path =
                    absolute_path.strip_prefix(root).unwrap_or(&absolute_path).to_path_buf();
                SourceFile { relative_path, absolute_path }
            })
            .collect();

        Ok((files, outcome.issues))
    }

    /// Decode and sanitize one file; never fails
    pub fn source_text(&self, file: &SourceFile) -> SourceText {
        let bytes = match read_bytes_smart(&file.absolute_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                return SourceText::ReadError(Sanitizer::clean(&markers::read_error_text(
                    &err.to_string(),
                )));
            }
        };

        match self.decoder.decode(bytes.as_ref()) {
            Some(text) => SourceText::Text(
                text.split('\n').map(Sanitizer::clean).collect::<Vec<_>>().join("\n"),
            ),
            None => SourceText::Placeholder(markers::unreadable_placeholder(&file.document_path())),
        }
    }

    /// Records for one source line: a numbered row plus continuation rows
    pub fn line_records(&self, line: &EncodedLine) -> Vec<String> {
        let chars: Vec<char> = line.content.chars().collect();
        let wrap = self.options.wrap_width.max(1);

        if chars.len() <= wrap {
            return vec![markers::numbered_record(line.line_number, &line.content)];
        }

        let head: String = chars[..wrap].iter().collect();
        let mut records = vec![markers::numbered_record(line.line_number, &head)];
        records.extend(
            chars[wrap..]
                .chunks(self.options.segment_width())
                .map(|seg| markers::continuation_record(&seg.iter().collect::<String>())),
        );
        records
    }

    pub fn encode_with(
        &self,
        root: &Path,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Document, CodecError> {
        let (files, walk_issues) = self.source_files(root)?;
        let canonical = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

        let mut pages = PageBuilder::new(self.options.lines_per_page);
        let mut summary = EncodeSummary { issues: walk_issues, ..Default::default() };

        self.title_section(&canonical, &mut pages);

        let total = files.len();
        for (i, file) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(encoded = i, total, "encode cancelled");
                summary.cancelled = true;
                break;
            }

            let doc_path = file.document_path();
            let text = self.source_text(file);
            match &text {
                SourceText::Text(_) => {}
                SourceText::Placeholder(_) => {
                    tracing::warn!(path = %doc_path, "no supported encoding, placeholder emitted");
                    summary.placeholders += 1;
                    summary.issues.push(Issue::Encoding { path: file.relative_path.clone() });
                }
                SourceText::ReadError(message) => {
                    tracing::warn!(path = %doc_path, "{message}");
                    summary.issues.push(Issue::Read {
                        path: file.relative_path.clone(),
                        message: message.clone(),
                    });
                }
            }

            pages.break_page();
            pages.push(markers::file_header(&doc_path));

            let mut line_count = 0;
            for (idx, content) in text.as_str().split('\n').enumerate() {
                let line = EncodedLine { line_number: idx + 1, content: content.to_string() };
                for record in self.line_records(&line) {
                    pages.push(record);
                }
                line_count += 1;
            }

            tracing::info!(path = %doc_path, lines = line_count, "encoded");
            summary.files.push(doc_path.clone());
            summary.files_encoded += 1;
            progress.item_done(i + 1, Some(total), &doc_path);
        }

        Ok(Document { pages: pages.finish(), summary })
    }

    fn title_section(&self, root: &Path, pages: &mut PageBuilder) {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        pages.push(markers::TITLE.to_string());
        pages.push(format!("{} {}", markers::PROJECT_PREFIX, Sanitizer::clean(&name)));
        pages.push(format!(
            "{} {}",
            markers::FOLDER_PREFIX,
            Sanitizer::clean(&root.display().to_string())
        ));
        pages.push(String::new());

        let summary = self.filter.summary();
        let lists = [
            (markers::EXCLUDED_DIRS_HEADER, &summary.dirs, markers::NO_EXCLUDED_DIRS),
            (markers::EXCLUDED_EXTENSIONS_HEADER, &summary.extensions, markers::NO_EXCLUDED_EXTENSIONS),
            (markers::EXCLUDED_FILES_HEADER, &summary.files, markers::NO_EXCLUDED_FILES),
        ];
        for (header, items, none) in lists {
            pages.push(header.to_string());
            if items.is_empty() {
                pages.push(none.to_string());
            }
            for item in items {
                pages.push(format!(" - {}", Sanitizer::clean(item)));
            }
        }
    }
}

/// One-shot encode with fresh rules and options
pub fn encode(
    root: &Path,
    rules: ExclusionRules,
    options: EncodeOptions,
) -> Result<Document, CodecError> {
    Encoder::new(rules, options)?.encode(root)
}

fn check_root(root: &Path) -> Result<(), CodecError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(CodecError::RootNotDirectory(root.to_path_buf())),
        Err(_) => Err(CodecError::RootNotFound(root.to_path_buf())),
    }
}

struct PageBuilder {
    limit: usize,
    pages: Vec<Page>,
    current: Vec<String>,
}

impl PageBuilder {
    fn new(limit: usize) -> Self {
        Self { limit: limit.max(1), pages: Vec::new(), current: Vec::new() }
    }

    fn push(&mut self, line: String) {
        if self.current.len() >= self.limit {
            self.break_page();
        }
        self.current.push(line);
    }

    /// Close the current page if it holds anything
    fn break_page(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(Page { lines: std::mem::take(&mut self.current) });
        }
    }

    fn finish(mut self) -> Vec<Page> {
        self.break_page();
        self.pages
    }
}

/// Build exclusion rules and options from config plus CLI flags
pub fn resolve(
    layout: &LayoutArgs,
    exclusions: &ExclusionArgs,
    cfg: Config,
) -> (ExclusionRules, EncodeOptions) {
    let mut rules =
        if exclusions.no_default_exclusions { ExclusionRules::empty() } else { cfg.exclude };
    rules.extend(
        &exclusions.exclude_dir,
        &exclusions.exclude_file,
        &exclusions.exclude_ext,
        &exclusions.exclude_pattern,
    );

    let options = EncodeOptions {
        wrap_width: layout.wrap_width.unwrap_or(cfg.encode.wrap_width),
        lines_per_page: layout.lines_per_page.unwrap_or(cfg.encode.lines_per_page),
        encodings: if layout.encoding.is_empty() {
            cfg.encode.encodings
        } else {
            layout.encoding.clone()
        },
        follow_gitignore: layout.gitignore || cfg.encode.gitignore,
        include_hidden: !layout.no_hidden && cfg.encode.include_hidden,
    };

    (rules, options)
}

pub fn run(args: EncodeArgs, ctx: &AppContext) -> Result<()> {
    let cfg = load_config()?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.encode.output_file));
    let (rules, options) = resolve(&args.layout, &args.exclusions, cfg);

    let encoder = Encoder::new(rules, options)?;

    let progress = if ctx.quiet {
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

    let document = encoder
        .encode_with(&args.root, &progress, &cancel)
        .with_context(|| format!("Failed to encode {}", args.root.display()))?;
    progress.finish_and_clear();

    let rendered = FormFeedChannel.render(&document);
    let summary = &document.summary;

    if ctx.dry_run {
        if !ctx.quiet {
            println!("{}", "DRY RUN: Would encode:".yellow());
            for path in &summary.files {
                println!("  {path}");
            }
            println!(
                "{}",
                format!(
                    "Would write {} pages ({} bytes) to {}",
                    document.pages.len(),
                    rendered.len(),
                    output.display()
                )
                .yellow()
            );
        }
        return Ok(());
    }

    std::fs::write(&output, &rendered)
        .with_context(|| format!("Failed to write to {}", output.display()))?;

    if !ctx.quiet {
        println!(
            "{} Encoded {} files into {} pages at {}",
            "✓".green(),
            summary.files_encoded,
            document.pages.len(),
            output.display()
        );
        if summary.placeholders > 0 {
            println!("{} {} file(s) replaced by a placeholder", "!".yellow(), summary.placeholders);
        }
        for issue in &summary.issues {
            println!("  {} {issue}", "-".yellow());
        }
        if summary.cancelled {
            println!("{}", "Interrupted: document is partial".red());
        }
    }

    Ok(())
}
