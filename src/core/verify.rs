//! Round-trip check: encode a tree, push it through a channel, decode in
//! memory and diff every file against its source.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use similar::TextDiff;

use crate::{
    cli::{AppContext, VerifyArgs},
    core::{
        decode::{DecodeOptions, Decoder},
        encode::{EncodeOptions, Encoder, SourceText, resolve},
        reconstruct::{Confidence, ReconstructOptions},
    },
    error::{CodecError, Issue},
    infra::{
        channel::{FormFeedChannel, LossyChannel, PagedTextChannel},
        config::load_config,
        exclude::ExclusionRules,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Identical,
    Differs,
    Missing,
    /// Source was undecodable; the sentinel round-tripped instead
    Placeholder,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileCheck {
    pub path: String,
    pub status: CheckStatus,
    pub low_confidence: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub files: Vec<FileCheck>,
    /// Decoded paths with no source counterpart
    pub unexpected: Vec<String>,
    pub issues: Vec<Issue>,
    pub pages: usize,
}

impl VerifyReport {
    pub fn count(&self, status: CheckStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    pub fn is_clean(&self) -> bool {
        self.unexpected.is_empty()
            && self
                .files
                .iter()
                .all(|f| matches!(f.status, CheckStatus::Identical | CheckStatus::Placeholder))
    }
}

/// What the decoder can be expected to give back for `source`
fn expected_form(source: &str, trim_trailing: bool) -> String {
    source
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else if trim_trailing {
                line.trim_end()
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn verify<C: PagedTextChannel>(
    root: &Path,
    rules: ExclusionRules,
    encode_options: EncodeOptions,
    channel: &C,
    decode_options: DecodeOptions,
) -> Result<VerifyReport, CodecError> {
    let encoder = Encoder::new(rules, encode_options)?;
    let document = encoder.encode(root)?;

    let rendered = channel.render(&document);
    let pages = channel.extract(&rendered);
    let decoded = Decoder::new(decode_options).decode(&pages)?;

    let mut report = VerifyReport {
        issues: document.summary.issues.clone(),
        pages: pages.len(),
        ..Default::default()
    };

    let (sources, _) = encoder.source_files(root)?;
    for source in &sources {
        let path = source.document_path();
        let text = encoder.source_text(source);
        let expected = expected_form(text.as_str(), decode_options.trim_trailing);

        let Some(file) = decoded.files.get(&path) else {
            tracing::warn!(path = %path, "missing after decode");
            report.files.push(FileCheck {
                path,
                status: CheckStatus::Missing,
                low_confidence: 0,
                diff: None,
            });
            continue;
        };

        let low_confidence =
            file.events.iter().filter(|e| e.confidence == Confidence::Low).count();

        let (status, diff) = if file.content == expected {
            let status = match text {
                SourceText::Placeholder(_) => CheckStatus::Placeholder,
                _ => CheckStatus::Identical,
            };
            (status, None)
        } else {
            let diff = TextDiff::from_lines(&expected, &file.content)
                .unified_diff()
                .context_radius(3)
                .header(&format!("a/{path}"), &format!("b/{path}"))
                .to_string();
            (CheckStatus::Differs, Some(diff))
        };

        tracing::debug!(path = %path, ?status, low_confidence, "verified");
        report.files.push(FileCheck { path, status, low_confidence, diff });
    }

    report.unexpected = decoded
        .files
        .keys()
        .filter(|p| !report.files.iter().any(|f| &f.path == *p))
        .cloned()
        .collect();

    Ok(report)
}

pub fn run(args: VerifyArgs, ctx: &AppContext) -> Result<()> {
    let cfg = load_config()?;
    let decode_cfg = &cfg.decode;

    let decode_options = DecodeOptions {
        reconstruct: ReconstructOptions {
            join_policy: args.join_policy.unwrap_or(decode_cfg.join_policy),
            ambiguous_policy: args.ambiguous.unwrap_or(decode_cfg.ambiguous_policy),
            indent_threshold: decode_cfg.indent_threshold,
            ..Default::default()
        },
        trim_trailing: decode_cfg.trim_trailing,
        write_report: false,
        dry_run: true,
    };
    let (rules, encode_options) = resolve(&args.layout, &args.exclusions, cfg);

    let channel = LossyChannel::new(FormFeedChannel)
        .with_reflow(args.reflow)
        .with_collapse_spaces(args.collapse_spaces)
        .with_strip_indent(args.strip_indent)
        .with_page_break_blanks(args.page_break_blanks);

    let report = verify(&args.root, rules, encode_options, &channel, decode_options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if ctx.quiet {
        return Ok(());
    }

    for file in &report.files {
        match file.status {
            CheckStatus::Identical => println!("{} {}", "=".green(), file.path),
            CheckStatus::Placeholder => println!("{} {} (placeholder)", "~".yellow(), file.path),
            CheckStatus::Missing => println!("{} {} (missing)", "x".red(), file.path),
            CheckStatus::Differs => {
                println!("{} {}", "!".red(), file.path);
                if let Some(diff) = &file.diff {
                    print!("{diff}");
                }
            }
        }
    }
    for path in &report.unexpected {
        println!("{} {path} (unexpected)", "?".yellow());
    }

    let summary = format!(
        "{} identical, {} differing, {} missing, {} placeholder over {} pages",
        report.count(CheckStatus::Identical),
        report.count(CheckStatus::Differs),
        report.count(CheckStatus::Missing),
        report.count(CheckStatus::Placeholder),
        report.pages,
    );
    if report.is_clean() {
        println!("{} {summary}", "✓".green());
    } else {
        println!("{} {summary}", "!".yellow());
    }

    Ok(())
}
