//! Reconstruction report, as text for people and JSON for scripts.

use std::{
    collections::BTreeMap,
    fmt::Write as _,
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::{
    core::reconstruct::{Confidence, MergeEvent, MergeKind},
    error::Issue,
};

pub const REPORT_FILE_NAME: &str = "RICOSTRUZIONE_REPORT.txt";

/// One reconstructed file as it ended up on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: String,
    pub extension: Option<String>,
    pub lines: usize,
    pub chars: usize,
    pub written: bool,
    pub placeholder: bool,
    pub low_confidence: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindCount {
    pub kind: Option<MergeKind>,
    pub high: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecodeReport {
    pub generated_at: DateTime<Local>,
    pub destination: PathBuf,
    pub sections_found: usize,
    pub empty_sections: Vec<String>,
    pub duplicate_headers: Vec<String>,
    pub files: Vec<FileOutcome>,
    pub errors: Vec<Issue>,
    pub confidence: Vec<KindCount>,
    pub dry_run: bool,
    pub cancelled: bool,
}

impl DecodeReport {
    pub fn new(destination: &Path) -> Self {
        Self {
            generated_at: Local::now(),
            destination: destination.to_path_buf(),
            sections_found: 0,
            empty_sections: Vec::new(),
            duplicate_headers: Vec::new(),
            files: Vec::new(),
            errors: Vec::new(),
            confidence: Vec::new(),
            dry_run: false,
            cancelled: false,
        }
    }

    pub fn files_written(&self) -> usize {
        self.files.iter().filter(|f| f.written).count()
    }

    pub fn encoding_errors(&self) -> usize {
        self.errors.iter().filter(|e| e.is_encoding()).count()
    }

    /// Written files over files found, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.files.is_empty() {
            return 0.0;
        }
        self.files_written() as f64 / self.files.len() as f64 * 100.0
    }

    /// File count per extension; `None` for names without one
    pub fn extension_counts(&self) -> BTreeMap<Option<String>, usize> {
        let mut counts = BTreeMap::new();
        for file in &self.files {
            *counts.entry(file.extension.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Fold events into per-kind totals
    pub fn tally<'a>(&mut self, events: impl IntoIterator<Item = &'a MergeEvent>) {
        let mut by_kind: BTreeMap<MergeKind, KindCount> = self
            .confidence
            .drain(..)
            .filter_map(|c| c.kind.map(|k| (k, c)))
            .collect();

        for event in events {
            let entry = by_kind
                .entry(event.kind)
                .or_insert_with(|| KindCount { kind: Some(event.kind), ..Default::default() });
            match event.confidence {
                Confidence::High => entry.high += 1,
                Confidence::Low => entry.low += 1,
            }
        }

        self.confidence = by_kind.into_values().collect();
    }

    pub fn low_confidence(&self) -> usize {
        self.confidence.iter().map(|c| c.low).sum()
    }
}

pub struct ReportWriter;

impl ReportWriter {
    pub fn render_text(report: &DecodeReport) -> String {
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = Self::write_text(&mut out, report);
        out
    }

    fn write_text(out: &mut String, report: &DecodeReport) -> std::fmt::Result {
        writeln!(out, "RICOSTRUZIONE PROGETTO DA PDF")?;
        writeln!(out, "===============================")?;
        writeln!(out)?;
        writeln!(
            out,
            "Data ricostruzione: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(out, "File creati con successo: {}", report.files_written())?;
        writeln!(out, "Errori riscontrati: {}", report.errors.len())?;
        writeln!(out)?;

        writeln!(out, "DETTAGLIO FILE RICOSTRUITI:")?;
        writeln!(out, "---------------------------")?;
        let mut files: Vec<&FileOutcome> = report.files.iter().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        for file in files {
            writeln!(
                out,
                "- {} ({}, {} linee, {} caratteri){}",
                file.path,
                file.extension.as_deref().unwrap_or(""),
                file.lines,
                file.chars,
                if file.placeholder { " [segnaposto]" } else { "" }
            )?;
        }

        if !report.errors.is_empty() {
            writeln!(out)?;
            writeln!(out, "ERRORI RISCONTRATI:")?;
            writeln!(out, "-------------------")?;
            for error in &report.errors {
                writeln!(out, "- {error}")?;
            }
        }

        if !report.empty_sections.is_empty() || !report.duplicate_headers.is_empty() {
            writeln!(out)?;
            writeln!(out, "AVVISI:")?;
            writeln!(out, "-------")?;
            for path in &report.empty_sections {
                writeln!(out, "- sezione vuota: {path}")?;
            }
            for path in &report.duplicate_headers {
                writeln!(out, "- intestazione duplicata: {path}")?;
            }
        }

        writeln!(out)?;
        writeln!(out, "STATISTICHE:")?;
        writeln!(out, "-----------")?;
        writeln!(out, "Sezioni trovate: {}", report.sections_found)?;
        writeln!(out, "File totali nel PDF: {}", report.files.len())?;
        writeln!(out, "File creati: {}", report.files_written())?;
        writeln!(out, "Success rate: {:.1}%", report.success_rate())?;
        writeln!(out)?;

        writeln!(out, "ESTENSIONI FILE RICOSTRUITE:")?;
        writeln!(out, "---------------------------")?;
        for (ext, count) in report.extension_counts() {
            writeln!(out, "- {}: {} file", ext.as_deref().unwrap_or("Nessuna"), count)?;
        }
        writeln!(out)?;

        writeln!(out, "AFFIDABILITA RICOSTRUZIONE:")?;
        writeln!(out, "---------------------------")?;
        if report.confidence.is_empty() {
            writeln!(out, "Nessuna unione o anomalia rilevata")?;
        }
        for count in &report.confidence {
            let kind = count
                .kind
                .and_then(|k| serde_json::to_value(k).ok())
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            writeln!(out, "- {kind}: {} alta, {} bassa", count.high, count.low)?;
        }

        if report.cancelled {
            writeln!(out)?;
            writeln!(out, "Ricostruzione interrotta: risultato parziale")?;
        }

        Ok(())
    }

    pub fn render_json(report: &DecodeReport) -> serde_json::Result<String> {
        serde_json::to_string_pretty(report)
    }

    /// Write the text report into `dir`
    pub fn write(report: &DecodeReport, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(REPORT_FILE_NAME);
        std::fs::write(&path, Self::render_text(report))?;
        Ok(path)
    }
}
