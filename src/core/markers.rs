//! Document format constants shared by the encoder and the decoder.
//!
//! These strings are the interchange contract with previously produced
//! documents: the `File:` header, the `NNNN| ` record prefix and the
//! section-header markers must not change.

use std::sync::LazyLock;

use regex::Regex;

pub const TITLE: &str = "DOCUMENTAZIONE PROGETTO PYTHON";
pub const PROJECT_PREFIX: &str = "Progetto:";
pub const FOLDER_PREFIX: &str = "Cartella:";

pub const EXCLUDED_DIRS_HEADER: &str = "Cartelle escluse:";
pub const EXCLUDED_EXTENSIONS_HEADER: &str = "Estensioni escluse:";
pub const EXCLUDED_FILES_HEADER: &str = "File esclusi:";

pub const NO_EXCLUDED_DIRS: &str = "Nessuna cartella esclusa";
pub const NO_EXCLUDED_EXTENSIONS: &str = "Nessuna estensione esclusa";
pub const NO_EXCLUDED_FILES: &str = "Nessun file escluso";

pub const FILE_PREFIX: &str = "File:";

/// Digits reserved for the right-aligned line number
pub const NUMBER_WIDTH: usize = 4;

/// Width of `NNNN| `; continuation rows are indented by exactly this much
pub const PLACEHOLDER_WIDTH: usize = NUMBER_WIDTH + 2;

/// Explicit truncation tag some extractors leave behind
pub const TRUNCATION_MARKER: &str = "... [troncato]";

const UNREADABLE_PREFIX: &str = "Impossibile leggere il file ";
const UNREADABLE_SUFFIX: &str = " - formato binario o codifica sconosciuta";
const READ_ERROR_PREFIX: &str = "Errore nella lettura del file: ";

static FILE_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*File:\s*(.+)$").expect("file header pattern"));

static NUMBERED_RECORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*\|\s*(.*)$").expect("numbered record pattern"));

static SECTION_END_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^DOCUMENTAZIONE PROGETTO PYTHON$",
        r"^Cartelle escluse:$",
        r"^File esclusi:$",
        r"^Estensioni escluse:$",
        r"^Progetto:\s*.+$",
        r"^Cartella:\s*.+$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("section marker pattern"))
    .collect()
});

/// `   7| content`
pub fn numbered_record(number: usize, content: &str) -> String {
    format!("{number:>width$}| {content}", width = NUMBER_WIDTH)
}

/// Continuation row: blank placeholder instead of a line number
pub fn continuation_record(content: &str) -> String {
    format!("{:width$}{content}", "", width = PLACEHOLDER_WIDTH)
}

pub fn file_header(path: &str) -> String {
    format!("{FILE_PREFIX} {path}")
}

/// Sentinel content for files no supported encoding could decode
pub fn unreadable_placeholder(path: &str) -> String {
    format!("{UNREADABLE_PREFIX}{path}{UNREADABLE_SUFFIX}")
}

pub fn read_error_text(message: &str) -> String {
    format!("{READ_ERROR_PREFIX}{message}")
}

/// True when `content` is exactly one sentinel line
pub fn is_unreadable_placeholder(content: &str) -> bool {
    let line = content.trim_end_matches('\n');
    !line.contains('\n') && line.starts_with(UNREADABLE_PREFIX) && line.ends_with(UNREADABLE_SUFFIX)
}

/// Captured path of a `File:` header line
pub fn match_file_header(line: &str) -> Option<&str> {
    FILE_HEADER_RE
        .captures(line.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|p| !p.is_empty())
}

/// True for the fixed title / exclusion / metadata markers (not `File:`)
pub fn is_section_end(line: &str) -> bool {
    let stripped = line.trim();
    SECTION_END_RE
        .iter()
        .any(|re| re.is_match(stripped))
}

/// Parsed line number of a numbered record
pub fn match_numbered_record(line: &str) -> Option<usize> {
    NUMBERED_RECORD_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
