use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::reconstruct::{AmbiguousPolicy, JoinPolicy};

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
    pub verbose: bool,  // global --verbose
}

#[derive(Parser)]
#[command(name = "snet")]
#[command(
    about = "Serialize a source tree into a paginated text document and rebuild the tree from it"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Debug-level logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode a directory tree into a paginated document
    Encode(EncodeArgs),

    /// Rebuild a directory tree from an extracted document
    Decode(DecodeArgs),

    /// Encode, pass through a (lossy) channel, decode and diff
    Verify(VerifyArgs),

    /// Initialize configuration file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Page layout and source decoding
#[derive(Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    /// Characters per numbered record before wrapping
    #[arg(long)]
    pub wrap_width: Option<usize>,

    /// Rows per page
    #[arg(long)]
    pub lines_per_page: Option<usize>,

    /// Source encodings to try in order (repeatable)
    #[arg(long = "encoding", value_name = "LABEL")]
    pub encoding: Vec<String>,

    /// Honour .gitignore files
    #[arg(long)]
    pub gitignore: bool,

    /// Skip dotfiles and dot-directories
    #[arg(long)]
    pub no_hidden: bool,
}

/// Additions to (or replacement of) the exclusion lists
#[derive(Args, Debug, Clone, Default)]
pub struct ExclusionArgs {
    /// Directory name to exclude anywhere in the tree (repeatable)
    #[arg(long, value_name = "DIR")]
    pub exclude_dir: Vec<String>,

    /// File name to exclude; names with `*` are glob patterns (repeatable)
    #[arg(long, value_name = "FILE")]
    pub exclude_file: Vec<String>,

    /// Extension to exclude, with or without the dot (repeatable)
    #[arg(long, value_name = "EXT")]
    pub exclude_ext: Vec<String>,

    /// Glob on the base name to exclude (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude_pattern: Vec<String>,

    /// Start from empty lists instead of the built-in ones
    #[arg(long)]
    pub no_default_exclusions: bool,
}

#[derive(Parser)]
pub struct EncodeArgs {
    /// Project root to encode
    pub root: PathBuf,

    /// Output document (default from config: documentazione_progetto.txt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub layout: LayoutArgs,

    #[command(flatten)]
    pub exclusions: ExclusionArgs,
}

#[derive(Parser)]
pub struct DecodeArgs {
    /// Extracted document text (pages separated by form feeds)
    pub document: PathBuf,

    /// Destination directory for the rebuilt tree
    pub out_dir: PathBuf,

    /// How continuation rows are joined
    #[arg(long, value_enum)]
    pub join_policy: Option<JoinPolicy>,

    /// Unnumbered text without continuation evidence
    #[arg(long, value_enum)]
    pub ambiguous: Option<AmbiguousPolicy>,

    /// Indentation jump (columns) that marks a wrapped line
    #[arg(long)]
    pub indent_threshold: Option<usize>,

    /// Right-trim every reconstructed line
    #[arg(long)]
    pub trim_trailing: bool,

    /// Do not write RICOSTRUZIONE_REPORT.txt
    #[arg(long)]
    pub no_report: bool,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct VerifyArgs {
    /// Project root to check
    pub root: PathBuf,

    #[command(flatten)]
    pub layout: LayoutArgs,

    #[command(flatten)]
    pub exclusions: ExclusionArgs,

    /// Re-flow extracted lines longer than N characters
    #[arg(long, value_name = "N")]
    pub reflow: Option<usize>,

    /// Collapse runs of spaces in extracted text
    #[arg(long)]
    pub collapse_spaces: bool,

    /// Drop leading whitespace of extracted lines
    #[arg(long)]
    pub strip_indent: bool,

    /// Insert a blank line at every page break
    #[arg(long)]
    pub page_break_blanks: bool,

    /// How continuation rows are joined
    #[arg(long, value_enum)]
    pub join_policy: Option<JoinPolicy>,

    /// Unnumbered text without continuation evidence
    #[arg(long, value_enum)]
    pub ambiguous: Option<AmbiguousPolicy>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
