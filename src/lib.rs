//! **syncronet** - Serialize a source tree into a paginated text document and rebuild it
//!
//! The encoder writes every file as numbered, fixed-width records; the decoder survives
//! lossy page extraction (re-flowed lines, page-break debris, lost indentation) and
//! reports how confident each reconstruction is.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Fatal errors and accumulated per-file issues
pub mod error;

/// Codec pipeline - encoder, section scanner, line reconstruction, reports
pub mod core {
    /// Document markers and record layout shared by both directions
    pub mod markers;

    /// Progress side-channel and cooperative cancellation
    pub mod progress;
    pub use progress::{CancelToken, ProgressSink};

    /// Directory tree to paginated document
    pub mod encode;
    pub use encode::{Document, EncodeOptions, EncodeSummary, Encoder, Page, run as encode_run};

    /// `File:` section delimiting state machine
    pub mod scan;
    pub use scan::{FileSection, ScanState, SectionScanner};

    /// Logical-line recovery with confidence events
    pub mod reconstruct;
    pub use reconstruct::{
        AmbiguousPolicy, Confidence, JoinPolicy, LineReconstructor, LogicalLine, MergeEvent,
        MergeKind, ReconstructOptions,
    };

    /// Idempotent cleanup of reconstructed content
    pub mod normalize;
    pub use normalize::IndentationNormalizer;

    /// Paginated document back to a directory tree
    pub mod decode;
    pub use decode::{DecodeOptions, Decoded, Decoder, ReconstructedFile, run as decode_run};

    /// Reconstruction report (text + JSON)
    pub mod report;
    pub use report::{DecodeReport, FileOutcome, REPORT_FILE_NAME, ReportWriter};

    /// Encode -> channel -> decode round-trip checks
    pub mod verify;
    pub use verify::{CheckStatus, VerifyReport, run as verify_run};
}

/// Infrastructure - Configuration, I/O, traversal and text handling
pub mod infra {
    /// Layered configuration (file + SYNCRONET_* env) and `init`
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Memory-mapped reads for large files (>1MB threshold)
    pub mod io;
    pub use io::{FileBytes, read_bytes_smart};

    /// Directory/file/extension/glob exclusion predicate
    pub mod exclude;
    pub use exclude::{ExclusionFilter, ExclusionRules};

    /// Deterministic file enumeration on the `ignore` walker
    pub mod walk;
    pub use walk::FileWalker;

    /// Ordered-encoding decode and renderer-safe character reduction
    pub mod text;
    pub use text::{Sanitizer, TextDecoder};

    /// Paged text channels (form-feed pages, simulated lossiness)
    pub mod channel;
    pub use channel::{FormFeedChannel, LossyChannel, PageBlock, PagedTextChannel};

    /// Utility functions and helpers for common operations
    pub mod utils;
}

// Strategic re-exports for the CLI and library consumers
pub use cli::{AppContext, Cli, Commands};
pub use crate::core::{
    decode::decode, decode::decode_to_dir, decode_run, encode::encode, encode_run, verify::verify,
    verify_run,
};
pub use error::{CodecError, Issue};
pub use infra::{Config, ExclusionRules, FileWalker, load_config};
