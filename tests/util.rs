//! Shared test utilities for integration tests
//!
//! Fixture trees and an in-memory encode -> channel -> decode helper
//! used across the round-trip and channel test files.

#![allow(dead_code)]

use assert_fs::prelude::*;
use syncronet::{
    core::{DecodeOptions, Decoded, EncodeOptions, decode::decode, encode::encode},
    infra::{ExclusionRules, PagedTextChannel},
};

/// Build a temporary tree from `(relative path, content)` pairs.
pub fn make_tree(files: &[(&str, &str)]) -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    for (path, text) in files
    {
        tmp.child(path)
            .write_str(text)
            .expect("write fixture file");
    }

    tmp
}

/// A small mixed project with nesting, blanks and an excluded cache.
pub fn make_project() -> assert_fs::TempDir
{
    make_tree(&[
        ("main.py", "import sys\n\n\ndef main():\n    return 0\n"),
        ("pkg/__init__.py", ""),
        ("pkg/util.py", "def add(a, b):\n    return a + b\n"),
        ("pkg/__pycache__/util.cpython-311.pyc", "\x00\x01cache"),
        ("notes.txt", "first\n\n  indented\nlast"),
        ("scratch.tmp", "leftover"),
    ])
}

/// Encode `root`, push the document through `channel`, decode in memory.
pub fn round_trip<C: PagedTextChannel>(
    root: &std::path::Path,
    rules: ExclusionRules,
    encode_options: EncodeOptions,
    channel: &C,
    decode_options: DecodeOptions,
) -> Decoded
{
    let document = encode(root, rules, encode_options).expect("encode");
    let rendered = channel.render(&document);
    let pages = channel.extract(&rendered);

    decode(&pages, decode_options).expect("decode")
}

/// Content of one decoded file, panicking with the known paths if absent.
pub fn content<'a>(
    decoded: &'a Decoded,
    path: &str,
) -> &'a str
{
    match decoded
        .files
        .get(path)
    {
        Some(file) => &file.content,
        None => panic!(
            "{path} missing; decoded: {:?}",
            decoded
                .files
                .keys()
                .collect::<Vec<_>>()
        ),
    }
}
