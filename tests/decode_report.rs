mod util;

use assert_fs::prelude::*;
use predicates::prelude::*;
use syncronet::{
    core::{CancelToken, DecodeOptions, EncodeOptions, REPORT_FILE_NAME, encode::encode},
    decode_to_dir,
    infra::{ExclusionRules, FormFeedChannel, PagedTextChannel},
};
use util::make_tree;

/// Ten files, one of which no configured encoding can read
fn mixed_tree() -> assert_fs::TempDir {
    let tmp = make_tree(&[]);
    for i in 0..9 {
        tmp.child(format!("src/mod_{i}.py"))
            .write_str(&format!("VALUE = {i}\n\ndef get():\n    return VALUE\n"))
            .expect("write source");
    }
    tmp.child("src/blob.dat").write_binary(b"PK\x00\x03\xff\xfe").expect("write blob");
    tmp
}

#[test]
fn one_undecodable_file_does_not_stop_the_rest() {
    let src = mixed_tree();
    let dest = assert_fs::TempDir::new().expect("tempdir");

    let document =
        encode(src.path(), ExclusionRules::empty(), EncodeOptions::default()).expect("encode");
    assert_eq!(document.summary.files_encoded, 10);
    assert_eq!(document.summary.placeholders, 1);

    let pages = FormFeedChannel.extract(&FormFeedChannel.render(&document));
    let report =
        decode_to_dir(&pages, dest.path(), DecodeOptions::default(), &(), &CancelToken::new())
            .expect("decode");

    assert_eq!(report.files.len(), 10);
    assert_eq!(report.files_written(), 10);
    assert_eq!(report.encoding_errors(), 1);
    assert_eq!(report.errors.len(), 1);

    for i in 0..9 {
        dest.child(format!("src/mod_{i}.py"))
            .assert(format!("VALUE = {i}\n\ndef get():\n    return VALUE\n"));
    }
    dest.child("src/blob.dat")
        .assert(predicate::str::contains("formato binario o codifica sconosciuta"));

    dest.child(REPORT_FILE_NAME)
        .assert(predicate::str::contains("File creati con successo: 10"))
        .assert(predicate::str::contains("Errori riscontrati: 1"))
        .assert(predicate::str::contains("- .py: 9 file"));
}

#[test]
fn legacy_encoded_source_is_rebuilt_as_utf8() {
    let src = make_tree(&[]);
    // "caffè" in windows-1252
    src.child("menu.txt").write_binary(b"caff\xe8\n").expect("write cp1252");
    let dest = assert_fs::TempDir::new().expect("tempdir");

    let document =
        encode(src.path(), ExclusionRules::empty(), EncodeOptions::default()).expect("encode");
    assert_eq!(document.summary.placeholders, 0);

    let pages = FormFeedChannel.extract(&FormFeedChannel.render(&document));
    decode_to_dir(&pages, dest.path(), DecodeOptions::default(), &(), &CancelToken::new())
        .expect("decode");

    dest.child("menu.txt").assert("caffè\n");
}

#[test]
fn dry_run_writes_nothing() {
    let src = make_tree(&[("a.txt", "alpha")]);
    let dest = assert_fs::TempDir::new().expect("tempdir");

    let document =
        encode(src.path(), ExclusionRules::empty(), EncodeOptions::default()).expect("encode");
    let pages = FormFeedChannel.extract(&FormFeedChannel.render(&document));
    let options = DecodeOptions { dry_run: true, ..Default::default() };
    let report =
        decode_to_dir(&pages, dest.path(), options, &(), &CancelToken::new()).expect("decode");

    assert!(report.dry_run);
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files_written(), 0);
    dest.child("a.txt").assert(predicate::path::missing());
    dest.child(REPORT_FILE_NAME).assert(predicate::path::missing());
}
