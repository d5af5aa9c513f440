mod util;

use syncronet::{
    core::{
        AmbiguousPolicy, CheckStatus, Confidence, DecodeOptions, EncodeOptions, ReconstructOptions,
    },
    infra::{ExclusionRules, FormFeedChannel, LossyChannel},
    verify,
};
use util::{content, make_tree, round_trip};

const PROSE: &str = "the quick brown fox jumps over the lazy dog while the cat watches from a sunny windowsill";

#[test]
fn reflowed_prose_is_rejoined_with_the_lost_space() {
    let text = format!("intro\n{PROSE}\nend\n");
    let tmp = make_tree(&[("prose.txt", text.as_str())]);

    let channel = LossyChannel::new(FormFeedChannel).with_reflow(Some(40));
    let decoded = round_trip(
        tmp.path(),
        ExclusionRules::empty(),
        EncodeOptions::default(),
        &channel,
        DecodeOptions::default(),
    );

    assert_eq!(content(&decoded, "prose.txt"), text);

    // Nothing but the text itself said these were continuations
    let file = &decoded.files["prose.txt"];
    assert!(!file.events.is_empty());
    assert!(file.events.iter().all(|e| e.confidence == Confidence::Low));
    assert!(file.events.iter().all(|e| e.line_index == 2));
}

#[test]
fn page_break_blanks_do_not_leak_into_files() {
    let text = "a\nb\n\nc\nd\ne\nf\ng\nh";
    let tmp = make_tree(&[("paged.txt", text), ("second.txt", "one\ntwo")]);

    let channel = LossyChannel::new(FormFeedChannel).with_page_break_blanks(true);
    let decoded = round_trip(
        tmp.path(),
        ExclusionRules::empty(),
        EncodeOptions { lines_per_page: 4, ..Default::default() },
        &channel,
        DecodeOptions::default(),
    );

    assert_eq!(content(&decoded, "paged.txt"), text);
    assert_eq!(content(&decoded, "second.txt"), "one\ntwo");
}

#[test]
fn stripped_page_indent_keeps_code_indentation() {
    let text = "def f(x):\n    if x:\n        return 1\n    return 0\n";
    let tmp = make_tree(&[("f.py", text)]);

    let channel = LossyChannel::new(FormFeedChannel).with_strip_indent(true);
    let decoded = round_trip(
        tmp.path(),
        ExclusionRules::empty(),
        EncodeOptions::default(),
        &channel,
        DecodeOptions::default(),
    );

    assert_eq!(content(&decoded, "f.py"), text);
}

#[test]
fn stripped_continuations_merge_with_low_confidence() {
    let line = "z".repeat(150);
    let text = format!("{line}\nnext");
    let tmp = make_tree(&[("wide.txt", text.as_str())]);

    let channel = LossyChannel::new(FormFeedChannel).with_strip_indent(true);
    let decoded = round_trip(
        tmp.path(),
        ExclusionRules::empty(),
        EncodeOptions::default(),
        &channel,
        DecodeOptions::default(),
    );

    let rebuilt = content(&decoded, "wide.txt");
    let lines: Vec<&str> = rebuilt.split('\n').collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].replace(' ', ""), line);
    assert_eq!(lines[1], "next");

    let file = &decoded.files["wide.txt"];
    assert_eq!(file.events.len(), 1);
    assert_eq!(file.events[0].confidence, Confidence::Low);
}

#[test]
fn standalone_policy_surfaces_reflow_damage_in_verify() {
    let tmp = make_tree(&[("prose.txt", PROSE)]);

    let channel = LossyChannel::new(FormFeedChannel).with_reflow(Some(40));
    let decode_options = DecodeOptions {
        reconstruct: ReconstructOptions {
            ambiguous_policy: AmbiguousPolicy::Standalone,
            ..Default::default()
        },
        ..Default::default()
    };

    let report = verify(
        tmp.path(),
        ExclusionRules::empty(),
        EncodeOptions::default(),
        &channel,
        decode_options,
    )
    .expect("verify");

    assert!(!report.is_clean());
    assert_eq!(report.count(CheckStatus::Differs), 1);
    assert!(report.files[0].low_confidence > 0);
}
