//! Filepath: src/infra/text.rs
//! Byte decoding and character-set reduction for encoded documents.
//! - `TextDecoder`: ordered list of encodings, first clean decode wins
//! - `Sanitizer`: emoji/symbol table to bracket tags, then a Latin-1 fallback

use std::{borrow::Cow, sync::LazyLock};

use aho_corasick::{AhoCorasick, MatchKind};
use encoding_rs::{Encoding, UTF_8};

use crate::error::CodecError;

/// Ordered decoder over a fixed list of encodings
#[derive(Debug, Clone)]
pub struct TextDecoder
{
    encodings: Vec<&'static Encoding>,
}

impl Default for TextDecoder
{
    fn default() -> Self
    {
        Self { encodings: vec![UTF_8, encoding_rs::WINDOWS_1252] }
    }
}

impl TextDecoder
{
    /// Resolve WHATWG labels ("utf-8", "latin-1", "cp1252", ...).
    /// Underscore spellings ("iso_8859_1") and separator-free ones
    /// ("latin-1" as "latin1") are accepted too.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, CodecError>
    {
        let mut encodings: Vec<&'static Encoding> = Vec::with_capacity(labels.len());

        for label in labels
        {
            let label = label
                .as_ref()
                .trim();
            let encoding = Encoding::for_label(label.as_bytes())
                .or_else(|| Encoding::for_label(label.replace('_', "-").as_bytes()))
                .or_else(|| Encoding::for_label(label.replace(['-', '_'], "").as_bytes()))
                .ok_or_else(|| CodecError::UnknownEncoding(label.to_string()))?;

            // Several labels map to the same encoding (latin-1 == cp1252)
            if !encodings.contains(&encoding)
            {
                encodings.push(encoding);
            }
        }

        Ok(Self { encodings })
    }

    pub fn encodings(&self) -> impl Iterator<Item = &'static str> + '_
    {
        self.encodings
            .iter()
            .map(|e| e.name())
    }

    /// Decode `bytes` with the first encoding that accepts them.
    /// Buffers holding NUL bytes are binary and never decode.
    pub fn decode<'a>(
        &self,
        bytes: &'a [u8],
    ) -> Option<Cow<'a, str>>
    {
        if memchr::memchr(0, bytes).is_some()
        {
            return None;
        }

        self.encodings
            .iter()
            .find_map(|encoding| {
                let body = if *encoding == UTF_8
                {
                    bytes
                        .strip_prefix(b"\xEF\xBB\xBF")
                        .unwrap_or(bytes)
                }
                else
                {
                    bytes
                };
                encoding.decode_without_bom_handling_and_without_replacement(body)
            })
    }
}

const SYMBOL_TAGS: &[(&str, &str)] = &[
    ("✨", "[SPARKLES]"),
    ("✅", "[CHECK]"),
    ("❌", "[CROSS]"),
    ("⚠️", "[WARNING]"),
    ("⚠", "[WARNING]"),
    ("ℹ️", "[INFO]"),
    ("🔍", "[SEARCH]"),
    ("📁", "[FOLDER]"),
    ("📂", "[OPEN_FOLDER]"),
    ("📄", "[FILE]"),
    ("⚙️", "[GEAR]"),
    ("🔄", "[REFRESH]"),
    ("📊", "[CHART]"),
    ("🔒", "[LOCK]"),
    ("🔓", "[UNLOCK]"),
    ("📋", "[CLIPBOARD]"),
    ("🎯", "[TARGET]"),
    ("🚀", "[ROCKET]"),
    ("💾", "[SAVE]"),
    ("📤", "[UPLOAD]"),
    ("📥", "[DOWNLOAD]"),
    ("🗑️", "[TRASH]"),
    ("⭐", "[STAR]"),
    ("🔥", "[FIRE]"),
    ("💡", "[BULB]"),
    ("📝", "[PENCIL]"),
    ("✏️", "[PENCIL]"),
    ("🔔", "[BELL]"),
    ("🎨", "[ART]"),
    ("🔧", "[WRENCH]"),
    ("📈", "[GRAPH_UP]"),
    ("📉", "[GRAPH_DOWN]"),
    ("🕒", "[CLOCK]"),
    ("👁️", "[EYE]"),
    ("👥", "[USERS]"),
    ("💬", "[SPEECH]"),
    ("📌", "[PIN]"),
    ("📍", "[ROUND_PIN]"),
    ("🛠️", "[TOOLS]"),
    ("🔨", "[HAMMER]"),
    ("⏱️", "[TIMER]"),
    ("🎭", "[MASK]"),
    ("📚", "[BOOKS]"),
    ("🔗", "[LINK]"),
    ("🧹", "[BROOM]"),
    ("🔤", "[SYMBOLS]"),
    ("🌟", "[GLOWING_STAR]"),
    ("👤", "[SILHOUETTE]"),
    ("📅", "[CALENDAR]"),
    ("🐛", "[BUG]"),
    ("→", "[ARROW_RIGHT]"),
    ("➡️", "[ARROW_RIGHT_FULL]"),
    ("⬅️", "[ARROW_LEFT]"),
    ("⬆️", "[ARROW_UP]"),
    ("⬇️", "[ARROW_DOWN]"),
    ("↩️", "[ARROW_LEFT_HOOK]"),
    ("↪️", "[ARROW_RIGHT_HOOK]"),
    ("⏪", "[REWIND]"),
    ("⏩", "[FAST_FORWARD]"),
    ("⏸️", "[PAUSE]"),
    ("⏹️", "[STOP]"),
    ("⏺️", "[RECORD]"),
    ("🎵", "[MUSIC]"),
    ("🎶", "[NOTES]"),
    ("🏷️", "[LABEL]"),
    ("📧", "[EMAIL]"),
    ("📱", "[PHONE]"),
    ("💻", "[LAPTOP]"),
    ("🖥️", "[DESKTOP]"),
    ("🖨️", "[PRINTER]"),
    ("📸", "[CAMERA]"),
    ("🎥", "[VIDEO_CAMERA]"),
    ("📡", "[SATELLITE]"),
    ("🔦", "[FLASHLIGHT]"),
    ("💰", "[MONEY_BAG]"),
    ("💳", "[CREDIT_CARD]"),
    ("🌐", "[GLOBE]"),
    ("🗺️", "[MAP]"),
    ("📦", "[PACKAGE]"),
    ("💥", "[COLLISION]"),
    ("💯", "[HUNDRED]"),
    ("👨‍💻", "[MAN_TECHNOLOGIST]"),
    ("👩‍💻", "[WOMAN_TECHNOLOGIST]"),
    ("🧑‍💻", "[PERSON_TECHNOLOGIST]"),
    ("\u{FFFD}", "[UNKNOWN]"),
];

static SYMBOLS: LazyLock<Option<AhoCorasick>> = LazyLock::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(
            SYMBOL_TAGS
                .iter()
                .map(|(sym, _)| sym),
        )
        .ok()
});

/// Reduces text to what a Latin-1 page renderer can show
pub struct Sanitizer;

impl Sanitizer
{
    /// Tags first, then tab + printable ASCII + U+00A0..=U+00FF; anything
    /// else becomes `?`. A trailing CR is dropped.
    pub fn clean(text: &str) -> String
    {
        let text = text
            .strip_suffix('\r')
            .unwrap_or(text);

        let tagged: Cow<'_, str> = match SYMBOLS.as_ref()
        {
            Some(ac) => Cow::Owned(ac.replace_all(
                text,
                &SYMBOL_TAGS
                    .iter()
                    .map(|(_, tag)| *tag)
                    .collect::<Vec<_>>(),
            )),
            None => Cow::Borrowed(text),
        };

        tagged
            .chars()
            .map(|c| if Self::is_safe(c) { c } else { '?' })
            .collect()
    }

    pub fn is_safe(c: char) -> bool
    {
        c == '\t' || (' '..='~').contains(&c) || ('\u{A0}'..='\u{FF}').contains(&c)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_first_matching_encoding_wins()
    {
        let decoder = TextDecoder::default();

        assert_eq!(
            decoder
                .decode("caffè".as_bytes())
                .as_deref(),
            Some("caffè")
        );

        // 0xE8 alone is invalid UTF-8 but is 'è' in windows-1252
        assert_eq!(
            decoder
                .decode(b"caff\xE8")
                .as_deref(),
            Some("caffè")
        );
    }

    #[test]
    fn test_nul_bytes_mean_binary()
    {
        let decoder = TextDecoder::default();
        assert!(
            decoder
                .decode(b"PK\x03\x04\x00\x00")
                .is_none()
        );
    }

    #[test]
    fn test_utf8_only_rejects_latin1_bytes()
    {
        let decoder = TextDecoder::from_labels(&["utf-8"]).unwrap();
        assert!(
            decoder
                .decode(b"caff\xE8")
                .is_none()
        );
    }

    #[test]
    fn test_bom_is_stripped()
    {
        let decoder = TextDecoder::default();
        assert_eq!(
            decoder
                .decode(b"\xEF\xBB\xBFhello")
                .as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_labels_resolve_and_deduplicate()
    {
        let decoder =
            TextDecoder::from_labels(&["utf-8", "latin-1", "cp1252", "iso_8859_1"]).unwrap();
        assert_eq!(
            decoder
                .encodings()
                .collect::<Vec<_>>(),
            vec!["UTF-8", "windows-1252"]
        );

        let err = TextDecoder::from_labels(&["klingon"]).unwrap_err();
        assert!(matches!(err, CodecError::UnknownEncoding(l) if l == "klingon"));
    }

    #[test]
    fn test_sanitizer_maps_symbols_then_falls_back()
    {
        assert_eq!(Sanitizer::clean("done ✅"), "done [CHECK]");
        assert_eq!(Sanitizer::clean("a → b"), "a [ARROW_RIGHT] b");
        assert_eq!(Sanitizer::clean("⚠️ careful"), "[WARNING] careful");
        assert_eq!(Sanitizer::clean("\tcaffè £5"), "\tcaffè £5");
        assert_eq!(Sanitizer::clean("日本"), "??");
        assert_eq!(Sanitizer::clean("line\r"), "line");
    }
}
