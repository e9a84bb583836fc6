//! Text cleanup applied to every reply before it reaches speech synthesis.
//!
//! The model is instructed not to emit markdown or emoji, but it still does,
//! and a TTS engine will happily read "asterisk asterisk" aloud. The passes
//! here strip formatting characters, list markers, and pictographic code
//! points, then collapse the leftover whitespace.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MARKDOWN_RUNS: Regex = Regex::new(r"[*#`]+").unwrap();
    static ref LIST_MARKERS: Regex = Regex::new(r"(?m)^(?:\s*(?:[-•*]|\d+\.)\s+)+").unwrap();
    // Emoticons, symbols & pictographs, transport & map, regional flags,
    // CJK symbols, dingbats, enclosed characters, variation selectors,
    // zero-width joiner, and the supplementary planes wholesale.
    static ref EMOJI: Regex = Regex::new(concat!(
        "[",
        "\u{1F600}-\u{1F64F}",
        "\u{1F300}-\u{1F5FF}",
        "\u{1F680}-\u{1F6FF}",
        "\u{1F1E0}-\u{1F1FF}",
        "\u{2500}-\u{2BEF}",
        "\u{2702}-\u{27B0}",
        "\u{24C2}-\u{1F251}",
        "\u{1F926}-\u{1F937}",
        "\u{10000}-\u{10FFFF}",
        "\u{2640}-\u{2642}",
        "\u{2600}-\u{2B55}",
        "\u{200D}",
        "\u{23CF}",
        "\u{23E9}",
        "\u{231A}",
        "\u{FE0F}",
        "\u{3030}",
        "]+",
    ))
    .unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Clean text for TTS by removing formatting and emojis.
///
/// Total and idempotent: never fails, and a second pass is a no-op. The
/// passes are ordered so that the whitespace collapse sees the gaps left by
/// the earlier deletions.
pub fn sanitize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = MARKDOWN_RUNS.replace_all(text, "");
    let text = LIST_MARKERS.replace_all(&text, "");
    let text = EMOJI.replace_all(&text, "");
    // Deleting emoji can expose a fresh marker at the start of a line, so
    // the marker pass runs once more before the whitespace collapse.
    let text = LIST_MARKERS.replace_all(&text, "");

    let text = BLANK_LINES.replace_all(&text, "\n");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}
