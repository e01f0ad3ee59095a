//! Tag-string helpers.
//!
//! Audio tags routinely cram several values into one delimited string
//! ("A; B", "A feat. B") and append version hints to titles ("Song (Remix)").
//! These helpers normalize those conventions into structured values.

/// Artist used when a file carries no artist tag at all.
pub const FALLBACK_ARTIST: &str = "Various Artists";

/// Splitters for artist tags, in priority order.
///
/// `/` is deliberately absent so artists like AC/DC survive intact.
pub const ARTIST_SPLITTERS: &[&str] = &[
    ";",
    ",",
    "Featuring",
    " Feat. ",
    " Feat ",
    "feat.",
    " & ",
];

/// Default splitters for generic tag values (genres).
pub const TAG_SPLITTERS: &[&str] = &["/", ";", ","];

/// Split a delimited tag string on the first splitter that occurs in it.
///
/// Only one splitter is ever applied: `"A, B & C"` with the artist splitters
/// splits on the comma into `["A", "B & C"]` and the `&` is left alone.
/// Tokens are trimmed; empty tokens are dropped.
pub fn split_tag_items(raw: &str, splitters: &[&str]) -> Vec<String> {
    for splitter in splitters {
        if raw.contains(splitter) {
            return raw
                .split(splitter)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![trimmed.to_string()]
    }
}

/// Split a combined title into base name and version suffix.
///
/// A single trailing parenthetical becomes the version: `"Song (Remix)"`
/// yields `("Song", Some("Remix"))`. Anything else is left untouched.
pub fn parse_title_and_version(title: &str) -> (String, Option<String>) {
    let trimmed = title.trim();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind(" (") {
            let version = trimmed[open + 2..trimmed.len() - 1].trim();
            let name = trimmed[..open].trim_end();
            if !version.is_empty() && !name.is_empty() {
                return (name.to_string(), Some(version.to_string()));
            }
        }
    }
    (trimmed.to_string(), None)
}

/// Best-effort integer parse for track/disc number tags.
///
/// Accepts values like `"2/12"` or `"03"`; returns `None` instead of failing
/// on anything non-numeric.
pub fn try_parse_int(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
