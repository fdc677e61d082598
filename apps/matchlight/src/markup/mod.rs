//! Markup — the address-marker grammar.
//!
//! Every addressed line is wrapped in a delimiter pair built from Unicode
//! private-use sentinels, so markers can never collide with prose and the
//! annotate → strip round-trip is exact:
//!
//! open  = `U+E000` address `U+E001`
//! close = `U+E000` `/` address `U+E001`
//!
//! `strip_markers` removes only well-formed pairs whose payload parses as a
//! valid address; any stray sentinel in the source text survives untouched.

pub mod annotator;
pub mod classifier;

pub use annotator::{annotate, AnnotatedDocument, Region};
pub use classifier::{classify, RegionKind};

/// Marker opening sentinel (Unicode private-use area).
pub const MARKER_START: char = '\u{E000}';
/// Marker closing sentinel.
pub const MARKER_END: char = '\u{E001}';
/// Prefix distinguishing a closing marker's payload from an opening one's.
const END_SIGIL: char = '/';

/// Builds the address for a region: `<doc_prefix>_<kind>_<line_index>`.
pub fn format_address(doc_prefix: &str, kind: RegionKind, line_index: usize) -> String {
    format!("{}_{}_{}", doc_prefix, kind.token(), line_index)
}

/// Parses an address back into `(doc_prefix, kind, line_index)`.
/// The prefix must be alphanumeric — that keeps the grammar unambiguous.
pub fn parse_address(address: &str) -> Option<(&str, RegionKind, usize)> {
    let (rest, index_str) = address.rsplit_once('_')?;
    let (prefix, kind_str) = rest.rsplit_once('_')?;
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    let kind = RegionKind::from_token(kind_str)?;
    let line_index = index_str.parse::<usize>().ok()?;
    Some((prefix, kind, line_index))
}

/// Opening marker for an address.
pub fn open_marker(address: &str) -> String {
    format!("{MARKER_START}{address}{MARKER_END}")
}

/// Closing marker for an address.
pub fn close_marker(address: &str) -> String {
    format!("{MARKER_START}{END_SIGIL}{address}{MARKER_END}")
}

/// Wraps one line's original bytes, unmodified, in a marker pair.
pub fn wrap(address: &str, line: &str) -> String {
    format!(
        "{}{}{}",
        open_marker(address),
        line,
        close_marker(address)
    )
}

/// Removes all well-formed address markers, reproducing the unannotated
/// text byte-for-byte. Sentinel characters that do not form a valid marker
/// are passed through unchanged, so this is total over arbitrary input.
pub fn strip_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(MARKER_START) {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);

        let after_start = &tail[MARKER_START.len_utf8()..];
        match after_start.find(MARKER_END) {
            Some(end) => {
                let payload = &after_start[..end];
                let address = payload.strip_prefix(END_SIGIL).unwrap_or(payload);
                if parse_address(address).is_some() {
                    // valid marker: drop it entirely
                    rest = &after_start[end + MARKER_END.len_utf8()..];
                } else {
                    // stray sentinel: keep it and continue after it
                    out.push(MARKER_START);
                    rest = after_start;
                }
            }
            None => {
                out.push(MARKER_START);
                rest = after_start;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_round_trips_through_parse() {
        let addr = format_address("cv", RegionKind::Section, 7);
        assert_eq!(addr, "cv_section_7");
        let (prefix, kind, idx) = parse_address(&addr).unwrap();
        assert_eq!(prefix, "cv");
        assert_eq!(kind, RegionKind::Section);
        assert_eq!(idx, 7);
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert!(parse_address("cv_banana_3").is_none());
    }

    #[test]
    fn test_parse_rejects_non_numeric_index() {
        assert!(parse_address("cv_section_x").is_none());
    }

    #[test]
    fn test_parse_rejects_non_alphanumeric_prefix() {
        assert!(parse_address("c-v_section_3").is_none());
        assert!(parse_address("_section_3").is_none());
    }

    #[test]
    fn test_strip_removes_wrapped_marker_pair() {
        let wrapped = wrap("cv_item_2", "• Built APIs");
        assert_eq!(strip_markers(&wrapped), "• Built APIs");
    }

    #[test]
    fn test_strip_preserves_stray_sentinels() {
        let weird = format!("abc{MARKER_START}def{MARKER_END}ghi");
        // payload "def" is not a valid address, so nothing is removed
        assert_eq!(strip_markers(&weird), weird);
    }

    #[test]
    fn test_strip_preserves_unterminated_sentinel() {
        let weird = format!("abc{MARKER_START}def");
        assert_eq!(strip_markers(&weird), weird);
    }

    #[test]
    fn test_strip_is_identity_on_plain_text() {
        let text = "EXPERIENCE\n\n• Built APIs with Go\n";
        assert_eq!(strip_markers(text), text);
    }
}
