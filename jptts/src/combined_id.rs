//! Combined speaker/style identifiers.
//!
//! Some engines address a voice by (speaker uuid, numeric style id) and have
//! no single id for the pair. For those, the style id exposed in the catalog
//! is a decimal string of the form
//!
//! ```text
//! "1" + zero-padded speaker index + provider style id
//! ```
//!
//! where the index width is the number of decimal digits in the speaker
//! count. With 12 speakers, index 3 and style 1 become `"1031"`.
//!
//! The encoding is deterministic for one fetched catalog. It is not stable
//! across refreshes: if the provider reorders its speakers or the count
//! crosses a power of ten, previously handed out ids decode differently.

/// Leading digit, keeps zero-padded indices from being lost when the id is
/// treated as a number.
pub const SENTINEL: char = '1';

/// A decoded combined id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombinedId {
    /// Position of the speaker in the catalog.
    pub index: usize,
    /// The provider's own style id.
    pub style_id: u32,
}

/// Number of digits used for the speaker index.
pub fn index_width(speaker_count: usize) -> usize {
    speaker_count.to_string().len()
}

/// Encodes a speaker position and provider style id.
pub fn encode(index: usize, style_id: u32, speaker_count: usize) -> String {
    format!(
        "{SENTINEL}{index:0width$}{style_id}",
        width = index_width(speaker_count)
    )
}

/// Decodes a combined id against a catalog of `speaker_count` speakers.
///
/// Returns None for malformed ids and for indices outside the catalog.
pub fn decode(id: &str, speaker_count: usize) -> Option<CombinedId> {
    let rest = id.strip_prefix(SENTINEL)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let width = index_width(speaker_count);
    if rest.len() <= width {
        return None;
    }
    let (index, style) = rest.split_at(width);
    let index: usize = index.parse().ok()?;
    if index >= speaker_count {
        return None;
    }
    let style_id = style.parse().ok()?;

    Some(CombinedId { index, style_id })
}
