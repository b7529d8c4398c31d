//! Assembly of the published now-playing string.

use crate::bus::TrackMetadata;
use crate::config::FormatConfig;

/// Templates for the published string.
///
/// The per-field templates take the value through `{}` and apply only
/// when that field is present and non-empty; the overall template then
/// stitches the rendered fields together through `{artist}`, `{title}`
/// and `{album}`.
#[derive(Debug, Clone)]
pub struct TrackFormatter {
    overall: String,
    artist: String,
    title: String,
    album: String,
}

impl TrackFormatter {
    pub fn new(format: &FormatConfig) -> Self {
        Self {
            overall: format.overall.clone(),
            artist: format.artist.clone(),
            title: format.title.clone(),
            album: format.album.clone(),
        }
    }

    /// Render `metadata` into the published string. Missing fields
    /// contribute nothing; this never fails.
    pub fn format(&self, metadata: &TrackMetadata) -> String {
        let artist = apply_field(&self.artist, metadata.artist.as_deref());
        let title = apply_field(&self.title, metadata.title.as_deref());
        let album = apply_field(&self.album, metadata.album.as_deref());
        expand_named(
            &self.overall,
            &[("artist", &artist), ("title", &title), ("album", &album)],
        )
    }
}

/// Apply a `{}` field template, or produce nothing for an absent value.
fn apply_field(template: &str, value: Option<&str>) -> String {
    match value {
        Some(value) if !value.is_empty() => template.replace("{}", value),
        _ => String::new(),
    }
}

/// Single-pass `{name}` substitution. Unknown placeholders and stray
/// braces pass through verbatim; substituted text is not rescanned, so
/// braces inside metadata stay literal.
fn expand_named(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        let name = &tail[1..close];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}
