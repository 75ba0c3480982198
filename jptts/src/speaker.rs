//! Speaker catalog types.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Style name used by backends that expose a single voice per speaker.
pub const DEFAULT_STYLE_NAME: &str = "デフォルト";

/// Style id used by backends that expose a single voice per speaker.
pub const DEFAULT_STYLE_ID: &str = "default";

/// A sub-variant of a speaker's voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    pub id: String,
}

impl Style {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// The single style of engines without style variants.
    pub fn default_style() -> Self {
        Self::new(DEFAULT_STYLE_NAME, DEFAULT_STYLE_ID)
    }
}

/// A voice identity exposed by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub name: String,
    pub id: String,
    pub styles: Vec<Style>,
}

impl Speaker {
    pub fn new(name: impl Into<String>, id: impl Into<String>, styles: Vec<Style>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            styles,
        }
    }

    /// Looks up a style by id.
    pub fn style(&self, id: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.id == id)
    }

    /// The first style in catalog order.
    pub fn default_style(&self) -> Option<&Style> {
        self.styles.first()
    }
}

/// Speakers of one backend, in provider order.
///
/// Ids are unique within the catalog and only meaningful for the backend
/// that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerCatalog {
    speakers: Vec<Speaker>,
}

impl SpeakerCatalog {
    pub fn new(speakers: Vec<Speaker>) -> Self {
        Self { speakers }
    }

    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Speaker> {
        self.speakers.iter().find(|s| s.id == id)
    }

    /// Returns the speaker at a catalog position, if in range.
    pub fn get_index(&self, index: usize) -> Option<&Speaker> {
        self.speakers.get(index)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.speakers.iter().map(|s| s.id.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Speaker> {
        self.speakers.iter()
    }

    /// Resolves a speaker and style. Without `style`, the speaker's first
    /// style is used.
    pub fn resolve(&self, backend: &str, speaker: &str, style: Option<&str>) -> Result<(&Speaker, &Style)> {
        let Some(found) = self.get(speaker) else {
            return Err(self.invalid(backend, speaker, style, self.speaker_choices()));
        };

        let chosen = match style {
            Some(id) => found.style(id),
            None => found.default_style(),
        };
        match chosen {
            Some(st) => Ok((found, st)),
            None => Err(self.invalid(
                backend,
                speaker,
                style,
                found
                    .styles
                    .iter()
                    .map(|s| format!("{} (name: {})", s.id, s.name))
                    .collect(),
            )),
        }
    }

    /// Builds an `InvalidSpeaker` error listing every speaker.
    pub(crate) fn invalid_speaker(&self, backend: &str, speaker: &str, style: Option<&str>) -> Error {
        self.invalid(backend, speaker, style, self.speaker_choices())
    }

    fn speaker_choices(&self) -> Vec<String> {
        self.speakers
            .iter()
            .map(|s| format!("{} (name: {})", s.id, s.name))
            .collect()
    }

    fn invalid(&self, backend: &str, speaker: &str, style: Option<&str>, available: Vec<String>) -> Error {
        Error::InvalidSpeaker {
            backend: backend.to_string(),
            speaker: speaker.to_string(),
            style: style.map(str::to_string),
            available,
        }
    }
}

impl<'a> IntoIterator for &'a SpeakerCatalog {
    type Item = &'a Speaker;
    type IntoIter = std::slice::Iter<'a, Speaker>;

    fn into_iter(self) -> Self::IntoIter {
        self.speakers.iter()
    }
}
