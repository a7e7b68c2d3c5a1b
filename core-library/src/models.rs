//! Domain models for the playback core
//!
//! Value types describing what can be played: songs, the containers they come
//! from, artists, lyric lines and the identifiers that tie them to a provider.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LibraryError, Result};

// =============================================================================
// Identifiers
// =============================================================================

/// Width of the provider id prefix, in characters.
pub const PROVIDER_ID_WIDTH: usize = 3;
/// Width of the source type tag that follows the provider id.
pub const SOURCE_TYPE_WIDTH: usize = 2;

/// Provider-scoped identifier: `provider_id` (3 chars) + `source_type` (2 chars)
/// + `actual_id`, concatenated without a separator.
///
/// Both prefixes have a fixed width, so comparing the parts is the same as
/// comparing full ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId {
    provider_id: String,
    source_type: String,
    actual_id: String,
}

impl ItemId {
    /// Split a full id at character positions 3 and 5.
    pub fn parse(full_id: &str) -> Result<Self> {
        let mut boundaries = full_id.char_indices().map(|(offset, _)| offset);
        let provider_end = boundaries.nth(PROVIDER_ID_WIDTH);
        let source_end = boundaries.nth(SOURCE_TYPE_WIDTH - 1);

        let (provider_end, source_end) = match (provider_end, source_end) {
            (Some(p), Some(s)) => (p, s),
            (Some(p), None) if full_id[p..].chars().count() == SOURCE_TYPE_WIDTH => {
                (p, full_id.len())
            }
            _ => {
                return Err(LibraryError::InvalidIdentifier {
                    id: full_id.to_string(),
                    reason: format!(
                        "expected at least {} characters",
                        PROVIDER_ID_WIDTH + SOURCE_TYPE_WIDTH
                    ),
                })
            }
        };

        Ok(Self {
            provider_id: full_id[..provider_end].to_string(),
            source_type: full_id[provider_end..source_end].to_string(),
            actual_id: full_id[source_end..].to_string(),
        })
    }

    pub fn from_parts(
        provider_id: impl Into<String>,
        source_type: impl Into<String>,
        actual_id: impl Into<String>,
    ) -> Result<Self> {
        let provider_id = provider_id.into();
        let source_type = source_type.into();
        let actual_id = actual_id.into();

        if provider_id.chars().count() != PROVIDER_ID_WIDTH {
            return Err(LibraryError::InvalidIdentifier {
                id: format!("{provider_id}{source_type}{actual_id}"),
                reason: format!("provider id must be {PROVIDER_ID_WIDTH} characters"),
            });
        }
        if source_type.chars().count() != SOURCE_TYPE_WIDTH {
            return Err(LibraryError::InvalidIdentifier {
                id: format!("{provider_id}{source_type}{actual_id}"),
                reason: format!("source type must be {SOURCE_TYPE_WIDTH} characters"),
            });
        }

        Ok(Self {
            provider_id,
            source_type,
            actual_id,
        })
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    pub fn actual_id(&self) -> &str {
        &self.actual_id
    }

    pub fn full_id(&self) -> String {
        format!("{}{}{}", self.provider_id, self.source_type, self.actual_id)
    }

    /// The id a provider understands: source type tag + actual id.
    pub fn in_provider_id(&self) -> String {
        format!("{}{}", self.source_type, self.actual_id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.provider_id, self.source_type, self.actual_id)
    }
}

impl FromStr for ItemId {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ItemId {
    type Error = LibraryError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.full_id()
    }
}

// =============================================================================
// Catalog entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ItemId,
    pub name: String,
}

impl Artist {
    pub fn new(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// How a container's items are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Fixed list that can be resolved in full.
    Linear,
    /// Unbounded list; the next item is resolved one at a time (radio, FM).
    Interactive,
}

impl TryFrom<u8> for SourceKind {
    type Error = LibraryError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(SourceKind::Linear),
            1 => Ok(SourceKind::Interactive),
            other => Err(LibraryError::UnknownSourceKind(other.to_string())),
        }
    }
}

impl FromStr for SourceKind {
    type Err = LibraryError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "linear" | "Linear" => Ok(SourceKind::Linear),
            "interactive" | "Interactive" => Ok(SourceKind::Interactive),
            other => Err(LibraryError::UnknownSourceKind(other.to_string())),
        }
    }
}

/// A playback origin: an album, a playlist, a radio station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ItemId,
    pub name: String,
    pub creator_name: String,
    pub creator_id: String,
    pub description: String,
    pub source_kind: SourceKind,
}

impl Container {
    pub fn new(id: ItemId, name: impl Into<String>, source_kind: SourceKind) -> Self {
        Self {
            id,
            name: name.into(),
            creator_name: String::new(),
            creator_id: String::new(),
            description: String::new(),
            source_kind,
        }
    }

    pub fn with_creator(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.creator_name = name.into();
        self.creator_id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Requested artwork dimensions in pixels. `None` means "provider default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtworkSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ArtworkSize {
    pub fn square(edge: u32) -> Self {
        Self {
            width: Some(edge),
            height: Some(edge),
        }
    }
}

/// Encoded cover image. Decoding is left to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub data: Bytes,
    pub mime_type: String,
}

/// Fetches album artwork, usually backed by the owning provider.
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    async fn fetch(&self, size: ArtworkSize) -> Result<Artwork>;

    /// Raw encoded bytes, for consumers that stream straight to a surface.
    async fn fetch_stream(&self, size: ArtworkSize) -> Result<Bytes> {
        Ok(self.fetch(size).await?.data)
    }
}

/// An album: a [`Container`] that also carries cover art.
#[derive(Clone, Serialize, Deserialize)]
pub struct Album {
    pub container: Container,
    pub cover_url: Option<String>,
    #[serde(skip)]
    artwork: Option<Arc<dyn ArtworkSource>>,
}

impl Album {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            cover_url: None,
            artwork: None,
        }
    }

    pub fn with_cover_url(mut self, url: impl Into<String>) -> Self {
        self.cover_url = Some(url.into());
        self
    }

    pub fn with_artwork(mut self, source: Arc<dyn ArtworkSource>) -> Self {
        self.artwork = Some(source);
        self
    }

    pub fn id(&self) -> &ItemId {
        &self.container.id
    }

    pub fn name(&self) -> &str {
        &self.container.name
    }

    pub fn has_artwork(&self) -> bool {
        self.artwork.is_some()
    }

    pub async fn cover(&self, size: ArtworkSize) -> Result<Artwork> {
        self.artwork_source()?.fetch(size).await
    }

    pub async fn cover_stream(&self, size: ArtworkSize) -> Result<Bytes> {
        self.artwork_source()?.fetch_stream(size).await
    }

    fn artwork_source(&self) -> Result<&Arc<dyn ArtworkSource>> {
        self.artwork
            .as_ref()
            .ok_or_else(|| LibraryError::ArtworkUnavailable(self.container.id.full_id()))
    }
}

impl PartialEq for Album {
    fn eq(&self, other: &Self) -> bool {
        self.container == other.container && self.cover_url == other.cover_url
    }
}

impl Eq for Album {}

impl fmt::Debug for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Album")
            .field("container", &self.container)
            .field("cover_url", &self.cover_url)
            .field("artwork", &self.artwork.is_some())
            .finish()
    }
}

/// A playable entry, as resolved by a provider. A refresh produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: ItemId,
    pub name: String,
    pub translated_name: Option<String>,
    pub duration: Duration,
    pub available: bool,
    pub description: String,
    pub album: Arc<Album>,
    pub artists: Vec<Artist>,
}

impl Song {
    pub fn new(id: ItemId, name: impl Into<String>, duration: Duration, album: Arc<Album>) -> Self {
        Self {
            id,
            name: name.into(),
            translated_name: None,
            duration,
            available: true,
            description: String::new(),
            album,
            artists: Vec::new(),
        }
    }

    pub fn with_artists(mut self, artists: Vec<Artist>) -> Self {
        self.artists = artists;
        self
    }

    pub fn with_translated_name(mut self, name: impl Into<String>) -> Self {
        self.translated_name = Some(name.into());
        self
    }

    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    pub fn provider_id(&self) -> &str {
        self.id.provider_id()
    }

    /// Artist names joined with `" / "`, in list order.
    pub fn artists_string(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

// =============================================================================
// Lyrics
// =============================================================================

/// Canonical sentinel texts. Hosts compare lyric lines against these verbatim.
pub const INSTRUMENTAL_TEXT: &str = "Instrumental, please enjoy";
pub const NO_LYRIC_TEXT: &str = "No lyrics, please enjoy";
pub const LOADING_LYRIC_TEXT: &str = "Loading lyrics...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    pub time: Duration,
    pub text: String,
    pub translation: Option<String>,
    pub has_translation: bool,
}

impl LyricLine {
    pub fn new(time: Duration, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
            translation: None,
            has_translation: false,
        }
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translation = Some(translation.into());
        self.has_translation = true;
        self
    }

    pub fn instrumental() -> Self {
        Self::new(Duration::ZERO, INSTRUMENTAL_TEXT)
    }

    pub fn no_lyric() -> Self {
        Self::new(Duration::ZERO, NO_LYRIC_TEXT)
    }

    pub fn loading() -> Self {
        Self::new(Duration::ZERO, LOADING_LYRIC_TEXT)
    }

    pub fn is_sentinel(&self) -> bool {
        self.time.is_zero()
            && !self.has_translation
            && matches!(
                self.text.as_str(),
                INSTRUMENTAL_TEXT | NO_LYRIC_TEXT | LOADING_LYRIC_TEXT
            )
    }
}

// =============================================================================
// Media
// =============================================================================

/// Opaque renderable handle a provider hands to a playback backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    LocalFile {
        path: PathBuf,
    },
    RemoteStream {
        url: String,
        headers: BTreeMap<String, String>,
    },
    MemoryBuffer {
        data: Bytes,
        mime_hint: Option<String>,
    },
}

impl MediaSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        MediaSource::LocalFile { path: path.into() }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        MediaSource::RemoteStream {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, MediaSource::RemoteStream { .. })
    }

    /// Log-safe description: file name only for local paths, header values
    /// masked for remote streams, length only for buffers.
    pub fn describe(&self) -> String {
        match self {
            MediaSource::LocalFile { path } => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "<unnamed>".to_string());
                format!("file:{name}")
            }
            MediaSource::RemoteStream { url, headers } => {
                let base = url.split('?').next().unwrap_or(url);
                if headers.is_empty() {
                    format!("stream:{base}")
                } else {
                    let keys: Vec<_> = headers.keys().map(|k| format!("{k}=***")).collect();
                    format!("stream:{base} [{}]", keys.join(", "))
                }
            }
            MediaSource::MemoryBuffer { data, .. } => format!("buffer:{} bytes", data.len()),
        }
    }
}

// =============================================================================
// Playback policy
// =============================================================================

/// Which song plays after the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollMode {
    /// Sequential, wrapping to the start.
    #[default]
    DefaultRoll,
    /// Repeat the current song.
    SinglePlay,
    Shuffled,
}

impl TryFrom<u8> for RollMode {
    type Error = LibraryError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(RollMode::DefaultRoll),
            1 => Ok(RollMode::SinglePlay),
            2 => Ok(RollMode::Shuffled),
            other => Err(LibraryError::UnknownRollMode(other.to_string())),
        }
    }
}

impl FromStr for RollMode {
    type Err = LibraryError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "default" | "DefaultRoll" => Ok(RollMode::DefaultRoll),
            "single" | "SinglePlay" => Ok(RollMode::SinglePlay),
            "shuffle" | "Shuffled" => Ok(RollMode::Shuffled),
            other => Err(LibraryError::UnknownRollMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album() -> Arc<Album> {
        let id = ItemId::parse("ncmal42").unwrap();
        Arc::new(Album::new(Container::new(id, "Album", SourceKind::Linear)))
    }

    #[test]
    fn identifier_round_trips_through_full_id() {
        let id = ItemId::from_parts("abc", "xy", "12345").unwrap();
        assert_eq!(id.full_id(), "abcxy12345");
        assert_eq!(id.in_provider_id(), "xy12345");

        let parsed = ItemId::parse(&id.full_id()).unwrap();
        assert_eq!(parsed.provider_id(), "abc");
        assert_eq!(parsed.source_type(), "xy");
        assert_eq!(parsed.actual_id(), "12345");
        assert_eq!(parsed, id);
    }

    #[test]
    fn identifier_slices_by_characters() {
        let id = ItemId::parse("網易雲sg7").unwrap();
        assert_eq!(id.provider_id(), "網易雲");
        assert_eq!(id.source_type(), "sg");
        assert_eq!(id.actual_id(), "7");
    }

    #[test]
    fn identifier_allows_empty_actual_id() {
        let id = ItemId::parse("abcxy").unwrap();
        assert_eq!(id.actual_id(), "");
        assert_eq!(id.full_id(), "abcxy");
    }

    #[test]
    fn identifier_rejects_short_or_misshapen_input() {
        assert!(ItemId::parse("abcx").is_err());
        assert!(ItemId::parse("").is_err());
        assert!(ItemId::from_parts("ab", "xy", "1").is_err());
        assert!(ItemId::from_parts("abc", "x", "1").is_err());
        assert!(ItemId::from_parts("abc", "xyz", "1").is_err());
    }

    #[test]
    fn identifier_serializes_as_full_id() {
        let id = ItemId::from_parts("abc", "xy", "9").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abcxy9\"");
        let back: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn artists_string_joins_in_order() {
        let song = Song::new(
            ItemId::parse("ncmsg1").unwrap(),
            "Song",
            Duration::from_secs(200),
            album(),
        )
        .with_artists(vec![
            Artist::new(ItemId::parse("ncmar1").unwrap(), "First"),
            Artist::new(ItemId::parse("ncmar2").unwrap(), "Second"),
        ]);
        assert_eq!(song.artists_string(), "First / Second");
    }

    #[test]
    fn sentinels_are_distinct_and_recognized() {
        let sentinels = [
            LyricLine::instrumental(),
            LyricLine::no_lyric(),
            LyricLine::loading(),
        ];
        for line in &sentinels {
            assert!(line.is_sentinel());
            assert_eq!(line.time, Duration::ZERO);
            assert!(!line.has_translation);
        }
        assert_ne!(sentinels[0], sentinels[1]);
        assert_ne!(sentinels[1], sentinels[2]);
        assert!(!LyricLine::new(Duration::from_secs(1), NO_LYRIC_TEXT).is_sentinel());
    }

    #[test]
    fn roll_mode_parse_rejects_unknown_values() {
        assert_eq!(RollMode::try_from(2).unwrap(), RollMode::Shuffled);
        assert_eq!("single".parse::<RollMode>().unwrap(), RollMode::SinglePlay);
        assert!(matches!(
            RollMode::try_from(7),
            Err(LibraryError::UnknownRollMode(_))
        ));
        assert!(matches!(
            "Interactive".parse::<SourceKind>(),
            Ok(SourceKind::Interactive)
        ));
        assert!(matches!(
            SourceKind::try_from(3),
            Err(LibraryError::UnknownSourceKind(_))
        ));
    }

    #[test]
    fn media_source_description_hides_secrets() {
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer abc".to_string());
        let source = MediaSource::RemoteStream {
            url: "https://cdn.example.com/a.mp3?token=xyz".to_string(),
            headers,
        };
        let described = source.describe();
        assert_eq!(described, "stream:https://cdn.example.com/a.mp3 [Authorization=***]");

        let local = MediaSource::local("/home/user/Music/song.flac");
        assert_eq!(local.describe(), "file:song.flac");
    }

    #[tokio::test]
    async fn album_without_artwork_source_reports_unavailable() {
        let err = album().cover(ArtworkSize::square(300)).await.unwrap_err();
        assert!(matches!(err, LibraryError::ArtworkUnavailable(id) if id == "ncmal42"));
    }
}
