//! # Catalog Model
//!
//! Entity model and provider contract for the playback core.
//!
//! ## Overview
//!
//! - [`models`]: identifiers, songs, containers, albums, artists, lyric lines,
//!   media handles and the roll-mode policy enum
//! - [`provider`]: the [`MusicProvider`] contract and the id-keyed
//!   [`ProviderRegistry`]
//! - [`lyrics`]: LRC parsing and sentinel handling

pub mod error;
pub mod lyrics;
pub mod models;
pub mod provider;

pub use error::{LibraryError, Result};
pub use lyrics::{compose_lyrics, RawLyric};
pub use models::{
    Album, Artist, Artwork, ArtworkSize, ArtworkSource, Container, ItemId, LyricLine,
    MediaSource, RollMode, Song, SourceKind,
};
pub use provider::{MusicProvider, ProvidableItem, ProviderRegistry, TranslatingProvider};
