#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use core_library::lyrics::RawLyric;
use core_library::models::{
    Album, Artist, Artwork, ArtworkSize, ArtworkSource, Container, ItemId, MediaSource, Song,
    SourceKind,
};
use core_library::provider::{MusicProvider, ProvidableItem, TranslatingProvider};
use core_library::{LibraryError, Result};
use core_playback::NullBackend;
use core_runtime::events::{CoreEvent, EventBus, EventStream, PlaylistEvent};
use core_runtime::PlayerConfig;
use core_service::PlayCore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PROVIDER: &str = "ncm";

pub struct StaticCover;

#[async_trait]
impl ArtworkSource for StaticCover {
    async fn fetch(&self, _size: ArtworkSize) -> Result<Artwork> {
        Ok(Artwork {
            data: Bytes::from_static(b"\x89PNG-cover"),
            mime_type: "image/png".to_string(),
        })
    }
}

pub fn album() -> Arc<Album> {
    let container = Container::new(
        ItemId::from_parts(PROVIDER, "al", "1").unwrap(),
        "First Album",
        SourceKind::Linear,
    );
    Arc::new(Album::new(container).with_artwork(Arc::new(StaticCover)))
}

pub fn song(n: u32) -> Song {
    Song::new(
        ItemId::from_parts(PROVIDER, "sg", n.to_string()).unwrap(),
        format!("Song {n}"),
        Duration::from_secs(200 + u64::from(n)),
        album(),
    )
    .with_artists(vec![
        Artist::new(ItemId::from_parts(PROVIDER, "ar", "1").unwrap(), "Alice"),
        Artist::new(ItemId::from_parts(PROVIDER, "ar", "2").unwrap(), "Bob"),
    ])
}

pub fn songs(range: std::ops::Range<u32>) -> Vec<Song> {
    range.map(song).collect()
}

pub fn linear_container(actual_id: &str) -> Container {
    Container::new(
        ItemId::from_parts(PROVIDER, "pl", actual_id).unwrap(),
        "Playlist",
        SourceKind::Linear,
    )
}

pub fn radio_container() -> Container {
    Container::new(
        ItemId::from_parts(PROVIDER, "fm", "radio").unwrap(),
        "Personal FM",
        SourceKind::Interactive,
    )
}

/// Provider with canned catalogs. Interactive sources hand out songs
/// numbered from 1000 upwards.
#[derive(Default)]
pub struct FakeProvider {
    catalogs: HashMap<String, Vec<Song>>,
    lyrics: HashMap<String, RawLyric>,
    next_counter: AtomicU32,
    fail_media: AtomicBool,
    media_calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(mut self, container: &Container, songs: Vec<Song>) -> Self {
        self.catalogs.insert(container.id.in_provider_id(), songs);
        self
    }

    pub fn with_lyric(mut self, song: &Song, lyric: RawLyric) -> Self {
        self.lyrics.insert(song.id.in_provider_id(), lyric);
        self
    }

    pub fn fail_media(&self, fail: bool) {
        self.fail_media.store(fail, Ordering::SeqCst);
    }

    pub fn media_calls(&self) -> Vec<String> {
        self.media_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MusicProvider for FakeProvider {
    fn id(&self) -> &str {
        PROVIDER
    }

    fn name(&self) -> &str {
        "Fake Music"
    }

    fn supported_source_types(&self) -> Vec<(String, String)> {
        vec![
            ("sg".to_string(), "Song".to_string()),
            ("pl".to_string(), "Playlist".to_string()),
            ("fm".to_string(), "Radio".to_string()),
        ]
    }

    async fn resolve_item(&self, in_provider_id: &str) -> Result<ProvidableItem> {
        self.catalogs
            .values()
            .flatten()
            .find(|song| song.id.in_provider_id() == in_provider_id)
            .cloned()
            .map(ProvidableItem::Song)
            .ok_or_else(|| {
                LibraryError::provider(PROVIDER, format!("unknown item {in_provider_id}"))
            })
    }

    async fn resolve_media_source(&self, in_provider_id: &str) -> Result<MediaSource> {
        self.media_calls
            .lock()
            .unwrap()
            .push(in_provider_id.to_string());
        if self.fail_media.load(Ordering::SeqCst) {
            return Err(LibraryError::provider(PROVIDER, "offline"));
        }
        Ok(MediaSource::local(format!("/cache/{in_provider_id}.mp3")))
    }

    async fn resolve_container_items(&self, in_provider_id: &str) -> Result<Vec<Song>> {
        self.catalogs
            .get(in_provider_id)
            .cloned()
            .ok_or_else(|| {
                LibraryError::provider(PROVIDER, format!("unknown container {in_provider_id}"))
            })
    }

    async fn resolve_next_item(&self, _in_provider_id: &str) -> Result<Song> {
        let n = self.next_counter.fetch_add(1, Ordering::SeqCst);
        Ok(song(1000 + n))
    }

    async fn resolve_lyric(&self, in_provider_id: &str) -> Result<RawLyric> {
        Ok(self
            .lyrics
            .get(in_provider_id)
            .cloned()
            .unwrap_or(RawLyric::Missing))
    }
}

/// Wraps [`FakeProvider`] with translated lyrics.
pub struct TranslatingFake {
    inner: FakeProvider,
    translations: HashMap<String, RawLyric>,
}

impl TranslatingFake {
    pub fn new(inner: FakeProvider) -> Self {
        Self {
            inner,
            translations: HashMap::new(),
        }
    }

    pub fn with_translation(mut self, song: &Song, lyric: RawLyric) -> Self {
        self.translations.insert(song.id.in_provider_id(), lyric);
        self
    }
}

#[async_trait]
impl MusicProvider for TranslatingFake {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supported_source_types(&self) -> Vec<(String, String)> {
        self.inner.supported_source_types()
    }

    async fn resolve_item(&self, in_provider_id: &str) -> Result<ProvidableItem> {
        self.inner.resolve_item(in_provider_id).await
    }

    async fn resolve_media_source(&self, in_provider_id: &str) -> Result<MediaSource> {
        self.inner.resolve_media_source(in_provider_id).await
    }

    async fn resolve_container_items(&self, in_provider_id: &str) -> Result<Vec<Song>> {
        self.inner.resolve_container_items(in_provider_id).await
    }

    async fn resolve_next_item(&self, in_provider_id: &str) -> Result<Song> {
        self.inner.resolve_next_item(in_provider_id).await
    }

    async fn resolve_lyric(&self, in_provider_id: &str) -> Result<RawLyric> {
        self.inner.resolve_lyric(in_provider_id).await
    }

    fn as_translating(&self) -> Option<&dyn TranslatingProvider> {
        Some(self)
    }
}

#[async_trait]
impl TranslatingProvider for TranslatingFake {
    async fn resolve_translated_lyric(&self, in_provider_id: &str) -> Result<RawLyric> {
        Ok(self
            .translations
            .get(in_provider_id)
            .cloned()
            .unwrap_or(RawLyric::Missing))
    }
}

pub struct Harness {
    pub core: Arc<PlayCore>,
    pub backend: Arc<NullBackend>,
    pub provider: Arc<FakeProvider>,
    pub events: EventStream,
}

pub fn harness_with(provider: FakeProvider, config: PlayerConfig) -> Harness {
    let bus = EventBus::new(256);
    let events = bus.stream();
    let backend =
        Arc::new(NullBackend::new(bus.clone()).with_duration_hint(Duration::from_secs(200)));
    let provider = Arc::new(provider);
    let core = Arc::new(PlayCore::new(backend.clone(), bus, config));
    core.register_provider(provider.clone());
    Harness {
        core,
        backend,
        provider,
        events,
    }
}

pub fn harness() -> Harness {
    harness_with(FakeProvider::new(), PlayerConfig::default())
}

pub fn playlist_events(events: &mut EventStream) -> Vec<PlaylistEvent> {
    events
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::Playlist(event) => Some(event),
            _ => None,
        })
        .collect()
}

/// Poll until `check` holds, yielding to spawned tasks in between.
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
