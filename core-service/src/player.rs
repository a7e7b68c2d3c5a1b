//! # Playback Core
//!
//! Owns the playlist, the play-pointer, the roll mode and the bound source,
//! and drives a [`PlaybackBackend`] through providers resolved from the
//! [`ProviderRegistry`].
//!
//! ## Invariant
//!
//! Whenever the pointer is `Some(i)`, `i < playlist.len()` and `now_playing`
//! equals `playlist[i]`, which is also the `new` song of the last published
//! item-changed event. Every mutation below keeps that true.
//!
//! ## Locking
//!
//! Playlist state sits behind a `parking_lot` mutex that is never held across
//! an `.await`. Provider calls and backend calls happen outside it.

use core_library::lyrics::compose_lyrics;
use core_library::models::{Container, LyricLine, RollMode, Song, SourceKind};
use core_library::provider::{MusicProvider, ProviderRegistry};
use core_playback::PlaybackBackend;
use core_runtime::config::PlayerConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, PlaylistEvent};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};

#[derive(Debug, Default)]
struct PlaylistState {
    playlist: Vec<Song>,
    pointer: Option<usize>,
    roll_mode: RollMode,
    source: Option<Container>,
    list_version: u64,
    now_playing: Option<Song>,
    lyrics: Vec<LyricLine>,
}

impl PlaylistState {
    fn bump(&mut self) -> u64 {
        self.list_version += 1;
        self.list_version
    }

    fn reset(&mut self) {
        self.playlist.clear();
        self.pointer = None;
        self.now_playing = None;
        self.lyrics.clear();
    }

    /// Shift the pointer for `count` songs inserted at `index`.
    fn shift_for_insert(&mut self, index: usize, count: usize) {
        if let Some(pointer) = self.pointer {
            if index <= pointer {
                self.pointer = Some(pointer + count);
            }
        }
    }
}

enum Removal {
    Ignored,
    Emptied,
    Plain,
    CurrentReplaced,
}

/// Pick the index that follows `pointer` in a list of `len` songs.
///
/// `Shuffled` draws uniformly from every index except the current one; a
/// single-song list always yields 0.
pub fn next_pointer(pointer: Option<usize>, len: usize, mode: RollMode) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match mode {
        RollMode::DefaultRoll => Some(pointer.map_or(0, |p| (p + 1) % len)),
        RollMode::SinglePlay => pointer,
        RollMode::Shuffled => {
            if len == 1 {
                return Some(0);
            }
            let mut rng = rand::thread_rng();
            match pointer.filter(|p| *p < len) {
                Some(current) => {
                    let pick = rng.gen_range(0..len - 1);
                    Some(if pick >= current { pick + 1 } else { pick })
                }
                None => Some(rng.gen_range(0..len)),
            }
        }
    }
}

/// The playback orchestrator.
pub struct PlayCore {
    state: Mutex<PlaylistState>,
    providers: RwLock<ProviderRegistry>,
    backend: Arc<dyn PlaybackBackend>,
    events: EventBus,
    config: PlayerConfig,
}

impl PlayCore {
    pub fn new(backend: Arc<dyn PlaybackBackend>, events: EventBus, config: PlayerConfig) -> Self {
        let state = PlaylistState {
            roll_mode: config.default_roll_mode,
            ..PlaylistState::default()
        };
        Self {
            state: Mutex::new(state),
            providers: RwLock::new(ProviderRegistry::new()),
            backend,
            events,
            config,
        }
    }

    // ========================================================================
    // Providers
    // ========================================================================

    pub fn register_provider(&self, provider: Arc<dyn MusicProvider>) {
        self.providers.write().register(provider);
    }

    pub fn register_providers<I>(&self, providers: I)
    where
        I: IntoIterator<Item = Arc<dyn MusicProvider>>,
    {
        self.providers.write().register_all(providers);
    }

    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.read().ids()
    }

    fn provider(&self, provider_id: &str) -> Result<Arc<dyn MusicProvider>> {
        Ok(self.providers.read().get(provider_id)?)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn playlist(&self) -> Vec<Song> {
        self.state.lock().playlist.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().playlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().playlist.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.lock().pointer
    }

    pub fn now_playing(&self) -> Option<Song> {
        self.state.lock().now_playing.clone()
    }

    pub fn list_version(&self) -> u64 {
        self.state.lock().list_version
    }

    pub fn roll_mode(&self) -> RollMode {
        self.state.lock().roll_mode
    }

    pub fn set_roll_mode(&self, mode: RollMode) {
        self.state.lock().roll_mode = mode;
        debug!(?mode, "Roll mode changed");
    }

    /// Set the roll mode from its stored numeric code.
    pub fn set_roll_mode_code(&self, code: u8) -> Result<()> {
        let mode = RollMode::try_from(code)?;
        self.set_roll_mode(mode);
        Ok(())
    }

    pub fn source(&self) -> Option<Container> {
        self.state.lock().source.clone()
    }

    pub fn lyrics(&self) -> Vec<LyricLine> {
        self.state.lock().lyrics.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn backend(&self) -> &Arc<dyn PlaybackBackend> {
        &self.backend
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    fn publish(&self, event: PlaylistEvent) {
        self.events.publish(event);
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    pub fn append(&self, song: Song) {
        self.append_range(std::iter::once(song));
    }

    pub fn append_range<I>(&self, songs: I)
    where
        I: IntoIterator<Item = Song>,
    {
        let mut state = self.state.lock();
        let before = state.playlist.len();
        state.playlist.extend(songs);
        let version = state.bump();
        debug!(added = state.playlist.len() - before, version, "Appended to playlist");
        self.publish(PlaylistEvent::ListChanged { version });
    }

    /// Insert at `index`, which must be within `0..=len`.
    pub fn insert(&self, song: Song, index: usize) -> Result<()> {
        self.insert_range(vec![song], index)
    }

    pub fn insert_range(&self, songs: Vec<Song>, index: usize) -> Result<()> {
        let mut state = self.state.lock();
        let len = state.playlist.len();
        if index > len {
            return Err(CoreError::IndexOutOfRange { index, len });
        }
        let count = songs.len();
        state.playlist.splice(index..index, songs);
        state.shift_for_insert(index, count);
        let version = state.bump();
        debug!(index, count, version, "Inserted into playlist");
        self.publish(PlaylistEvent::ListChanged { version });
        Ok(())
    }

    /// Insert at the play-pointer position, ahead of the current song, or at
    /// the head when nothing is selected. The pointer shifts so the current
    /// song stays selected, which means a following `move_next` does not land
    /// on the inserted song.
    pub fn insert_next(&self, song: Song) {
        let mut state = self.state.lock();
        let index = state.pointer.unwrap_or(0);
        state.playlist.insert(index, song);
        state.shift_for_insert(index, 1);
        let version = state.bump();
        self.publish(PlaylistEvent::ListChanged { version });
    }

    /// Remove the song at `index`. Out-of-range indices are ignored.
    ///
    /// Removing the only song clears the playlist and stops the backend.
    /// Removing the selected song selects its successor and loads it.
    pub async fn remove_at(&self, index: usize) -> Result<()> {
        let removal = {
            let mut state = self.state.lock();
            let len = state.playlist.len();
            if index >= len {
                Removal::Ignored
            } else if len == 1 {
                Removal::Emptied
            } else {
                match state.pointer {
                    Some(pointer) if pointer == index => {
                        let removed = state.playlist.remove(index);
                        let pointer = if index >= state.playlist.len() { 0 } else { index };
                        state.pointer = Some(pointer);
                        let new = state.playlist[pointer].clone();
                        state.now_playing = Some(new.clone());
                        let version = state.bump();
                        self.publish(PlaylistEvent::ListChanged { version });
                        self.publish(PlaylistEvent::ItemChanged {
                            new: Some(new),
                            old: Some(removed),
                        });
                        Removal::CurrentReplaced
                    }
                    Some(pointer) if index < pointer => {
                        state.pointer = Some(pointer - 1);
                        state.playlist.remove(index);
                        let version = state.bump();
                        self.publish(PlaylistEvent::ListChanged { version });
                        Removal::Plain
                    }
                    _ => {
                        state.playlist.remove(index);
                        let version = state.bump();
                        self.publish(PlaylistEvent::ListChanged { version });
                        Removal::Plain
                    }
                }
            }
        };

        match removal {
            Removal::Ignored => {
                debug!(index, "Ignoring stale remove");
                Ok(())
            }
            Removal::Plain => Ok(()),
            Removal::Emptied => {
                self.clear();
                self.backend.stop().await?;
                Ok(())
            }
            Removal::CurrentReplaced => self.load_now_playing().await,
        }
    }

    /// Empty the playlist and publish list-cleared.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.reset();
        let version = state.bump();
        info!(version, "Playlist cleared");
        self.publish(PlaylistEvent::ListCleared { version });
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// The index [`move_next`](Self::move_next) would select.
    pub fn next_pointer(&self) -> Option<usize> {
        let state = self.state.lock();
        next_pointer(state.pointer, state.playlist.len(), state.roll_mode)
    }

    /// Select `index`. Returns `false` and does nothing when it is out of range.
    pub fn move_to(&self, index: usize) -> bool {
        let mut state = self.state.lock();
        let Some(song) = state.playlist.get(index).cloned() else {
            debug!(index, len = state.playlist.len(), "Ignoring move outside playlist");
            return false;
        };
        state.pointer = Some(index);
        let old = state.now_playing.replace(song.clone());
        state.lyrics.clear();
        info!(index, song = %song.id, "Moved play pointer");
        self.publish(PlaylistEvent::ItemChanged {
            new: Some(song),
            old,
        });
        true
    }

    /// Advance by the roll mode. An interactive source first replaces the
    /// playlist with the single next item resolved from its provider.
    pub async fn move_next(&self) -> Result<()> {
        let source = self.source();
        if let Some(source) = source.filter(|s| s.source_kind == SourceKind::Interactive) {
            let provider = self.provider(source.id.provider_id())?;
            let song = provider
                .resolve_next_item(&source.id.in_provider_id())
                .await?;

            let mut state = self.state.lock();
            state.playlist.clear();
            state.playlist.push(song);
            state.pointer = state.pointer.map(|_| 0);
            let version = state.bump();
            self.publish(PlaylistEvent::ListChanged { version });
        }

        if let Some(index) = self.next_pointer() {
            self.move_to(index);
        }
        Ok(())
    }

    /// Step back one song, wrapping to the last from the head.
    pub fn move_previous(&self) {
        let target = {
            let state = self.state.lock();
            let len = state.playlist.len();
            if len == 0 {
                return;
            }
            match state.pointer {
                Some(pointer) if pointer > 0 => pointer - 1,
                _ => len - 1,
            }
        };
        self.move_to(target);
    }

    // ========================================================================
    // Source Binding
    // ========================================================================

    /// Bind `container` as the playlist source. Does not reload the playlist.
    pub fn bind_source(&self, container: Container) {
        self.state.lock().source = Some(container.clone());
        info!(source = %container.id, kind = ?container.source_kind, "Playlist source bound");
        self.publish(PlaylistEvent::SourceChanged { source: container });
    }

    /// Replace the playlist with the bound source's items: the full list for
    /// a linear source, one item for an interactive one.
    pub async fn load_from_source(&self) -> Result<()> {
        let source = self.source().ok_or(CoreError::NoSourceBound)?;
        let provider = self.provider(source.id.provider_id())?;
        let in_provider_id = source.id.in_provider_id();

        let songs = match source.source_kind {
            SourceKind::Linear => provider.resolve_container_items(&in_provider_id).await?,
            SourceKind::Interactive => vec![provider.resolve_next_item(&in_provider_id).await?],
        };

        debug!(source = %source.id, count = songs.len(), "Loaded playlist from source");
        self.clear();
        self.append_range(songs);
        Ok(())
    }

    // ========================================================================
    // Media
    // ========================================================================

    /// Resolve the selected song's media and hand it to the backend.
    pub async fn load_now_playing(&self) -> Result<()> {
        let song = self.now_playing().ok_or(CoreError::NothingSelected)?;
        let provider = self.provider(song.provider_id())?;
        let media = provider
            .resolve_media_source(&song.id.in_provider_id())
            .await?;
        debug!(song = %song.id, media = %media.describe(), "Loading now playing");
        self.backend.load(Some(media)).await?;
        Ok(())
    }

    /// Resolve and publish lyrics for the selected song.
    ///
    /// Publishes the loading sentinel first. The result is dropped if the
    /// selection changed while resolving.
    pub async fn load_lyrics(&self) -> Result<Vec<LyricLine>> {
        let song = self.now_playing().ok_or(CoreError::NothingSelected)?;
        self.replace_lyrics(&song, vec![LyricLine::loading()]);

        let provider = self.provider(song.provider_id())?;
        let in_provider_id = song.id.in_provider_id();
        let primary = provider.resolve_lyric(&in_provider_id).await?;
        let translation = match provider.as_translating() {
            Some(translating) => Some(translating.resolve_translated_lyric(&in_provider_id).await?),
            None => None,
        };

        let lines = compose_lyrics(primary, translation);
        self.replace_lyrics(&song, lines.clone());
        Ok(lines)
    }

    fn replace_lyrics(&self, song: &Song, lines: Vec<LyricLine>) {
        let mut state = self.state.lock();
        if state.now_playing.as_ref().map(|s| &s.id) != Some(&song.id) {
            debug!(song = %song.id, "Discarding lyrics for deselected song");
            return;
        }
        state.lyrics = lines.clone();
        self.publish(PlaylistEvent::LyricsChanged { lines });
    }

    // ========================================================================
    // Backend Passthrough
    // ========================================================================

    pub async fn play(&self) -> Result<()> {
        Ok(self.backend.play().await?)
    }

    pub async fn pause(&self) -> Result<()> {
        Ok(self.backend.pause().await?)
    }

    pub async fn stop(&self) -> Result<()> {
        Ok(self.backend.stop().await?)
    }

    pub async fn seek(&self, position: Duration) -> Result<()> {
        Ok(self.backend.seek(position).await?)
    }

    pub async fn set_volume(&self, volume: u32) -> Result<()> {
        Ok(self.backend.set_volume(volume).await?)
    }

    pub async fn set_playback_rate(&self, rate: u32) -> Result<()> {
        Ok(self.backend.set_playback_rate(rate).await?)
    }

    // ========================================================================
    // Auto-advance
    // ========================================================================

    /// Advance and play whenever the backend reports the media ended.
    ///
    /// The task ends when the core is dropped. Disabled by
    /// `PlayerConfig::auto_advance`, in which case it still runs but ignores
    /// the events.
    pub fn spawn_auto_advance(self: &Arc<Self>) -> JoinHandle<()> {
        let receiver = self.events.subscribe();
        let core = Arc::downgrade(self);
        tokio::spawn(auto_advance_loop(core, receiver))
    }
}

async fn auto_advance_loop(
    core: Weak<PlayCore>,
    mut receiver: tokio::sync::broadcast::Receiver<CoreEvent>,
) {
    loop {
        match receiver.recv().await {
            Ok(CoreEvent::Playback(PlaybackEvent::MediaEnded)) => {
                let Some(core) = core.upgrade() else {
                    break;
                };
                if !core.config.auto_advance {
                    continue;
                }
                if let Err(err) = core.move_next_and_play().await {
                    warn!(error = %err, "Auto-advance failed");
                }
            }
            Ok(_) => {
                if core.strong_count() == 0 {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Auto-advance lagged behind the event bus");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_roll_wraps() {
        assert_eq!(next_pointer(Some(4), 5, RollMode::DefaultRoll), Some(0));
        assert_eq!(next_pointer(Some(2), 5, RollMode::DefaultRoll), Some(3));
        assert_eq!(next_pointer(None, 5, RollMode::DefaultRoll), Some(0));
    }

    #[test]
    fn single_play_repeats() {
        for pointer in [None, Some(0), Some(3)] {
            assert_eq!(next_pointer(pointer, 5, RollMode::SinglePlay), pointer);
        }
    }

    #[test]
    fn empty_list_has_no_next() {
        for mode in [RollMode::DefaultRoll, RollMode::SinglePlay, RollMode::Shuffled] {
            assert_eq!(next_pointer(Some(0), 0, mode), None);
        }
    }

    #[test]
    fn shuffle_avoids_current_and_covers_the_rest() {
        let mut seen = [false; 4];
        for _ in 0..500 {
            let next = next_pointer(Some(1), 4, RollMode::Shuffled).unwrap();
            assert!(next < 4);
            assert_ne!(next, 1);
            seen[next] = true;
        }
        assert_eq!(seen, [true, false, true, true]);
        assert_eq!(next_pointer(Some(0), 1, RollMode::Shuffled), Some(0));
    }
}
