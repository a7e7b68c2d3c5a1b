//! # Transport-Control Adapter
//!
//! Mirrors playback onto the platform "now playing" surface and turns the
//! surface's button and seek requests back into core calls.
//!
//! ## Outbound
//!
//! | event | surface call |
//! |---|---|
//! | item changed | enable buttons, metadata, timeline, cover (spawned) |
//! | playing / paused / stopped | playback status |
//! | position changed | timeline, when `sync_transport_position` is set |
//! | list cleared | disable buttons, status stopped |
//!
//! ## Inbound
//!
//! Every one of the five buttons maps to a core call. A button name the core
//! does not model is returned as [`CoreError::UnrecognizedButton`] and stops
//! [`TransportControlAdapter::run`].

use bridge_traits::transport::{
    NowPlayingMetadata, TimelineProperties, TransportButton, TransportControlSurface,
    TransportRequest, TransportStatus,
};
use core_library::models::{ArtworkSize, Song};
use core_runtime::events::{CoreEvent, PlaybackEvent, PlaylistEvent};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::{CoreError, Result};
use crate::player::PlayCore;

const DEFAULT_COVER_EDGE: u32 = 300;

pub struct TransportControlAdapter {
    core: Arc<PlayCore>,
    surface: Arc<dyn TransportControlSurface>,
    cover_size: ArtworkSize,
    cover_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl TransportControlAdapter {
    pub fn new(core: Arc<PlayCore>, surface: Arc<dyn TransportControlSurface>) -> Self {
        Self {
            core,
            surface,
            cover_size: ArtworkSize::square(DEFAULT_COVER_EDGE),
            cover_task: parking_lot::Mutex::new(None),
        }
    }

    pub fn with_cover_size(mut self, size: ArtworkSize) -> Self {
        self.cover_size = size;
        self
    }

    fn enabled(&self) -> bool {
        self.core.config().sync_transport
    }

    /// Subscribe to the core's bus and mirror every event onto the surface.
    ///
    /// Returns `None` when transport sync is disabled. The task ends when the
    /// adapter is dropped.
    pub fn spawn_event_pump(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.enabled() {
            debug!("Transport sync disabled");
            return None;
        }
        let receiver = self.core.events().subscribe();
        Some(tokio::spawn(pump_events(Arc::downgrade(self), receiver)))
    }

    /// Mirror one event onto the surface.
    pub async fn mirror(&self, event: &CoreEvent) -> Result<()> {
        if !self.enabled() {
            return Ok(());
        }
        match event {
            CoreEvent::Playlist(PlaylistEvent::ItemChanged { new: Some(song), .. }) => {
                self.show_song(song).await?
            }
            CoreEvent::Playlist(PlaylistEvent::ListCleared { .. }) => {
                self.surface.set_enabled_buttons(Vec::new()).await?;
                self.surface
                    .set_playback_status(TransportStatus::Stopped)
                    .await?;
            }
            CoreEvent::Playback(PlaybackEvent::Playing) => {
                self.surface
                    .set_playback_status(TransportStatus::Playing)
                    .await?
            }
            CoreEvent::Playback(PlaybackEvent::Paused) => {
                self.surface
                    .set_playback_status(TransportStatus::Paused)
                    .await?
            }
            CoreEvent::Playback(PlaybackEvent::Stopped) => {
                self.surface
                    .set_playback_status(TransportStatus::Stopped)
                    .await?
            }
            CoreEvent::Playback(PlaybackEvent::PositionChanged {
                position_ms,
                duration_ms,
            }) if self.core.config().sync_transport_position => {
                let timeline = TimelineProperties::spanning(Duration::from_millis(*duration_ms))
                    .with_position(Duration::from_millis(*position_ms));
                self.surface.update_timeline(timeline).await?
            }
            _ => {}
        }
        Ok(())
    }

    async fn show_song(&self, song: &Song) -> Result<()> {
        self.surface
            .set_enabled_buttons(TransportButton::ALL.to_vec())
            .await?;
        self.surface
            .update_metadata(NowPlayingMetadata {
                title: song.name.clone(),
                artist: song.artists_string(),
                album_title: song.album.name().to_string(),
                duration: song.duration,
            })
            .await?;
        self.surface
            .update_timeline(TimelineProperties::spanning(song.duration))
            .await?;
        self.spawn_cover_fetch(song);
        Ok(())
    }

    /// Fetch the cover off the event path. A newer song cancels the fetch.
    fn spawn_cover_fetch(&self, song: &Song) {
        let album = Arc::clone(&song.album);
        let surface = Arc::clone(&self.surface);
        let size = self.cover_size;
        let song_id = song.id.clone();

        let task = tokio::spawn(async move {
            match album.cover_stream(size).await {
                Ok(image) => {
                    if let Err(err) = surface.update_thumbnail(image).await {
                        warn!(song = %song_id, error = %err, "Failed to push cover");
                    }
                }
                Err(err) => debug!(song = %song_id, error = %err, "No cover for song"),
            }
        });

        if let Some(previous) = self.cover_task.lock().replace(task) {
            previous.abort();
        }
    }

    /// Translate one surface request into a core call.
    pub async fn handle_request(&self, request: TransportRequest) -> Result<()> {
        match request {
            TransportRequest::Button(raw) => {
                let button = raw
                    .parse::<TransportButton>()
                    .map_err(|_| CoreError::UnrecognizedButton(raw.clone()))?;
                debug!(%button, "Transport button");
                match button {
                    TransportButton::Play => self.core.play().await,
                    TransportButton::Pause => self.core.pause().await,
                    TransportButton::Stop => self.core.stop().await,
                    TransportButton::Next => self.core.move_next_and_play().await,
                    TransportButton::Previous => self.core.move_previous_and_play().await,
                }
            }
            TransportRequest::Seek(position) => self.core.seek(position).await,
        }
    }

    /// Serve surface requests until the channel closes.
    ///
    /// Ordinary failures are logged and the loop continues; a contract
    /// violation ends it with the error.
    pub async fn run(&self, mut requests: mpsc::Receiver<TransportRequest>) -> Result<()> {
        while let Some(request) = requests.recv().await {
            match self.handle_request(request).await {
                Ok(()) => {}
                Err(err) if err.is_contract_violation() => {
                    error!(error = %err, "Transport surface sent an unmodeled request");
                    return Err(err);
                }
                Err(err) => warn!(error = %err, "Transport request failed"),
            }
        }
        Ok(())
    }
}

impl Drop for TransportControlAdapter {
    fn drop(&mut self) {
        if let Some(task) = self.cover_task.get_mut().take() {
            task.abort();
        }
    }
}

async fn pump_events(
    adapter: Weak<TransportControlAdapter>,
    mut receiver: tokio::sync::broadcast::Receiver<CoreEvent>,
) {
    loop {
        let event = match receiver.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "Transport adapter lagged behind the event bus");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        let Some(adapter) = adapter.upgrade() else {
            break;
        };
        if let Err(err) = adapter.mirror(&event).await {
            warn!(event = event.description(), error = %err, "Failed to mirror event");
        }
    }
}
