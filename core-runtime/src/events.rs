//! # Event Bus System
//!
//! Typed publish/subscribe hub for playback lifecycle notifications, built on
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Event Types**: [`PlaybackEvent`] (what the backend is doing) and
//!   [`PlaylistEvent`] (what the playlist and play-pointer look like), wrapped in
//!   [`CoreEvent`]
//! - **EventBus**: the shared broadcast channel. Clone it to get another producer.
//! - **EventStream**: a receiver with optional filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐   subscribe   ┌───────────────────┐
//! │ PlayCore     ├────────────>│           ├──────────────>│ Transport adapter │
//! └──────────────┘             │ EventBus  │               └───────────────────┘
//! ┌──────────────┐    emit     │ (broadcast│   subscribe   ┌───────────────────┐
//! │ Backend      ├────────────>│  channel) ├──────────────>│ UI binding layer  │
//! └──────────────┘             └───────────┘               └───────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(64);
//! let mut subscriber = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Playing)).ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event, CoreEvent::Playback(PlaybackEvent::Playing));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n`
//!   events. Non-fatal. Position updates are the usual cause, so list observers
//!   should re-read state after a lag.
//! - **`RecvError::Closed`**: every sender was dropped. Treat it as shutdown.
//!
//! `emit` fails only when nobody is subscribed. Publishers ignore that.
//!
//! ## Change Signals
//!
//! List events carry a monotonically increasing `version`. Any new version
//! means "re-read the playlist"; observers never need to compare payloads.

use core_library::models::{Container, LyricLine, Song};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// A playing backend emits a position update every poll tick, so the buffer
/// needs room for a few seconds of those on top of list traffic.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published through the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Backend lifecycle
    Playback(PlaybackEvent),
    /// Playlist, play-pointer and bound source
    Playlist(PlaylistEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Playlist(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Playlist(PlaylistEvent::ItemChanged { .. })
            | CoreEvent::Playlist(PlaylistEvent::ListCleared { .. })
            | CoreEvent::Playlist(PlaylistEvent::SourceChanged { .. })
            | CoreEvent::Playback(PlaybackEvent::MediaLoaded { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    pub fn is_playback(&self) -> bool {
        matches!(self, CoreEvent::Playback(_))
    }

    pub fn is_playlist(&self) -> bool {
        matches!(self, CoreEvent::Playlist(_))
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events raised by a playback backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    Playing,
    Paused,
    Stopped,
    /// A load or device switch failed. The backend is left in `Failed`.
    Failed {
        /// Human-readable reason, same as the backend's last error.
        message: String,
    },
    /// Emitted by the poll timer when the position moved noticeably.
    PositionChanged { position_ms: u64, duration_ms: u64 },
    /// New media is ready to play (paused at the start).
    MediaLoaded { duration_ms: u64 },
    /// The current media played to its end.
    MediaEnded,
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Playing => "Playback started",
            PlaybackEvent::Paused => "Playback paused",
            PlaybackEvent::Stopped => "Playback stopped",
            PlaybackEvent::Failed { .. } => "Playback failed",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::MediaLoaded { .. } => "Media loaded",
            PlaybackEvent::MediaEnded => "Media ended",
        }
    }
}

// ============================================================================
// Playlist Events
// ============================================================================

/// Events raised by the playback core about its playlist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaylistEvent {
    /// The play-pointer now references a different song.
    ItemChanged {
        new: Option<Song>,
        old: Option<Song>,
    },
    /// The playlist was mutated; re-read it.
    ListChanged { version: u64 },
    /// The playlist was emptied. Observers should tear down now-playing state.
    ListCleared { version: u64 },
    /// A different container is bound as the playlist source.
    SourceChanged { source: Container },
    /// Lyric lines for the now-playing song were replaced.
    LyricsChanged { lines: Vec<LyricLine> },
}

impl PlaylistEvent {
    fn description(&self) -> &str {
        match self {
            PlaylistEvent::ItemChanged { .. } => "Now playing item changed",
            PlaylistEvent::ListChanged { .. } => "Playlist changed",
            PlaylistEvent::ListCleared { .. } => "Playlist cleared",
            PlaylistEvent::SourceChanged { .. } => "Playlist source changed",
            PlaylistEvent::LyricsChanged { .. } => "Lyrics changed",
        }
    }
}

impl From<PlaybackEvent> for CoreEvent {
    fn from(event: PlaybackEvent) -> Self {
        CoreEvent::Playback(event)
    }
}

impl From<PlaylistEvent> for CoreEvent {
    fn from(event: PlaylistEvent) -> Self {
        CoreEvent::Playlist(event)
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Clones share the same channel. Each [`subscribe`](Self::subscribe) call
/// creates an independent receiver that sees only events emitted after it.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus. Subscribers that fall more than `capacity`
    /// events behind receive `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: impl Into<CoreEvent>) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event.into())
    }

    /// Publishes an event and ignores the no-subscriber case.
    pub fn publish(&self, event: impl Into<CoreEvent>) {
        let event = event.into();
        if let Err(SendError(event)) = self.sender.send(event) {
            tracing::trace!(event = event.description(), "Event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Subscribe and wrap the receiver in an [`EventStream`].
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional filter.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus};
///
/// let bus = EventBus::new(16);
/// let playlist_only = bus.stream().filter(CoreEvent::is_playlist);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once every sender is gone.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive. `None` when nothing matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drain everything currently queued that passes the filter. Lag markers
    /// are skipped.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        loop {
            match self.try_recv() {
                Some(Ok(event)) => events.push(event),
                Some(Err(RecvError::Lagged(_))) => continue,
                Some(Err(RecvError::Closed)) | None => return events,
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
