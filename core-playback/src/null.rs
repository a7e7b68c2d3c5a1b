//! Backend that renders nothing.
//!
//! Tracks state, emits the same events a real backend would and keeps a
//! call history. Used for headless hosts and for exercising the playback
//! core without an audio stack.

use async_trait::async_trait;
use bridge_traits::device::OutputDevice;
use core_library::models::MediaSource;
use core_runtime::events::{EventBus, PlaybackEvent};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::watch;

use crate::error::{PlaybackError, Result};
use crate::traits::{
    validate_playback_rate, validate_volume, BackendCapabilities, BackendStatus, Capability,
    LoadOutcome, PlayState, PlaybackBackend,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Load(Option<String>),
    Play,
    Pause,
    Stop,
    Seek(Duration),
    SetVolume(u32),
    SetPlaybackRate(u32),
}

#[derive(Default)]
struct NullState {
    media: Option<MediaSource>,
    load_failure: Option<String>,
    last_error: Option<String>,
    history: Vec<BackendCall>,
}

pub struct NullBackend {
    events: EventBus,
    duration_hint: Duration,
    state: Mutex<NullState>,
    status: watch::Sender<BackendStatus>,
}

impl NullBackend {
    pub fn new(events: EventBus) -> Self {
        let (status, _) = watch::channel(BackendStatus::default());
        Self {
            events,
            duration_hint: Duration::ZERO,
            state: Mutex::new(NullState::default()),
            status,
        }
    }

    /// Duration reported for every loaded media.
    pub fn with_duration_hint(mut self, duration: Duration) -> Self {
        self.duration_hint = duration;
        self
    }

    /// Make every subsequent load fail with `message`.
    pub fn with_load_failure(self, message: impl Into<String>) -> Self {
        self.set_load_failure(Some(message.into()));
        self
    }

    pub fn set_load_failure(&self, message: Option<String>) {
        self.state.lock().load_failure = message;
    }

    pub fn history(&self) -> Vec<BackendCall> {
        self.state.lock().history.clone()
    }

    pub fn clear_history(&self) {
        self.state.lock().history.clear();
    }

    pub fn loaded_media(&self) -> Option<MediaSource> {
        self.state.lock().media.clone()
    }

    /// Simulate the loaded media reaching its end.
    pub fn finish(&self) {
        if self.state.lock().media.is_some() {
            self.status.send_modify(|status| status.position = status.duration);
            self.events.publish(PlaybackEvent::MediaEnded);
        }
    }

    fn record(&self, call: BackendCall) {
        self.state.lock().history.push(call);
    }

    fn set_play_state(&self, play_state: PlayState) {
        self.status.send_modify(|status| status.play_state = play_state);
    }
}

#[async_trait]
impl PlaybackBackend for NullBackend {
    fn id(&self) -> &str {
        "null"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            device_switch: false,
            ..BackendCapabilities::all()
        }
    }

    fn status(&self) -> BackendStatus {
        self.status.borrow().clone()
    }

    fn watch_status(&self) -> watch::Receiver<BackendStatus> {
        self.status.subscribe()
    }

    fn is_available(&self) -> bool {
        true
    }

    fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    fn output_devices(&self) -> Vec<OutputDevice> {
        Vec::new()
    }

    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn load(&self, media: Option<MediaSource>) -> Result<LoadOutcome> {
        self.record(BackendCall::Load(media.as_ref().map(MediaSource::describe)));

        let Some(media) = media else {
            self.state.lock().media = None;
            self.status.send_modify(|status| {
                status.play_state = PlayState::None;
                status.position = Duration::ZERO;
                status.duration = Duration::ZERO;
            });
            return Ok(LoadOutcome::Unloaded);
        };

        let failure = {
            let mut state = self.state.lock();
            let failure = state.load_failure.clone();
            match &failure {
                Some(message) => {
                    state.media = None;
                    state.last_error = Some(message.clone());
                }
                None => state.media = Some(media),
            }
            failure
        };

        if let Some(message) = failure {
            self.set_play_state(PlayState::Failed);
            self.events.publish(PlaybackEvent::Failed {
                message: message.clone(),
            });
            return Err(PlaybackError::BackendUnavailable(message));
        }

        let duration = self.duration_hint;
        self.status.send_modify(|status| {
            status.play_state = PlayState::Loaded;
            status.position = Duration::ZERO;
            status.duration = duration;
        });
        self.events.publish(PlaybackEvent::MediaLoaded {
            duration_ms: duration.as_millis() as u64,
        });
        Ok(LoadOutcome::Loaded)
    }

    async fn play(&self) -> Result<()> {
        self.record(BackendCall::Play);
        if self.state.lock().media.is_some() {
            self.set_play_state(PlayState::Playing);
            self.events.publish(PlaybackEvent::Playing);
        } else {
            self.set_play_state(PlayState::None);
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record(BackendCall::Pause);
        if self.state.lock().media.is_some() {
            self.set_play_state(PlayState::Paused);
            self.events.publish(PlaybackEvent::Paused);
        } else {
            self.set_play_state(PlayState::None);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.record(BackendCall::Stop);
        self.state.lock().media = None;
        self.status.send_modify(|status| {
            status.play_state = PlayState::None;
            status.position = Duration::ZERO;
            status.duration = Duration::ZERO;
        });
        self.events.publish(PlaybackEvent::Stopped);
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<()> {
        self.record(BackendCall::Seek(position));
        if self.state.lock().media.is_some() {
            self.status.send_modify(|status| status.position = position);
        }
        Ok(())
    }

    async fn set_volume(&self, volume: u32) -> Result<()> {
        validate_volume(volume)?;
        self.record(BackendCall::SetVolume(volume));
        self.status.send_modify(|status| status.volume = volume);
        Ok(())
    }

    async fn set_playback_rate(&self, rate: u32) -> Result<()> {
        validate_playback_rate(rate)?;
        self.record(BackendCall::SetPlaybackRate(rate));
        self.status.send_modify(|status| status.playback_rate = rate);
        Ok(())
    }

    async fn change_output_device(&self, _device: OutputDevice) -> Result<()> {
        self.capabilities().require(Capability::DeviceSwitch)
    }

    async fn refresh_output_devices(&self) -> Result<Vec<OutputDevice>> {
        Ok(Vec::new())
    }

    async fn switch_background(&self) -> Result<()> {
        Ok(())
    }
}
