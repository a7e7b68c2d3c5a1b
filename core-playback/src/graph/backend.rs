//! Audio-graph playback backend.
//!
//! Owns one graph per output device. The device output node carries the
//! effect chain and the gain; each load creates a media input node that is
//! connected to it. Superseded input nodes are stopped at once and disposed
//! by the poll task a few ticks later.
//!
//! ## Poll Task
//!
//! Runs while playing: started by `play`, aborted by `pause` and `stop`.
//! A tokio interval ticks every `position_poll_interval`. Each tick:
//! - compares the live node position with the last reported one and emits
//!   `PositionChanged` when it moved by at least `position_epsilon`
//! - every `sweep_every_ticks` ticks, disposes superseded nodes
//!
//! The task holds only a `Weak` reference to the backend and skips a tick
//! when a control operation holds the graph lock.

use async_trait::async_trait;
use bridge_traits::device::{OutputDevice, OutputDeviceEnumerator};
use core_library::models::MediaSource;
use core_runtime::config::PlayerConfig;
use core_runtime::events::{EventBus, PlaybackEvent};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use super::arena::{Generation, NodeArena};
use super::effects::{EffectChain, EffectKind};
use super::engine::{AudioGraph, AudioGraphEngine, InputNode, OutputNode};
use crate::error::{PlaybackError, Result};
use crate::traits::{
    validate_playback_rate, validate_volume, BackendCapabilities, BackendStatus, LoadOutcome,
    PlayState, PlaybackBackend,
};

const BACKEND_ID: &str = "audio-graph";
const NO_GENERATION: u64 = 0;

#[derive(Default)]
struct GraphState {
    graph: Option<Arc<dyn AudioGraph>>,
    output: Option<Arc<dyn OutputNode>>,
    nodes: NodeArena<Arc<dyn InputNode>>,
    effects: EffectChain,
    media: Option<MediaSource>,
    device: Option<OutputDevice>,
}

impl GraphState {
    fn current_node(&self) -> Option<Arc<dyn InputNode>> {
        self.nodes.current().cloned()
    }

    fn dispose_nodes(&mut self) {
        for node in self.nodes.clear() {
            node.stop();
            node.dispose();
        }
    }

    fn dispose_graph(&mut self) {
        self.dispose_nodes();
        if let Some(output) = self.output.take() {
            output.dispose();
        }
        if let Some(graph) = self.graph.take() {
            graph.dispose();
        }
    }
}

/// Tick bookkeeping for the poll task.
#[derive(Debug)]
struct PositionPoller {
    epsilon: Duration,
    sweep_every: u32,
    countdown: u32,
}

impl PositionPoller {
    fn new(config: &PlayerConfig) -> Self {
        let sweep_every = config.sweep_every_ticks.max(1);
        Self {
            epsilon: config.position_epsilon,
            sweep_every,
            countdown: sweep_every,
        }
    }

    fn moved(&self, reported: Duration, live: Duration) -> bool {
        let delta = if live > reported {
            live - reported
        } else {
            reported - live
        };
        delta >= self.epsilon && delta > Duration::ZERO
    }

    fn sweep_due(&mut self) -> bool {
        self.countdown -= 1;
        if self.countdown == 0 {
            self.countdown = self.sweep_every;
            true
        } else {
            false
        }
    }
}

struct Inner {
    engine: Arc<dyn AudioGraphEngine>,
    enumerator: Option<Arc<dyn OutputDeviceEnumerator>>,
    events: EventBus,
    config: PlayerConfig,
    graph: Mutex<GraphState>,
    status: watch::Sender<BackendStatus>,
    last_error: parking_lot::Mutex<Option<String>>,
    available: AtomicBool,
    live_generation: AtomicU64,
    devices: parking_lot::Mutex<Vec<OutputDevice>>,
    poller: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn set_play_state(&self, next: PlayState) {
        self.status.send_modify(|status| {
            if !status.play_state.can_transition_to(next) {
                warn!(from = ?status.play_state, to = ?next, "Unexpected play state transition");
            }
            status.play_state = next;
        });
    }

    fn record_failure(&self, error: &PlaybackError) {
        let message = error.to_string();
        warn!(error = %message, "Playback backend failure");
        *self.last_error.lock() = Some(message.clone());
        self.status.send_modify(|status| {
            status.play_state = PlayState::Failed;
            status.buffering = false;
        });
        self.events.publish(PlaybackEvent::Failed { message });
    }

    /// Create graph and output node for `state.device`.
    async fn build_graph(&self, state: &mut GraphState) -> Result<()> {
        let graph = self
            .engine
            .create_graph(state.device.as_ref())
            .await
            .map_err(PlaybackError::GraphCreation)?;

        let output = match graph.create_output_node().await {
            Ok(output) => output,
            Err(status) => {
                graph.dispose();
                return Err(PlaybackError::OutputNodeCreation(status));
            }
        };

        for definition in state.effects.definitions() {
            output.add_effect(definition);
        }
        for kind in [
            EffectKind::Echo,
            EffectKind::Reverb,
            EffectKind::Limiter,
            EffectKind::Equalizer,
        ] {
            output.set_effect_enabled(kind, state.effects.is_enabled(kind));
        }
        output.set_gain(self.status.borrow().gain());

        graph.start();
        state.graph = Some(graph);
        state.output = Some(output);
        Ok(())
    }

    async fn ensure_graph(&self, state: &mut GraphState) -> Result<()> {
        if state.graph.is_some() && state.output.is_some() {
            return Ok(());
        }
        match self.build_graph(state).await {
            Ok(()) => {
                self.available.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(err) => {
                self.available.store(false, Ordering::SeqCst);
                self.record_failure(&err);
                Err(err)
            }
        }
    }

    async fn load_media(
        self: &Arc<Self>,
        state: &mut GraphState,
        media: MediaSource,
    ) -> Result<()> {
        self.ensure_graph(state).await?;
        let (graph, output) = match (state.graph.clone(), state.output.clone()) {
            (Some(graph), Some(output)) => (graph, output),
            _ => return Err(PlaybackError::Internal("graph not built".to_string())),
        };

        if let Some(previous) = state.current_node() {
            previous.stop();
        }
        state.nodes.release_current();
        self.live_generation.store(NO_GENERATION, Ordering::SeqCst);

        self.status.send_modify(|status| {
            status.buffering = true;
            status.position = Duration::ZERO;
        });
        self.set_play_state(PlayState::Loading);
        debug!(media = %media.describe(), "Creating media input node");

        let node = match graph.create_input_node(&media).await {
            Ok(node) => node,
            Err(status) => {
                let err = PlaybackError::InputNodeCreation(status);
                state.media = None;
                self.record_failure(&err);
                return Err(err);
            }
        };

        node.stop();
        node.set_speed(self.status.borrow().speed());
        node.connect(&output);

        let generation = state.nodes.supersede(Arc::clone(&node));
        self.live_generation
            .store(generation.value(), Ordering::SeqCst);
        node.on_completed(completion_callback(Arc::downgrade(self), generation));

        let duration = node.duration();
        state.media = Some(media);
        self.status.send_modify(|status| {
            status.duration = duration;
            status.position = Duration::ZERO;
            status.buffering = false;
        });
        self.set_play_state(PlayState::Loaded);
        self.events.publish(PlaybackEvent::MediaLoaded {
            duration_ms: duration.as_millis() as u64,
        });
        Ok(())
    }

    fn ensure_poller(self: &Arc<Self>) {
        let mut poller = self.poller.lock();
        if poller.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let weak = Arc::downgrade(self);
        let period = self.config.position_poll_interval;
        let ticks = PositionPoller::new(&self.config);
        *poller = Some(tokio::spawn(run_poller(weak, period, ticks)));
    }

    fn stop_poller(&self) {
        if let Some(handle) = self.poller.lock().take() {
            handle.abort();
        }
    }

    fn poll_tick(&self, ticks: &mut PositionPoller) {
        let Ok(mut state) = self.graph.try_lock() else {
            return;
        };

        if let Some(node) = state.current_node() {
            let live = node.position();
            let (reported, duration) = {
                let status = self.status.borrow();
                (status.position, status.duration)
            };
            if ticks.moved(reported, live) {
                self.status.send_modify(|status| status.position = live);
                self.events.publish(PlaybackEvent::PositionChanged {
                    position_ms: live.as_millis() as u64,
                    duration_ms: duration.as_millis() as u64,
                });
            }
        }

        if ticks.sweep_due() {
            let stale = state.nodes.sweep();
            if !stale.is_empty() {
                debug!(count = stale.len(), "Disposing superseded input nodes");
            }
            for node in stale {
                node.dispose();
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.get_mut().take() {
            handle.abort();
        }
    }
}

fn completion_callback(inner: Weak<Inner>, generation: Generation) -> Box<dyn Fn() + Send + Sync> {
    Box::new(move || {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        if inner.live_generation.load(Ordering::SeqCst) == generation.value() {
            inner.events.publish(PlaybackEvent::MediaEnded);
        } else {
            debug!(%generation, "Ignoring completion from superseded node");
        }
    })
}

async fn run_poller(inner: Weak<Inner>, period: Duration, mut ticks: PositionPoller) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.poll_tick(&mut ticks);
    }
}

/// [`PlaybackBackend`] over a host [`AudioGraphEngine`].
///
/// Clones share the same graph.
#[derive(Clone)]
pub struct AudioGraphBackend {
    inner: Arc<Inner>,
}

impl AudioGraphBackend {
    pub fn new(engine: Arc<dyn AudioGraphEngine>, events: EventBus, config: PlayerConfig) -> Self {
        let status =
            BackendStatus::with_levels(config.default_volume, config.default_playback_rate);
        let (status, _) = watch::channel(status);
        Self {
            inner: Arc::new(Inner {
                engine,
                enumerator: None,
                events,
                config,
                graph: Mutex::new(GraphState::default()),
                status,
                last_error: parking_lot::Mutex::new(None),
                available: AtomicBool::new(false),
                live_generation: AtomicU64::new(NO_GENERATION),
                devices: parking_lot::Mutex::new(Vec::new()),
                poller: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Must be called before the backend is shared.
    pub fn with_device_enumerator(mut self, enumerator: Arc<dyn OutputDeviceEnumerator>) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.enumerator = Some(enumerator),
            None => warn!("Device enumerator ignored: backend already shared"),
        }
        self
    }

    /// Toggle one effect on the output node.
    pub async fn set_effect_enabled(&self, kind: EffectKind, enabled: bool) {
        let mut state = self.inner.graph.lock().await;
        state.effects.set_enabled(kind, enabled);
        if let Some(output) = &state.output {
            output.set_effect_enabled(kind, enabled);
        }
    }

    pub async fn enabled_effects(&self) -> Vec<EffectKind> {
        self.inner.graph.lock().await.effects.enabled_kinds()
    }

    /// The device the graph currently renders to; `None` is the system default.
    pub async fn current_device(&self) -> Option<OutputDevice> {
        self.inner.graph.lock().await.device.clone()
    }
}

#[async_trait]
impl PlaybackBackend for AudioGraphBackend {
    fn id(&self) -> &str {
        BACKEND_ID
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::all()
    }

    fn status(&self) -> BackendStatus {
        self.inner.status.borrow().clone()
    }

    fn watch_status(&self) -> watch::Receiver<BackendStatus> {
        self.inner.status.subscribe()
    }

    fn is_available(&self) -> bool {
        self.inner.available.load(Ordering::SeqCst)
    }

    fn last_error(&self) -> Option<String> {
        self.inner.last_error.lock().clone()
    }

    fn output_devices(&self) -> Vec<OutputDevice> {
        self.inner.devices.lock().clone()
    }

    #[instrument(skip(self))]
    async fn initialize(&self) -> Result<()> {
        {
            let mut state = self.inner.graph.lock().await;
            self.inner.ensure_graph(&mut state).await?;
        }
        if let Err(err) = self.refresh_output_devices().await {
            warn!(error = %err, "Initial output device enumeration failed");
        }
        info!("Audio graph backend initialized");
        Ok(())
    }

    async fn load(&self, media: Option<MediaSource>) -> Result<LoadOutcome> {
        let mut state = self.inner.graph.lock().await;
        match media {
            Some(media) => {
                self.inner.load_media(&mut state, media).await?;
                Ok(LoadOutcome::Loaded)
            }
            None => {
                self.inner.stop_poller();
                state.dispose_nodes();
                state.media = None;
                self.inner
                    .live_generation
                    .store(NO_GENERATION, Ordering::SeqCst);
                self.inner.status.send_modify(|status| {
                    status.position = Duration::ZERO;
                    status.duration = Duration::ZERO;
                    status.buffering = false;
                });
                self.inner.set_play_state(PlayState::None);
                debug!("Media unloaded");
                Ok(LoadOutcome::Unloaded)
            }
        }
    }

    async fn play(&self) -> Result<()> {
        let state = self.inner.graph.lock().await;
        match state.current_node() {
            Some(node) => {
                node.start();
                self.inner.set_play_state(PlayState::Playing);
                self.inner.ensure_poller();
                self.inner.events.publish(PlaybackEvent::Playing);
            }
            None => self.inner.set_play_state(PlayState::None),
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let state = self.inner.graph.lock().await;
        match state.current_node() {
            Some(node) => {
                node.stop();
                self.inner.stop_poller();
                self.inner.set_play_state(PlayState::Paused);
                self.inner.events.publish(PlaybackEvent::Paused);
            }
            None => self.inner.set_play_state(PlayState::None),
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut state = self.inner.graph.lock().await;
        self.inner.stop_poller();
        state.dispose_nodes();
        state.media = None;
        self.inner
            .live_generation
            .store(NO_GENERATION, Ordering::SeqCst);
        self.inner.status.send_modify(|status| {
            status.position = Duration::ZERO;
            status.duration = Duration::ZERO;
            status.buffering = false;
        });
        self.inner.set_play_state(PlayState::None);
        self.inner.events.publish(PlaybackEvent::Stopped);
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<()> {
        let state = self.inner.graph.lock().await;
        if let Some(node) = state.current_node() {
            node.seek(position);
            self.inner
                .status
                .send_modify(|status| status.position = position);
        }
        Ok(())
    }

    async fn set_volume(&self, volume: u32) -> Result<()> {
        validate_volume(volume)?;
        let state = self.inner.graph.lock().await;
        self.inner.status.send_modify(|status| status.volume = volume);
        if let Some(output) = &state.output {
            output.set_gain(self.inner.status.borrow().gain());
        }
        Ok(())
    }

    async fn set_playback_rate(&self, rate: u32) -> Result<()> {
        validate_playback_rate(rate)?;
        let state = self.inner.graph.lock().await;
        self.inner
            .status
            .send_modify(|status| status.playback_rate = rate);
        if let Some(node) = state.current_node() {
            node.set_speed(self.inner.status.borrow().speed());
        }
        Ok(())
    }

    #[instrument(skip(self, device), fields(device = %device.id))]
    async fn change_output_device(&self, device: OutputDevice) -> Result<()> {
        let mut state = self.inner.graph.lock().await;
        self.inner.set_play_state(PlayState::Loading);
        self.inner.stop_poller();

        let media = state.media.take();
        state.dispose_graph();
        self.inner
            .live_generation
            .store(NO_GENERATION, Ordering::SeqCst);
        state.device = Some(device);

        self.inner.ensure_graph(&mut state).await?;
        match media {
            Some(media) => self.inner.load_media(&mut state, media).await,
            None => {
                self.inner.set_play_state(PlayState::None);
                Ok(())
            }
        }
    }

    async fn refresh_output_devices(&self) -> Result<Vec<OutputDevice>> {
        let devices = match &self.inner.enumerator {
            Some(enumerator) => enumerator.output_devices().await?,
            None => {
                debug!("No output device enumerator configured");
                Vec::new()
            }
        };
        *self.inner.devices.lock() = devices.clone();
        Ok(devices)
    }

    async fn switch_background(&self) -> Result<()> {
        Ok(())
    }
}
