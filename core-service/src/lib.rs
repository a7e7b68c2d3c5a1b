//! Playback core service and bootstrap helpers.
//!
//! Wires a host-chosen [`PlaybackBackend`], the registered music providers
//! and an optional platform transport surface into one [`PlayCore`].
//!
//! ```no_run
//! # async fn example() -> core_service::Result<()> {
//! use core_playback::NullBackend;
//! use core_runtime::{EventBus, PlayerConfig};
//! use core_service::{CoreDependencies, CoreService};
//! use std::sync::Arc;
//!
//! let events = EventBus::new(256);
//! let backend = Arc::new(NullBackend::new(events.clone()));
//! let service = CoreService::bootstrap(
//!     CoreDependencies::new(backend, events),
//!     PlayerConfig::default(),
//! )
//! .await?;
//! service.core().move_next_and_play().await.ok();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod navigation;
pub mod player;
pub mod transport;

pub use error::{CoreError, Result};
pub use player::{next_pointer, PlayCore};
pub use transport::TransportControlAdapter;

use bridge_traits::transport::TransportControlSurface;
use core_library::provider::MusicProvider;
use core_playback::PlaybackBackend;
use core_runtime::{EventBus, PlayerConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Everything the host supplies to the core.
pub struct CoreDependencies {
    pub backend: Arc<dyn PlaybackBackend>,
    /// The bus the backend publishes to.
    pub events: EventBus,
    pub transport: Option<Arc<dyn TransportControlSurface>>,
    pub providers: Vec<Arc<dyn MusicProvider>>,
}

impl CoreDependencies {
    pub fn new(backend: Arc<dyn PlaybackBackend>, events: EventBus) -> Self {
        Self {
            backend,
            events,
            transport: None,
            providers: Vec::new(),
        }
    }

    pub fn with_transport(mut self, surface: Arc<dyn TransportControlSurface>) -> Self {
        self.transport = Some(surface);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn MusicProvider>) -> Self {
        self.providers.push(provider);
        self
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    core: Arc<PlayCore>,
    transport: Option<Arc<TransportControlAdapter>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl CoreService {
    /// Validate the config, initialize the backend and start the background
    /// tasks (auto-advance and transport mirroring).
    ///
    /// A backend that fails to initialize is kept: it reports
    /// `is_available() == false` and the host decides what to do.
    pub async fn bootstrap(deps: CoreDependencies, config: PlayerConfig) -> Result<Self> {
        config.validate()?;

        if let Err(err) = deps.backend.initialize().await {
            warn!(backend = deps.backend.id(), error = %err, "Backend failed to initialize");
        }

        let core = Arc::new(PlayCore::new(deps.backend, deps.events, config));
        core.register_providers(deps.providers);

        let mut tasks = vec![core.spawn_auto_advance()];
        let transport = deps.transport.map(|surface| {
            let adapter = Arc::new(TransportControlAdapter::new(Arc::clone(&core), surface));
            if let Some(pump) = adapter.spawn_event_pump() {
                tasks.push(pump);
            }
            adapter
        });

        info!(
            backend = core.backend().id(),
            providers = ?core.provider_ids(),
            transport = transport.is_some(),
            "Core service ready"
        );

        Ok(Self {
            core,
            transport,
            tasks: Arc::new(Mutex::new(tasks)),
        })
    }

    pub fn core(&self) -> &Arc<PlayCore> {
        &self.core
    }

    pub fn transport(&self) -> Option<&Arc<TransportControlAdapter>> {
        self.transport.as_ref()
    }

    pub fn events(&self) -> &EventBus {
        self.core.events()
    }

    /// Abort the background tasks.
    pub fn shutdown(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}
