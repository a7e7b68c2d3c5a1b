//! Host audio-graph engine abstraction.
//!
//! The backend builds one graph per output device: a device output node that
//! carries the effect chain, plus one media input node per loaded song. The
//! platform supplies the engine; the backend only drives node lifetimes.

use async_trait::async_trait;
use bridge_traits::device::OutputDevice;
use core_library::models::MediaSource;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::effects::{EffectDefinition, EffectKind};

// ============================================================================
// Creation Status
// ============================================================================

/// Why the engine could not build a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphCreationStatus {
    UnknownFailure,
    DeviceNotAvailable,
    FormatNotSupported,
}

impl fmt::Display for GraphCreationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GraphCreationStatus::UnknownFailure => "Unknown failure",
            GraphCreationStatus::DeviceNotAvailable => "Output device not available",
            GraphCreationStatus::FormatNotSupported => "Audio format not supported",
        })
    }
}

/// Why the graph could not open its output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceNodeCreationStatus {
    AccessDenied,
    UnknownFailure,
    DeviceNotAvailable,
    FormatNotSupported,
}

impl fmt::Display for DeviceNodeCreationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceNodeCreationStatus::AccessDenied => "Access denied",
            DeviceNodeCreationStatus::UnknownFailure => "Unknown failure",
            DeviceNodeCreationStatus::DeviceNotAvailable => "Output device not available",
            DeviceNodeCreationStatus::FormatNotSupported => "Audio format not supported",
        })
    }
}

/// Why the graph could not open a media source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputNodeCreationStatus {
    NetworkError,
    UnknownFailure,
    FormatNotSupported,
}

impl fmt::Display for InputNodeCreationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputNodeCreationStatus::NetworkError => "Network error while opening media",
            InputNodeCreationStatus::UnknownFailure => "Unknown failure",
            InputNodeCreationStatus::FormatNotSupported => "Media format not supported",
        })
    }
}

// ============================================================================
// Engine Traits
// ============================================================================

/// Callback fired by an input node when it reaches the end of its media.
pub type CompletionCallback = Box<dyn Fn() + Send + Sync>;

#[async_trait]
pub trait AudioGraphEngine: Send + Sync {
    /// Build a graph rendering to `device`, or to the system default.
    async fn create_graph(
        &self,
        device: Option<&OutputDevice>,
    ) -> Result<Arc<dyn AudioGraph>, GraphCreationStatus>;
}

#[async_trait]
pub trait AudioGraph: Send + Sync {
    async fn create_output_node(&self) -> Result<Arc<dyn OutputNode>, DeviceNodeCreationStatus>;

    async fn create_input_node(
        &self,
        source: &MediaSource,
    ) -> Result<Arc<dyn InputNode>, InputNodeCreationStatus>;

    fn start(&self);

    fn dispose(&self);
}

/// The device output node. Effects live here so they survive song changes.
pub trait OutputNode: Send + Sync {
    fn set_gain(&self, gain: f64);

    fn add_effect(&self, effect: &EffectDefinition);

    fn set_effect_enabled(&self, kind: EffectKind, enabled: bool);

    fn dispose(&self);
}

/// A media input node feeding the output node.
pub trait InputNode: Send + Sync {
    fn duration(&self) -> Duration;

    fn position(&self) -> Duration;

    fn start(&self);

    fn stop(&self);

    fn seek(&self, position: Duration);

    fn set_speed(&self, speed: f64);

    fn connect(&self, output: &Arc<dyn OutputNode>);

    /// Replaces any previously registered callback.
    fn on_completed(&self, callback: CompletionCallback);

    fn dispose(&self);
}
