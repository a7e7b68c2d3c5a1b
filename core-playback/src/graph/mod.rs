//! Audio-graph backend and the engine abstraction it drives.

pub mod arena;
pub mod backend;
pub mod effects;
pub mod engine;

pub use arena::{Generation, NodeArena};
pub use backend::AudioGraphBackend;
pub use effects::{EffectChain, EffectDefinition, EffectKind, EqualizerBand, EQUALIZER_BANDS};
pub use engine::{
    AudioGraph, AudioGraphEngine, CompletionCallback, DeviceNodeCreationStatus,
    GraphCreationStatus, InputNode, InputNodeCreationStatus, OutputNode,
};
