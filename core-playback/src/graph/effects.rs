//! Output-node effect chain.
//!
//! Every effect is attached once when the output node is built and starts
//! disabled. Toggling an effect never rebuilds the graph.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Echo,
    Reverb,
    Limiter,
    Equalizer,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqualizerBand {
    pub center_hz: f64,
    pub gain: f64,
    pub bandwidth: f64,
}

pub const EQUALIZER_BANDS: [EqualizerBand; 4] = [
    EqualizerBand {
        center_hz: 100.0,
        gain: 4.0,
        bandwidth: 1.5,
    },
    EqualizerBand {
        center_hz: 900.0,
        gain: 4.0,
        bandwidth: 1.5,
    },
    EqualizerBand {
        center_hz: 5000.0,
        gain: 4.0,
        bandwidth: 1.5,
    },
    EqualizerBand {
        center_hz: 12000.0,
        gain: 4.0,
        bandwidth: 2.0,
    },
];

/// Parameters for one effect, as handed to
/// [`OutputNode::add_effect`](super::engine::OutputNode::add_effect).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectDefinition {
    Echo {
        wet_dry_mix: f64,
        feedback: f64,
        delay_ms: u32,
    },
    Reverb {
        wet_dry_mix: f64,
        reflections_delay_ms: u32,
        reverb_delay_ms: u32,
        rear_delay_ms: u32,
        decay_time_s: f64,
    },
    Limiter {
        loudness: u32,
        release: u32,
    },
    Equalizer {
        bands: Vec<EqualizerBand>,
    },
}

impl EffectDefinition {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectDefinition::Echo { .. } => EffectKind::Echo,
            EffectDefinition::Reverb { .. } => EffectKind::Reverb,
            EffectDefinition::Limiter { .. } => EffectKind::Limiter,
            EffectDefinition::Equalizer { .. } => EffectKind::Equalizer,
        }
    }

    pub fn default_for(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Echo => EffectDefinition::Echo {
                wet_dry_mix: 0.7,
                feedback: 0.5,
                delay_ms: 500,
            },
            EffectKind::Reverb => EffectDefinition::Reverb {
                wet_dry_mix: 50.0,
                reflections_delay_ms: 120,
                reverb_delay_ms: 30,
                rear_delay_ms: 3,
                decay_time_s: 2.0,
            },
            EffectKind::Limiter => EffectDefinition::Limiter {
                loudness: 500,
                release: 10,
            },
            EffectKind::Equalizer => EffectDefinition::Equalizer {
                bands: EQUALIZER_BANDS.to_vec(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct EffectSlot {
    definition: EffectDefinition,
    enabled: bool,
}

/// The ordered effect set of an output node and which entries are on.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectChain {
    slots: Vec<EffectSlot>,
}

impl Default for EffectChain {
    fn default() -> Self {
        let slots = [
            EffectKind::Echo,
            EffectKind::Reverb,
            EffectKind::Limiter,
            EffectKind::Equalizer,
        ]
        .into_iter()
        .map(|kind| EffectSlot {
            definition: EffectDefinition::default_for(kind),
            enabled: false,
        })
        .collect();
        Self { slots }
    }
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.slots.iter().map(|slot| &slot.definition)
    }

    /// Returns `false` when the chain has no effect of that kind.
    pub fn set_enabled(&mut self, kind: EffectKind, enabled: bool) -> bool {
        match self.slots.iter_mut().find(|slot| slot.definition.kind() == kind) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, kind: EffectKind) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.definition.kind() == kind && slot.enabled)
    }

    pub fn enabled_kinds(&self) -> Vec<EffectKind> {
        self.slots
            .iter()
            .filter(|slot| slot.enabled)
            .map(|slot| slot.definition.kind())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chain_is_ordered_and_disabled() {
        let chain = EffectChain::new();
        let kinds: Vec<_> = chain.definitions().map(EffectDefinition::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EffectKind::Echo,
                EffectKind::Reverb,
                EffectKind::Limiter,
                EffectKind::Equalizer
            ]
        );
        assert!(chain.enabled_kinds().is_empty());
    }

    #[test]
    fn toggling_effects() {
        let mut chain = EffectChain::new();
        assert!(chain.set_enabled(EffectKind::Reverb, true));
        assert!(chain.is_enabled(EffectKind::Reverb));
        assert!(!chain.is_enabled(EffectKind::Echo));

        chain.set_enabled(EffectKind::Reverb, false);
        assert!(chain.enabled_kinds().is_empty());
    }

    #[test]
    fn equalizer_has_four_bands() {
        match EffectDefinition::default_for(EffectKind::Equalizer) {
            EffectDefinition::Equalizer { bands } => {
                assert_eq!(bands.len(), 4);
                assert_eq!(bands[3].center_hz, 12000.0);
                assert_eq!(bands[3].bandwidth, 2.0);
            }
            other => panic!("unexpected definition: {other:?}"),
        }
    }
}
