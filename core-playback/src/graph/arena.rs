//! Generation-tagged node storage.
//!
//! Loading a new song supersedes the previous input node without disposing it
//! right away: the engine may still deliver a late completion for it. Old
//! nodes are released by [`NodeArena::sweep`] on a later tick, and anything
//! holding a [`Generation`] can tell whether its node is still the live one.

use std::fmt;

/// Monotonic tag handed out for each node placed in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }

    pub fn from_value(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

#[derive(Debug)]
pub struct NodeArena<N> {
    entries: Vec<(Generation, N)>,
    current: Option<Generation>,
    next: u64,
}

impl<N> Default for NodeArena<N> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            current: None,
            next: 1,
        }
    }
}

impl<N> NodeArena<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `node` as the current one. Earlier nodes stay until swept.
    pub fn supersede(&mut self, node: N) -> Generation {
        let generation = Generation(self.next);
        self.next += 1;
        self.entries.push((generation, node));
        self.current = Some(generation);
        generation
    }

    pub fn current(&self) -> Option<&N> {
        let current = self.current?;
        self.entries
            .iter()
            .find(|(generation, _)| *generation == current)
            .map(|(_, node)| node)
    }

    pub fn current_generation(&self) -> Option<Generation> {
        self.current
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current == Some(generation)
    }

    /// Drop the current marker without removing the node.
    pub fn release_current(&mut self) {
        self.current = None;
    }

    /// Remove and return every superseded node.
    pub fn sweep(&mut self) -> Vec<N> {
        let current = self.current;
        let (keep, stale): (Vec<_>, Vec<_>) = self
            .entries
            .drain(..)
            .partition(|(generation, _)| Some(*generation) == current);
        self.entries = keep;
        stale.into_iter().map(|(_, node)| node).collect()
    }

    /// Remove and return every node, current included.
    pub fn clear(&mut self) -> Vec<N> {
        self.current = None;
        self.entries.drain(..).map(|(_, node)| node).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
