//! Music provider contract
//!
//! A provider resolves catalog entries for one 3-character provider id. The
//! core never talks to a catalog directly; every id it holds is routed through
//! the [`ProviderRegistry`] to the provider that issued it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{LibraryError, Result};
use crate::lyrics::RawLyric;
use crate::models::{Album, Artist, Container, MediaSource, Song};

/// Anything a provider can resolve an id to.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvidableItem {
    Song(Song),
    Container(Container),
    Album(Arc<Album>),
    Artist(Artist),
}

/// Catalog access for a single provider.
///
/// All `in_provider_id` arguments are [`ItemId::in_provider_id`] values:
/// source type tag followed by the actual id.
///
/// [`ItemId::in_provider_id`]: crate::models::ItemId::in_provider_id
#[async_trait]
pub trait MusicProvider: Send + Sync {
    /// 3-character provider id, matching the prefix of every id it issues.
    fn id(&self) -> &str;

    /// Display name.
    fn name(&self) -> &str;

    /// Supported source type tags and their display labels.
    fn supported_source_types(&self) -> Vec<(String, String)>;

    async fn resolve_item(&self, in_provider_id: &str) -> Result<ProvidableItem>;

    async fn resolve_media_source(&self, in_provider_id: &str) -> Result<MediaSource>;

    /// Full ordered item list of a linear container.
    async fn resolve_container_items(&self, in_provider_id: &str) -> Result<Vec<Song>>;

    /// Next item of an interactive container. Called once per advance.
    async fn resolve_next_item(&self, in_provider_id: &str) -> Result<Song>;

    async fn resolve_lyric(&self, in_provider_id: &str) -> Result<RawLyric>;

    /// Translated-lyric support, when the provider has it.
    fn as_translating(&self) -> Option<&dyn TranslatingProvider> {
        None
    }
}

/// Providers that also serve translated lyrics.
#[async_trait]
pub trait TranslatingProvider: MusicProvider {
    async fn resolve_translated_lyric(&self, in_provider_id: &str) -> Result<RawLyric>;
}

/// Provider instances keyed by provider id.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn MusicProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. A later registration for the same id replaces the
    /// earlier one.
    pub fn register(&mut self, provider: Arc<dyn MusicProvider>) {
        let id = provider.id().to_string();
        match self.providers.insert(id.clone(), provider) {
            Some(previous) => info!(
                provider_id = %id,
                replaced = previous.name(),
                "Replaced music provider"
            ),
            None => debug!(provider_id = %id, "Registered music provider"),
        }
    }

    pub fn register_all<I>(&mut self, providers: I)
    where
        I: IntoIterator<Item = Arc<dyn MusicProvider>>,
    {
        for provider in providers {
            self.register(provider);
        }
    }

    pub fn get(&self, provider_id: &str) -> Result<Arc<dyn MusicProvider>> {
        self.providers
            .get(provider_id)
            .cloned()
            .ok_or_else(|| LibraryError::ProviderNotRegistered(provider_id.to_string()))
    }

    pub fn contains(&self, provider_id: &str) -> bool {
        self.providers.contains_key(provider_id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}
