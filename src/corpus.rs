//! Loaded corpora and the reloadable store the HTTP host reads from.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::VoiceIntentError;
use crate::event::{events_from_document, Event};
use crate::taxonomy::Taxonomy;

/// Events plus the taxonomy derived from them. Immutable once built.
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    pub events: Vec<Event>,
    pub taxonomy: Taxonomy,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
}

impl CorpusSnapshot {
    pub fn empty(source: impl Into<String>) -> Self {
        Self::from_events(Vec::new(), source)
    }

    pub fn from_events(events: Vec<Event>, source: impl Into<String>) -> Self {
        let taxonomy = Taxonomy::extract(&events);
        Self {
            events,
            taxonomy,
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }

    /// Build from a JSON document; only an event array yields events
    pub fn from_document(document: Value, source: impl Into<String>) -> Self {
        Self::from_events(events_from_document(document), source)
    }

    /// Read a corpus file.
    ///
    /// A file that cannot be opened is an error; a file that is not valid JSON loads as an
    /// empty corpus, meaning "no vocabulary constraints".
    pub fn load(path: &Path) -> Result<Self, VoiceIntentError> {
        let source = path.display().to_string();
        let raw = fs::read(path).map_err(|e| VoiceIntentError::CorpusRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let snapshot = match serde_json::from_slice::<Value>(&raw) {
            Ok(document) => Self::from_document(document, source),
            Err(e) => {
                warn!("Corpus {} is not valid JSON ({}); using empty taxonomy", source, e);
                Self::empty(source)
            }
        };

        info!(
            "Loaded {} events from {} ({} categories, {} actions, {} hook names)",
            snapshot.events.len(),
            snapshot.source,
            snapshot.taxonomy.categories.len(),
            snapshot.taxonomy.actions.len(),
            snapshot.taxonomy.hook_names.len()
        );
        Ok(snapshot)
    }

    /// Load from `path` if given, else the first existing default location; missing files
    /// give an empty snapshot.
    pub fn load_or_empty(path: Option<&Path>, defaults: &[PathBuf]) -> Self {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => defaults.iter().find(|p| p.exists()).cloned(),
        };

        let Some(candidate) = candidate else {
            warn!("No corpus found; taxonomy is empty");
            return Self::empty("none");
        };

        match Self::load(&candidate) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("{}; taxonomy is empty", e);
                Self::empty(candidate.display().to_string())
            }
        }
    }
}

/// Current corpus, swappable while requests are in flight.
///
/// Readers get an `Arc` to the snapshot current at call time; a reload publishes a new
/// snapshot without touching ones already handed out.
#[derive(Debug)]
pub struct CorpusStore {
    current: RwLock<Arc<CorpusSnapshot>>,
}

impl CorpusStore {
    pub fn new(snapshot: CorpusSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub async fn snapshot(&self) -> Arc<CorpusSnapshot> {
        self.current.read().await.clone()
    }

    /// Publish `snapshot`, returning the one it replaced
    pub async fn replace(&self, snapshot: CorpusSnapshot) -> Arc<CorpusSnapshot> {
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, Arc::new(snapshot))
    }
}
