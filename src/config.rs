//! Runtime configuration shared by every subcommand.
//!
//! Each setting comes from a command-line flag, falling back to an environment variable,
//! then a default.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::corpus::CorpusSnapshot;
use crate::remote::{OpenAiClient, RemoteNormalizer, DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::resolver::IntentResolver;

/// Corpus file name looked up in the default locations
const CORPUS_FILE: &str = "sampleData.txt";

/// Directory name under the platform data dir
const DATA_DIR: &str = "voice-intent";

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Event corpus (JSON array of events)
    #[arg(long, env = "VOICE_INTENT_CORPUS", global = true)]
    pub corpus: Option<PathBuf>,

    /// API key for the remote classifier; without one only heuristics are used
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Remote classifier model
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// Upper bound on one remote classification, in milliseconds
    #[arg(long, env = "VOICE_INTENT_TIMEOUT_MS", default_value_t = 8000, global = true)]
    pub classifier_timeout_ms: u64,

    /// Never call the remote classifier
    #[arg(long, global = true)]
    pub local_only: bool,
}

impl Config {
    /// Where a corpus is looked for when `--corpus` is not given
    pub fn default_corpus_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("public").join(CORPUS_FILE),
            PathBuf::from("src").join(CORPUS_FILE),
        ];
        if let Some(data_dir) = dirs::data_dir() {
            paths.push(data_dir.join(DATA_DIR).join(CORPUS_FILE));
        }
        paths
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn load_corpus(&self) -> CorpusSnapshot {
        CorpusSnapshot::load_or_empty(self.corpus.as_deref(), &Self::default_corpus_paths())
    }

    /// Resolver with the remote classifier when a key is configured and it is not disabled
    pub fn build_resolver(&self) -> IntentResolver {
        if self.local_only {
            info!("Remote classifier disabled (--local-only)");
            return IntentResolver::local();
        }
        let Some(api_key) = self.api_key() else {
            info!("No API key configured; using heuristics only");
            return IntentResolver::local();
        };

        let timeout = self.classifier_timeout();
        match OpenAiClient::new(api_key.to_string(), &self.model, &self.api_base, timeout) {
            Ok(client) => {
                info!("Remote classifier enabled ({}, timeout {:?})", self.model, timeout);
                IntentResolver::with_normalizer(Arc::new(RemoteNormalizer::new(client)), timeout)
            }
            Err(e) => {
                warn!("Could not build remote classifier ({}); using heuristics only", e);
                IntentResolver::local()
            }
        }
    }
}
