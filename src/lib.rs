//! Voice Intent
//!
//! Turns a spoken or typed analytics question ("show me the signin category", "what are the
//! actions", "show duplicates") into a typed [`Intent`] whose filter value is snapped to the
//! vocabulary actually present in an event corpus.
//!
//! The pipeline is local first: a pattern parser always produces a result, an optional
//! remote classifier may replace it, and the taxonomy matcher corrects whatever survives.

pub mod answer;
pub mod config;
pub mod corpus;
pub mod error;
pub mod event;
pub mod fuzzy;
pub mod heuristic;
pub mod intent;
pub mod remote;
pub mod resolver;
pub mod server;
pub mod taxonomy;

pub use corpus::{CorpusSnapshot, CorpusStore};
pub use error::VoiceIntentError;
pub use event::{Event, Field};
pub use intent::Intent;
pub use resolver::IntentResolver;
pub use taxonomy::Taxonomy;
