//! Intent Resolver
//!
//! Composes the pipeline for one utterance:
//! 1. heuristic parse (always)
//! 2. remote normalization, if configured, replacing the heuristic result when it yields a
//!    supported intent within the timeout
//! 3. taxonomy correction of the filter value
//!
//! Remote failures never reach the caller; they are logged and the heuristic result stands.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::VoiceIntentError;
use crate::fuzzy::{match_vocabulary, VocabularyMatch};
use crate::heuristic;
use crate::intent::Intent;
use crate::remote::{check_supported, AdapterUnavailable, IntentNormalizer};
use crate::taxonomy::Taxonomy;

/// Default bound on a remote normalization round-trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Resolves utterances against a taxonomy snapshot. Holds no per-call state, so one
/// resolver can serve concurrent requests.
#[derive(Clone)]
pub struct IntentResolver {
    normalizer: Option<Arc<dyn IntentNormalizer>>,
    timeout: Duration,
}

impl Default for IntentResolver {
    fn default() -> Self {
        Self::local()
    }
}

impl IntentResolver {
    /// Heuristics and taxonomy matching only
    pub fn local() -> Self {
        Self {
            normalizer: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Prefer `normalizer` when it answers within `timeout`
    pub fn with_normalizer(normalizer: Arc<dyn IntentNormalizer>, timeout: Duration) -> Self {
        Self {
            normalizer: Some(normalizer),
            timeout,
        }
    }

    pub fn has_normalizer(&self) -> bool {
        self.normalizer.is_some()
    }

    /// Resolve `text` to a final intent. Blank text is rejected before any stage runs.
    pub async fn resolve(
        &self,
        text: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Intent, VoiceIntentError> {
        if text.trim().is_empty() {
            return Err(VoiceIntentError::InputMissing);
        }

        let mut candidate = heuristic::parse(text);

        if let Some(normalizer) = &self.normalizer {
            match self.normalize(normalizer.as_ref(), text, taxonomy).await {
                Ok(remote) => {
                    debug!("Remote intent {:?} replaces {:?}", remote, candidate);
                    candidate = remote;
                }
                Err(e) => warn!("Remote normalization unavailable, using heuristics: {}", e),
            }
        }

        Ok(correct(candidate, taxonomy))
    }

    async fn normalize(
        &self,
        normalizer: &dyn IntentNormalizer,
        text: &str,
        taxonomy: &Taxonomy,
    ) -> Result<Intent, AdapterUnavailable> {
        let remote = tokio::time::timeout(self.timeout, normalizer.normalize(text, taxonomy))
            .await
            .map_err(|_| AdapterUnavailable::Timeout(self.timeout))??;

        check_supported(remote)
    }
}

/// Replace a filter intent's value with its taxonomy entry, if any.
///
/// An unmatched value is kept as-is so the caller can report it.
pub fn correct(intent: Intent, taxonomy: &Taxonomy) -> Intent {
    let Some((field, value)) = intent.filter_value() else {
        return intent;
    };

    match match_vocabulary(value, taxonomy.vocabulary(field)) {
        VocabularyMatch::Exact(entry) | VocabularyMatch::Contains(entry) => {
            if entry != value {
                info!("Resolved {} {:?} to {:?}", field.display_name(), value, entry);
            }
            Intent::filter(field, entry)
        }
        VocabularyMatch::Unresolved => {
            info!("No matching {} for: {}", field.display_name(), value);
            intent
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Field;
    use async_trait::async_trait;

    struct FailingNormalizer;

    #[async_trait]
    impl IntentNormalizer for FailingNormalizer {
        async fn normalize(&self, _: &str, _: &Taxonomy) -> Result<Intent, AdapterUnavailable> {
            Err(AdapterUnavailable::Status {
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    struct MalformedNormalizer;

    #[async_trait]
    impl IntentNormalizer for MalformedNormalizer {
        async fn normalize(&self, _: &str, _: &Taxonomy) -> Result<Intent, AdapterUnavailable> {
            Err(AdapterUnavailable::Malformed("not json".to_string()))
        }
    }

    struct FixedNormalizer(Intent);

    #[async_trait]
    impl IntentNormalizer for FixedNormalizer {
        async fn normalize(&self, _: &str, _: &Taxonomy) -> Result<Intent, AdapterUnavailable> {
            Ok(self.0.clone())
        }
    }

    struct SlowNormalizer;

    #[async_trait]
    impl IntentNormalizer for SlowNormalizer {
        async fn normalize(&self, _: &str, _: &Taxonomy) -> Result<Intent, AdapterUnavailable> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Intent::ShowDuplicates)
        }
    }

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            categories: vec!["app_open".into(), "home_tab".into(), "signin".into()],
            actions: vec!["login_with_password".into(), "seen".into()],
            hook_names: vec!["listing_carousel".into()],
        }
    }

    const UTTERANCES: &[&str] = &[
        "show duplicates",
        "what are the categories",
        "list actions",
        "how many hooknames",
        "show me the category signin",
        "SIGNIN category",
        "filter action login",
        "show hook carousel",
        "display category nothing_like_it",
        "banana",
    ];

    #[tokio::test]
    async fn test_local_pipeline() {
        let resolver = IntentResolver::local();
        let taxonomy = taxonomy();

        assert_eq!(
            resolver.resolve("signin category", &taxonomy).await.unwrap(),
            Intent::filter(Field::Category, "signin")
        );
        assert_eq!(
            resolver.resolve("filter action login", &taxonomy).await.unwrap(),
            Intent::filter(Field::Action, "login_with_password")
        );
        assert_eq!(
            resolver.resolve("show hook carousel", &taxonomy).await.unwrap(),
            Intent::filter(Field::HookName, "listing_carousel")
        );
        assert_eq!(
            resolver.resolve("banana", &taxonomy).await.unwrap(),
            Intent::Unknown
        );
    }

    #[tokio::test]
    async fn test_unresolved_value_kept() {
        let resolver = IntentResolver::local();
        assert_eq!(
            resolver
                .resolve("display category nothing_like_it", &taxonomy())
                .await
                .unwrap(),
            Intent::filter(Field::Category, "nothing_like_it")
        );
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let resolver = IntentResolver::local();
        assert!(matches!(
            resolver.resolve("", &taxonomy()).await,
            Err(VoiceIntentError::InputMissing)
        ));
        assert!(matches!(
            resolver.resolve("  \n", &taxonomy()).await,
            Err(VoiceIntentError::InputMissing)
        ));
    }

    #[tokio::test]
    async fn test_failing_normalizer_matches_local() {
        let local = IntentResolver::local();
        let taxonomy = taxonomy();
        for normalizer in [
            Arc::new(FailingNormalizer) as Arc<dyn IntentNormalizer>,
            Arc::new(MalformedNormalizer) as Arc<dyn IntentNormalizer>,
        ] {
            let remote = IntentResolver::with_normalizer(normalizer, DEFAULT_TIMEOUT);
            for text in UTTERANCES {
                assert_eq!(
                    remote.resolve(text, &taxonomy).await.unwrap(),
                    local.resolve(text, &taxonomy).await.unwrap(),
                    "diverged on {:?}",
                    text
                );
            }
        }
    }

    #[tokio::test]
    async fn test_remote_result_preferred_and_corrected() {
        let normalizer = Arc::new(FixedNormalizer(Intent::filter(Field::Category, "SIGN")));
        let resolver = IntentResolver::with_normalizer(normalizer, DEFAULT_TIMEOUT);
        assert_eq!(
            resolver.resolve("banana", &taxonomy()).await.unwrap(),
            Intent::filter(Field::Category, "signin")
        );
    }

    #[tokio::test]
    async fn test_remote_unknown_does_not_override() {
        let normalizer = Arc::new(FixedNormalizer(Intent::Unknown));
        let resolver = IntentResolver::with_normalizer(normalizer, DEFAULT_TIMEOUT);
        assert_eq!(
            resolver.resolve("show duplicates", &taxonomy()).await.unwrap(),
            Intent::ShowDuplicates
        );
    }

    #[tokio::test]
    async fn test_remote_blank_value_does_not_override() {
        let local = IntentResolver::local();
        let taxonomy = taxonomy();
        for blank in ["", "   "] {
            let resolver = IntentResolver::with_normalizer(
                Arc::new(FixedNormalizer(Intent::filter(Field::Category, blank))),
                DEFAULT_TIMEOUT,
            );
            for text in UTTERANCES {
                assert_eq!(
                    resolver.resolve(text, &taxonomy).await.unwrap(),
                    local.resolve(text, &taxonomy).await.unwrap(),
                    "blank remote value replaced result for {:?}",
                    text
                );
            }
        }
        let resolver = IntentResolver::with_normalizer(
            Arc::new(FixedNormalizer(Intent::filter(Field::HookName, ""))),
            DEFAULT_TIMEOUT,
        );
        assert_eq!(
            resolver.resolve("show duplicates", &taxonomy).await.unwrap(),
            Intent::ShowDuplicates
        );
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let resolver =
            IntentResolver::with_normalizer(Arc::new(SlowNormalizer), Duration::from_millis(50));
        assert_eq!(
            resolver.resolve("list actions", &taxonomy()).await.unwrap(),
            Intent::AskAboutActions
        );
    }

    #[tokio::test]
    async fn test_idempotent() {
        let resolver = IntentResolver::with_normalizer(
            Arc::new(FixedNormalizer(Intent::filter(Field::Action, "SEE"))),
            DEFAULT_TIMEOUT,
        );
        let taxonomy = taxonomy();
        let first = resolver.resolve("anything", &taxonomy).await.unwrap();
        let second = resolver.resolve("anything", &taxonomy).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Intent::filter(Field::Action, "seen"));
    }

    #[test]
    fn test_correct_leaves_non_filters() {
        let taxonomy = taxonomy();
        assert_eq!(correct(Intent::AskAboutActions, &taxonomy), Intent::AskAboutActions);
        assert_eq!(correct(Intent::Unknown, &taxonomy), Intent::Unknown);
    }

    #[test]
    fn test_correct_with_empty_taxonomy() {
        assert_eq!(
            correct(Intent::filter(Field::Category, "signin"), &Taxonomy::default()),
            Intent::filter(Field::Category, "signin")
        );
    }
}
