//! Vocabulary discovered from an event corpus.
//!
//! A [`Taxonomy`] is built once per corpus load and never mutated afterwards; resolution
//! reads it as a snapshot.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::event::{Event, Field};

/// Sorted, deduplicated vocabularies for categories, actions and hook names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    pub categories: Vec<String>,
    pub actions: Vec<String>,
    pub hook_names: Vec<String>,
}

#[derive(Default)]
struct VocabularySets<'a> {
    categories: BTreeSet<&'a str>,
    actions: BTreeSet<&'a str>,
    hook_names: BTreeSet<&'a str>,
}

impl<'a> VocabularySets<'a> {
    fn add(mut self, event: &'a Event) -> Self {
        if let Some(category) = event.field(Field::Category) {
            self.categories.insert(category);
        }
        if let Some(action) = event.field(Field::Action) {
            self.actions.insert(action);
        }
        if let Some(hook) = event.field(Field::HookName) {
            self.hook_names.insert(hook);
        }
        self
    }

    fn merge(mut self, other: Self) -> Self {
        self.categories.extend(other.categories);
        self.actions.extend(other.actions);
        self.hook_names.extend(other.hook_names);
        self
    }
}

fn into_sorted(set: BTreeSet<&str>) -> Vec<String> {
    set.into_iter().map(str::to_string).collect()
}

impl Taxonomy {
    /// Scan `events` and collect every non-empty category, action and `label.hook_name`.
    ///
    /// Output vocabularies are ordinally sorted (case-sensitive).
    pub fn extract(events: &[Event]) -> Self {
        let sets = events
            .par_iter()
            .fold(VocabularySets::default, VocabularySets::add)
            .reduce(VocabularySets::default, VocabularySets::merge);

        Self {
            categories: into_sorted(sets.categories),
            actions: into_sorted(sets.actions),
            hook_names: into_sorted(sets.hook_names),
        }
    }

    /// The vocabulary a filter on `field` is resolved against
    pub fn vocabulary(&self, field: Field) -> &[String] {
        match field {
            Field::Category => &self.categories,
            Field::Action => &self.actions,
            Field::HookName => &self.hook_names,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.actions.is_empty() && self.hook_names.is_empty()
    }
}
