//! The typed result of resolving an utterance.

use serde::{Deserialize, Serialize};

use crate::event::Field;

/// What a user's utterance asked for.
///
/// Serializes as a single JSON object tagged by `type`, e.g.
/// `{"type":"filterByCategory","category":"signin"}` or `{"type":"showDuplicates"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Intent {
    FilterByCategory {
        category: String,
    },
    FilterByAction {
        action: String,
    },
    FilterByHookName {
        #[serde(rename = "hookName")]
        hook_name: String,
    },
    AskAboutCategories,
    AskAboutActions,
    AskAboutHookNames,
    ShowDuplicates,
    Unknown,
}

impl Intent {
    /// Build the filter intent for `field`
    pub fn filter(field: Field, value: impl Into<String>) -> Self {
        let value = value.into();
        match field {
            Field::Category => Intent::FilterByCategory { category: value },
            Field::Action => Intent::FilterByAction { action: value },
            Field::HookName => Intent::FilterByHookName { hook_name: value },
        }
    }

    /// The field and value of a filter intent
    pub fn filter_value(&self) -> Option<(Field, &str)> {
        match self {
            Intent::FilterByCategory { category } => Some((Field::Category, category.as_str())),
            Intent::FilterByAction { action } => Some((Field::Action, action.as_str())),
            Intent::FilterByHookName { hook_name } => Some((Field::HookName, hook_name.as_str())),
            Intent::AskAboutCategories
            | Intent::AskAboutActions
            | Intent::AskAboutHookNames
            | Intent::ShowDuplicates
            | Intent::Unknown => None,
        }
    }

    /// Wire name of the tag
    pub fn tag(&self) -> &'static str {
        match self {
            Intent::FilterByCategory { .. } => "filterByCategory",
            Intent::FilterByAction { .. } => "filterByAction",
            Intent::FilterByHookName { .. } => "filterByHookName",
            Intent::AskAboutCategories => "askAboutCategories",
            Intent::AskAboutActions => "askAboutActions",
            Intent::AskAboutHookNames => "askAboutHookNames",
            Intent::ShowDuplicates => "showDuplicates",
            Intent::Unknown => "unknown",
        }
    }
}
