//! Apply a resolved intent to a corpus.

use crate::event::{find_duplicates, DuplicateEvent, Event, EventFilter, Field};
use crate::fuzzy::match_vocabulary;
use crate::intent::Intent;
use crate::taxonomy::Taxonomy;

/// Maximum number of vocabulary entries listed in an answer
pub const MAX_LISTED: usize = 50;

/// What the caller should show for an intent
#[derive(Debug, PartialEq)]
pub enum Outcome<'a> {
    /// Events matching a known vocabulary entry
    Filtered {
        field: Field,
        value: &'a str,
        events: Vec<&'a Event>,
    },
    /// The filter value is not in the taxonomy
    NoMatch { field: Field, value: String },
    /// Vocabulary listing for an "ask about" intent
    Listing { field: Field, entries: &'a [String] },
    Duplicates(Vec<DuplicateEvent<'a>>),
    NotUnderstood,
}

impl Outcome<'_> {
    /// One-line summary for display
    pub fn message(&self) -> String {
        match self {
            Outcome::Filtered {
                field,
                value,
                events,
            } => format!(
                "Showing {} events for {} {}",
                events.len(),
                field.display_name(),
                value
            ),
            Outcome::NoMatch { field, value } => {
                format!("No matching {} for: {}", field.display_name(), value)
            }
            Outcome::Listing { field, entries } => listing_text(*field, entries),
            Outcome::Duplicates(duplicates) => format!("Duplicate Events ({})", duplicates.len()),
            Outcome::NotUnderstood => "I didn't understand".to_string(),
        }
    }
}

fn plural_label(field: Field) -> &'static str {
    match field {
        Field::Category => "Categories",
        Field::Action => "Actions",
        Field::HookName => "Hook names",
    }
}

/// `"Categories (3): a, b, c"`, truncated to [`MAX_LISTED`] entries with a trailing ellipsis
pub fn listing_text(field: Field, entries: &[String]) -> String {
    let shown = &entries[..entries.len().min(MAX_LISTED)];
    let ellipsis = if entries.len() > MAX_LISTED { "…" } else { "" };
    format!(
        "{} ({}): {}{}",
        plural_label(field),
        entries.len(),
        shown.join(", "),
        ellipsis
    )
}

/// Decide what `intent` means for `events`
pub fn apply<'a>(intent: &Intent, events: &'a [Event], taxonomy: &'a Taxonomy) -> Outcome<'a> {
    match intent {
        Intent::FilterByCategory { .. }
        | Intent::FilterByAction { .. }
        | Intent::FilterByHookName { .. } => {
            let Some((field, value)) = intent.filter_value() else {
                return Outcome::NotUnderstood;
            };
            match match_vocabulary(value, taxonomy.vocabulary(field)).entry() {
                Some(entry) => Outcome::Filtered {
                    field,
                    value: entry,
                    events: EventFilter::on(field, entry).apply(events),
                },
                None => Outcome::NoMatch {
                    field,
                    value: value.to_string(),
                },
            }
        }
        Intent::AskAboutCategories => Outcome::Listing {
            field: Field::Category,
            entries: &taxonomy.categories,
        },
        Intent::AskAboutActions => Outcome::Listing {
            field: Field::Action,
            entries: &taxonomy.actions,
        },
        Intent::AskAboutHookNames => Outcome::Listing {
            field: Field::HookName,
            entries: &taxonomy.hook_names,
        },
        Intent::ShowDuplicates => Outcome::Duplicates(find_duplicates(events)),
        Intent::Unknown => Outcome::NotUnderstood,
    }
}
