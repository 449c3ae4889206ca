//! Analytics event records and the operations the command layer runs over them.
//!
//! Corpora arrive as arbitrary JSON exported from an analytics pipeline, so loading is
//! lenient: a field that is not a string is treated as absent, and array entries that are
//! not objects are dropped.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

// ============================================================================
// Event
// ============================================================================

/// One recorded analytics occurrence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Screen the event was recorded on
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub screen_name: Option<String>,

    /// Action name (e.g. "login_with_password")
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Category name (e.g. "signin")
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Free-form attributes; may carry `hook_name` and `hook_screen`
    #[serde(default, deserialize_with = "lenient_label", skip_serializing_if = "Option::is_none")]
    pub label: Option<Map<String, Value>>,
}

impl Event {
    /// `label.hook_name`, when it is a string
    pub fn hook_name(&self) -> Option<&str> {
        self.label_str("hook_name")
    }

    /// `label.hook_screen`, when it is a string
    pub fn hook_screen(&self) -> Option<&str> {
        self.label_str("hook_screen")
    }

    fn label_str(&self, key: &str) -> Option<&str> {
        self.label.as_ref()?.get(key)?.as_str()
    }

    /// Value of a vocabulary field, skipping empty strings
    pub fn field(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Category => self.category.as_deref(),
            Field::Action => self.action.as_deref(),
            Field::HookName => self.hook_name(),
        };
        value.filter(|v| !v.is_empty())
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_label<'de, D>(deserializer: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => Some(map),
        _ => None,
    })
}

/// The three event fields a taxonomy is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Category,
    Action,
    HookName,
}

impl Field {
    /// Human-readable name used in answers and error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Field::Category => "category",
            Field::Action => "action",
            Field::HookName => "hook name",
        }
    }
}

// ============================================================================
// Corpus Document
// ============================================================================

/// Extract events from a corpus document.
///
/// Only the array form carries events; a keyed object (or any other JSON value) yields an
/// empty sequence.
pub fn events_from_document(document: Value) -> Vec<Event> {
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(map) => {
            warn!(
                "Corpus is a keyed object with {} entries, not an event array; ignoring",
                map.len()
            );
            return Vec::new();
        }
        other => {
            warn!("Corpus is not an event array (found {}); ignoring", json_kind(&other));
            return Vec::new();
        }
    };

    let total = entries.len();
    let events: Vec<Event> = entries
        .into_iter()
        .filter_map(|entry| match entry {
            // serde would also accept an array here, binding fields by position
            Value::Object(_) => serde_json::from_value(entry).ok(),
            _ => None,
        })
        .collect();

    if events.len() < total {
        warn!("Skipped {} corpus entries that are not objects", total - events.len());
    }
    debug!("Loaded {} events", events.len());
    events
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Filtering
// ============================================================================

/// Exact-equality filter over the vocabulary fields; `None` means "all"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub category: Option<String>,
    pub action: Option<String>,
    pub hook_name: Option<String>,
}

impl EventFilter {
    /// Filter on a single field
    pub fn on(field: Field, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            Field::Category => Self {
                category: value,
                ..Self::default()
            },
            Field::Action => Self {
                action: value,
                ..Self::default()
            },
            Field::HookName => Self {
                hook_name: value,
                ..Self::default()
            },
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        let accepts = |wanted: &Option<String>, actual: Option<&str>| match wanted {
            Some(w) => actual == Some(w.as_str()),
            None => true,
        };
        accepts(&self.category, event.category.as_deref())
            && accepts(&self.action, event.action.as_deref())
            && accepts(&self.hook_name, event.hook_name())
    }

    pub fn apply<'a>(&self, events: &'a [Event]) -> Vec<&'a Event> {
        events.iter().filter(|e| self.matches(e)).collect()
    }
}

/// Count events per value of `field`, most frequent first (ties by name)
pub fn breakdown(events: &[&Event], field: Field) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for event in events {
        if let Some(value) = event.field(field) {
            *counts.entry(value).or_insert(0) += 1;
        }
    }
    let mut sorted: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

// ============================================================================
// Duplicates
// ============================================================================

/// A repeat of an earlier event with the same screen, action, category and hook
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateEvent<'a> {
    pub first_index: usize,
    pub dup_index: usize,
    pub event: &'a Event,
}

type DuplicateKey<'a> = (Option<&'a str>, Option<&'a str>, Option<&'a str>, Option<&'a str>);

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn duplicate_key(event: &Event) -> DuplicateKey<'_> {
    (
        non_empty(event.screen_name.as_deref()),
        non_empty(event.action.as_deref()),
        non_empty(event.category.as_deref()),
        non_empty(event.hook_name()),
    )
}

/// Every event whose key was already seen, paired with the first occurrence's index
pub fn find_duplicates(events: &[Event]) -> Vec<DuplicateEvent<'_>> {
    let mut seen: HashMap<DuplicateKey<'_>, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    for (idx, event) in events.iter().enumerate() {
        let key = duplicate_key(event);
        match seen.get(&key) {
            Some(&first_index) => duplicates.push(DuplicateEvent {
                first_index,
                dup_index: idx,
                event,
            }),
            None => {
                seen.insert(key, idx);
            }
        }
    }

    duplicates
}

// ============================================================================
// Flows
// ============================================================================

/// Stand-in for a missing screen name or action in flow output
pub const UNKNOWN_STEP: &str = "UNKNOWN";

/// One node of a flow: the screen an event happened on and what was done there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FlowStep<'a> {
    pub screen: &'a str,
    pub action: &'a str,
}

impl<'a> FlowStep<'a> {
    pub fn of(event: &'a Event) -> Self {
        Self {
            screen: non_empty(event.screen_name.as_deref()).unwrap_or(UNKNOWN_STEP),
            action: non_empty(event.action.as_deref()).unwrap_or(UNKNOWN_STEP),
        }
    }
}

/// How often `from` was immediately followed by `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition<'a> {
    pub from: FlowStep<'a>,
    pub to: FlowStep<'a>,
    pub count: usize,
}

/// Consecutive step pairs in corpus order, most frequent first (ties by step order)
pub fn transitions<'a>(events: &[&'a Event]) -> Vec<Transition<'a>> {
    let mut counts: HashMap<(FlowStep<'a>, FlowStep<'a>), usize> = HashMap::new();
    for pair in events.windows(2) {
        let key = (FlowStep::of(pair[0]), FlowStep::of(pair[1]));
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut sorted: Vec<Transition<'a>> = counts
        .into_iter()
        .map(|((from, to), count)| Transition { from, to, count })
        .collect();
    sorted.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| (a.from, a.to).cmp(&(b.from, b.to)))
    });
    sorted
}

/// Events grouped by screen. Lanes appear in first-seen order; `steps` are positions in
/// the input, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenLane<'a> {
    pub screen: &'a str,
    pub steps: Vec<usize>,
}

pub fn lanes_by_screen<'a>(events: &[&'a Event]) -> Vec<ScreenLane<'a>> {
    let mut lanes: Vec<ScreenLane<'a>> = Vec::new();
    let mut lane_of: HashMap<&'a str, usize> = HashMap::new();

    for (position, &event) in events.iter().enumerate() {
        let screen = FlowStep::of(event).screen;
        let lane = *lane_of.entry(screen).or_insert_with(|| {
            lanes.push(ScreenLane {
                screen,
                steps: Vec::new(),
            });
            lanes.len() - 1
        });
        lanes[lane].steps.push(position);
    }
    lanes
}

// ============================================================================
// Tests
// ============================================================================
