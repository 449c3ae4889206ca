//! Pattern-based intent parsing.
//!
//! Runs on every utterance, needs neither network nor taxonomy, and always produces an
//! intent. Rules are tried in a fixed order and the first match wins, so a phrase like
//! "show duplicate signin category" is a duplicates request, not a category filter.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::event::Field;
use crate::intent::Intent;

// ============================================================================
// Patterns
// ============================================================================

lazy_static! {
    static ref RE_DUPLICATES: Regex = Regex::new(r"\bduplicates?\b").unwrap();

    // Listing / counting questions
    static ref RE_ASK_CATEGORIES: Regex =
        Regex::new(r"(what|which|list|show|how\s+many)\s+(are\s+the\s+)?categories").unwrap();
    static ref RE_ASK_ACTIONS: Regex =
        Regex::new(r"(what|which|list|show|how\s+many)\s+(are\s+the\s+)?actions").unwrap();
    static ref RE_ASK_HOOK_NAMES: Regex =
        Regex::new(r"(what|which|list|show|how\s+many)\s+(are\s+the\s+)?hook\s*names?").unwrap();
    static ref RE_HOOKNAME_TOKEN: Regex = Regex::new(r"hookname").unwrap();

    // Explicit filter verbs
    static ref RE_FILTER_CATEGORY: Regex =
        Regex::new(r"(?:show|filter|display)(?:\s+me)?\s+(?:the\s+)?category\s+([0-9A-Za-z_\-]+)").unwrap();
    static ref RE_FILTER_ACTION: Regex =
        Regex::new(r"(?:show|filter|display)(?:\s+me)?\s+(?:the\s+)?action\s+([0-9A-Za-z_\-]+)").unwrap();
    static ref RE_FILTER_HOOK: Regex =
        Regex::new(r"(?:show|filter|display)(?:\s+me)?\s+(?:the\s+)?hook(?:\s*name)?\s+([0-9A-Za-z_\-]+)")
            .unwrap();

    // Loose juxtaposition: "<keyword> <token>" then "<token> <keyword>"
    static ref RE_CATEGORY_BEFORE: Regex = Regex::new(r"category\s+([0-9A-Za-z_\-]+)").unwrap();
    static ref RE_CATEGORY_AFTER: Regex = Regex::new(r"([0-9A-Za-z_\-]+)\s+category").unwrap();
    static ref RE_ACTION_BEFORE: Regex = Regex::new(r"action\s+([0-9A-Za-z_\-]+)").unwrap();
    static ref RE_ACTION_AFTER: Regex = Regex::new(r"([0-9A-Za-z_\-]+)\s+action").unwrap();
    static ref RE_HOOK_BEFORE: Regex = Regex::new(r"hook(?:\s*name)?\s+([0-9A-Za-z_\-]+)").unwrap();
    static ref RE_HOOK_AFTER: Regex = Regex::new(r"([0-9A-Za-z_\-]+)\s+hook(?:\s*name)?").unwrap();
}

/// First capture group of the first matching pattern
fn capture<'t>(patterns: &[&Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str())
}

// ============================================================================
// Parser
// ============================================================================

/// Parse an utterance into an intent. Total: anything unrecognised is [`Intent::Unknown`].
///
/// Extracted filter values are lower-cased fragments of the input; they are matched
/// against the taxonomy later by the resolver.
pub fn parse(text: &str) -> Intent {
    let lower = text.to_lowercase();
    let intent = parse_lower(&lower);
    debug!("Heuristic intent for {:?}: {:?}", lower, intent);
    intent
}

fn parse_lower(lower: &str) -> Intent {
    if RE_DUPLICATES.is_match(lower) {
        return Intent::ShowDuplicates;
    }

    if RE_ASK_CATEGORIES.is_match(lower) {
        return Intent::AskAboutCategories;
    }
    if RE_ASK_ACTIONS.is_match(lower) {
        return Intent::AskAboutActions;
    }
    if RE_ASK_HOOK_NAMES.is_match(lower) || RE_HOOKNAME_TOKEN.is_match(lower) {
        return Intent::AskAboutHookNames;
    }

    let explicit: [(Field, &Regex); 3] = [
        (Field::Category, &*RE_FILTER_CATEGORY),
        (Field::Action, &*RE_FILTER_ACTION),
        (Field::HookName, &*RE_FILTER_HOOK),
    ];
    for (field, re) in explicit {
        if let Some(token) = capture(&[re], lower) {
            return Intent::filter(field, token);
        }
    }

    let loose: [(Field, [&Regex; 2]); 3] = [
        (Field::Category, [&*RE_CATEGORY_BEFORE, &*RE_CATEGORY_AFTER]),
        (Field::Action, [&*RE_ACTION_BEFORE, &*RE_ACTION_AFTER]),
        (Field::HookName, [&*RE_HOOK_BEFORE, &*RE_HOOK_AFTER]),
    ];
    for (field, patterns) in loose {
        if let Some(token) = capture(&patterns, lower) {
            return Intent::filter(field, token);
        }
    }

    Intent::Unknown
}

// ============================================================================
// Tests
// ============================================================================
