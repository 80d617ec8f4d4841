//! String inflection utilities for table/column name matching.
//!
//! Built on the `inflector` crate, with a lookup table for irregular
//! plurals that show up in real schemas and that inflector gets wrong
//! (or right only by accident).

use inflector::Inflector;

/// Irregular singular/plural pairs seen in database table names.
static IRREGULARS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("status", "statuses"),
    ("address", "addresses"),
    ("category", "categories"),
    ("company", "companies"),
    ("country", "countries"),
    ("inventory", "inventories"),
    ("analysis", "analyses"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("datum", "data"),
    ("medium", "media"),
];

/// Pluralize a word, irregulars first, inflector as fallback.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULARS {
        if lower == *singular || lower == *plural {
            return (*plural).to_string();
        }
    }

    lower.to_plural()
}

/// Singularize a word, irregulars first, inflector as fallback.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULARS {
        if lower == *singular || lower == *plural {
            return (*singular).to_string();
        }
    }

    lower.to_singular()
}
