//! Keyword-driven place inference.
//!
//! A [`PlaceTable`] is an ordered list of `(keyword, name, address)` rows.
//! The first row whose keyword occurs in the text wins, so more specific
//! keywords must come before the ones that also appear in their context.

use serde::{Deserialize, Serialize};

/// Name reported when no keyword matches.
pub const UNSPECIFIED_PLACE: &str = "unspecified";

const BUILTIN_PLACES: &[(&str, &str, &str)] = &[
    ("Ayvalık", "Ayvalık", "Ayvalık, Balıkesir"),
    ("Foça", "Foça", "Eski Foça, İzmir"),
    ("Kuşadası", "Kuşadası", "Kuşadası, Aydın"),
    ("Akyaka", "Akyaka (Gökova)", "Akyaka, Muğla"),
    ("Gökova", "Akyaka (Gökova)", "Akyaka, Muğla"),
    ("Muğla", "Muğla", "Muğla Merkez"),
];

/// One row of the keyword table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRule {
    pub keyword: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
}

/// Best guess for a block of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceGuess<'a> {
    pub name: &'a str,
    pub address: &'a str,
}

impl PlaceGuess<'_> {
    pub fn is_unspecified(&self) -> bool {
        self.name == UNSPECIFIED_PLACE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceTable {
    rules: Vec<PlaceRule>,
}

impl PlaceTable {
    pub fn new(rules: Vec<PlaceRule>) -> Self {
        Self { rules }
    }

    /// The built-in Aegean coast table.
    pub fn builtin() -> Self {
        let rules = BUILTIN_PLACES
            .iter()
            .map(|(keyword, name, address)| PlaceRule {
                keyword: (*keyword).to_owned(),
                name: (*name).to_owned(),
                address: (*address).to_owned(),
            })
            .collect();
        Self { rules }
    }

    pub fn rules(&self) -> &[PlaceRule] {
        &self.rules
    }

    /// Return `(name, address)` of the first rule whose keyword occurs in
    /// `text`, or `("unspecified", "")`.
    pub fn infer(&self, text: &str) -> PlaceGuess<'_> {
        match first_match(&self.rules, |rule| rule.keyword.as_str(), text) {
            Some(rule) => PlaceGuess {
                name: &rule.name,
                address: &rule.address,
            },
            None => PlaceGuess {
                name: UNSPECIFIED_PLACE,
                address: "",
            },
        }
    }
}

impl Default for PlaceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// First item whose key is a non-empty substring of `text`.
fn first_match<'t, T>(items: &'t [T], key: impl Fn(&T) -> &str, text: &str) -> Option<&'t T> {
    items.iter().find(|item| {
        let needle = key(item);
        !needle.is_empty() && text.contains(needle)
    })
}
