//! Artifact version ordering.
//!
//! Versions follow Maven's comparison rules:
//! - items are split on `.`, `-` and `_`, and where digits meet letters
//! - numeric items compare as numbers, trailing zero items are insignificant
//! - known qualifiers order
//!   `alpha` < `beta` < `milestone` < `rc` < `snapshot` < release < `sp`
//! - unknown qualifiers sort after `sp`, case-insensitively among themselves

use std::cmp::Ordering;
use std::fmt;

/// A parsed artifact version that keeps its original spelling.
#[derive(Debug, Clone)]
pub struct ArtifactVersion {
    raw: String,
    items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(u64),
    Qualifier(Qualifier),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Qualifier {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
    Other(String),
}

impl Qualifier {
    fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "alpha" | "a" => Self::Alpha,
            "beta" | "b" => Self::Beta,
            "milestone" | "m" => Self::Milestone,
            "rc" | "cr" => Self::Rc,
            "snapshot" => Self::Snapshot,
            "ga" | "final" | "release" => Self::Release,
            "sp" => Self::Sp,
            other => Self::Other(other.to_string()),
        }
    }
}

impl ArtifactVersion {
    pub fn parse(raw: &str) -> Self {
        let mut items = Vec::new();
        let mut token = String::new();
        let mut digits = false;

        for ch in raw.trim().chars() {
            if ch == '.' || ch == '-' || ch == '_' {
                flush(&mut token, digits, &mut items);
                continue;
            }
            let is_digit = ch.is_ascii_digit();
            if !token.is_empty() && is_digit != digits {
                flush(&mut token, digits, &mut items);
            }
            digits = is_digit;
            token.push(ch);
        }
        flush(&mut token, digits, &mut items);

        Self {
            raw: raw.to_string(),
            items,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_snapshot(&self) -> bool {
        self.items.contains(&Item::Qualifier(Qualifier::Snapshot))
    }
}

fn flush(token: &mut String, digits: bool, items: &mut Vec<Item>) {
    if token.is_empty() {
        return;
    }
    let item = match token.parse::<u64>() {
        Ok(n) if digits => Item::Number(n),
        _ => Item::Qualifier(Qualifier::from_token(token)),
    };
    items.push(item);
    token.clear();
}

/// How an item compares against a missing item on the other side.
fn against_missing(item: &Item) -> Ordering {
    match item {
        Item::Number(0) => Ordering::Equal,
        Item::Number(_) => Ordering::Greater,
        Item::Qualifier(q) => q.cmp(&Qualifier::Release),
    }
}

impl Ord for ArtifactVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        (0..len)
            .map(|i| match (self.items.get(i), other.items.get(i)) {
                (Some(Item::Number(a)), Some(Item::Number(b))) => a.cmp(b),
                (Some(Item::Qualifier(a)), Some(Item::Qualifier(b))) => a.cmp(b),
                (Some(Item::Number(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
                (Some(Item::Qualifier(_)), Some(Item::Number(_))) => Ordering::Less,
                (Some(a), None) => against_missing(a),
                (None, Some(b)) => against_missing(b).reverse(),
                (None, None) => Ordering::Equal,
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for ArtifactVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ArtifactVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ArtifactVersion {}

impl fmt::Display for ArtifactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
