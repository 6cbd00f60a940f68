use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::MalformedReference;

/// Reference designator with natural ordering (R1 < R2 < R10).
///
/// Ordering is by prefix, then numeric suffix. References without a numeric
/// suffix sort after every well-formed reference sharing their prefix and are
/// ordered by their full text among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct RefDes {
    raw: String,
    prefix: String,
    number: Option<u64>,
}

impl RefDes {
    /// Split `raw` into its alphabetic prefix and numeric suffix.
    pub fn parse(raw: &str) -> Result<Self, MalformedReference> {
        let trimmed = raw.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (prefix, digits) = trimmed.split_at(split);

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(MalformedReference::new(raw));
        }
        let number = digits
            .parse::<u64>()
            .map_err(|_| MalformedReference::new(raw))?;

        Ok(Self {
            raw: raw.to_string(),
            prefix: prefix.to_string(),
            number: Some(number),
        })
    }

    /// Like [`RefDes::parse`], but malformed references fall back to lexical
    /// ordering instead of failing. The parse error is handed back so the
    /// caller can report it.
    pub fn normalize(raw: &str) -> (Self, Option<MalformedReference>) {
        match Self::parse(raw) {
            Ok(refdes) => (refdes, None),
            Err(err) => (Self::lexical(raw), Some(err)),
        }
    }

    fn lexical(raw: &str) -> Self {
        let trimmed = raw.trim();
        let prefix: String = trimmed
            .chars()
            .take_while(|c| !c.is_ascii_digit())
            .collect();
        Self {
            raw: raw.to_string(),
            prefix,
            number: None,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn number(&self) -> Option<u64> {
        self.number
    }

    pub fn is_well_formed(&self) -> bool {
        self.number.is_some()
    }
}

impl From<String> for RefDes {
    fn from(s: String) -> Self {
        Self::normalize(&s).0
    }
}

impl From<&str> for RefDes {
    fn from(s: &str) -> Self {
        Self::normalize(s).0
    }
}

impl From<RefDes> for String {
    fn from(r: RefDes) -> Self {
        r.raw
    }
}

impl AsRef<str> for RefDes {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for RefDes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl PartialOrd for RefDes {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RefDes {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prefix
            .cmp(&other.prefix)
            .then_with(|| match (self.number, other.number) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RefDes {
        RefDes::parse(s).unwrap()
    }

    #[test]
    fn test_numeric_suffix_orders_naturally() {
        assert!(key("R2") < key("R9"));
        assert!(key("R9") < key("R10"));
        assert!(key("R2") < key("R10"));
    }

    #[test]
    fn test_prefixes_order_lexically() {
        assert!(key("C10") < key("R1"));
        assert!(key("R1") < key("RN1"));
        assert!(key("D3") < key("U1"));
    }

    #[test]
    fn test_missing_suffix_is_malformed() {
        let err = RefDes::parse("TP").unwrap_err();
        assert_eq!(err.reference, "TP");
        assert!(RefDes::parse("R1A").is_err());
        assert!(RefDes::parse("").is_err());
    }

    #[test]
    fn test_malformed_sorts_after_well_formed_with_same_prefix() {
        let (malformed, err) = RefDes::normalize("R1A");
        assert!(err.is_some());
        assert!(!malformed.is_well_formed());
        assert!(key("R999") < malformed);
        assert!(malformed < key("U1"));

        let (a, _) = RefDes::normalize("RA");
        let (b, _) = RefDes::normalize("RB");
        assert!(a < b);
    }

    #[test]
    fn test_total_order_over_distinct_references() {
        let mut refs: Vec<RefDes> = ["R10", "R01", "R1", "TP", "C2", "R1A", "C10"]
            .iter()
            .map(|s| RefDes::from(*s))
            .collect();
        refs.sort();
        let sorted: Vec<String> = refs.iter().map(|r| r.to_string()).collect();
        assert_eq!(sorted, vec!["C2", "C10", "R01", "R1", "R10", "R1A", "TP"]);

        for (i, a) in refs.iter().enumerate() {
            for (j, b) in refs.iter().enumerate() {
                assert_eq!(a.cmp(b) == Ordering::Equal, i == j);
            }
        }
    }

    #[test]
    fn test_serde_transparent() {
        let r = key("C12");
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"C12\"");
        let back: RefDes = serde_json::from_str("\"C12\"").unwrap();
        assert_eq!(back, r);
    }
}
