//! Parser for the account mapping tag.
//!
//! Ledger account notes link an account to a bank account with a tag of the
//! form `<namespace>.<key>:<source account id>`, e.g. `fbs.mono:4hQ3kR0`.
//! Only the first tag of a notes field counts.

use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTag {
    pub namespace: String,
    pub key: String,
    pub value: String,
}

impl MappingTag {
    /// Parse a single tag. The value is everything after the first `:`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let (head, value) = input
            .split_once(':')
            .ok_or_else(|| Error::InvalidMappingTag(format!("missing ':' in '{}'", input)))?;
        let (namespace, key) = head
            .split_once('.')
            .ok_or_else(|| Error::InvalidMappingTag(format!("missing '.' in '{}'", input)))?;

        let value = value.trim();
        if namespace.is_empty() || key.is_empty() || value.is_empty() {
            return Err(Error::InvalidMappingTag(format!(
                "expected namespace.key:value, got '{}'",
                input
            )));
        }

        Ok(Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Find the first tag of `namespace` in free-form notes.
    ///
    /// The tag runs from `<namespace>.` to the end of its line. Later tags
    /// in the same notes are ignored, even when the first one is malformed.
    pub fn find_in(notes: &str, namespace: &str) -> Option<Result<Self>> {
        let prefix = format!("{}.", namespace);
        let start = notes.find(&prefix)?;
        let line = notes[start..].lines().next().unwrap_or_default();
        Some(Self::parse(line))
    }
}

impl FromStr for MappingTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MappingTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.namespace, self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        let tag: MappingTag = "fbs.mono:4hQ3kR0".parse().unwrap();
        assert_eq!(tag.namespace, "fbs");
        assert_eq!(tag.key, "mono");
        assert_eq!(tag.value, "4hQ3kR0");
        assert_eq!(tag.to_string(), "fbs.mono:4hQ3kR0");
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let tag = MappingTag::parse("fbs.mono:a:b").unwrap();
        assert_eq!(tag.value, "a:b");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(MappingTag::parse("fbs.mono").is_err());
        assert!(MappingTag::parse("fbsmono:abc").is_err());
        assert!(MappingTag::parse("fbs.mono:").is_err());
        assert!(MappingTag::parse("fbs.:abc").is_err());
    }

    #[test]
    fn test_find_in_notes() {
        let notes = "Main card\nfbs.mono:abc123\nother text";
        let tag = MappingTag::find_in(notes, "fbs").unwrap().unwrap();
        assert_eq!(tag.value, "abc123");
    }

    #[test]
    fn test_find_in_uses_first_tag_only() {
        let notes = "fbs.mono:first\nfbs.mono:second";
        let tag = MappingTag::find_in(notes, "fbs").unwrap().unwrap();
        assert_eq!(tag.value, "first");
    }

    #[test]
    fn test_find_in_without_tag() {
        assert!(MappingTag::find_in("just notes", "fbs").is_none());
        assert!(MappingTag::find_in("", "fbs").is_none());
    }

    #[test]
    fn test_find_in_malformed_first_tag() {
        let notes = "fbs.broken\nfbs.mono:abc";
        assert!(MappingTag::find_in(notes, "fbs").unwrap().is_err());
    }
}
