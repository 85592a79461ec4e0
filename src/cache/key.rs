//! Cache addressing.
//!
//! An entry is identified by (subject, filter, language). Older callers
//! address it with a requested count as well, so every entry is also
//! reachable under legacy keys of the form `{subject}_{count}_{filter}_{language}`.

use std::fmt;

use crate::types::{ReviewFilter, normalize_language};

/// The identifying fields of one logical cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryAddress {
    pub subject_id: String,
    pub filter: ReviewFilter,
    pub language: String,
}

impl EntryAddress {
    pub fn new(subject_id: &str, filter: ReviewFilter, language: &str) -> Self {
        Self {
            subject_id: subject_id.trim().to_string(),
            filter,
            language: normalize_language(language),
        }
    }

    /// Count-independent key used for top-up.
    pub fn primary_key(&self) -> CacheKey {
        CacheKey(format!(
            "{}:{}:{}",
            self.subject_id, self.filter, self.language
        ))
    }

    /// Historical key that also carries a review count.
    pub fn legacy_key(&self, count: u32) -> CacheKey {
        CacheKey(format!(
            "{}_{}_{}_{}",
            self.subject_id, count, self.filter, self.language
        ))
    }

    /// Keys to try on lookup, primary first.
    pub fn lookup_keys(&self, count_hint: Option<u32>) -> Vec<CacheKey> {
        let mut keys = vec![self.primary_key()];
        keys.extend(count_hint.map(|count| self.legacy_key(count)));
        keys
    }

    /// Keys an entry is written under: primary plus one legacy key per count.
    pub fn store_keys(&self, counts: &[u32]) -> Vec<CacheKey> {
        let mut keys = vec![self.primary_key()];
        for &count in counts {
            let key = self.legacy_key(count);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

impl fmt::Display for EntryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.subject_id, self.filter, self.language)
    }
}

/// A string key into the analysis cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_key_keeps_historical_format() {
        let addr = EntryAddress::new("570", ReviewFilter::Recent, "English");
        assert_eq!(addr.legacy_key(1000).as_str(), "570_1000_recent_english");
        assert_eq!(addr.primary_key().as_str(), "570:recent:english");
    }

    #[test]
    fn lookup_tries_primary_first() {
        let addr = EntryAddress::new("570", ReviewFilter::All, "");
        let keys = addr.lookup_keys(Some(50));
        assert_eq!(keys[0], addr.primary_key());
        assert_eq!(keys[1].as_str(), "570_50_all_english");
        assert_eq!(addr.lookup_keys(None).len(), 1);
    }

    #[test]
    fn store_keys_are_deduplicated() {
        let addr = EntryAddress::new("1", ReviewFilter::Recent, "english");
        assert_eq!(addr.store_keys(&[100, 100]).len(), 2);
        assert_eq!(addr.store_keys(&[100, 22]).len(), 3);
    }
}
