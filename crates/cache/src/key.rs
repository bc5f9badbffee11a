//! Deterministic cache keys.

use sha2::{Digest, Sha256};

/// Digest of a query shape: name plus canonically ordered filters.
///
/// Two calls with the same logical query and filters produce the same
/// key regardless of parameter insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new<K, V>(query_name: &str, filters: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut pairs: Vec<(&str, &str)> = filters
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();
        pairs.sort_unstable();

        let mut hasher = Sha256::new();
        hasher.update(query_name.as_bytes());
        for (k, v) in pairs {
            // Field separators keep ("a","bc") distinct from ("ab","c").
            hasher.update([0x1f]);
            hasher.update(k.as_bytes());
            hasher.update([0x1e]);
            hasher.update(v.as_bytes());
        }

        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
