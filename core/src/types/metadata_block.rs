use std::collections::BTreeMap;

/// Key/value pairs from the vendor's embedded free-text block
///
/// Keys are unique; a repeated key keeps its last value. The block is empty
/// when the image carries no vendor block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct MetadataBlock {
    entries: BTreeMap<String, String>,
}

impl MetadataBlock {
    /// Creates an empty block
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair, replacing any earlier value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns the value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataBlock {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut block = MetadataBlock::new();
        for (k, v) in iter {
            block.insert(k, v);
        }
        block
    }
}
