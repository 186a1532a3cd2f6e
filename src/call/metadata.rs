// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Call metadata: the headers sent with a call and the trailers that end it.

use std::fmt;

use crate::errors::MetadataError;

/// An ordered multimap of ASCII metadata entries.
///
/// Keys are case-insensitive and stored lowercase. Insertion order is kept so
/// that whatever the transport writes on the wire matches what interceptors
/// added.
///
/// # Example
///
/// ```rust
/// use rpc_intercept::Metadata;
///
/// let mut headers = Metadata::new();
/// headers.insert("X-Request-Id", "abc123").unwrap();
/// assert_eq!(headers.get("x-request-id"), Some("abc123"));
///
/// // Binary headers are a wire concern and are rejected here
/// assert!(headers.insert("payload-bin", "AAEC").is_err());
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    /// Creates an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing every existing entry for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] if the key or value is not valid ASCII metadata.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) -> Result<(), MetadataError> {
        let (key, value) = validate(key, value.into())?;
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, value));
        Ok(())
    }

    /// Adds an entry for `key`, keeping existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] if the key or value is not valid ASCII metadata.
    pub fn append(&mut self, key: &str, value: impl Into<String>) -> Result<(), MetadataError> {
        let entry = validate(key, value.into())?;
        self.entries.push(entry);
        Ok(())
    }

    /// Returns the first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for `key`, in insertion order.
    pub fn get_all<'a, 'k>(&'a self, key: &'k str) -> impl Iterator<Item = &'a str> + use<'a, 'k> {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes every entry for `key`, returning the first removed value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let mut removed = None;
        self.entries.retain(|(k, v)| {
            if k.eq_ignore_ascii_case(key) {
                if removed.is_none() {
                    removed = Some(v.clone());
                }
                false
            } else {
                true
            }
        });
        removed
    }

    /// Appends every entry of `other`.
    pub fn merge(&mut self, other: &Metadata) {
        self.entries.extend(other.entries.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

fn validate(key: &str, value: String) -> Result<(String, String), MetadataError> {
    let key_ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
    let key_lower = key.to_ascii_lowercase();
    if !key_ok || key_lower.ends_with("-bin") {
        return Err(MetadataError::InvalidKey {
            key: key.to_string(),
        });
    }

    if !value.bytes().all(|b| b == b' ' || b.is_ascii_graphic()) {
        return Err(MetadataError::InvalidValue { key: key_lower });
    }

    Ok((key_lower, value))
}
