//! Header collection with a one-way freeze.
//!
//! # Responsibilities
//! - Case-insensitive header storage (backed by `HeaderMap`)
//! - Fetch-style accessors (`get` joins repeated values with `", "`)
//! - Reject every write once the collection is frozen
//!
//! # Design Decisions
//! - The frozen flag is checked at the top of each mutating method
//! - There is no way to unfreeze a collection
//! - Copies are never frozen; request and response clones re-freeze explicitly

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{ShimError, ShimResult};

/// An ordered, case-insensitive header collection.
#[derive(Debug, Default)]
pub struct Headers {
    map: HeaderMap,
    frozen: bool,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from `(name, value)` string pairs, appending in order.
    pub fn from_pairs<'a, I>(pairs: I) -> ShimResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.append(name, value)?;
        }
        Ok(headers)
    }

    /// All values for `name` joined with `", "`, or `None` when absent.
    ///
    /// Values that are not valid UTF-8 are skipped.
    pub fn get(&self, name: &str) -> Option<String> {
        let values = self.get_all(name);
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.map
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    pub fn has(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Replace all values for `name` with `value`.
    pub fn set(&mut self, name: &str, value: &str) -> ShimResult<()> {
        self.ensure_mutable()?;
        let (name, value) = parse_pair(name, value)?;
        self.map.insert(name, value);
        Ok(())
    }

    /// Add `value` alongside any existing values for `name`.
    pub fn append(&mut self, name: &str, value: &str) -> ShimResult<()> {
        self.ensure_mutable()?;
        let (name, value) = parse_pair(name, value)?;
        self.map.append(name, value);
        Ok(())
    }

    /// Remove every value for `name`. Removing an absent header is not an error.
    pub fn delete(&mut self, name: &str) -> ShimResult<()> {
        self.ensure_mutable()?;
        let name = HeaderName::from_bytes(name.as_bytes())?;
        self.map.remove(name);
        Ok(())
    }

    /// Make every later `set`, `append`, and `delete` fail. Idempotent.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.map.iter()
    }

    /// Number of stored values (repeated headers count once per value).
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn as_header_map(&self) -> &HeaderMap {
        &self.map
    }

    pub(crate) fn into_header_map(self) -> HeaderMap {
        self.map
    }

    fn ensure_mutable(&self) -> ShimResult<()> {
        if self.frozen {
            return Err(ShimError::ImmutableHeaders);
        }
        Ok(())
    }
}

/// Copies the entries only. The copy starts out mutable.
impl Clone for Headers {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            frozen: false,
        }
    }
}

impl From<HeaderMap> for Headers {
    fn from(map: HeaderMap) -> Self {
        Self { map, frozen: false }
    }
}

/// Freeze `headers` in place.
pub fn freeze_headers(headers: &mut Headers) {
    headers.freeze();
}

fn parse_pair(name: &str, value: &str) -> ShimResult<(HeaderName, HeaderValue)> {
    let name = HeaderName::from_bytes(name.as_bytes())?;
    let value = HeaderValue::from_str(value)?;
    Ok((name, value))
}
