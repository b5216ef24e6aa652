//! Query string builder
//!
//! Keeps parameters in insertion order. `add` always appends, so duplicate
//! keys survive; `add_or_update` rewrites the first pair with the same key in
//! place and only appends when the key is new.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(String, String)>,
}

/// Split "key=value" on the first '='. A bare "key" gets an empty value.
fn split_param(param: &str) -> (&str, &str) {
    param.split_once('=').unwrap_or((param, ""))
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair, even if the key is already present
    pub fn add(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a pair given as "key=value"
    pub fn add_param(self, param: &str) -> Self {
        let (key, value) = split_param(param);
        self.add(key, value)
    }

    pub fn add_all<I, S>(self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        params
            .into_iter()
            .fold(self, |builder, param| builder.add_param(param.as_ref()))
    }

    /// Replace the value of the first pair with this key, or append
    pub fn add_or_update(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn add_or_update_param(self, param: &str) -> Self {
        let (key, value) = split_param(param);
        self.add_or_update(key, value)
    }

    pub fn add_or_update_all<I, S>(self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        params
            .into_iter()
            .fold(self, |builder, param| builder.add_or_update_param(param.as_ref()))
    }

    /// In-place form of [`QueryParams::add`]
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// In-place form of [`QueryParams::add_or_update`]
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();

        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Value of the first pair with this key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Render as "?k1=v1&k2=v2", or "" when empty
    pub fn build(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }

        let query = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("?{}", query)
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::new(), |builder, (k, v)| builder.add(k, v))
    }
}
