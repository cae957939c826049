//! Request parameters and their canonical form.
//!
//! [`Parameters`] is an ordered map from name to [`ParamValue`]. Ordering is
//! by name, so the canonical string used for signing and the serialized
//! query string do not depend on insertion order.
//!
//! # Examples
//!
//! ```
//! use allopass_kit::protocol::Parameters;
//!
//! let mut params = Parameters::new();
//! params.insert("site_id", 127042);
//! params.insert("code", vec!["9M7QU457", "5G7AB331"]);
//!
//! assert_eq!(params.canonical_string(), "code9M7QU4575G7AB331site_id127042");
//! assert_eq!(
//!     params.to_query_string(),
//!     "code%5B0%5D=9M7QU457&code%5B1%5D=5G7AB331&site_id=127042"
//! );
//! ```

use std::collections::{BTreeMap, btree_map};

use serde::Deserialize;

use crate::error::{ApiError, Result};

/// Name of the API key parameter.
pub const API_KEY: &str = "api_key";
/// Name of the request timestamp parameter (unix seconds).
pub const API_TIMESTAMP: &str = "api_ts";
/// Name of the hash algorithm parameter.
pub const API_HASH: &str = "api_hash";
/// Name of the request signature parameter.
pub const API_SIGNATURE: &str = "api_sig";
/// Name of the response format parameter.
pub const FORMAT: &str = "format";

/// Parameter names set by the protocol layer itself.
pub const RESERVED_NAMES: [&str; 5] = [API_KEY, API_TIMESTAMP, API_HASH, API_SIGNATURE, FORMAT];

/// Single parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer, rendered in decimal.
    Integer(i64),
    /// Free text.
    Text(String),
    /// Ordered list, serialized as `name[0]=..&name[1]=..`.
    List(Vec<String>),
}

impl ParamValue {
    /// Renders the value for the canonical string.
    ///
    /// List elements are concatenated in order without separator.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Integer(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::List(values) => values.concat(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for ParamValue {
    fn from(values: &[&str]) -> Self {
        Self::List(values.iter().map(|v| (*v).to_owned()).collect())
    }
}

/// Name-ordered parameter map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(BTreeMap<String, ParamValue>);

impl Parameters {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, returning the previous value under that name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Whether a parameter named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Removes and returns the parameter named `name`.
    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.0.remove(name)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates parameters in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.0.iter()
    }

    /// Copies every parameter of `other` into `self`, overwriting on conflict.
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in other {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Rejects maps that use a protocol-reserved name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidParameter`] naming the first reserved key found.
    pub fn ensure_unreserved(&self) -> Result<()> {
        match RESERVED_NAMES.iter().find(|name| self.contains(name)) {
            Some(name) => Err(ApiError::InvalidParameter(format!(
                "'{name}' is set by the client and cannot be supplied"
            ))),
            None => Ok(()),
        }
    }

    /// Builds the string that request signatures are computed over.
    ///
    /// Each parameter contributes its name immediately followed by its
    /// canonical value, in ascending name order. `api_sig` is skipped.
    ///
    /// List elements are joined without a boundary, so the signature does
    /// not cover how a list value is split across `name[i]` entries:
    /// `["AB", "C"]` and `["A", "BC"]` sign identically.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        self.0
            .iter()
            .filter(|(name, _)| name.as_str() != API_SIGNATURE)
            .fold(String::new(), |mut acc, (name, value)| {
                acc.push_str(name);
                acc.push_str(&value.canonical());
                acc
            })
    }

    /// Flattens the map into wire pairs. Lists expand to `name[i]`.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            match value {
                ParamValue::Integer(v) => pairs.push((name.clone(), v.to_string())),
                ParamValue::Text(v) => pairs.push((name.clone(), v.clone())),
                ParamValue::List(values) => {
                    for (index, v) in values.iter().enumerate() {
                        pairs.push((format!("{name}[{index}]"), v.clone()));
                    }
                }
            }
        }
        pairs
    }

    /// Serializes the map as `application/x-www-form-urlencoded`.
    ///
    /// Used both for GET query strings and POST bodies.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in self.to_pairs() {
            serializer.append_pair(&name, &value);
        }
        serializer.finish()
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;
    type Item = (&'a String, &'a ParamValue);

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Parameters
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl From<BTreeMap<String, ParamValue>> for Parameters {
    fn from(map: BTreeMap<String, ParamValue>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_string_sorted_by_name() {
        let params = Parameters::from([("site_id", "127042"), ("product_id", "354926")]);
        assert_eq!(params.canonical_string(), "product_id354926site_id127042");
    }

    #[test]
    fn test_canonical_string_independent_of_insertion_order() {
        let mut first = Parameters::new();
        first.insert("b", "2");
        first.insert("a", "1");
        first.insert("c", 3);

        let mut second = Parameters::new();
        second.insert("c", 3);
        second.insert("a", "1");
        second.insert("b", "2");

        assert_eq!(first.canonical_string(), second.canonical_string());
        assert_eq!(first.to_query_string(), second.to_query_string());
    }

    #[test]
    fn test_canonical_string_skips_signature() {
        let params = Parameters::from([("api_sig", "deadbeef"), ("id", "1")]);
        assert_eq!(params.canonical_string(), "id1");
    }

    #[test]
    fn test_canonical_string_concatenates_lists() {
        let params = Parameters::new().with("code", vec!["A", "B", "C"]);
        assert_eq!(params.canonical_string(), "codeABC");
    }

    #[test]
    fn test_list_split_not_part_of_canonical_string() {
        let left = Parameters::new().with("code", vec!["AB", "C"]);
        let right = Parameters::new().with("code", vec!["A", "BC"]);

        assert_eq!(left.canonical_string(), right.canonical_string());
        assert_ne!(left.to_pairs(), right.to_pairs());
    }

    #[test]
    fn test_empty_parameters() {
        let params = Parameters::new();
        assert!(params.is_empty());
        assert_eq!(params.canonical_string(), "");
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn test_query_string_encodes_special_characters() {
        let params = Parameters::new().with("data", "a b&c=d");
        assert_eq!(params.to_query_string(), "data=a+b%26c%3Dd");
    }

    #[test]
    fn test_list_pairs_are_indexed() {
        let params = Parameters::new().with("code", vec!["X", "Y"]);
        assert_eq!(
            params.to_pairs(),
            vec![("code[0]".to_owned(), "X".to_owned()), ("code[1]".to_owned(), "Y".to_owned())]
        );
    }

    #[test]
    fn test_reserved_names_rejected() {
        for name in RESERVED_NAMES {
            let params = Parameters::new().with(name, "x");
            let err = params.ensure_unreserved().unwrap_err();
            assert!(matches!(err, ApiError::InvalidParameter(ref msg) if msg.contains(name)));
        }
        assert!(Parameters::new().with("site_id", 1).ensure_unreserved().is_ok());
    }

    #[test]
    fn test_merge_overwrites() {
        let mut base = Parameters::from([("locale", "en"), ("site_id", "1")]);
        base.merge(&Parameters::from([("locale", "fr")]));
        assert_eq!(base.get("locale"), Some(&ParamValue::Text("fr".to_owned())));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_param_value_deserialize_untagged() {
        #[derive(Deserialize)]
        struct Holder {
            values: BTreeMap<String, ParamValue>,
        }

        let holder: Holder = toml::from_str(
            r#"
            [values]
            locale = "en"
            site_id = 127042
            codes = ["A", "B"]
            "#,
        )
        .unwrap();

        assert_eq!(holder.values["locale"], ParamValue::Text("en".to_owned()));
        assert_eq!(holder.values["site_id"], ParamValue::Integer(127042));
        assert_eq!(holder.values["codes"], ParamValue::List(vec!["A".into(), "B".into()]));
    }
}
