//! Filter composition for cloud resource queries.
//!
//! A lookup may be constrained in three ways: well-known attributes that map
//! onto a provider filter key, ad hoc filters declared by the user, and tags.
//! [`compose`] merges all three into the single ordered list the query API
//! expects.
//!
//! The output order is always attribute filters (in table order), then custom
//! filters (in input order), then tag filters (sorted by tag key).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::LookupError;

/// Static mapping from a user-facing field name to the provider's filter key.
pub type AttributeFilterMap = [(&'static str, &'static str)];

/// Prefix applied to tag keys when they are turned into filters.
pub const TAG_FILTER_PREFIX: &str = "tag:";

/// A scalar attribute value that can be expressed as a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    Int(i64),
}

impl AttributeValue {
    /// Encode the value the way query APIs expect it.
    pub fn encode(&self) -> String {
        match self {
            AttributeValue::String(s) => s.clone(),
            AttributeValue::Bool(true) => "true".to_string(),
            AttributeValue::Bool(false) => "false".to_string(),
            AttributeValue::Int(i) => i.to_string(),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

/// A single query filter: a key and at least one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    key: String,
    values: Vec<String>,
}

impl Filter {
    /// Create a filter matching exactly one value.
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            values: vec![value.into()],
        }
    }

    /// Filter key, e.g. `vpc-id` or `tag:Name`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Accepted values. Never empty.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.values.join(","))
    }
}

/// A user-declared filter with an arbitrary name and a set of values.
///
/// Values keep their first-insertion order; duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFilter {
    name: String,
    values: Vec<String>,
}

impl CustomFilter {
    /// Create a custom filter.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::EmptyFilterValues` if `values` yields nothing.
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Result<Self, LookupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let mut unique: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        if unique.is_empty() {
            return Err(LookupError::EmptyFilterValues(name));
        }
        Ok(Self {
            name,
            values: unique,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Parses `name=value1,value2`.
impl FromStr for CustomFilter {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, values) = s
            .split_once('=')
            .ok_or_else(|| LookupError::InvalidConfig(format!("expected name=values, got {s:?}")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(LookupError::InvalidConfig(format!(
                "filter name is empty in {s:?}"
            )));
        }
        CustomFilter::new(
            name,
            values
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty()),
        )
    }
}

/// Compose the filter list for a resource query.
///
/// `lookup` reports the value of each attribute named in `attributes`, or
/// `None` when the caller left it unset. Returns `None` when there is nothing
/// to filter on, so the query can omit the filter parameter entirely.
pub fn compose<F>(
    attributes: &AttributeFilterMap,
    lookup: F,
    custom_filters: &[CustomFilter],
    tags: &BTreeMap<String, String>,
) -> Option<Vec<Filter>>
where
    F: Fn(&str) -> Option<AttributeValue>,
{
    let mut filters = Vec::with_capacity(attributes.len() + custom_filters.len() + tags.len());

    for (attr_name, filter_key) in attributes {
        if let Some(value) = lookup(attr_name) {
            filters.push(Filter::single(*filter_key, value.encode()));
        }
    }

    for custom in custom_filters {
        filters.push(Filter {
            key: custom.name.clone(),
            values: custom.values.clone(),
        });
    }

    for (key, value) in tags {
        filters.push(Filter::single(
            format!("{TAG_FILTER_PREFIX}{key}"),
            value.clone(),
        ));
    }

    if filters.is_empty() {
        None
    } else {
        Some(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTRS: &AttributeFilterMap = &[
        ("cidr_block", "cidr"),
        ("default", "isDefault"),
        ("netmask", "netmask-length"),
    ];

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_values() {
        assert_eq!(AttributeValue::from("abc").encode(), "abc");
        assert_eq!(AttributeValue::from(true).encode(), "true");
        assert_eq!(AttributeValue::from(false).encode(), "false");
        assert_eq!(AttributeValue::from(-42i64).encode(), "-42");
    }

    #[test]
    fn test_all_empty_is_absent() {
        let result = compose(ATTRS, |_| None, &[], &BTreeMap::new());
        assert_eq!(result, None);
    }

    #[test]
    fn test_attribute_and_tag() {
        let result = compose(
            &[("cidr_block", "cidr")],
            |name| (name == "cidr_block").then(|| "10.0.0.0/16".into()),
            &[],
            &tags(&[("env", "prod")]),
        );
        assert_eq!(
            result,
            Some(vec![
                Filter::single("cidr", "10.0.0.0/16"),
                Filter::single("tag:env", "prod"),
            ])
        );
    }

    #[test]
    fn test_custom_filter_only() {
        let custom = CustomFilter::new("state", ["available"]).unwrap();
        let result = compose(ATTRS, |_| None, &[custom], &BTreeMap::new());
        assert_eq!(result, Some(vec![Filter::single("state", "available")]));
    }

    #[test]
    fn test_unset_bool_emits_nothing_but_false_does() {
        let unset = compose(ATTRS, |_| None, &[], &BTreeMap::new());
        assert_eq!(unset, None);

        let set_false = compose(
            ATTRS,
            |name| (name == "default").then_some(AttributeValue::Bool(false)),
            &[],
            &BTreeMap::new(),
        );
        assert_eq!(set_false, Some(vec![Filter::single("isDefault", "false")]));
    }

    #[test]
    fn test_attribute_order_follows_table() {
        let result = compose(
            ATTRS,
            |name| match name {
                "netmask" => Some(AttributeValue::Int(24)),
                "cidr_block" => Some("10.1.0.0/16".into()),
                "default" => Some(true.into()),
                _ => None,
            },
            &[],
            &BTreeMap::new(),
        )
        .unwrap();
        let keys: Vec<_> = result.iter().map(Filter::key).collect();
        assert_eq!(keys, ["cidr", "isDefault", "netmask-length"]);
        assert_eq!(result[2].values(), ["24"]);
    }

    #[test]
    fn test_segment_order() {
        let custom = vec![
            CustomFilter::new("b-filter", ["1"]).unwrap(),
            CustomFilter::new("a-filter", ["2"]).unwrap(),
        ];
        let result = compose(
            ATTRS,
            |name| (name == "default").then_some(AttributeValue::Bool(true)),
            &custom,
            &tags(&[("zeta", "z"), ("alpha", "a")]),
        )
        .unwrap();
        let keys: Vec<_> = result.iter().map(Filter::key).collect();
        assert_eq!(
            keys,
            ["isDefault", "b-filter", "a-filter", "tag:alpha", "tag:zeta"]
        );
    }

    #[test]
    fn test_custom_filter_keeps_all_values() {
        let custom = CustomFilter::new("cidr", ["x", "y", "x"]).unwrap();
        assert_eq!(custom.values(), ["x", "y"]);

        let result = compose(ATTRS, |_| None, &[custom], &BTreeMap::new()).unwrap();
        assert_eq!(result[0].values(), ["x", "y"]);
        assert!(result.iter().all(|f| !f.values().is_empty()));
    }

    #[test]
    fn test_custom_filter_rejects_empty_values() {
        let result = CustomFilter::new("state", Vec::<String>::new());
        assert!(matches!(result, Err(LookupError::EmptyFilterValues(name)) if name == "state"));
    }

    #[test]
    fn test_parse_custom_filter() {
        let filter: CustomFilter = "tag-key=Name, Owner".parse().unwrap();
        assert_eq!(filter.name(), "tag-key");
        assert_eq!(filter.values(), ["Name", "Owner"]);

        assert!("novalue".parse::<CustomFilter>().is_err());
        assert!("=x".parse::<CustomFilter>().is_err());
        assert!(matches!(
            "state=".parse::<CustomFilter>(),
            Err(LookupError::EmptyFilterValues(_))
        ));
    }

    #[test]
    fn test_filter_display() {
        let custom = CustomFilter::new("state", ["available", "pending"]).unwrap();
        let filters = compose(ATTRS, |_| None, &[custom], &BTreeMap::new()).unwrap();
        assert_eq!(filters[0].to_string(), "state=available,pending");
    }
}
