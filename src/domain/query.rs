//! Normalized list/search query parameters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query parameter names with reserved meaning; everything else is a filter.
const PARAM_PAGE: &str = "page";
const PARAM_PER: &str = "per";
const PARAM_FREE_TEXT: &str = "q";

/// Default page size applied when `per` is absent from the request.
const DEFAULT_PER_PAGE: u32 = 20;

/// A filter value, coerced to a number when the raw text parses as one so
/// typed document fields match (`year=2004` must match the number 2004,
/// not the string "2004").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(i64),
    Text(String),
}

impl FilterValue {
    /// Parses a raw query-string value
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Returns the JSON value this filter matches against
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.clone()),
        }
    }
}

impl std::fmt::Display for FilterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Normalized description of a list/search request.
///
/// Two requests with the same normalized content produce equal specs, which
/// is what makes the derived cache keys deterministic. `raw_params` keeps
/// the untouched parameter set for free-text key digesting.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub resource: String,
    pub filters: BTreeMap<String, FilterValue>,
    pub page: u32,
    pub per_page: u32,
    pub free_text: Option<String>,
    pub raw_params: BTreeMap<String, String>,
}

impl QuerySpec {
    /// Builds a spec from raw query-string parameters.
    ///
    /// `page` defaults to 1 and `per` to 20 when absent; a non-numeric value
    /// for either drops pagination entirely (`page=1, per=0`, unbounded)
    /// instead of erroring. Empty filter values are discarded.
    pub fn from_params(resource: impl Into<String>, params: &BTreeMap<String, String>) -> Self {
        let raw_page = params.get(PARAM_PAGE).map(String::as_str).unwrap_or("1");
        let raw_per = params.get(PARAM_PER).map(String::as_str);

        let (page, per_page) = match (
            raw_page.parse::<u32>(),
            raw_per.map_or(Ok(DEFAULT_PER_PAGE), |v| v.parse::<u32>()),
        ) {
            (Ok(page), Ok(per)) => (page.max(1), per),
            _ => (1, 0),
        };

        let free_text = params
            .get(PARAM_FREE_TEXT)
            .filter(|q| !q.is_empty())
            .cloned();

        let filters = params
            .iter()
            .filter(|(name, value)| {
                !matches!(name.as_str(), PARAM_PAGE | PARAM_PER | PARAM_FREE_TEXT)
                    && !value.is_empty()
            })
            .map(|(name, value)| (name.clone(), FilterValue::parse(value)))
            .collect();

        Self {
            resource: resource.into(),
            filters,
            page,
            per_page,
            free_text,
            raw_params: params.clone(),
        }
    }

    /// True when the request carries a free-text search term
    pub fn is_search(&self) -> bool {
        self.free_text.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let spec = QuerySpec::from_params("games", &params(&[]));

        assert_eq!(spec.page, 1);
        assert_eq!(spec.per_page, 20);
        assert!(spec.filters.is_empty());
        assert!(!spec.is_search());
    }

    #[test]
    fn test_pagination_parsed() {
        let spec = QuerySpec::from_params("games", &params(&[("page", "3"), ("per", "5")]));

        assert_eq!(spec.page, 3);
        assert_eq!(spec.per_page, 5);
    }

    #[test]
    fn test_non_numeric_pagination_falls_back_to_unbounded() {
        let spec = QuerySpec::from_params("games", &params(&[("page", "abc"), ("per", "5")]));
        assert_eq!((spec.page, spec.per_page), (1, 0));

        let spec = QuerySpec::from_params("games", &params(&[("per", "lots")]));
        assert_eq!((spec.page, spec.per_page), (1, 0));
    }

    #[test]
    fn test_page_zero_clamped_to_one() {
        let spec = QuerySpec::from_params("games", &params(&[("page", "0")]));
        assert_eq!(spec.page, 1);
    }

    #[test]
    fn test_filters_extracted_and_coerced() {
        let spec = QuerySpec::from_params(
            "games",
            &params(&[("genre", "rpg"), ("year", "2004"), ("page", "1")]),
        );

        assert_eq!(
            spec.filters.get("genre"),
            Some(&FilterValue::Text("rpg".to_string()))
        );
        assert_eq!(spec.filters.get("year"), Some(&FilterValue::Number(2004)));
        assert!(!spec.filters.contains_key("page"));
    }

    #[test]
    fn test_empty_filter_values_dropped() {
        let spec = QuerySpec::from_params("games", &params(&[("genre", ""), ("year", "2004")]));

        assert!(!spec.filters.contains_key("genre"));
        assert_eq!(spec.filters.len(), 1);
    }

    #[test]
    fn test_free_text_captured() {
        let spec = QuerySpec::from_params("games", &params(&[("q", "dragon"), ("genre", "rpg")]));

        assert_eq!(spec.free_text.as_deref(), Some("dragon"));
        assert!(spec.is_search());
        // q is not a filter
        assert!(!spec.filters.contains_key("q"));
    }

    #[test]
    fn test_filter_value_display() {
        assert_eq!(FilterValue::Number(7).to_string(), "7");
        assert_eq!(FilterValue::Text("ps2".to_string()).to_string(), "ps2");
    }

    #[test]
    fn test_filter_value_to_json() {
        assert_eq!(FilterValue::Number(7).to_json(), serde_json::json!(7));
        assert_eq!(
            FilterValue::Text("ps2".to_string()).to_json(),
            serde_json::json!("ps2")
        );
    }
}
