//! List filters and query-string encoding
//!
//! Options are turned into a [`ListQuery`] by hand-written `to_query`
//! functions and then encoded in one place, so ordering and formatting are
//! identical for every option type.

use super::time::{format_service_time, parse_service_time};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Comparison applied by the service to a filtered field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterType {
    #[default]
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
}

impl FilterType {
    /// Every operator that is encoded with a prefix
    pub const PREFIXED: [FilterType; 6] = [
        FilterType::Neq,
        FilterType::Lt,
        FilterType::Lte,
        FilterType::Gt,
        FilterType::Gte,
        FilterType::In,
    ];

    /// Query prefix, `None` for equality
    pub fn token(self) -> Option<&'static str> {
        match self {
            FilterType::Eq => None,
            FilterType::Neq => Some("neq"),
            FilterType::Lt => Some("lt"),
            FilterType::Lte => Some("lte"),
            FilterType::Gt => Some("gt"),
            FilterType::Gte => Some("gte"),
            FilterType::In => Some("in"),
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Self::PREFIXED
            .into_iter()
            .find(|filter| filter.token() == Some(token))
    }

    /// Encode a comparand: bare for `Eq`, `op:value` otherwise
    pub fn apply(self, value: &str) -> String {
        match self.token() {
            None => value.to_string(),
            Some(op) => format!("{}:{}", op, value),
        }
    }
}

/// Split `op:value`. A prefix that is not an operator belongs to the value.
fn split_operator(s: &str) -> (FilterType, &str) {
    if let Some((op, value)) = s.split_once(':') {
        if let Some(filter) = FilterType::from_token(op) {
            return (filter, value);
        }
    }
    (FilterType::Eq, s)
}

/// Filter over a string field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListFilter {
    pub filter: FilterType,
    pub value: String,
}

impl ListFilter {
    pub fn new(filter: FilterType, value: impl Into<String>) -> Self {
        Self {
            filter,
            value: value.into(),
        }
    }

    pub fn equals(value: impl Into<String>) -> Self {
        Self::new(FilterType::Eq, value)
    }
}

impl FromStr for ListFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (filter, value) = split_operator(s);
        Ok(Self::new(filter, value))
    }
}

/// Filter over a timestamp field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDateFilter {
    pub filter: FilterType,
    pub value: DateTime<Utc>,
}

impl ListDateFilter {
    pub fn new(filter: FilterType, value: DateTime<Utc>) -> Self {
        Self { filter, value }
    }
}

impl FromStr for ListDateFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (filter, value) = split_operator(s);
        let value = parse_service_time(value).map_err(|e| {
            Error::encoding("date filter", format!("{:?}: {} (expected YYYY-MM-DD HH:MM:SS)", value, e))
        })?;
        Ok(Self::new(filter, value))
    }
}

/// One value of a list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Scalar(String),
    /// Comma-joined in insertion order (tag sets, sort keys, field lists)
    List(Vec<String>),
    Filter(ListFilter),
    Date(ListDateFilter),
}

/// Field name to value mapping, encoded in field-name order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    fields: BTreeMap<&'static str, QueryValue>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str, value: QueryValue) -> &mut Self {
        self.fields.insert(field, value);
        self
    }

    pub fn scalar(&mut self, field: &'static str, value: impl Into<String>) -> &mut Self {
        self.insert(field, QueryValue::Scalar(value.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&QueryValue> {
        self.fields.get(field)
    }

    /// Encode as `k=v&k=v`, without a leading `?`.
    ///
    /// Validates every value first; on error nothing is emitted.
    pub fn encode(&self) -> Result<String> {
        let mut pairs = Vec::with_capacity(self.fields.len());

        for (field, value) in &self.fields {
            let encoded = match value {
                QueryValue::Scalar(s) => s.clone(),
                QueryValue::List(items) => join_list(field, items)?,
                QueryValue::Filter(f) => {
                    check_comparand(field, f.filter, &f.value)?;
                    f.filter.apply(&f.value)
                }
                QueryValue::Date(f) => f.filter.apply(&format_service_time(&f.value)),
            };
            pairs.push(format!(
                "{}={}",
                urlencoding::encode(field),
                urlencoding::encode(&encoded)
            ));
        }

        Ok(pairs.join("&"))
    }
}

/// Join list members with `,`; members may not be empty or contain `,`
fn join_list(field: &'static str, items: &[String]) -> Result<String> {
    for item in items {
        if item.is_empty() {
            return Err(Error::encoding(field, "list entries must not be empty"));
        }
        if item.contains(',') {
            return Err(Error::encoding(
                field,
                format!("{:?} contains the list separator ','", item),
            ));
        }
    }
    Ok(items.join(","))
}

fn check_comparand(field: &'static str, filter: FilterType, value: &str) -> Result<()> {
    if filter != FilterType::Eq && value.is_empty() {
        return Err(Error::encoding(
            field,
            format!("{} filter needs a value", filter.token().unwrap_or("eq")),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_eq_has_no_prefix() {
        assert_eq!(FilterType::Eq.apply("my_workbook"), "my_workbook");
        assert_eq!(FilterType::Neq.apply("invalid_name"), "neq:invalid_name");
        assert_eq!(FilterType::In.apply("a,b"), "in:a,b");
    }

    #[test]
    fn test_tags_encoding() {
        let mut query = ListQuery::new();
        query.insert("tags", QueryValue::List(vec!["tag1".into(), "tag2".into()]));
        assert_eq!(query.encode().unwrap(), "tags=tag1%2Ctag2");
    }

    #[test]
    fn test_name_filter_encoding() {
        let mut query = ListQuery::new();
        query.insert(
            "name",
            QueryValue::Filter(ListFilter::new(FilterType::Neq, "invalid_name")),
        );
        assert_eq!(query.encode().unwrap(), "name=neq%3Ainvalid_name");
    }

    #[test]
    fn test_date_filter_encoding() {
        let mut query = ListQuery::new();
        query.insert(
            "created_at",
            QueryValue::Date(ListDateFilter::new(
                FilterType::Gt,
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            )),
        );
        assert_eq!(
            query.encode().unwrap(),
            "created_at=gt%3A2024-01-01%2000%3A00%3A00"
        );
    }

    #[test]
    fn test_fields_are_sorted() {
        let mut query = ListQuery::new();
        query
            .scalar("scope", "private")
            .scalar("namespace", "ns")
            .scalar("limit", "10");
        assert_eq!(query.encode().unwrap(), "limit=10&namespace=ns&scope=private");
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(ListQuery::new().encode().unwrap(), "");
        assert!(ListQuery::new().is_empty());
    }

    #[test]
    fn test_bad_tags_fail_without_output() {
        for tags in [vec!["ok".to_string(), String::new()], vec!["a,b".to_string()]] {
            let mut query = ListQuery::new();
            query.scalar("namespace", "ns");
            query.insert("tags", QueryValue::List(tags));
            assert!(matches!(
                query.encode(),
                Err(Error::Encoding { field: "tags", .. })
            ));
        }
    }

    #[test]
    fn test_prefixed_filter_needs_value() {
        let mut query = ListQuery::new();
        query.insert("name", QueryValue::Filter(ListFilter::new(FilterType::Gt, "")));
        assert!(query.encode().is_err());

        // Bare equality with an empty value is allowed
        let mut query = ListQuery::new();
        query.insert("name", QueryValue::Filter(ListFilter::equals("")));
        assert_eq!(query.encode().unwrap(), "name=");
    }

    #[test]
    fn test_parse_list_filter() {
        assert_eq!(
            "neq:foo".parse::<ListFilter>().unwrap(),
            ListFilter::new(FilterType::Neq, "foo")
        );
        assert_eq!("foo".parse::<ListFilter>().unwrap(), ListFilter::equals("foo"));
        // Unknown prefixes are part of the value
        assert_eq!(
            "ns:foo".parse::<ListFilter>().unwrap(),
            ListFilter::equals("ns:foo")
        );
        assert_eq!(
            "in:a,b".parse::<ListFilter>().unwrap(),
            ListFilter::new(FilterType::In, "a,b")
        );
    }

    #[test]
    fn test_parse_date_filter() {
        let filter: ListDateFilter = "gte:2024-11-16 22:48:45".parse().unwrap();
        assert_eq!(filter.filter, FilterType::Gte);
        assert_eq!(filter.value, Utc.with_ymd_and_hms(2024, 11, 16, 22, 48, 45).unwrap());

        let filter: ListDateFilter = "2024-11-16 22:48:45".parse().unwrap();
        assert_eq!(filter.filter, FilterType::Eq);

        assert!("gt:yesterday".parse::<ListDateFilter>().is_err());
    }

    #[test]
    fn test_operator_tokens() {
        let tokens: Vec<_> = FilterType::PREFIXED
            .iter()
            .filter_map(|f| f.token())
            .collect();
        assert_eq!(tokens, vec!["neq", "lt", "lte", "gt", "gte", "in"]);
        assert_eq!(FilterType::default().token(), None);
    }
}
