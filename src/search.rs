use core::fmt::{self, Display, Formatter};
use indexmap::IndexMap;

use crate::entity::ServiceDefinitionEntity;

/// Filters of [`crate::DiscoveryQueryEngine::advanced_search`] by key, applied in insertion order
pub type SearchFilters = IndexMap<String, FilterValue>;

const FALSE_WORDS: &[&str] = &["", "0", "false", "no", "off"];

/// Loosely typed filter value, coerced to what the filter key expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    List(Vec<String>),
}

impl FilterValue {
    /// Integer view. Unparsable text and lists are `0`
    #[must_use]
    pub fn as_int(&self) -> i64 {
        match self {
            FilterValue::Text(text) => text.trim().parse().unwrap_or(0),
            FilterValue::Integer(value) => *value,
            FilterValue::Bool(value) => i64::from(*value),
            FilterValue::List(_) => 0,
        }
    }

    /// Boolean view. Text is false for `""`, `"0"`, `"false"`, `"no"` and `"off"` (case-insensitive)
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match self {
            FilterValue::Text(text) => {
                let text = text.trim();
                !FALSE_WORDS.iter().any(|word| word.eq_ignore_ascii_case(text))
            }
            FilterValue::Integer(value) => *value != 0,
            FilterValue::Bool(value) => *value,
            FilterValue::List(items) => !items.is_empty(),
        }
    }

    /// List view. Text is split by commas
    #[must_use]
    pub fn as_list(&self) -> Vec<String> {
        match self {
            FilterValue::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect(),
            FilterValue::List(items) => items.clone(),
            other => vec![other.to_string()],
        }
    }
}

impl Display for FilterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(text) => f.write_str(text),
            FilterValue::Integer(value) => write!(f, "{value}"),
            FilterValue::Bool(value) => write!(f, "{value}"),
            FilterValue::List(items) => f.write_str(&items.join(",")),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<String>> From<Vec<T>> for FilterValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Recognized search filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Any of the tags
    Tags(Vec<String>),
    /// Lifetime name, case-insensitive
    Lifetime(String),
    Interface(String),
    /// Prefix of the type token
    Namespace(String),
    ComplexityMin(i64),
    HasDependencies(bool),
}

impl SearchFilter {
    /// `None` for unknown keys
    #[must_use]
    pub fn parse(key: &str, value: &FilterValue) -> Option<Self> {
        let filter = match key {
            "tags" => SearchFilter::Tags(value.as_list()),
            "lifetime" => SearchFilter::Lifetime(value.to_string()),
            "interface" => SearchFilter::Interface(value.to_string()),
            "namespace" => SearchFilter::Namespace(value.to_string()),
            "complexity_min" => SearchFilter::ComplexityMin(value.as_int()),
            "has_dependencies" => SearchFilter::HasDependencies(value.as_bool()),
            _ => return None,
        };
        Some(filter)
    }

    /// `implements` answers whether the entity's type is a strict subtype of the given token
    pub(crate) fn matches(&self, entity: &ServiceDefinitionEntity, implements: impl FnOnce(&str) -> bool) -> bool {
        match self {
            SearchFilter::Tags(tags) => tags.iter().any(|tag| entity.tags.contains(tag)),
            SearchFilter::Lifetime(name) => entity.lifetime.name().eq_ignore_ascii_case(name.trim()),
            SearchFilter::Interface(token) => implements(token),
            SearchFilter::Namespace(prefix) => entity.type_token.starts_with(prefix.as_str()),
            SearchFilter::ComplexityMin(min) => i64::try_from(entity.complexity_score()).unwrap_or(i64::MAX) >= *min,
            SearchFilter::HasDependencies(expected) => entity.dependencies.is_empty() != *expected,
        }
    }
}
