use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A positional query argument. Bound in order by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Uuid(Uuid),
    Int(i64),
    Text(String),
}

/// Generated SQL text plus its positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

impl SqlResult {
    /// Number of `?` placeholders outside of quoted literals
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut in_literal = false;
        for c in self.query.chars() {
            match c {
                '\'' => in_literal = !in_literal,
                '?' if !in_literal => count += 1,
                _ => {}
            }
        }
        count
    }
}

/// Request-scoped listing filters. Empty by default; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Distinct category ids in the order they were first seen on the wire
    pub category_ids: Vec<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub keyword: Option<String>,
}

impl ProductFilter {
    pub fn is_empty(&self) -> bool {
        self.category_ids.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.keyword().is_none()
    }

    /// Absent minimum price counts as zero for the range rules
    pub fn min_price_or_zero(&self) -> i64 {
        self.min_price.unwrap_or(0)
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.is_empty())
    }
}
