use uuid::Uuid;

use super::error::FilterError;
use super::types::ProductFilter;

/// Raw listing parameters as they arrive on the query string
#[derive(Debug, Clone, Default)]
pub struct FilterParams<'a> {
    pub category_ids: Option<&'a str>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub keyword: Option<&'a str>,
}

impl ProductFilter {
    pub fn parse(params: FilterParams<'_>) -> Result<Self, FilterError> {
        let category_ids = match params.category_ids {
            Some(raw) => Self::parse_category_ids(raw)?,
            None => vec![],
        };

        Ok(Self {
            category_ids,
            min_price: params.min_price,
            max_price: params.max_price,
            keyword: params.keyword.filter(|k| !k.is_empty()).map(str::to_string),
        })
    }

    /// Split a comma-delimited id list. Blank segments are skipped and repeats
    /// collapse onto their first occurrence.
    pub fn parse_category_ids(raw: &str) -> Result<Vec<Uuid>, FilterError> {
        let mut ids: Vec<Uuid> = vec![];
        for segment in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let id = Uuid::parse_str(segment)
                .map_err(|_| FilterError::InvalidCategoryId(segment.to_string()))?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}
