use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid category id: {0}")]
    InvalidCategoryId(String),
}

impl FilterError {
    /// Wire name of the query parameter that carried the bad value
    pub fn field(&self) -> &'static str {
        match self {
            FilterError::InvalidCategoryId(_) => "category_ids",
        }
    }
}
