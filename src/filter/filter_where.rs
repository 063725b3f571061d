use uuid::Uuid;

use super::types::{ProductFilter, SqlParam, SqlResult};
use crate::types::PageRequest;

const ORDER_CLAUSE: &str = " ORDER BY p.created_at DESC, p.id";

/// Incremental predicate builder for product listings.
///
/// Every fragment is conjunctive and written with `?` placeholders; each
/// placeholder pushes exactly one value, so the argument list always lines up
/// with placeholder order. Call [`rebind`] on the final query before handing
/// it to Postgres.
pub struct FilterWhere {
    clause: String,
    param_values: Vec<SqlParam>,
}

impl FilterWhere {
    /// Starts from "not soft-deleted"
    fn new() -> Self {
        Self {
            clause: "p.deleted_at IS NULL".to_string(),
            param_values: vec![],
        }
    }

    /// Starts from "not soft-deleted and belongs to shop"
    pub fn for_shop(shop_id: Uuid) -> Self {
        let mut filter_where = Self::new();
        let p = filter_where.param(SqlParam::Uuid(shop_id));
        filter_where.clause.push_str(&format!(" AND p.shop_id = {}", p));
        filter_where
    }

    /// Full WHERE body for one listing call, pagination included
    pub fn generate(shop_id: Option<Uuid>, filter: &ProductFilter, page: PageRequest) -> SqlResult {
        let mut filter_where = match shop_id {
            Some(id) => Self::for_shop(id),
            None => Self::new(),
        };
        filter_where.apply(filter).paginate(page);
        filter_where.finish()
    }

    /// Appends filter predicates in fixed order: categories, minimum price,
    /// price range, keyword.
    pub fn apply(&mut self, filter: &ProductFilter) -> &mut Self {
        self.category_ids(&filter.category_ids);
        self.min_price(filter.min_price_or_zero());
        self.price_range(filter.min_price_or_zero(), filter.max_price);
        if let Some(keyword) = filter.keyword() {
            self.keyword(keyword);
        }
        self
    }

    fn category_ids(&mut self, ids: &[Uuid]) {
        if ids.is_empty() {
            return;
        }
        let placeholders: Vec<&str> = ids.iter().map(|id| self.param(SqlParam::Uuid(*id))).collect();
        self.clause.push_str(&format!(" AND p.category_id IN ({})", placeholders.join(", ")));
    }

    fn min_price(&mut self, min_price: i64) {
        if min_price > 0 {
            let p = self.param(SqlParam::Int(min_price));
            self.clause.push_str(&format!(" AND p.price >= {}", p));
        }
    }

    // Overlaps with min_price when both apply; kept additive.
    fn price_range(&mut self, min_price: i64, max_price: Option<i64>) {
        match max_price {
            Some(max) if max > min_price => {
                let lo = self.param(SqlParam::Int(min_price));
                let hi = self.param(SqlParam::Int(max));
                self.clause.push_str(&format!(" AND p.price BETWEEN {} AND {}", lo, hi));
            }
            _ => {}
        }
    }

    fn keyword(&mut self, keyword: &str) {
        let pattern = format!("%{}%", keyword);
        let name = self.param(SqlParam::Text(pattern.clone()));
        let description = self.param(SqlParam::Text(pattern));
        self.clause.push_str(&format!(" AND (p.name ILIKE {} OR p.description ILIKE {})", name, description));
    }

    /// Ordering plus LIMIT/OFFSET. Must be the last fragment.
    pub fn paginate(&mut self, page: PageRequest) -> &mut Self {
        self.clause.push_str(ORDER_CLAUSE);
        let limit = self.param(SqlParam::Int(page.limit()));
        let offset = self.param(SqlParam::Int(page.offset()));
        self.clause.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        self
    }

    pub fn finish(self) -> SqlResult {
        SqlResult { query: self.clause, params: self.param_values }
    }

    fn param(&mut self, value: SqlParam) -> &'static str {
        self.param_values.push(value);
        "?"
    }
}

/// Rewrites `?` placeholders to Postgres `$1..$n`, leaving quoted literals alone.
pub fn rebind(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 8);
    let mut index = 0;
    let mut in_literal = false;
    for c in query.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                out.push(c);
            }
            '?' if !in_literal => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            _ => out.push(c),
        }
    }
    out
}
