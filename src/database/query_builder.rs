use std::time::Instant;

use sqlx::{self, postgres::PgArguments, FromRow, PgPool};

use crate::config::DatabaseConfig;
use crate::database::manager::DatabaseError;
use crate::filter::{rebind, SqlParam, SqlResult};

/// A SELECT assembled from a fixed projection and a generated WHERE body,
/// rebound to Postgres placeholders.
pub struct QueryBuilder<T> {
    sql: String,
    params: Vec<SqlParam>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(projection: &str, filter: SqlResult) -> Self {
        let sql = rebind(&format!("{} WHERE {}", projection.trim_end(), filter.query));
        Self {
            sql,
            params: filter.params,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub async fn select_all(&self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let mut q = sqlx::query_as::<_, T>(&self.sql);
        for p in self.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }
}

pub fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        SqlParam::Uuid(id) => q.bind(*id),
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Text(s) => q.bind(s.as_str()),
    }
}

/// Query logging driven by [`DatabaseConfig`]: SQL text at debug level and
/// a warning for anything slower than the configured threshold.
#[derive(Debug, Clone)]
pub struct QueryLog {
    enable_query_logging: bool,
    enable_slow_query_warning: bool,
    slow_query_threshold_ms: u64,
}

impl QueryLog {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            enable_query_logging: config.enable_query_logging,
            enable_slow_query_warning: config.enable_slow_query_warning,
            slow_query_threshold_ms: config.slow_query_threshold_ms,
        }
    }

    pub fn statement(&self, label: &str, sql: &str, params: &[SqlParam]) {
        if self.enable_query_logging {
            tracing::debug!("{} - sql: {} params: {:?}", label, sql, params);
        }
    }

    pub fn finished(&self, label: &str, started: Instant) {
        if !self.enable_slow_query_warning {
            return;
        }
        let elapsed = started.elapsed();
        if elapsed.as_millis() >= u128::from(self.slow_query_threshold_ms) {
            tracing::warn!("{} - slow query took {}ms (threshold {}ms)", label, elapsed.as_millis(), self.slow_query_threshold_ms);
        }
    }
}
