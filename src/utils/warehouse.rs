// src/utils/warehouse.rs - Query execution seam between the pipeline and the SQL warehouse
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, info};
use std::future::Future;
use std::time::Instant;
use tokio_postgres::types::Type;
use tokio_postgres::Row;

use crate::models::table::{Column, ColumnType, Table, Value};
use crate::utils::db_connect::PgPool;

/// Anything that can run a SQL query and hand back a typed table.
pub trait QueryExecutor: Sync {
    fn execute_query(&self, query: &str) -> impl Future<Output = Result<Table>> + Send;
}

impl QueryExecutor for PgPool {
    fn execute_query(&self, query: &str) -> impl Future<Output = Result<Table>> + Send {
        async move {
            let start = Instant::now();
            let conn = self
                .get()
                .await
                .context("Failed to get DB connection for warehouse query")?;
            let statement = conn
                .prepare(query)
                .await
                .with_context(|| format!("Failed to prepare warehouse query: {}", query.trim()))?;

            let columns: Vec<Column> = statement
                .columns()
                .iter()
                .map(|c| Column::new(c.name(), column_type_for(c.type_())))
                .collect();
            let rows = conn
                .query(&statement, &[])
                .await
                .context("Warehouse query failed")?;

            let mut table = Table::new(columns);
            for row in &rows {
                table.push_row(row_values(row));
            }
            info!(
                "📊 Warehouse query returned {} rows x {} columns in {:.2?}",
                table.len(),
                table.columns().len(),
                start.elapsed()
            );
            Ok(table)
        }
    }
}

fn column_type_for(pg_type: &Type) -> ColumnType {
    if [Type::INT2, Type::INT4, Type::INT8].contains(pg_type) {
        ColumnType::Int
    } else if [Type::FLOAT4, Type::FLOAT8].contains(pg_type) {
        ColumnType::Float
    } else if *pg_type == Type::BOOL {
        ColumnType::Bool
    } else if [Type::TIMESTAMP, Type::TIMESTAMPTZ, Type::DATE].contains(pg_type) {
        ColumnType::DateTime
    } else {
        ColumnType::Text
    }
}

fn row_values(row: &Row) -> Vec<Value> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let pg_type = column.type_();
            let value = if *pg_type == Type::INT2 {
                row.try_get::<_, Option<i16>>(idx).map(|v| v.map(|x| Value::Int(x.into())))
            } else if *pg_type == Type::INT4 {
                row.try_get::<_, Option<i32>>(idx).map(|v| v.map(|x| Value::Int(x.into())))
            } else if *pg_type == Type::INT8 {
                row.try_get::<_, Option<i64>>(idx).map(|v| v.map(Value::Int))
            } else if *pg_type == Type::FLOAT4 {
                row.try_get::<_, Option<f32>>(idx).map(|v| v.map(|x| Value::Float(x.into())))
            } else if *pg_type == Type::FLOAT8 {
                row.try_get::<_, Option<f64>>(idx).map(|v| v.map(Value::Float))
            } else if *pg_type == Type::BOOL {
                row.try_get::<_, Option<bool>>(idx).map(|v| v.map(Value::Bool))
            } else if *pg_type == Type::TIMESTAMP {
                row.try_get::<_, Option<NaiveDateTime>>(idx)
                    .map(|v| v.map(Value::DateTime))
            } else if *pg_type == Type::TIMESTAMPTZ {
                row.try_get::<_, Option<DateTime<Utc>>>(idx)
                    .map(|v| v.map(|dt| Value::DateTime(dt.naive_utc())))
            } else if *pg_type == Type::DATE {
                row.try_get::<_, Option<NaiveDate>>(idx)
                    .map(|v| v.and_then(|d| d.and_hms_opt(0, 0, 0)).map(Value::DateTime))
            } else {
                row.try_get::<_, Option<String>>(idx).map(|v| v.map(Value::Text))
            };
            match value {
                Ok(Some(v)) => v,
                Ok(None) => Value::Null,
                Err(e) => {
                    debug!(
                        "Column '{}' ({}) could not be decoded, storing null: {}",
                        column.name(),
                        column.type_(),
                        e
                    );
                    Value::Null
                }
            }
        })
        .collect()
}

/// Appends a caller-supplied filter clause verbatim.
pub fn with_filter(query: &str, filter_by: Option<&str>) -> String {
    match filter_by {
        Some(filter) => format!("{} WHERE {}", query.trim_end(), filter),
        None => query.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::sync::Mutex;

    /// In-memory warehouse answering queries by the relation they select from.
    #[derive(Default)]
    pub struct FixtureWarehouse {
        tables: Vec<(String, Table)>,
        pub queries: Mutex<Vec<String>>,
    }

    impl FixtureWarehouse {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_table(mut self, relation: &str, table: Table) -> Self {
            self.tables.push((relation.to_string(), table));
            self
        }

        pub fn query_count(&self) -> usize {
            self.queries.lock().unwrap().len()
        }

        pub fn last_query(&self) -> Option<String> {
            self.queries.lock().unwrap().last().cloned()
        }
    }

    impl QueryExecutor for FixtureWarehouse {
        fn execute_query(&self, query: &str) -> impl Future<Output = Result<Table>> + Send {
            self.queries.lock().unwrap().push(query.to_string());
            let found = self
                .tables
                .iter()
                .find(|(relation, _)| query.contains(&format!("FROM {}", relation)))
                .map(|(_, table)| table.clone());
            let query = query.to_string();
            async move { found.ok_or_else(|| anyhow::anyhow!("No fixture table for query: {}", query)) }
        }
    }
}
