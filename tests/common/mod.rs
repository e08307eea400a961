#![allow(dead_code)]

use async_stream::try_stream;
use log::LevelFilter;
use rowbind::{
    Error, Executor, Query, Result, RowLabeled, RowNames, RowsAffected, TIMESTAMP_FORMAT, Value,
    stream::{Stream, TryStreamExt},
};
use sqlx::{
    Column, Row, Sqlite, TypeInfo, ValueRef,
    query::Query as SqlxQuery,
    sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow},
};
use std::{env, future::Future};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Executor over an in memory SQLite database.
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    pub async fn connect() -> Result<Self> {
        // One connection: every in memory connection is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    /// Runs DDL or fixtures, one statement per call.
    pub async fn run(&self, sql: &str) -> Result<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }
}

type SqliteQuery<'q> = SqlxQuery<'q, Sqlite, SqliteArguments<'q>>;

fn bind<'q>(query: SqliteQuery<'q>, value: Value) -> Result<SqliteQuery<'q>> {
    Ok(match value {
        Value::Null => query.bind(None::<i64>),
        Value::Boolean(v) => query.bind(v),
        Value::Int8(v) => query.bind(v.map(i64::from)),
        Value::Int16(v) => query.bind(v.map(i64::from)),
        Value::Int32(v) => query.bind(v.map(i64::from)),
        Value::Int64(v) => query.bind(v),
        Value::UInt8(v) => query.bind(v.map(i64::from)),
        Value::UInt16(v) => query.bind(v.map(i64::from)),
        Value::UInt32(v) => query.bind(v.map(i64::from)),
        Value::UInt64(v) => query.bind(v.map(i64::try_from).transpose()?),
        Value::Float32(v) => query.bind(v.map(f64::from)),
        Value::Float64(v) => query.bind(v),
        Value::Char(v) => query.bind(v.map(String::from)),
        Value::Varchar(v) => query.bind(v),
        Value::Blob(v) => query.bind(v.map(Vec::from)),
        Value::Timestamp(v) => query.bind(v.map(|v| v.format(TIMESTAMP_FORMAT)).transpose()?),
        Value::Uuid(v) => query.bind(v.map(|v| v.to_string())),
        Value::List(..) => {
            return Err(Error::msg(format!(
                "SQLite cannot bind the list {value}, rewrite the query first"
            )));
        }
    })
}

fn prepare(query: &Query) -> Result<SqliteQuery<'_>> {
    query
        .args
        .iter()
        .cloned()
        .try_fold(sqlx::query(&query.sql), bind)
}

fn decode(row: &SqliteRow) -> Result<Box<[Value]>> {
    (0..row.columns().len())
        .map(|i| {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                return Ok(Value::Null);
            }
            let type_name = raw.type_info().name().to_owned();
            Ok(match type_name.as_str() {
                "INTEGER" => Value::Int64(Some(row.try_get(i)?)),
                "REAL" => Value::Float64(Some(row.try_get(i)?)),
                "TEXT" => Value::Varchar(Some(row.try_get(i)?)),
                "BLOB" => Value::Blob(Some(row.try_get::<Vec<u8>, _>(i)?.into())),
                _ => {
                    return Err(Error::msg(format!(
                        "Unexpected SQLite type `{type_name}` in column {i}"
                    )));
                }
            })
        })
        .collect()
}

impl Executor for SqliteExecutor {
    fn fetch(&mut self, query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send {
        let pool = self.pool.clone();
        try_stream! {
            let mut rows = prepare(&query)?.fetch(&pool);
            let mut labels: Option<RowNames> = None;
            while let Some(row) = rows.try_next().await? {
                let labels = labels.get_or_insert_with(|| {
                    row.columns().iter().map(|c| c.name().to_string()).collect()
                });
                yield RowLabeled::new(labels.clone(), decode(&row)?);
            }
        }
    }

    fn execute(&mut self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = prepare(&query)?.execute(&pool).await?;
            Ok(RowsAffected {
                rows_affected: result.rows_affected(),
                last_affected_id: Some(result.last_insert_rowid()),
            })
        }
    }
}

/// Wraps an executor and keeps every statement sent through `execute`.
pub struct RecordingExecutor<E> {
    pub inner: E,
    pub executed: Vec<Query>,
    pub fetched: usize,
}

impl<E: Executor> RecordingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            executed: Vec::new(),
            fetched: 0,
        }
    }
}

impl<E: Executor> Executor for RecordingExecutor<E> {
    fn fetch(&mut self, query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.fetched += 1;
        self.inner.fetch(query)
    }

    fn execute(&mut self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.executed.push(query.clone());
        self.inner.execute(query)
    }
}
