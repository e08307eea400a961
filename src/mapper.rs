use crate::{
    Config, Entity, Executor, FieldKind, FieldMeta, MappingError, Opt, Query, Registry, Result,
    RowBinding, RowNames, RowsAffected, SqlWriter, Value, rewrite_query,
    stream::TryStreamExt,
};
use std::{pin::pin, sync::Arc};

/// Struct to row mapping operations over any [`Executor`].
///
/// ```ignore
/// let mapper = Mapper::default();
/// let mut user = User { name: "alice".into(), ..Default::default() };
/// mapper.insert_one(&mut executor, "user", &mut user, &[]).await?;
/// let found: Option<User> = mapper
///     .fetch_one(&mut executor, "SELECT * FROM user WHERE id = ?", args![user.id], &[])
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Mapper {
    registry: Arc<Registry>,
    config: Config,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(Registry::shared(), Config::default())
    }
}

impl Mapper {
    pub fn new(registry: Arc<Registry>, config: Config) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn prepare(config: &Config, query: &str, args: Vec<Value>) -> Query {
        if config.rewrite_query {
            rewrite_query(query, args)
        } else {
            Query::new(query, args)
        }
    }

    /// First row of the result mapped to `T`, `None` when there is no row.
    pub async fn fetch_one<T, E>(
        &self,
        executor: &mut E,
        query: &str,
        args: Vec<Value>,
        opts: &[Opt],
    ) -> Result<Option<T>>
    where
        T: Entity + Default,
        E: Executor,
    {
        let config = self.config.with(opts);
        let query = Self::prepare(&config, query, args);
        log::debug!("Fetching one: {query}");
        let metadata = self.registry.resolve::<T>(&config.tag_name);
        let mut stream = pin!(executor.fetch(query));
        let Some(row) = stream.try_next().await? else {
            return Ok(None);
        };
        let binding = RowBinding::new(&metadata, row.names());
        let mut result = T::default();
        binding.scan(&mut result, row.values)?;
        Ok(Some(result))
    }

    /// Every row of the result mapped to `T`, in order.
    pub async fn fetch_many<T, E>(
        &self,
        executor: &mut E,
        query: &str,
        args: Vec<Value>,
        opts: &[Opt],
    ) -> Result<Vec<T>>
    where
        T: Entity + Default,
        E: Executor,
    {
        let config = self.config.with(opts);
        let query = Self::prepare(&config, query, args);
        log::debug!("Fetching many: {query}");
        let metadata = self.registry.resolve::<T>(&config.tag_name);
        let mut stream = pin!(executor.fetch(query));
        let mut bound: Option<(RowNames, RowBinding<_>)> = None;
        let mut result = Vec::new();
        while let Some(row) = stream.try_next().await? {
            // Rebind only when the result set changes shape.
            if bound.as_ref().is_some_and(|(labels, _)| {
                !Arc::ptr_eq(labels, &row.labels) && **labels != *row.labels
            }) {
                bound = None;
            }
            let (_, binding) = bound.get_or_insert_with(|| {
                (row.labels.clone(), RowBinding::new(&metadata, row.names()))
            });
            let mut entity = T::default();
            binding.scan(&mut entity, row.values)?;
            result.push(entity);
        }
        Ok(result)
    }

    /// Insert one row, then write the generated key back into the autoincrement field.
    pub async fn insert_one<T, E>(
        &self,
        executor: &mut E,
        table: &str,
        entity: &mut T,
        opts: &[Opt],
    ) -> Result<RowsAffected>
    where
        T: Entity,
        E: Executor,
    {
        let config = self.config.with(opts);
        let metadata = self.registry.resolve::<T>(&config.tag_name);
        let mut autoincrement = None;
        let mut columns = Vec::with_capacity(metadata.len());
        let mut args = Vec::with_capacity(metadata.len());
        for field in metadata.iter() {
            if field.is_autoincrement() {
                autoincrement.get_or_insert(field);
                continue;
            }
            columns.push(field.name.as_str());
            args.push(field.get(&*entity));
        }
        let query = Query::new(
            insert_statement(executor.sql_writer(), table, &columns, 1),
            args,
        );
        log::debug!("Inserting one: {query}");
        let result = executor.execute(query).await?;
        if let Some(field) = autoincrement {
            let Some(id) = result.last_affected_id else {
                return Err(MappingError::MissingGeneratedKey {
                    table: table.to_owned(),
                    field: field.name.clone(),
                }
                .into());
            };
            field.set(entity, Value::Int64(Some(id)))?;
        }
        Ok(result)
    }

    /// Insert every entity, at most `batch_size` rows per statement.
    ///
    /// Generated keys are not read back.
    pub async fn insert_many<T, E>(
        &self,
        executor: &mut E,
        table: &str,
        entities: &[T],
        opts: &[Opt],
    ) -> Result<RowsAffected>
    where
        T: Entity,
        E: Executor,
    {
        let mut total = RowsAffected::default();
        if entities.is_empty() {
            return Ok(total);
        }
        let config = self.config.with(opts);
        let metadata = self.registry.resolve::<T>(&config.tag_name);
        let fields: Vec<&FieldMeta> = metadata.iter().filter(|v| !v.is_autoincrement()).collect();
        let columns: Vec<&str> = fields.iter().map(|v| v.name.as_str()).collect();
        // Without columns the statement is `DEFAULT VALUES`, one row each.
        let batch_size = if columns.is_empty() {
            1
        } else {
            config.batch_size.max(1)
        };
        let mut full_batch: Option<String> = None;
        for chunk in entities.chunks(batch_size) {
            let sql = if chunk.len() == batch_size {
                full_batch
                    .get_or_insert_with(|| {
                        insert_statement(executor.sql_writer(), table, &columns, batch_size)
                    })
                    .clone()
            } else {
                insert_statement(executor.sql_writer(), table, &columns, chunk.len())
            };
            let args = chunk
                .iter()
                .flat_map(|entity| fields.iter().map(move |field| field.get(entity)))
                .collect();
            let query = Query::new(sql, args);
            log::debug!("Inserting {} row(s): {query}", chunk.len());
            let affected = executor.execute(query).await?;
            total.extend([affected]);
        }
        Ok(total)
    }

    /// Update the row identified by the primary key fields.
    ///
    /// With optimistic locking enabled the first `version` integer field guards the
    /// statement: it must still hold the value read, and it is incremented on success.
    /// A guarded update that matches no row fails with
    /// [`MappingError::ConcurrencyUpdate`] and leaves `entity` untouched.
    pub async fn update_one<T, E>(
        &self,
        executor: &mut E,
        table: &str,
        entity: &mut T,
        opts: &[Opt],
    ) -> Result<RowsAffected>
    where
        T: Entity,
        E: Executor,
    {
        let config = self.config.with(opts);
        let metadata = self.registry.resolve::<T>(&config.tag_name);
        let mut set = Vec::with_capacity(metadata.len());
        let mut set_args = Vec::with_capacity(metadata.len());
        let mut filter = Vec::new();
        let mut filter_args = Vec::new();
        let mut version: Option<(&FieldMeta, Value)> = None;
        for field in metadata.iter() {
            let value = field.get(&*entity);
            if field.is_primary_key() {
                filter.push(field.name.as_str());
                filter_args.push(value);
                continue;
            }
            let version_bits = match field.kind() {
                FieldKind::Int(bits)
                    if version.is_none()
                        && config.enable_optimistic_lock
                        && field.is_version()
                        && !field.declared.nullable =>
                {
                    Some(bits)
                }
                _ => None,
            };
            if let Some(bits) = version_bits {
                let current = value.as_signed().unwrap_or_default();
                let next = Value::signed(bits, current.wrapping_add(1));
                filter.push(field.name.as_str());
                filter_args.push(value);
                set.push(field.name.as_str());
                set_args.push(next.clone());
                version = Some((field, next));
                continue;
            }
            set.push(field.name.as_str());
            set_args.push(value);
        }
        if filter.is_empty() {
            log::warn!("Updating `{table}` without any primary key, every row is affected");
        }
        let mut sql = String::with_capacity(64 + (set.len() + filter.len()) * 16);
        executor
            .sql_writer()
            .write_update(&mut sql, table, &set, &filter);
        set_args.extend(filter_args);
        let query = Query::new(sql, set_args);
        log::debug!("Updating one: {query}");
        let result = executor.execute(query).await?;
        if let Some((field, next)) = version {
            if result.rows_affected == 0 {
                log::info!(
                    "Concurrent update on `{table}`, field `{}` no longer matches",
                    field.name
                );
                return Err(MappingError::ConcurrencyUpdate {
                    table: table.to_owned(),
                }
                .into());
            }
            field.set(entity, next)?;
        }
        Ok(result)
    }
}

fn insert_statement(writer: &dyn SqlWriter, table: &str, columns: &[&str], rows: usize) -> String {
    let mut sql = String::with_capacity(32 + columns.len() * (16 + rows * 2));
    writer.write_insert(&mut sql, table, columns, rows);
    sql
}
