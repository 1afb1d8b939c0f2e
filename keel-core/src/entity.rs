use crate::{
    AndOr, Driver, Error, Executor, Filter, FilterExpression, FilterSegment, Operator, ReadQuery,
    Registry, Result, RowLabeled, SqlWriter, TableDef, Value,
    stream::TryStreamExt,
};
use std::future::Future;

/// Object safe view of an entity instance, used wherever records of
/// different types travel together.
pub trait Record: Send + Sync {
    /// Rust type name of the entity.
    fn entity_name(&self) -> &'static str;
    /// Current value of a property, `None` when the property does not exist.
    fn get_value(&self, property: &str) -> Option<Value>;
    /// Assigns a property, converting the value to the property type.
    fn set_value(&mut self, property: &str, value: Value) -> Result<()>;
    /// Every property with its current value, in declaration order.
    fn row(&self) -> Vec<(&'static str, Value)>;
}

/// A type mapped to a table, usually implemented by `#[derive(Entity)]`.
pub trait Entity: Record + Sized + 'static {
    /// Declared mapping, resolved once per [`Registry`].
    fn table_def() -> TableDef;

    /// Names of the mapped properties.
    fn properties() -> &'static [&'static str];

    /// Builds an instance from a row labeled with property names.
    fn from_row(row: RowLabeled) -> Result<Self>;

    /// Reads the rows matching `query`. Errors are logged and reported through
    /// the response, never returned.
    ///
    /// Every row must decode into `Self`. A projection that leaves out a
    /// required field fails here, use [`Entity::find_rows`] for those.
    fn find_all<Exec: Executor>(
        executor: &mut Exec,
        registry: &Registry,
        query: &ReadQuery,
    ) -> impl Future<Output = Response<Self>> + Send {
        async move {
            let rows = Self::find_rows(executor, registry, query).await;
            if !rows.success {
                return Response {
                    success: false,
                    items: Vec::new(),
                    total_count: None,
                    error_message: rows.error_message,
                };
            }
            match rows
                .items
                .into_iter()
                .map(Self::from_row)
                .collect::<Result<Vec<_>>>()
            {
                Ok(items) => Response::success(items, rows.total_count),
                Err(e) => Response::failure(e),
            }
        }
    }

    /// Reads the rows matching `query` without decoding them, the labels are
    /// the projected property names.
    fn find_rows<Exec: Executor>(
        executor: &mut Exec,
        registry: &Registry,
        query: &ReadQuery,
    ) -> impl Future<Output = Response<RowLabeled>> + Send {
        async move {
            Response::from_result(
                async {
                    let table = registry.descriptor::<Self>()?;
                    let writer = executor.driver().sql_writer();
                    let statement = writer.select_statement(&table, query)?;
                    let count = if query.with_total {
                        Some(writer.count_statement(&table, &query.filter)?)
                    } else {
                        None
                    };
                    let items = executor.fetch(statement).try_collect::<Vec<_>>().await?;
                    let total_count = match count {
                        Some(count) => Some(scalar_count(executor.fetch_scalar(count).await?)?),
                        None => None,
                    };
                    Ok((items, total_count))
                }
                .await,
            )
        }
    }

    /// Reads the row with the given primary key.
    fn find_pk<Exec: Executor>(
        executor: &mut Exec,
        registry: &Registry,
        key: impl Into<Value> + Send,
    ) -> impl Future<Output = Response<Self>> + Send {
        let key = key.into();
        async move {
            let table = match registry.descriptor::<Self>() {
                Ok(v) => v,
                Err(e) => return Response::failure(e),
            };
            let Some(pk) = table.primary_key() else {
                let error = Error::msg(format!(
                    "Cannot find {} by key, `{}` has no primary key",
                    table.entity, table.name
                ));
                log::error!("{:#}", error);
                return Response::failure(error);
            };
            let filter = Filter::new().push(FilterSegment {
                name: None,
                joined_by: AndOr::And,
                expressions: vec![(
                    FilterExpression {
                        property: pk.property.into(),
                        operator: Operator::Equal,
                        value: Some(key),
                        name: None,
                    },
                    AndOr::And,
                )],
            });
            Self::find_all(executor, registry, &ReadQuery::new(filter)).await
        }
    }

    /// Counts the rows matching `filter`, the result is in `total_count`.
    fn count<Exec: Executor>(
        executor: &mut Exec,
        registry: &Registry,
        filter: &Filter,
    ) -> impl Future<Output = Response<Self>> + Send {
        async move {
            Response::from_result(
                async {
                    let table = registry.descriptor::<Self>()?;
                    let statement = executor
                        .driver()
                        .sql_writer()
                        .count_statement(&table, filter)?;
                    let total = scalar_count(executor.fetch_scalar(statement).await?)?;
                    Ok((Vec::new(), Some(total)))
                }
                .await,
            )
        }
    }
}

fn scalar_count(value: Value) -> Result<u64> {
    value
        .as_i64()
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| Error::msg(format!("Expected a row count, found {value}")))
}

/// Outcome of a read helper.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<E> {
    pub success: bool,
    pub items: Vec<E>,
    pub total_count: Option<u64>,
    pub error_message: Option<String>,
}

impl<E> Default for Response<E> {
    fn default() -> Self {
        Self {
            success: true,
            items: Vec::new(),
            total_count: None,
            error_message: None,
        }
    }
}

impl<E> Response<E> {
    pub fn success(items: Vec<E>, total_count: Option<u64>) -> Self {
        Self {
            success: true,
            items,
            total_count,
            error_message: None,
        }
    }

    /// Empty unsuccessful response, the error is logged.
    pub fn failure(error: Error) -> Self {
        log::error!("{:#}", error);
        Self {
            success: false,
            items: Vec::new(),
            total_count: None,
            error_message: Some(format!("{:#}", error)),
        }
    }

    fn from_result(result: Result<(Vec<E>, Option<u64>)>) -> Self {
        match result {
            Ok((items, total_count)) => Self::success(items, total_count),
            Err(e) => Self::failure(e),
        }
    }

    pub fn first(&self) -> Option<&E> {
        self.items.first()
    }
}
