use crate::{Executor, Result};

/// Executor bound to an open transaction, consumed by its outcome.
pub trait Transaction<'c>: Executor {
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
