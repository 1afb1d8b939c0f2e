use crate::{Driver, Executor, Result};
use std::future::Future;

pub trait Connection: Executor {
    /// Establish a connection to the given url, retrying transient failures.
    fn connect(url: &str) -> impl Future<Output = Result<Self>> + Send;

    /// Start a transaction, every statement run on it is undone unless it is committed.
    fn begin(
        &mut self,
    ) -> impl Future<Output = Result<<Self::Driver as Driver>::Transaction<'_>>> + Send;

    fn disconnect(self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
