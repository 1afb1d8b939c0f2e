mod as_value;
mod change;
mod column;
mod connection;
mod driver;
mod entity;
mod executor;
mod filter;
mod query;
mod queue;
mod registry;
mod retry;
mod save;
mod sequence;
mod table;
mod transaction;
mod util;
mod value;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use change::*;
pub use column::*;
pub use connection::*;
pub use driver::*;
pub use entity::*;
pub use executor::*;
pub use filter::*;
pub use query::*;
pub use queue::*;
pub use registry::*;
pub use retry::*;
pub use save::*;
pub use sequence::*;
pub use table::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub use writer::{GenericSqlWriter, Parameters, SqlWriter, Statement};
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
