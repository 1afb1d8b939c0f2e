mod expression;
#[allow(clippy::module_inception)]
mod filter;
mod operator;
mod order_by;
mod read_query;
mod segment;

pub use expression::*;
pub use filter::*;
pub use operator::*;
pub use order_by::*;
pub use read_query::*;
pub use segment::*;
