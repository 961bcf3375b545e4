//! Command implementations.

mod info;
mod query;
mod send;
mod validate;

pub use info::run_info;
pub use query::run_query;
pub use send::run_send;
pub use validate::run_validate;
