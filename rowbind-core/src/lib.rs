mod as_value;
mod bound;
mod config;
mod entity;
mod error;
mod executor;
mod field;
mod query;
mod registry;
mod rewrite;
mod sql_writer;
mod util;
mod value;

pub use as_value::*;
pub use bound::*;
pub use config::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use field::*;
pub use query::*;
pub use registry::*;
pub use rewrite::*;
pub use sql_writer::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
