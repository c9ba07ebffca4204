pub mod chunker;
pub mod engine;
pub mod executor;
pub mod grouping;
pub mod node;
pub mod pipeline;
pub mod statement;
pub mod values;

pub use crate::domain::model::{Record, Row, SqlValue, TableUnit};
pub use crate::domain::ports::{ConfigProvider, ConnectionPool, Driver, NodeParameters, Pipeline, Storage};
pub use crate::utils::error::Result;
