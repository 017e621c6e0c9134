// Ingestion driver: reads raw lines, routes them to parsers, emits canonical events.

pub mod boot;
pub mod conf;
pub mod error;
pub mod pipeline;
pub mod stats;

pub use conf::IngestConfig;
pub use error::IngestError;
