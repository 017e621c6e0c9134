//! Log normalization core.
//!
//! Converts raw log records from heterogeneous sources into canonical,
//! strongly-typed events for security analytics.
//!
//! # Architecture
//!
//! - `indicator.rs`: per-event indicator sets (IPs, domains, AWS ids)
//! - `event.rs`: the core record every parser finalizes, and the canonical event
//! - `validate/`: rule-table validation engine with field-path error reporting
//! - `traits.rs`: the parser contract and the shared soft-failure policy
//! - `registry.rs`: log type → parser factory dispatch
//! - `classify.rs`: tries candidate parsers when the log type is unknown
//! - `formats/`: individual format parsers
//! - `timestamp.rs`: timestamp normalization to UTC
//! - `integration.rs`: log source integration models validated by the engine

pub mod classify;
pub mod event;
pub mod formats;
pub mod indicator;
pub mod integration;
pub mod registry;
pub mod timestamp;
pub mod traits;
pub mod validate;

// Re-export commonly used types
pub use classify::{Classification, Classifier};
pub use event::{CoreRecord, Event};
pub use formats::Record;
pub use indicator::{IndicatorClass, Indicators};
pub use registry::{DispatchError, Registry, RegistryError};
pub use traits::{factory, LogParser, ParseError, ParserFactory};
pub use validate::{FieldError, Validate, ValidationErrors, Validator};

// Constants
pub const MAX_LINE_SIZE: usize = 1_048_576; // 1MB
