use thiserror::Error;
use tracing::debug;

use crate::event::Event;
use crate::timestamp::TimestampError;
use crate::validate::ValidationErrors;
use crate::MAX_LINE_SIZE;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Line too large: {0} bytes (max: {1} bytes)")]
    LineTooLarge(usize, usize),

    #[error("failed to parse log: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("failed to parse timestamp: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("failed to validate log: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Builds a fresh, independent parser instance
pub type ParserFactory = fn() -> Box<dyn LogParser>;

/// Factory for any parser with a `Default` constructor
pub fn factory<P>() -> Box<dyn LogParser>
where
    P: LogParser + Default + 'static,
{
    Box::new(P::default())
}

/// One supported log format.
///
/// Parsers hold no mutable state, so one instance can be shared across
/// threads or a fresh one built per worker via its [`ParserFactory`].
pub trait LogParser: Send + Sync {
    /// Stable identifier used as the dispatch key
    fn log_type(&self) -> &'static str;

    /// Map one raw record to its events, surfacing the failure cause.
    fn parse_events(&self, raw: &str) -> Result<Vec<Event>, ParseError>;

    /// Largest raw record accepted, in bytes
    fn max_size(&self) -> usize {
        MAX_LINE_SIZE
    }

    /// Parse a raw record into zero or more events.
    ///
    /// Malformed or invalid input never raises: the failure is logged and
    /// the record is dropped, so one bad line cannot halt a batch.
    fn parse(&self, raw: &str) -> Vec<Event> {
        // SECURITY: Enforce size limit before handing input to a deserializer
        let max_size = self.max_size();
        if raw.len() > max_size {
            let err = ParseError::LineTooLarge(raw.len(), max_size);
            debug!(log_type = self.log_type(), error = %err, "dropping log");
            return Vec::new();
        }

        match self.parse_events(raw) {
            Ok(events) => events,
            Err(err) => {
                debug!(log_type = self.log_type(), error = %err, "dropping log");
                Vec::new()
            }
        }
    }
}
