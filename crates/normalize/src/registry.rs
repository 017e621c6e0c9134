use std::collections::HashMap;
use std::sync::LazyLock;

use thiserror::Error;

use crate::formats;
use crate::traits::{LogParser, ParserFactory};

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let mut registry = Registry::new();
    for factory in formats::builtin() {
        if let Err(err) = registry.register_parser(factory) {
            tracing::error!(error = %err, "skipping builtin parser");
        }
    }
    registry
});

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("log type already registered: {0}")]
    Duplicate(String),

    #[error("parser for {actual} cannot be registered as {key}")]
    Mismatch { key: String, actual: String },
}

/// The log type is not routable; the caller decides what to do with the record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no parser registered for log type: {0}")]
    NotFound(String),
}

/// Log type → parser factory lookup table.
///
/// Filled once during startup and only read afterwards, so shared lookups
/// need no locking.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    factories: HashMap<&'static str, ParserFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry holding every shipped format
    pub fn global() -> &'static Registry {
        &REGISTRY
    }

    /// Register `factory` under `log_type`; the parser it builds must
    /// report that same log type.
    pub fn register(&mut self, log_type: &'static str, factory: ParserFactory) -> Result<(), RegistryError> {
        let actual = factory().log_type();
        if actual != log_type {
            return Err(RegistryError::Mismatch {
                key: log_type.to_string(),
                actual: actual.to_string(),
            });
        }
        if self.factories.contains_key(log_type) {
            return Err(RegistryError::Duplicate(log_type.to_string()));
        }
        self.factories.insert(log_type, factory);
        Ok(())
    }

    /// Register under the log type the parser itself reports
    pub fn register_parser(&mut self, factory: ParserFactory) -> Result<(), RegistryError> {
        let log_type = factory().log_type();
        self.register(log_type, factory)
    }

    pub fn resolve(&self, log_type: &str) -> Result<ParserFactory, DispatchError> {
        self.factories
            .get(log_type)
            .copied()
            .ok_or_else(|| DispatchError::NotFound(log_type.to_string()))
    }

    /// Registered log types, sorted
    pub fn log_types(&self) -> Vec<&'static str> {
        let mut log_types: Vec<&'static str> = self.factories.keys().copied().collect();
        log_types.sort_unstable();
        log_types
    }

    /// Fresh instances of every registered parser, ordered by log type
    pub fn parsers(&self) -> Vec<Box<dyn LogParser>> {
        self.log_types()
            .into_iter()
            .filter_map(|log_type| self.factories.get(log_type).map(|factory| factory()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{cloudtrail, fluentd_syslog, syslog};
    use crate::indicator::IndicatorClass;
    use crate::traits::factory;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_global_has_builtin_formats() {
        let registry = Registry::global();
        assert_eq!(
            registry.log_types(),
            vec![
                cloudtrail::LOG_TYPE,
                fluentd_syslog::LOG_TYPE_3164,
                fluentd_syslog::LOG_TYPE_5424,
                syslog::LOG_TYPE,
            ]
        );
    }

    #[test]
    fn test_resolve_returns_matching_parser() {
        for log_type in Registry::global().log_types() {
            let parser = Registry::global().resolve(log_type).unwrap()();
            assert_eq!(parser.log_type(), log_type);
        }
    }

    #[test]
    fn test_resolve_unknown_is_not_found() {
        let err = Registry::global().resolve("Nope.Nothing").unwrap_err();
        assert_eq!(err, DispatchError::NotFound("Nope.Nothing".to_string()));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = Registry::new();
        registry
            .register(fluentd_syslog::LOG_TYPE_3164, factory::<fluentd_syslog::Rfc3164Parser>)
            .unwrap();
        let err = registry
            .register_parser(factory::<fluentd_syslog::Rfc3164Parser>)
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate(fluentd_syslog::LOG_TYPE_3164.to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_rejects_mismatched_log_type() {
        let mut registry = Registry::new();
        let err = registry
            .register(syslog::LOG_TYPE, factory::<fluentd_syslog::Rfc3164Parser>)
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::Mismatch {
                key: syslog::LOG_TYPE.to_string(),
                actual: fluentd_syslog::LOG_TYPE_3164.to_string(),
            }
        );
        assert!(registry.is_empty());
        assert!(registry.resolve(syslog::LOG_TYPE).is_err());
    }

    #[test]
    fn test_end_to_end_dispatch() {
        let factory = Registry::global().resolve(fluentd_syslog::LOG_TYPE_5424).unwrap();
        let events = factory().parse(r#"{"pri":16,"host":"10.0.0.9","message":"hi"}"#);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].log_type(), fluentd_syslog::LOG_TYPE_5424);
        assert!(events[0].has_indicator(IndicatorClass::IpAddress, "10.0.0.9"));
    }

    #[test]
    fn test_concurrent_parsers_are_independent() {
        let factory = Registry::global().resolve(fluentd_syslog::LOG_TYPE_3164).unwrap();
        let shared = Arc::new(factory());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    // Half the workers build their own instance
                    let own = factory();
                    let parser: &dyn LogParser = if worker % 2 == 0 { &**shared } else { &*own };
                    (0..50)
                        .map(|i| {
                            let host = format!("10.{}.0.{}", worker, i);
                            let events = parser.parse(&format!(r#"{{"pri":13,"host":"{}"}}"#, host));
                            assert_eq!(events.len(), 1);
                            let ips = events[0].indicators().get(IndicatorClass::IpAddress).unwrap();
                            assert_eq!(ips.len(), 1);
                            assert!(ips.contains(&host));
                        })
                        .count()
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 400);
    }
}
