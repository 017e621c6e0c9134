//! Pipeline — routes raw lines to parsers across a pool of blocking workers.

use std::collections::BTreeMap;
use std::sync::Arc;

use normalize::{Classifier, Event, LogParser, ParserFactory, Registry};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::conf::IngestConfig;
use crate::error::{IngestError, IngestResult};
use crate::stats::IngestStats;

/// How lines find their parser
#[derive(Debug, Clone)]
pub enum Route {
    /// Every line has the same, known log type
    Fixed(ParserFactory),
    /// Try each candidate until one accepts the line
    Classify(Vec<ParserFactory>),
}

impl Route {
    pub fn from_config(config: &IngestConfig, registry: &Registry) -> IngestResult<Self> {
        if let Some(log_type) = &config.log_type {
            info!(log_type = %log_type, "routing all lines to a single parser");
            return Ok(Route::Fixed(registry.resolve(log_type)?));
        }

        let log_types: Vec<String> = if config.candidate_log_types.is_empty() {
            registry.log_types().into_iter().map(str::to_string).collect()
        } else {
            config.candidate_log_types.clone()
        };
        info!(candidates = ?log_types, "classifying lines");

        let factories = log_types
            .iter()
            .map(|log_type| registry.resolve(log_type))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Route::Classify(factories))
    }

    /// Fresh per-worker parsing state
    fn worker(&self) -> Worker {
        match self {
            Route::Fixed(factory) => Worker::Fixed(factory()),
            Route::Classify(factories) => {
                Worker::Classify(Classifier::new(factories.iter().map(|factory| factory()).collect()))
            }
        }
    }
}

enum Worker {
    Fixed(Box<dyn LogParser>),
    Classify(Classifier),
}

impl Worker {
    fn parse(&mut self, line: &str, stats: &IngestStats) -> Vec<Event> {
        match self {
            Worker::Fixed(parser) => {
                let events = parser.parse(line);
                stats.record(parser.log_type(), events.len());
                events
            }
            Worker::Classify(classifier) => {
                let classification = classifier.classify(line);
                match classification.log_type {
                    Some(log_type) => stats.record(log_type, classification.events.len()),
                    None => stats.record_unmatched(),
                }
                classification.events
            }
        }
    }
}

/// Parsing state for every worker, kept for the whole run so classifier
/// promotion carries across batches.
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    pub fn new(route: &Route, size: usize) -> Self {
        let workers = (0..size.max(1)).map(|_| route.worker()).collect();
        Self { workers }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Parse a batch of lines, one chunk per worker on the blocking pool.
    ///
    /// Events come back in input order. Blank lines are skipped.
    pub async fn process(&mut self, lines: Vec<String>, stats: &Arc<IngestStats>) -> IngestResult<Vec<Event>> {
        let lines: Vec<String> = lines.into_iter().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        if self.workers.is_empty() {
            return Err(IngestError::PoolExhausted);
        }

        let chunk_size = lines.len().div_ceil(self.workers.len());
        let mut remaining = lines.into_iter().peekable();
        let mut idle = std::mem::take(&mut self.workers).into_iter();
        let mut handles = Vec::new();
        while remaining.peek().is_some() {
            let Some(mut worker) = idle.next() else {
                break;
            };
            let chunk: Vec<String> = remaining.by_ref().take(chunk_size).collect();
            let stats = Arc::clone(stats);
            handles.push(tokio::task::spawn_blocking(move || {
                let events: Vec<Event> = chunk
                    .iter()
                    .flat_map(|line| worker.parse(line, &stats))
                    .collect();
                (worker, events)
            }));
        }

        let mut events = Vec::new();
        for handle in handles {
            let (worker, chunk_events) = handle.await?;
            self.workers.push(worker);
            events.extend(chunk_events);
        }
        self.workers.extend(idle);
        Ok(events)
    }

    /// Classifier matches per log type, summed over workers
    pub fn match_counts(&self) -> Vec<(&'static str, u64)> {
        let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
        for worker in &self.workers {
            if let Worker::Classify(classifier) = worker {
                for (log_type, matches) in classifier.stats() {
                    *counts.entry(log_type).or_default() += matches;
                }
            }
        }
        counts.into_iter().collect()
    }
}

/// Strip the line terminator (`\n` or `\r\n`)
fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Read `reader` to the end, writing one JSON event per line to `writer`.
///
/// Lines that are not valid UTF-8 are counted and dropped. Returns the
/// number of events written.
pub async fn run<R, W>(
    mut reader: R,
    writer: &mut W,
    route: &Route,
    config: &IngestConfig,
    stats: Arc<IngestStats>,
) -> IngestResult<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut pool = WorkerPool::new(route, config.workers);
    let mut buf = Vec::new();
    let mut written = 0u64;
    let mut eof = false;

    while !eof {
        let mut batch = Vec::with_capacity(config.batch_size);
        while batch.len() < config.batch_size {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                eof = true;
                break;
            }
            match std::str::from_utf8(trim_newline(&buf)) {
                Ok(line) => batch.push(line.to_string()),
                Err(err) => {
                    stats.record_non_utf8();
                    debug!(error = %err, "dropping non-UTF-8 line");
                }
            }
        }
        if batch.is_empty() {
            continue;
        }

        let batch_len = batch.len();
        let events = pool.process(batch, &stats).await?;
        debug!(lines = batch_len, events = events.len(), "batch parsed");

        for event in &events {
            let mut encoded = serde_json::to_vec(event)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            written += 1;
        }
    }

    for (log_type, matches) in pool.match_counts() {
        debug!(log_type, matches, "classifier matches");
    }
    writer.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use normalize::formats::{cloudtrail, fluentd_syslog, syslog};

    const FLUENTD_LINE: &str = r#"{"pri":16,"host":"10.0.0.1","message":"one","time":"2020-01-06 19:41:37 +0000"}"#;
    const SYSLOG_LINE: &str = "<34>1 2020-01-06T19:41:37Z db01.example.com app - - - hello";

    fn fixed_config(log_type: &str) -> IngestConfig {
        IngestConfig {
            log_type: Some(log_type.to_string()),
            workers: 2,
            batch_size: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_route_fixed_resolves() {
        let route = Route::from_config(&fixed_config(syslog::LOG_TYPE), Registry::global()).unwrap();
        assert!(matches!(route, Route::Fixed(_)));
    }

    #[test]
    fn test_route_unknown_log_type_is_dispatch_error() {
        let result = Route::from_config(&fixed_config("Nope.Nothing"), Registry::global());
        assert!(matches!(result, Err(IngestError::Dispatch(_))));
    }

    #[test]
    fn test_route_classify_candidates() {
        let config = IngestConfig {
            candidate_log_types: vec![syslog::LOG_TYPE.to_string(), cloudtrail::LOG_TYPE.to_string()],
            ..Default::default()
        };
        match Route::from_config(&config, Registry::global()).unwrap() {
            Route::Classify(factories) => assert_eq!(factories.len(), 2),
            other => panic!("unexpected route {other:?}"),
        }
    }

    #[test]
    fn test_pool_preserves_order() {
        let route = Route::from_config(&fixed_config(fluentd_syslog::LOG_TYPE_5424), Registry::global()).unwrap();
        let stats = Arc::new(IngestStats::new());
        let mut pool = WorkerPool::new(&route, 3);
        let lines: Vec<String> = (0..10)
            .map(|i| format!(r#"{{"pri":16,"host":"10.0.0.{}"}}"#, i))
            .collect();

        let events = tokio_test::block_on(pool.process(lines, &stats)).unwrap();
        assert_eq!(events.len(), 10);
        for (i, event) in events.iter().enumerate() {
            let host = format!("10.0.0.{}", i);
            assert!(event.has_indicator(normalize::IndicatorClass::IpAddress, &host));
        }
        assert_eq!(stats.total_events(), 10);
        assert_eq!(pool.len(), 3);
    }

    #[tokio::test]
    async fn test_pool_keeps_classifier_across_batches() {
        let config = IngestConfig {
            candidate_log_types: vec![syslog::LOG_TYPE.to_string(), fluentd_syslog::LOG_TYPE_5424.to_string()],
            ..Default::default()
        };
        let route = Route::from_config(&config, Registry::global()).unwrap();
        let stats = Arc::new(IngestStats::new());
        let mut pool = WorkerPool::new(&route, 1);

        let batch = |n: usize| vec![FLUENTD_LINE.to_string(); n];
        assert_eq!(pool.process(batch(3), &stats).await.unwrap().len(), 3);
        assert_eq!(pool.process(batch(2), &stats).await.unwrap().len(), 2);

        assert_eq!(
            pool.match_counts(),
            vec![(fluentd_syslog::LOG_TYPE_5424, 5), (syslog::LOG_TYPE, 0)]
        );
    }

    #[tokio::test]
    async fn test_run_skips_non_utf8_lines() {
        let mut input = Vec::new();
        input.extend_from_slice(FLUENTD_LINE.as_bytes());
        input.extend_from_slice(b"\n\xff\xfe garbage\n");
        input.extend_from_slice(FLUENTD_LINE.as_bytes());
        input.extend_from_slice(b"\r\n");

        let config = fixed_config(fluentd_syslog::LOG_TYPE_5424);
        let route = Route::from_config(&config, Registry::global()).unwrap();
        let stats = Arc::new(IngestStats::new());
        let mut out: Vec<u8> = Vec::new();

        let written = run(input.as_slice(), &mut out, &route, &config, Arc::clone(&stats))
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(stats.non_utf8(), 1);
        assert_eq!(stats.snapshot()[0].dropped, 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn test_run_drops_bad_lines_and_writes_json() {
        let input = format!("{FLUENTD_LINE}\nnot json\n\n{FLUENTD_LINE}\n");
        let config = fixed_config(fluentd_syslog::LOG_TYPE_5424);
        let route = Route::from_config(&config, Registry::global()).unwrap();
        let stats = Arc::new(IngestStats::new());
        let mut out: Vec<u8> = Vec::new();

        let written = run(input.as_bytes(), &mut out, &route, &config, Arc::clone(&stats))
            .await
            .unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["p_log_type"], fluentd_syslog::LOG_TYPE_5424);
        assert_eq!(value["p_any_ip_addresses"][0], "10.0.0.1");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot[0].lines, 3);
        assert_eq!(snapshot[0].dropped, 1);
    }

    #[tokio::test]
    async fn test_run_classifies_mixed_input() {
        let input = format!("{SYSLOG_LINE}\n{FLUENTD_LINE}\nrandom words\n");
        let config = IngestConfig {
            candidate_log_types: vec![syslog::LOG_TYPE.to_string(), fluentd_syslog::LOG_TYPE_5424.to_string()],
            workers: 1,
            ..Default::default()
        };
        let route = Route::from_config(&config, Registry::global()).unwrap();
        let stats = Arc::new(IngestStats::new());
        let mut out: Vec<u8> = Vec::new();

        let written = run(input.as_bytes(), &mut out, &route, &config, Arc::clone(&stats))
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(stats.unmatched(), 1);

        let log_types: Vec<String> = stats.snapshot().into_iter().map(|s| s.log_type).collect();
        assert_eq!(log_types, vec![fluentd_syslog::LOG_TYPE_5424.to_string(), syslog::LOG_TYPE.to_string()]);
    }
}
