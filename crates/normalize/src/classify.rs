use tracing::debug;

use crate::event::Event;
use crate::registry::Registry;
use crate::traits::LogParser;

/// Outcome of classifying one line
#[derive(Debug)]
pub struct Classification {
    /// Log type of the parser that accepted the line
    pub log_type: Option<&'static str>,
    pub events: Vec<Event>,
}

impl Classification {
    fn unmatched() -> Self {
        Self {
            log_type: None,
            events: Vec::new(),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.log_type.is_some()
    }
}

struct Candidate {
    parser: Box<dyn LogParser>,
    matches: u64,
}

/// Finds the format of lines whose log type is not known up front.
///
/// Tries each candidate parser in turn and keeps the first non-empty result.
/// Candidates that match are promoted, so in a stream dominated by one
/// format that parser is tried first. Holds per-instance counters; use one
/// classifier per worker.
pub struct Classifier {
    candidates: Vec<Candidate>,
}

impl Classifier {
    pub fn new(parsers: Vec<Box<dyn LogParser>>) -> Self {
        let candidates = parsers
            .into_iter()
            .map(|parser| Candidate { parser, matches: 0 })
            .collect();
        Self { candidates }
    }

    /// One candidate per registered log type
    pub fn from_registry(registry: &Registry) -> Self {
        Self::new(registry.parsers())
    }

    pub fn classify(&mut self, line: &str) -> Classification {
        let line = line.trim();
        if line.is_empty() {
            return Classification::unmatched();
        }

        for idx in 0..self.candidates.len() {
            let events = self.candidates[idx].parser.parse(line);
            if events.is_empty() {
                continue;
            }

            self.candidates[idx].matches += 1;
            let log_type = self.candidates[idx].parser.log_type();
            self.promote(idx);
            return Classification {
                log_type: Some(log_type),
                events,
            };
        }

        debug!("no parser matched line");
        Classification::unmatched()
    }

    /// Move a candidate ahead of those with fewer matches
    fn promote(&mut self, mut idx: usize) {
        while idx > 0 && self.candidates[idx].matches > self.candidates[idx - 1].matches {
            self.candidates.swap(idx, idx - 1);
            idx -= 1;
        }
    }

    /// Log types in current try order with their match counts
    pub fn stats(&self) -> Vec<(&'static str, u64)> {
        self.candidates
            .iter()
            .map(|c| (c.parser.log_type(), c.matches))
            .collect()
    }
}
