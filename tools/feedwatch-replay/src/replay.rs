//! Drives the engine over recorded snapshots with a simulated clock.

use anyhow::{Context, Result};
use feedwatch::AlarmEvaluationEngine;
use feedwatch::EvaluationResult;
use feedwatch::alarm::SnoozeState;
use feedwatch::feed::FeedSnapshot;
use time::{Duration, OffsetDateTime};

/// Outcome of replaying one recorded snapshot.
#[derive(Debug)]
pub struct Step {
    pub index: usize,
    pub at: OffsetDateTime,
    pub last_entry_id: Option<u64>,
    pub result: EvaluationResult,
}

pub struct Replay {
    engine: AlarmEvaluationEngine,
    clock: OffsetDateTime,
    tick: Duration,
    snooze: SnoozeState,
    steps: usize,
}

impl Replay {
    pub fn new(
        engine: AlarmEvaluationEngine,
        start: OffsetDateTime,
        tick: Duration,
        snooze: SnoozeState,
    ) -> Self {
        Self {
            engine,
            clock: start,
            tick,
            snooze,
            steps: 0,
        }
    }

    /// Evaluate one snapshot at the current simulated time, then advance
    /// the clock by one tick.
    pub fn step(&mut self, snapshot: &FeedSnapshot) -> Step {
        let at = self.clock;
        let result = self.engine.evaluate_at(snapshot, &self.snooze, at);
        let step = Step {
            index: self.steps,
            at,
            last_entry_id: self.engine.cursor().last_entry_id(),
            result,
        };
        self.clock += self.tick;
        self.steps += 1;
        step
    }

    pub fn engine(&self) -> &AlarmEvaluationEngine {
        &self.engine
    }
}

/// Parse a JSON-lines recording: one feed snapshot per line. Blank lines
/// and lines starting with `#` are skipped.
pub fn parse_recording(text: &str) -> Result<Vec<FeedSnapshot>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(number, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}", number + 1))
        })
        .collect()
}
