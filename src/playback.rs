//! Playback Clock: fires recorded keystrokes when their deadlines arrive.
//!
//! Deadlines are anchored to the previous deadline rather than to the tick
//! that observed it, so a stalled host loses no time: the backlog is fired
//! one event per tick (or all at once under [`CatchUp::DrainOverdue`]).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sequence::{Sequence, SequenceEvent};

/// What to do when several deadlines have passed between two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CatchUp {
    /// Fire at most one event per tick.
    #[default]
    OnePerTick,
    /// Fire every overdue event in the same tick.
    DrainOverdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Wait between entering guided mode and the first event's own delay.
    pub lead_in_ms: f64,
    /// Wait between the last event and the hand-off to freeplay.
    pub hold_ms: f64,
    pub catch_up: CatchUp,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            lead_in_ms: 2000.0,
            hold_ms: 3000.0,
            catch_up: CatchUp::OnePerTick,
        }
    }
}

/// Result of a single [`PlaybackClock::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Next deadline not reached yet.
    Pending,
    /// This event's deadline arrived; apply it.
    Fired(SequenceEvent),
    /// Sequence finished; waiting out the post-completion hold.
    Holding,
    /// Hold expired; the session should leave guided mode.
    HandOff,
}

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    sequence: Arc<Sequence>,
    index: usize,
    next_fire_ms: f64,
    complete: bool,
    hold_ms: f64,
    hold_until_ms: f64,
}

impl PlaybackClock {
    pub fn start(sequence: Arc<Sequence>, now_ms: f64, config: &PlaybackConfig) -> Self {
        let first_delay = sequence.get(0).map_or(0.0, |e| e.delay_ms);
        PlaybackClock {
            sequence,
            index: 0,
            next_fire_ms: now_ms + config.lead_in_ms.max(0.0) + first_delay,
            complete: false,
            hold_ms: config.hold_ms.max(0.0),
            hold_until_ms: f64::INFINITY,
        }
    }

    pub fn tick(&mut self, now_ms: f64) -> Tick {
        if self.complete {
            return if now_ms >= self.hold_until_ms {
                Tick::HandOff
            } else {
                Tick::Holding
            };
        }
        if now_ms < self.next_fire_ms {
            return Tick::Pending;
        }

        let deadline = self.next_fire_ms;
        let Some(event) = self.sequence.get(self.index).copied() else {
            // Empty sequence: completes once the lead-in has elapsed.
            self.finish(deadline);
            return self.tick(now_ms);
        };

        self.index += 1;
        match self.sequence.get(self.index) {
            Some(next) => self.next_fire_ms = deadline + next.delay_ms,
            None => self.finish(deadline),
        }
        log::debug!(
            "playback fired #{} {:?} at {deadline:.1}ms",
            self.index - 1,
            event.token
        );
        Tick::Fired(event)
    }

    fn finish(&mut self, at_ms: f64) {
        self.complete = true;
        self.hold_until_ms = at_ms + self.hold_ms;
        log::info!(
            "guided sequence complete after {} events; hand-off at {:.1}ms",
            self.index,
            self.hold_until_ms
        );
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.sequence.len() - self.index
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Deadline of the next event, or `None` once complete.
    pub fn next_fire_ms(&self) -> Option<f64> {
        (!self.complete).then_some(self.next_fire_ms)
    }

    /// When the post-completion hold ends, once complete.
    pub fn hold_until_ms(&self) -> Option<f64> {
        self.complete.then_some(self.hold_until_ms)
    }
}
