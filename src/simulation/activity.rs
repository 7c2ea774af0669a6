//! Activity reporting - structured facts about what workers did
//!
//! Every assignment, movement step and critical-need event becomes an
//! `ActivityEvent`. Events are handed to sinks after the tick that produced
//! them; sinks must not block.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::core::types::{GridPos, Tick, WorkerId};
use crate::entity::worker::Worker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    TaskAssigned,
    TaskAbandoned,
    TaskCompleted,
    Moved,
    Arrived,
    CriticalNeed,
    Harvested,
    Constructed,
    OracleDecision,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub tick: Tick,
    pub worker_id: WorkerId,
    pub worker_name: String,
    pub kind: ActivityKind,
    pub detail: String,
    pub location: Option<GridPos>,
}

impl ActivityEvent {
    /// Event located at the worker's current cell
    pub fn new(tick: Tick, worker: &Worker, kind: ActivityKind, detail: impl Into<String>) -> Self {
        Self {
            tick,
            worker_id: worker.id,
            worker_name: worker.name.clone(),
            kind,
            detail: detail.into(),
            location: Some(worker.position),
        }
    }

    pub fn at(mut self, location: GridPos) -> Self {
        self.location = Some(location);
        self
    }

    /// Whether the worker should remember this in its memory
    pub fn is_memorable(&self) -> bool {
        !matches!(self.kind, ActivityKind::Moved | ActivityKind::Harvested)
    }
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({}): {}", self.tick, self.worker_name, self.worker_id, self.detail)?;
        if let Some(pos) = self.location {
            write!(f, " at {pos}")?;
        }
        Ok(())
    }
}

/// Receiver of activity facts
pub trait ActivitySink: Send {
    fn record(&mut self, event: &ActivityEvent);
}

/// Bounded, append-only, in-memory log; the oldest entries fall off
#[derive(Debug, Clone)]
pub struct ActivityLog {
    events: VecDeque<ActivityEvent>,
    capacity: usize,
    total: u64,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            total: 0,
        }
    }

    pub fn push(&mut self, event: ActivityEvent) {
        self.total += 1;
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivityEvent> + '_ {
        self.events.iter()
    }

    /// Most recent `n` events, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ActivityEvent> + '_ {
        self.events.iter().skip(self.events.len().saturating_sub(n))
    }

    pub fn for_worker(&self, worker: WorkerId) -> impl Iterator<Item = &ActivityEvent> + '_ {
        self.events.iter().filter(move |e| e.worker_id == worker)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events ever recorded, including those evicted
    pub fn total_recorded(&self) -> u64 {
        self.total
    }
}

impl ActivitySink for ActivityLog {
    fn record(&mut self, event: &ActivityEvent) {
        self.push(event.clone());
    }
}

/// Emits each event as a structured `tracing` record
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ActivitySink for TracingSink {
    fn record(&mut self, event: &ActivityEvent) {
        let location = event.location.map(|p| p.to_string());
        match event.kind {
            ActivityKind::Moved | ActivityKind::Harvested => tracing::debug!(
                tick = event.tick,
                worker = event.worker_id.0,
                name = %event.worker_name,
                kind = ?event.kind,
                location = ?location,
                "{}",
                event.detail
            ),
            ActivityKind::Failure | ActivityKind::TaskAbandoned => tracing::warn!(
                tick = event.tick,
                worker = event.worker_id.0,
                name = %event.worker_name,
                kind = ?event.kind,
                location = ?location,
                "{}",
                event.detail
            ),
            _ => tracing::info!(
                tick = event.tick,
                worker = event.worker_id.0,
                name = %event.worker_name,
                kind = ?event.kind,
                location = ?location,
                "{}",
                event.detail
            ),
        }
    }
}

/// Forwards events over an unbounded channel; a dropped receiver is ignored
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ActivityEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ActivityEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ActivityEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ActivitySink for ChannelSink {
    fn record(&mut self, event: &ActivityEvent) {
        let _ = self.tx.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tick: Tick, worker: u32) -> ActivityEvent {
        ActivityEvent {
            tick,
            worker_id: WorkerId(worker),
            worker_name: format!("w{worker}"),
            kind: ActivityKind::Moved,
            detail: "step".into(),
            location: Some(GridPos::new(1, 2)),
        }
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = ActivityLog::new(3);
        for t in 0..5 {
            log.push(event(t, 1));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.total_recorded(), 5);
        let ticks: Vec<_> = log.iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![2, 3, 4]);
        let recent: Vec<_> = log.recent(2).map(|e| e.tick).collect();
        assert_eq!(recent, vec![3, 4]);
    }

    #[test]
    fn test_log_filters_by_worker() {
        let mut log = ActivityLog::new(10);
        log.push(event(0, 1));
        log.push(event(0, 2));
        log.push(event(1, 1));
        assert_eq!(log.for_worker(WorkerId(1)).count(), 2);
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (mut sink, rx) = ChannelSink::channel();
        sink.record(&event(0, 1));
        drop(rx);
        sink.record(&event(1, 1));
    }

    #[test]
    fn test_channel_sink_delivers() {
        let (mut sink, mut rx) = ChannelSink::channel();
        sink.record(&event(7, 3));
        let got = rx.try_recv().unwrap();
        assert_eq!(got.tick, 7);
        assert_eq!(got.worker_id, WorkerId(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(event(4, 2).to_string(), "[4] w2 (worker #2): step at (1, 2)");
    }
}
