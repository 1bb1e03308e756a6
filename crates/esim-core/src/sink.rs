//! ---
//! esim_section: "11-simulation"
//! esim_subsection: "01-engine"
//! esim_type: "source"
//! esim_scope: "code"
//! esim_description: "Consumers of the accumulated battery and utilization series."
//! esim_version: "v0.1.0"
//! esim_owner: "tbd"
//! ---
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::frames::SeriesSnapshot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("series consumer has disconnected")]
    Disconnected,
}

/// Receiver of the series the engine emits after each integrating tick.
pub trait SeriesSink: Send {
    /// Hand over the full accumulated history.
    fn publish(&mut self, snapshot: SeriesSnapshot) -> Result<(), SinkError>;
}

/// Forwards snapshots to a concurrently running consumer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<SeriesSnapshot>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<SeriesSnapshot>) -> Self {
        Self { sender }
    }

    /// Sink plus the receiving half for the consumer.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<SeriesSnapshot>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl SeriesSink for ChannelSink {
    fn publish(&mut self, snapshot: SeriesSnapshot) -> Result<(), SinkError> {
        self.sender
            .send(snapshot)
            .map_err(|_| SinkError::Disconnected)
    }
}

/// Keeps every snapshot; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    snapshots: Arc<Mutex<Vec<SeriesSnapshot>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<SeriesSnapshot> {
        self.snapshots.lock().clone()
    }

    pub fn latest(&self) -> Option<SeriesSnapshot> {
        self.snapshots.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }
}

impl SeriesSink for MemorySink {
    fn publish(&mut self, snapshot: SeriesSnapshot) -> Result<(), SinkError> {
        self.snapshots.lock().push(snapshot);
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SeriesSink for NullSink {
    fn publish(&mut self, _snapshot: SeriesSnapshot) -> Result<(), SinkError> {
        Ok(())
    }
}
