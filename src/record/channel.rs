//! In-process channel source/sink, used by the test suite and the
//! `--debug` dry-run CLI path — no external broker required.

use std::sync::mpsc::{Receiver, RecvError, Sender};

use crate::error::RecordError;
use crate::record::{AlarmEnvelope, Record, RecordSink, RecordSource};

/// Feeds records from an in-process [`Sender`]. Closing the sender produces
/// the clean end-of-stream `None`.
pub struct ChannelSource {
    rx: Receiver<Record>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<Record>) -> Self {
        ChannelSource { rx }
    }
}

impl RecordSource for ChannelSource {
    fn recv(&mut self) -> Result<Option<Record>, RecordError> {
        match self.rx.recv() {
            Ok(record) => Ok(Some(record)),
            Err(RecvError) => Ok(None),
        }
    }
}

/// Collects emitted alarms into an in-process [`Sender`].
pub struct ChannelSink {
    tx: Sender<AlarmEnvelope>,
}

impl ChannelSink {
    pub fn new(tx: Sender<AlarmEnvelope>) -> Self {
        ChannelSink { tx }
    }
}

impl RecordSink for ChannelSink {
    fn send(&mut self, alarm: &AlarmEnvelope) -> Result<(), RecordError> {
        // A closed receiver means the consumer shut down; the dispatcher
        // treats this the same as any other downstream-write failure.
        self.tx.send(alarm.clone()).map_err(|_| {
            RecordError::DownstreamWrite(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "receiver dropped"))
        })
    }
}
