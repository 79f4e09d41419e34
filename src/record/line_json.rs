//! Line-delimited-JSON source/sink over any `Read`/`Write`, used as the
//! default runnable binary path. One JSON object per line in, one JSON
//! object per line out.

use std::io::{BufRead, BufReader, Read, Write};

use crate::error::RecordError;
use crate::record::{self, AlarmEnvelope, Record, RecordSink, RecordSource};

/// Reads one JSON record per line from any buffered reader.
pub struct LineJsonSource<R: Read> {
    lines: std::io::Lines<BufReader<R>>,
}

impl<R: Read> LineJsonSource<R> {
    pub fn new(reader: R) -> Self {
        LineJsonSource { lines: BufReader::new(reader).lines() }
    }
}

impl<R: Read> RecordSource for LineJsonSource<R> {
    fn recv(&mut self) -> Result<Option<Record>, RecordError> {
        loop {
            let Some(line) = self.lines.next() else { return Ok(None) };
            let line = line.map_err(RecordError::Io)?;
            if line.trim().is_empty() {
                continue;
            }
            return record::decode(line.as_bytes()).map(Some);
        }
    }
}

/// Writes one JSON alarm per line to any writer.
pub struct LineJsonSink<W: Write> {
    writer: W,
}

impl<W: Write> LineJsonSink<W> {
    pub fn new(writer: W) -> Self {
        LineJsonSink { writer }
    }
}

impl<W: Write> RecordSink for LineJsonSink<W> {
    fn send(&mut self, alarm: &AlarmEnvelope) -> Result<(), RecordError> {
        let mut line = serde_json::to_vec(alarm).map_err(RecordError::Decode)?;
        line.push(b'\n');
        self.writer.write_all(&line).map_err(RecordError::DownstreamWrite)?;
        self.writer.flush().map_err(RecordError::DownstreamWrite)
    }
}
