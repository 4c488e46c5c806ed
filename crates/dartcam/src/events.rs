//! Where accepted strikes go.
//!
//! Emission never fails the capture loop: sinks log and drop what they
//! cannot deliver. [`ChannelSink`] never blocks either; [`JsonLinesSink`]
//! writes inline, so put it behind [`json_lines_writer`] when the output can
//! stall (a pipe, a terminal).

use crate::pipeline::StrikeEvent;
use crossbeam_channel::{bounded, Sender, TrySendError};
use log::{debug, warn};
use std::io::Write;
use std::thread::{self, JoinHandle};

pub trait EventSink {
    fn emit(&mut self, event: &StrikeEvent);
}

/// Collects events in memory.
impl EventSink for Vec<StrikeEvent> {
    fn emit(&mut self, event: &StrikeEvent) {
        self.push(event.clone());
    }
}

/// Forwards events to a bounded channel.
///
/// A full channel drops the event. A disconnected receiver marks the sink
/// dead and later events are skipped silently.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender<StrikeEvent>,
    dead: bool,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(tx: Sender<StrikeEvent>) -> Self {
        Self {
            tx,
            dead: false,
            dropped: 0,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Events lost to a full queue.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: &StrikeEvent) {
        if self.dead {
            return;
        }
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                warn!("event queue full; dropping strike from frame {}", event.frame);
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("event receiver disconnected; no further events will be sent");
                self.dead = true;
            }
        }
    }
}

/// Writes one JSON object per line, flushing after each.
///
/// `emit` blocks for as long as the writer does.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: &StrikeEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("failed to encode strike event: {e}");
                return;
            }
        };
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            warn!("failed to write strike event: {e}");
        }
    }
}

/// JSON lines on a background thread.
///
/// Events go through a bounded queue of `capacity` to a thread that owns a
/// [`JsonLinesSink`] over `out`, so a slow writer only ever fills the queue.
/// The thread exits once the returned sink is dropped and hands `out` back.
pub fn json_lines_writer<W>(out: W, capacity: usize) -> (ChannelSink, JoinHandle<W>)
where
    W: Write + Send + 'static,
{
    let (tx, rx) = bounded::<StrikeEvent>(capacity.max(1));
    let handle = thread::spawn(move || {
        let mut sink = JsonLinesSink::new(out);
        for event in rx {
            sink.emit(&event);
        }
        debug!("event writer drained");
        sink.into_inner()
    });
    (ChannelSink::new(tx), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::{Duration, Instant};

    /// Writer that stalls on every write.
    struct SlowWriter {
        delay: Duration,
        buf: Vec<u8>,
    }

    impl Write for SlowWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            thread::sleep(self.delay);
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn event(frame: u64) -> StrikeEvent {
        StrikeEvent {
            frame,
            camera: [10.0, 20.0],
            board: None,
            zone: None,
            label: None,
            code: None,
            points: None,
            calibrated: false,
            detected_at: Instant::now(),
        }
    }

    #[test]
    fn channel_sink_drops_when_full() {
        let (tx, rx) = bounded(1);
        let mut sink = ChannelSink::new(tx);
        sink.emit(&event(1));
        sink.emit(&event(2));
        assert_eq!(sink.dropped(), 1);
        assert_eq!(rx.try_recv().map(|e| e.frame), Ok(1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_sink_goes_dead_on_disconnect() {
        let (tx, rx) = bounded(4);
        let mut sink = ChannelSink::new(tx);
        drop(rx);
        sink.emit(&event(1));
        assert!(sink.is_dead());
        sink.emit(&event(2));
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn json_lines_are_one_object_per_event() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.emit(&event(3));
        sink.emit(&event(4));
        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let v: serde_json::Value = serde_json::from_str(lines[1]).expect("json");
        assert_eq!(v["frame"], 4);
        assert_eq!(v["camera"][1], 20.0);
        assert!(v["zone"].is_null());
        assert!(v.get("detected_at").is_none());
    }

    #[test]
    fn slow_writer_does_not_stall_emit() {
        let out = SlowWriter {
            delay: Duration::from_millis(300),
            buf: Vec::new(),
        };
        let (mut sink, writer) = json_lines_writer(out, 8);

        let start = Instant::now();
        sink.emit(&event(1));
        sink.emit(&event(2));
        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(sink.dropped(), 0);

        drop(sink);
        let out = writer.join().expect("writer thread");
        let text = String::from_utf8(out.buf).expect("utf8");
        let frames: Vec<u64> = text
            .lines()
            .map(|l| {
                let v: serde_json::Value = serde_json::from_str(l).expect("json");
                v["frame"].as_u64().expect("frame")
            })
            .collect();
        assert_eq!(frames, vec![1, 2]);
    }
}
