use crate::data::{Datum, PublishRecord};
use crossbeam_channel::{bounded, Sender};
use log::{error, info};
use std::{
    io::{self, Write},
    thread::{self, JoinHandle},
};
use thiserror::Error;

/// Errors while publishing a record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The publishing worker is gone.
    #[error("publish queue is disconnected")]
    Disconnected,

    /// The backend refused the record.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Destination for aggregated records.
///
/// Sinks are called synchronously from the flush path.  A slow sink stalls ingestion for as long as
/// it takes; wrap it in a [`BackgroundSink`] to move that cost onto another thread.
pub trait Sink {
    fn publish(&mut self, record: &PublishRecord) -> Result<(), SinkError>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn publish(&mut self, record: &PublishRecord) -> Result<(), SinkError> { (**self).publish(record) }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn publish(&mut self, record: &PublishRecord) -> Result<(), SinkError> { (**self).publish(record) }
}

/// Logs every record at `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn publish(&mut self, record: &PublishRecord) -> Result<(), SinkError> {
        match &record.datum {
            Datum::Value(value) => info!(
                "{}/{} = {} {} @ {}",
                record.namespace, record.name, value, record.unit, record.timestamp
            ),
            Datum::Statistics(stats) => info!(
                "{}/{} = min {} max {} sum {} count {} {} @ {}",
                record.namespace,
                record.name,
                stats.minimum,
                stats.maximum,
                stats.sum,
                stats.sample_count,
                record.unit,
                record.timestamp
            ),
        }
        Ok(())
    }
}

/// Writes every record as a single line of JSON.
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> JsonSink<W> { JsonSink { writer } }

    pub fn into_inner(self) -> W { self.writer }
}

impl<W: Write> Sink for JsonSink<W> {
    fn publish(&mut self, record: &PublishRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Hands records to a worker thread that owns the real sink.
///
/// Records are queued on a bounded channel.  When the queue is full the caller blocks until the
/// worker catches up, so a flush never drops records to back-pressure.  Failures inside the worker
/// are logged there, since the flush that produced the record has already moved on.
///
/// Dropping the handle closes the queue and waits for the worker to drain it.
pub struct BackgroundSink {
    tx: Option<Sender<PublishRecord>>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundSink {
    pub fn spawn<S>(mut inner: S, capacity: usize) -> io::Result<BackgroundSink>
    where
        S: Sink + Send + 'static,
    {
        let (tx, rx) = bounded::<PublishRecord>(capacity);
        let handle = thread::Builder::new()
            .name("hotstatsd-publisher".to_owned())
            .spawn(move || {
                for record in rx.iter() {
                    if let Err(e) = inner.publish(&record) {
                        error!("failed to publish {}/{}: {}", record.namespace, record.name, e);
                    }
                }
            })?;

        Ok(BackgroundSink {
            tx: Some(tx),
            handle: Some(handle),
        })
    }
}

impl Sink for BackgroundSink {
    fn publish(&mut self, record: &PublishRecord) -> Result<(), SinkError> {
        let tx = self.tx.as_ref().ok_or(SinkError::Disconnected)?;
        tx.send(record.clone()).map_err(|_| SinkError::Disconnected)
    }
}

impl Drop for BackgroundSink {
    fn drop(&mut self) {
        // Closing the channel ends the worker's receive loop.
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
