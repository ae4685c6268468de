//! A statsd-compatible aggregator.
//!
//! Datagrams in the `bucket:value|type[|@rate]` line protocol are parsed, aggregated per metric
//! key into a live generation, and every flush interval the whole generation is detached,
//! published to a [`Sink`], and discarded.
mod clock;
mod configuration;
mod control;
mod data;
mod key;
mod parser;
mod receiver;
mod registry;
mod scheduler;
mod sink;

pub use self::{
    clock::{Clock, MockClock, SystemClock},
    configuration::Configuration,
    control::{ControlMessage, Controller},
    data::{Datum, Metric, MetricKind, PublishRecord, Statistics, Unit, UpdateError},
    key::{sanitize, split_key},
    parser::{parse_all, parse_line, Line, LineError, ParseLines},
    receiver::Receiver,
    registry::Registry,
    scheduler::{FlushScheduler, FlushSummary},
    sink::{BackgroundSink, JsonSink, LogSink, Sink, SinkError},
};
