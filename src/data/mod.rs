use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub mod counter;
pub mod gauge;
pub mod meter;
pub mod set;
pub mod timer;

pub use self::{counter::Counter, gauge::Gauge, meter::Meter, set::Set, timer::Timer};

/// Errors while applying a single update to a metric.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UpdateError {
    /// The value was not valid numeric text for this kind of metric.
    #[error("invalid value {0:?}")]
    InvalidValue(String),

    /// The `@rate` sampling modifier could not be used.
    #[error("invalid sample rate {0:?}")]
    InvalidSampleRate(String),

    /// The type code has no kind in the dispatch table.
    #[error("unknown metric type {0:?}")]
    UnknownType(String),

    /// The key is already bound to a different kind in this generation.
    #[error("metric previously type {existing}, now type {requested}")]
    TypeMismatch { existing: MetricKind, requested: MetricKind },
}

/// The closed set of aggregation behaviors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Meter,
    Timer,
    Histogram,
    Set,
}

impl MetricKind {
    /// Maps a wire type code to the kind that aggregates it.
    ///
    /// `h` is served by a timer while `m` is served by a histogram; the two only differ in which
    /// kind a key gets bound to.  `Meter` has no type code of its own.
    pub fn from_type_code(code: &str) -> Option<MetricKind> {
        match code {
            "c" => Some(MetricKind::Counter),
            "g" => Some(MetricKind::Gauge),
            "h" => Some(MetricKind::Timer),
            "m" => Some(MetricKind::Histogram),
            "ms" => Some(MetricKind::Timer),
            "s" => Some(MetricKind::Set),
            _ => None,
        }
    }

    pub fn unit(self) -> Unit {
        match self {
            MetricKind::Counter => Unit::Count,
            MetricKind::Timer | MetricKind::Histogram => Unit::Milliseconds,
            MetricKind::Gauge | MetricKind::Meter | MetricKind::Set => Unit::None,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Meter => "meter",
            MetricKind::Timer => "timer",
            MetricKind::Histogram => "histogram",
            MetricKind::Set => "set",
        };
        f.write_str(name)
    }
}

/// Unit attached to a published record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Unit {
    Count,
    Milliseconds,
    None,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Unit::Count => "Count",
            Unit::Milliseconds => "Milliseconds",
            Unit::None => "None",
        };
        f.write_str(name)
    }
}

/// Summary of a timer's samples for one generation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Statistics {
    pub minimum: f64,
    pub maximum: f64,
    pub sum: f64,
    #[serde(rename = "samplecount")]
    pub sample_count: u64,
}

/// Either a single value or a statistics block, never both.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Datum {
    Value(f64),
    Statistics(Statistics),
}

/// What gets handed to the sink for one metric at flush time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PublishRecord {
    pub namespace: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub unit: Unit,
    #[serde(flatten)]
    pub datum: Datum,
}

#[derive(Debug)]
enum MetricValue {
    Counter(Counter),
    Gauge(Gauge),
    Meter(Meter),
    Timer(Timer),
    Histogram(Timer),
    Set(Set),
}

/// A live metric within a registry generation.
///
/// The namespace and name are fixed at creation.  The timestamp tracks the last accepted update.
#[derive(Debug)]
pub struct Metric {
    namespace: String,
    name: String,
    last_update: Option<DateTime<Utc>>,
    value: MetricValue,
}

impl Metric {
    pub fn new(kind: MetricKind, namespace: String, name: String) -> Metric {
        let value = match kind {
            MetricKind::Counter => MetricValue::Counter(Counter::new()),
            MetricKind::Gauge => MetricValue::Gauge(Gauge::new()),
            MetricKind::Meter => MetricValue::Meter(Meter::new()),
            MetricKind::Timer => MetricValue::Timer(Timer::new()),
            MetricKind::Histogram => MetricValue::Histogram(Timer::new()),
            MetricKind::Set => MetricValue::Set(Set::new()),
        };

        Metric {
            namespace,
            name,
            last_update: None,
            value,
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self.value {
            MetricValue::Counter(_) => MetricKind::Counter,
            MetricValue::Gauge(_) => MetricKind::Gauge,
            MetricValue::Meter(_) => MetricKind::Meter,
            MetricValue::Timer(_) => MetricKind::Timer,
            MetricValue::Histogram(_) => MetricKind::Histogram,
            MetricValue::Set(_) => MetricKind::Set,
        }
    }

    pub fn namespace(&self) -> &str { &self.namespace }

    pub fn name(&self) -> &str { &self.name }

    pub fn last_update(&self) -> Option<DateTime<Utc>> { self.last_update }

    /// Applies a raw update.  On error the metric is left exactly as it was.
    pub fn update(&mut self, raw: &str, args: &[&str], timestamp: DateTime<Utc>) -> Result<(), UpdateError> {
        match &mut self.value {
            MetricValue::Counter(c) => c.update(raw, args)?,
            MetricValue::Gauge(g) => g.update(raw)?,
            MetricValue::Meter(m) => m.update(raw)?,
            MetricValue::Timer(t) | MetricValue::Histogram(t) => t.update(raw)?,
            MetricValue::Set(s) => s.update(raw),
        }

        self.last_update = Some(timestamp);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        match &self.value {
            MetricValue::Counter(c) => c.is_empty(),
            MetricValue::Gauge(g) => g.is_empty(),
            MetricValue::Meter(m) => m.is_empty(),
            MetricValue::Timer(t) | MetricValue::Histogram(t) => t.is_empty(),
            MetricValue::Set(s) => s.is_empty(),
        }
    }

    /// Builds the record to publish, or `None` if nothing was accumulated.
    pub fn to_publish_record(&self) -> Option<PublishRecord> {
        let datum = match &self.value {
            MetricValue::Counter(c) => Datum::Value(c.value()?),
            MetricValue::Gauge(g) => Datum::Value(g.value()?),
            MetricValue::Meter(m) => Datum::Value(m.value()? as f64),
            MetricValue::Timer(t) | MetricValue::Histogram(t) => Datum::Statistics(t.statistics()?),
            MetricValue::Set(s) => {
                if s.is_empty() {
                    return None;
                }
                Datum::Value(s.cardinality() as f64)
            },
        };

        Some(PublishRecord {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            timestamp: self.last_update?,
            unit: self.kind().unit(),
            datum,
        })
    }
}

/// Parses numeric text, tolerating surrounding whitespace.  NaN and the infinities are refused.
///
/// Published records carry plain JSON numbers, which cannot represent non-finite values, and a
/// single one would poison every later sum in the generation.
pub(crate) fn parse_float(raw: &str) -> Result<f64, UpdateError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(UpdateError::InvalidValue(raw.to_owned())),
    }
}

/// Like [`parse_float`], but an empty value stands for `default`.
pub(crate) fn parse_float_or(raw: &str, default: f64) -> Result<f64, UpdateError> {
    if raw.trim().is_empty() {
        Ok(default)
    } else {
        parse_float(raw)
    }
}
