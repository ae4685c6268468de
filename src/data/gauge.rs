use super::{parse_float, UpdateError};

/// Last-known value, with relative adjustments.
///
/// A leading `+` or `-` adjusts the current value instead of replacing it, which means a gauge
/// can never be set to a negative absolute value over the wire.
#[derive(Debug, Default)]
pub struct Gauge {
    value: Option<f64>,
}

impl Gauge {
    pub fn new() -> Gauge { Gauge { value: None } }

    pub fn update(&mut self, raw: &str) -> Result<(), UpdateError> {
        let raw = raw.trim();
        let current = self.value.unwrap_or(0.0);

        let next = if let Some(magnitude) = raw.strip_prefix('+') {
            current + parse_float(magnitude)?
        } else if let Some(magnitude) = raw.strip_prefix('-') {
            current - parse_float(magnitude)?
        } else {
            parse_float(raw)?
        };
        if !next.is_finite() {
            return Err(UpdateError::InvalidValue(raw.to_owned()));
        }

        self.value = Some(next);
        Ok(())
    }

    pub fn is_empty(&self) -> bool { self.value.is_none() }

    pub fn value(&self) -> Option<f64> { self.value }
}
