use super::UpdateError;

/// Increment-only event count.
///
/// Values are whole numbers, and a missing value counts as a single event.
#[derive(Debug, Default)]
pub struct Meter {
    count: Option<i64>,
}

impl Meter {
    pub fn new() -> Meter { Meter { count: None } }

    pub fn update(&mut self, raw: &str) -> Result<(), UpdateError> {
        let raw = raw.trim();
        let delta = if raw.is_empty() {
            1
        } else {
            raw.parse::<i64>().map_err(|_| UpdateError::InvalidValue(raw.to_owned()))?
        };

        let count = self.count.get_or_insert(0);
        *count = count.saturating_add(delta);
        Ok(())
    }

    pub fn is_empty(&self) -> bool { self.count.is_none() }

    pub fn value(&self) -> Option<i64> { self.count }
}
