use super::{parse_float, Statistics, UpdateError};

/// Raw samples for a timer or histogram.
///
/// Every sample is kept until the generation is flushed, at which point the samples are reduced
/// into a [`Statistics`] block.
#[derive(Debug, Default)]
pub struct Timer {
    samples: Vec<f64>,
}

impl Timer {
    pub fn new() -> Timer { Timer { samples: Vec::new() } }

    pub fn update(&mut self, raw: &str) -> Result<(), UpdateError> {
        let sample = parse_float(raw)?;
        self.samples.push(sample);
        Ok(())
    }

    pub fn is_empty(&self) -> bool { self.samples.is_empty() }

    /// Reduces the samples.  Returns `None` when there are none.
    pub fn statistics(&self) -> Option<Statistics> {
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let minimum = *sorted.first()?;
        let maximum = *sorted.last()?;

        Some(Statistics {
            minimum,
            maximum,
            sum: sorted.iter().sum(),
            sample_count: sorted.len() as u64,
        })
    }
}
