use super::{parse_float_or, UpdateError};

/// Running sum of sampled increments.
///
/// Each update adds its value (defaulting to `1`) scaled up by the inverse of its sampling rate,
/// so `foo:1|c|@0.1` counts as ten events.
#[derive(Debug, Default)]
pub struct Counter {
    value: Option<f64>,
}

impl Counter {
    pub fn new() -> Counter { Counter { value: None } }

    pub fn update(&mut self, raw: &str, args: &[&str]) -> Result<(), UpdateError> {
        let (scale, rate_text) = match sample_rate(args)? {
            Some((rate, _)) if rate == 0.0 => return Ok(()),
            Some((rate, text)) => (1.0 / rate, text),
            None => (1.0, ""),
        };
        if !scale.is_finite() {
            return Err(UpdateError::InvalidSampleRate(rate_text.to_owned()));
        }

        let delta = parse_float_or(raw, 1.0)?;
        let sum = self.value.unwrap_or(0.0) + delta * scale;
        if !sum.is_finite() {
            return Err(UpdateError::InvalidValue(raw.to_owned()));
        }

        self.value = Some(sum);
        Ok(())
    }

    pub fn is_empty(&self) -> bool { self.value.is_none() }

    pub fn value(&self) -> Option<f64> { self.value }
}

/// Extracts the `@rate` modifier and its text, if any.  Rates must fall within `[0, 1]`.
fn sample_rate<'a>(args: &[&'a str]) -> Result<Option<(f64, &'a str)>, UpdateError> {
    let raw = match args.iter().find(|arg| arg.starts_with('@')) {
        Some(arg) => &arg[1..],
        None => return Ok(None),
    };

    match raw.trim().parse::<f64>() {
        Ok(rate) if (0.0..=1.0).contains(&rate) => Ok(Some((rate, raw))),
        _ => Err(UpdateError::InvalidSampleRate(raw.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::Counter;
    use crate::data::UpdateError;

    #[test]
    fn test_counter_simple_update() {
        let mut counter = Counter::new();
        assert!(counter.is_empty());

        counter.update("5", &[]).unwrap();
        counter.update("2.5", &[]).unwrap();
        assert_eq!(counter.value(), Some(7.5));
        assert!(!counter.is_empty());
    }

    #[test]
    fn test_counter_default_increment() {
        let mut counter = Counter::new();
        counter.update("", &[]).unwrap();
        counter.update("", &[]).unwrap();
        assert_eq!(counter.value(), Some(2.0));
    }

    #[test]
    fn test_counter_sample_rate() {
        let mut counter = Counter::new();
        counter.update("1", &["@0.1"]).unwrap();
        let value = counter.value().unwrap();
        assert!((value - 10.0).abs() < 1e-9);

        counter.update("2", &["@0.5"]).unwrap();
        let value = counter.value().unwrap();
        assert!((value - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_counter_zero_rate_is_noop() {
        let mut counter = Counter::new();
        counter.update("1", &["@0"]).unwrap();
        assert!(counter.is_empty());

        counter.update("3", &[]).unwrap();
        counter.update("1", &["@0"]).unwrap();
        assert_eq!(counter.value(), Some(3.0));
    }

    #[test]
    fn test_counter_ignores_other_modifiers() {
        let mut counter = Counter::new();
        counter.update("1", &["#tag:value", "@0.5"]).unwrap();
        assert_eq!(counter.value(), Some(2.0));
    }

    #[test]
    fn test_counter_rejects_bad_input() {
        let mut counter = Counter::new();
        counter.update("4", &[]).unwrap();

        assert_eq!(counter.update("four", &[]), Err(UpdateError::InvalidValue("four".to_owned())));
        assert_eq!(counter.update("1", &["@fast"]), Err(UpdateError::InvalidSampleRate("fast".to_owned())));
        assert_eq!(counter.update("1", &["@1.5"]), Err(UpdateError::InvalidSampleRate("1.5".to_owned())));
        assert_eq!(counter.update("1", &["@-0.5"]), Err(UpdateError::InvalidSampleRate("-0.5".to_owned())));
        assert_eq!(counter.value(), Some(4.0));
    }

    #[test]
    fn test_counter_rejects_non_finite_results() {
        let mut counter = Counter::new();
        counter.update("2", &[]).unwrap();

        assert_eq!(counter.update("1", &["@1e-320"]), Err(UpdateError::InvalidSampleRate("1e-320".to_owned())));
        assert_eq!(counter.value(), Some(2.0));

        counter.update("1e308", &[]).unwrap();
        assert_eq!(counter.update("1e308", &[]), Err(UpdateError::InvalidValue("1e308".to_owned())));
        assert!(counter.value().unwrap().is_finite());
    }
}
