use crate::{registry::Registry, sink::Sink};
use chrono::{DateTime, Duration, Utc};
use log::{debug, error};

/// Outcome of flushing one generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Records the sink accepted.
    pub published: usize,
    /// Records the sink refused.
    pub failed: usize,
    /// Metrics with nothing to publish.
    pub skipped: usize,
}

/// Tracks when the live generation is due to be flushed.
#[derive(Debug)]
pub struct FlushScheduler {
    interval: Duration,
    deadline: DateTime<Utc>,
}

impl FlushScheduler {
    /// Creates a scheduler whose first flush is due at `now`.
    pub fn new(interval: Duration, now: DateTime<Utc>) -> FlushScheduler {
        FlushScheduler {
            interval,
            deadline: now,
        }
    }

    pub fn deadline(&self) -> DateTime<Utc> { self.deadline }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool { now >= self.deadline }

    /// Publishes a detached generation and pushes the deadline out by one interval from `now`.
    ///
    /// A deadline past the last representable instant saturates there.
    ///
    /// Every non-empty metric is offered to the sink exactly once.  A sink failure is logged and
    /// does not stop the remaining metrics from being offered.  The generation is consumed either
    /// way.
    pub fn flush<S: Sink>(&mut self, generation: Registry, sink: &mut S, now: DateTime<Utc>) -> FlushSummary {
        let mut summary = FlushSummary::default();

        for (key, metric) in generation {
            let record = match metric.to_publish_record() {
                Some(record) => record,
                None => {
                    summary.skipped += 1;
                    continue;
                },
            };

            match sink.publish(&record) {
                Ok(()) => summary.published += 1,
                Err(e) => {
                    error!("error whilst publishing {:?}: {}", key, e);
                    summary.failed += 1;
                },
            }
        }

        self.deadline = now.checked_add_signed(self.interval).unwrap_or(DateTime::<Utc>::MAX_UTC);
        debug!(
            "flushed {} metrics ({} failed, {} skipped), next flush at {}",
            summary.published, summary.failed, summary.skipped, self.deadline
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::{FlushScheduler, FlushSummary};
    use crate::{
        data::{Datum, PublishRecord},
        registry::Registry,
        sink::{Sink, SinkError},
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};

    #[derive(Default)]
    struct VecSink {
        records: Vec<PublishRecord>,
        fail_on: Option<&'static str>,
    }

    impl Sink for VecSink {
        fn publish(&mut self, record: &PublishRecord) -> Result<(), SinkError> {
            if self.fail_on == Some(record.name.as_str()) {
                return Err(SinkError::Backend("throttled".to_owned()));
            }
            self.records.push(record.clone());
            Ok(())
        }
    }

    #[test]
    fn test_scheduler_deadline() {
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let mut scheduler = FlushScheduler::new(Duration::seconds(60), t0);
        assert!(scheduler.is_due(t0));

        let summary = scheduler.flush(Registry::new("Statsd"), &mut VecSink::default(), t0);
        assert_eq!(summary, FlushSummary::default());
        assert_eq!(scheduler.deadline(), t0 + Duration::seconds(60));
        assert!(!scheduler.is_due(t0 + Duration::seconds(59)));
        assert!(scheduler.is_due(t0 + Duration::seconds(60)));
    }

    #[test]
    fn test_scheduler_publishes_non_empty_metrics() {
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let mut registry = Registry::new("Statsd");
        registry.ingest("app.hits:2|c\napp.lat:5|ms\napp.bad:oops|ms\napp.users:u1|s", t0);

        let mut sink = VecSink::default();
        let mut scheduler = FlushScheduler::new(Duration::seconds(60), t0);
        let summary = scheduler.flush(registry, &mut sink, t0 + Duration::seconds(1));

        assert_eq!(
            summary,
            FlushSummary {
                published: 3,
                failed: 0,
                skipped: 1,
            }
        );

        let mut names: Vec<&str> = sink.records.iter().map(|r| r.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["hits", "lat", "users"]);
        assert!(sink.records.iter().all(|r| r.namespace == "Statsd/app" && r.timestamp == t0));
    }

    #[test]
    fn test_scheduler_continues_after_sink_failure() {
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let mut registry = Registry::new("Statsd");
        registry.ingest("a:1|c\nb:2|c\nc:3|c", t0);

        let mut sink = VecSink {
            records: Vec::new(),
            fail_on: Some("b"),
        };
        let mut scheduler = FlushScheduler::new(Duration::seconds(10), t0);
        let summary = scheduler.flush(registry, &mut sink, t0);

        assert_eq!(summary.published, 2);
        assert_eq!(summary.failed, 1);
        assert!(sink.records.iter().all(|r| r.name != "b"));
        assert_eq!(scheduler.deadline(), t0 + Duration::seconds(10));
    }

    #[test]
    fn test_scheduler_generations_do_not_carry_over() {
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let mut live = Registry::new("Statsd");
        live.ingest("gauge:5|g\ncount:1|c", t0);

        let mut sink = VecSink::default();
        let mut scheduler = FlushScheduler::new(Duration::seconds(60), t0);

        let detached = std::mem::replace(&mut live, Registry::new("Statsd"));
        scheduler.flush(detached, &mut sink, t0);
        assert_eq!(sink.records.len(), 2);

        live.ingest("count:4|c", t0 + Duration::seconds(30));
        let detached = std::mem::replace(&mut live, Registry::new("Statsd"));
        sink.records.clear();
        scheduler.flush(detached, &mut sink, t0 + Duration::seconds(60));

        // The gauge saw no update this interval, so it is gone.
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].name, "count");
        assert_eq!(sink.records[0].datum, Datum::Value(4.0));
    }

    #[test]
    fn test_scheduler_deadline_saturates() {
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let mut scheduler = FlushScheduler::new(Duration::days(365 * 400_000), t0);
        scheduler.flush(Registry::new("Statsd"), &mut VecSink::default(), t0);

        assert_eq!(scheduler.deadline(), DateTime::<Utc>::MAX_UTC);
        assert!(!scheduler.is_due(t0));
    }
}
