use crate::{
    data::{Metric, MetricKind, UpdateError},
    key::split_key,
    parser::{parse_all, LineError},
};
use chrono::{DateTime, Utc};
use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use log::{error, warn};

/// One generation of live metrics, keyed by sanitized metric key.
///
/// A key is bound to the kind of its first update for as long as the generation lives.  Flushing
/// consumes the whole generation; nothing carries over into the next one.
#[derive(Debug)]
pub struct Registry {
    root: String,
    metrics: HashMap<String, Metric, FnvBuildHasher>,
}

impl Registry {
    /// Creates an empty generation whose namespaces hang off `root`.
    pub fn new(root: &str) -> Registry {
        Registry {
            root: root.to_owned(),
            metrics: HashMap::default(),
        }
    }

    /// Starts a fresh, empty generation under the same root namespace.
    pub fn next_generation(&self) -> Registry { Registry::new(&self.root) }

    pub fn root(&self) -> &str { &self.root }

    pub fn len(&self) -> usize { self.metrics.len() }

    pub fn is_empty(&self) -> bool { self.metrics.is_empty() }

    pub fn get(&self, key: &str) -> Option<&Metric> { self.metrics.get(key) }

    /// Parses a payload and applies every valid line to this generation.
    ///
    /// Bad lines and rejected updates are logged and skipped.  Returns the number of updates that
    /// were applied.
    pub fn ingest(&mut self, payload: &str, timestamp: DateTime<Utc>) -> usize {
        let mut applied = 0;

        for result in parse_all(payload) {
            let line = match result {
                Ok(line) => line,
                Err(e @ LineError::Malformed(_)) => {
                    warn!("skipping {}", e);
                    continue;
                },
                Err(e @ LineError::UnknownType(_)) => {
                    error!("skipping {}", e);
                    continue;
                },
            };

            match self.update_kind(&line.key, line.kind, line.value, &line.args, timestamp) {
                Ok(()) => applied += 1,
                Err(e) => error!("rejected update for {:?}: {}", line.key, e),
            }
        }

        applied
    }

    /// Applies an update using a wire type code.
    pub fn update(
        &mut self, key: &str, type_code: &str, raw: &str, args: &[&str], timestamp: DateTime<Utc>,
    ) -> Result<(), UpdateError> {
        match MetricKind::from_type_code(type_code) {
            Some(kind) => self.update_kind(key, kind, raw, args, timestamp),
            None => Err(UpdateError::UnknownType(type_code.to_owned())),
        }
    }

    /// Applies an update to `key`, creating a metric of `kind` if the key is new.
    ///
    /// A key already bound to another kind rejects the update and is left untouched.
    pub fn update_kind(
        &mut self, key: &str, kind: MetricKind, raw: &str, args: &[&str], timestamp: DateTime<Utc>,
    ) -> Result<(), UpdateError> {
        if let Some(metric) = self.metrics.get_mut(key) {
            if metric.kind() != kind {
                return Err(UpdateError::TypeMismatch {
                    existing: metric.kind(),
                    requested: kind,
                });
            }
            return metric.update(raw, args, timestamp);
        }

        let (namespace, name) = split_key(&self.root, key);
        let metric = self
            .metrics
            .entry(key.to_owned())
            .or_insert_with(|| Metric::new(kind, namespace, name));
        metric.update(raw, args, timestamp)
    }
}

impl IntoIterator for Registry {
    type IntoIter = hashbrown::hash_map::IntoIter<String, Metric>;
    type Item = (String, Metric);

    fn into_iter(self) -> Self::IntoIter { self.metrics.into_iter() }
}
