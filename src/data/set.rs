use fnv::FnvBuildHasher;
use hashbrown::HashSet;

/// Distinct raw values seen in a generation.
#[derive(Debug, Default)]
pub struct Set {
    members: HashSet<String, FnvBuildHasher>,
}

impl Set {
    pub fn new() -> Set {
        Set {
            members: HashSet::default(),
        }
    }

    /// Inserts the value verbatim.  Sets accept any text, so this cannot fail.
    pub fn update(&mut self, raw: &str) {
        if !self.members.contains(raw) {
            self.members.insert(raw.to_owned());
        }
    }

    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    pub fn cardinality(&self) -> usize { self.members.len() }
}
