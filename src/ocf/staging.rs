//! Pending member writes and deletions of one open archive.

/// Ordered set of staged writes plus the paths marked deleted.
///
/// Each open [`crate::Epub`] owns exactly one `Staging`.
#[derive(Debug, Default, Clone)]
pub struct Staging {
    writes: Vec<(String, Vec<u8>)>,
    deleted: Vec<String>,
}

impl Staging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `data` at `path`. A later write to the same path replaces the
    /// earlier one in place; writing a deleted path revives it.
    pub fn write(&mut self, path: &str, data: Vec<u8>) {
        self.deleted.retain(|p| p != path);
        match self.writes.iter_mut().find(|(p, _)| p == path) {
            Some(entry) => entry.1 = data,
            None => self.writes.push((path.to_string(), data)),
        }
    }

    /// Drop any staged write for `path` and mark it deleted.
    ///
    /// Returns whether a staged write was discarded.
    pub fn delete(&mut self, path: &str) -> bool {
        let before = self.writes.len();
        self.writes.retain(|(p, _)| p != path);
        if !self.is_deleted(path) {
            self.deleted.push(path.to_string());
        }
        self.writes.len() != before
    }

    /// Staged bytes for `path`.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.writes
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, data)| data.as_slice())
    }

    #[inline]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    #[inline]
    pub fn is_deleted(&self, path: &str) -> bool {
        self.deleted.iter().any(|p| p == path)
    }

    /// Staged writes in staging order.
    pub fn writes(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.writes.iter().map(|(p, d)| (p.as_str(), d.as_slice()))
    }

    /// Number of staged writes.
    #[inline]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.deleted.is_empty()
    }

    /// Forget everything staged.
    pub fn clear(&mut self) {
        self.writes.clear();
        self.deleted.clear();
    }
}
