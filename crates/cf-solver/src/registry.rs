//! Stream value registry.

use cf_core::StreamId;
use cf_props::Stream;

/// Current stream values, indexed by stream id.
///
/// Entries start empty and are filled as feeds are applied, tears are seeded,
/// and units write their outlets. Replacement is wholesale: streams are value
/// snapshots, never mutated in place.
#[derive(Debug, Clone)]
pub struct StreamRegistry {
    entries: Vec<Option<Stream>>,
}

impl StreamRegistry {
    pub fn new(stream_count: usize) -> Self {
        Self {
            entries: vec![None; stream_count],
        }
    }

    pub fn get(&self, id: StreamId) -> Option<&Stream> {
        self.entries.get(id.index() as usize).and_then(Option::as_ref)
    }

    pub fn set(&mut self, id: StreamId, stream: Stream) {
        let idx = id.index() as usize;
        if idx < self.entries.len() {
            self.entries[idx] = Some(stream);
        }
    }

    /// Iterate over populated entries.
    pub fn iter(&self) -> impl Iterator<Item = (StreamId, &Stream)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (StreamId::from_index(i as u32), s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{k, pa};
    use cf_props::Composition;

    #[test]
    fn set_and_get_round_trip() {
        let mut reg = StreamRegistry::new(3);
        let id = StreamId::from_index(1);
        assert!(reg.get(id).is_none());

        let s = Stream::new(1.0, k(300.0), pa(1e5), Composition::pure("A"));
        reg.set(id, s.clone());
        assert_eq!(reg.get(id), Some(&s));
        assert!(reg.get(StreamId::from_index(0)).is_none());
        assert_eq!(reg.iter().count(), 1);
    }
}
