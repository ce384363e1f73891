use crate::qseq::FragmentRecord;
use rustc_hash::FxHasher;
use std::hash::Hasher;
use std::iter::Peekable;

/// Shard for a fragment location. The read number plays no part, so both
/// mates of a fragment always land in the same shard.
pub fn shard_for_location(location: &str, shard_count: usize) -> usize {
    debug_assert!(shard_count > 0);
    let mut hasher = FxHasher::default();
    hasher.write(location.as_bytes());
    (hasher.finish() % shard_count as u64) as usize
}

/// Sort a shard by the full `(location, read_index)` key.
pub fn sort_shard(records: &mut [FragmentRecord]) {
    records.sort_by(|a, b| a.key.sort_cmp(&b.key));
}

/// Split records into per-shard buckets, preserving encounter order in each.
pub fn route_to_shards<I>(records: I, shard_count: usize) -> Vec<Vec<FragmentRecord>>
where
    I: IntoIterator<Item = FragmentRecord>,
{
    let mut shards: Vec<Vec<FragmentRecord>> = (0..shard_count).map(|_| Vec::new()).collect();
    for record in records {
        let shard = shard_for_location(&record.key.location, shard_count);
        shards[shard].push(record);
    }
    shards
}

/// Streaming fold of a sorted record sequence into same-location groups.
///
/// Groups of any size are yielded; deciding whether a size is acceptable is
/// left to the consumer, and a bad group never swallows the ones after it.
pub struct LocationGroups<I: Iterator<Item = FragmentRecord>> {
    records: Peekable<I>,
}

impl<I: Iterator<Item = FragmentRecord>> LocationGroups<I> {
    pub fn new<T: IntoIterator<IntoIter = I>>(records: T) -> Self {
        LocationGroups {
            records: records.into_iter().peekable(),
        }
    }
}

impl<I: Iterator<Item = FragmentRecord>> Iterator for LocationGroups<I> {
    type Item = Vec<FragmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.records.next()?;
        let key = first.key.clone();
        let mut group = vec![first];
        while let Some(next) = self
            .records
            .next_if(|candidate| candidate.key.same_fragment(&key))
        {
            group.push(next);
        }
        Some(group)
    }
}
