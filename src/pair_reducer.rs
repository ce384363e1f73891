use crate::error::SealError;
use crate::qseq::{FragmentRecord, ReadPayload};
use std::ops::AddAssign;

pub const DEFAULT_MIN_BASES_THRESHOLD: usize = 30;
pub const UNKNOWN_BASE: u8 = b'N';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingConfig {
    /// Minimum number of known (non-`N`) bases a read must carry
    pub min_bases_threshold: usize,
    /// Reject reads whose filter flag is not `1`
    pub drop_failed_filter: bool,
}

impl Default for PairingConfig {
    fn default() -> Self {
        PairingConfig {
            min_bases_threshold: DEFAULT_MIN_BASES_THRESHOLD,
            drop_failed_filter: true,
        }
    }
}

/// Non-fatal per-read quality decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadCounters {
    pub not_enough_bases: u64,
    pub failed_filter: u64,
    pub dropped: u64,
}

impl AddAssign for ReadCounters {
    fn add_assign(&mut self, other: Self) {
        self.not_enough_bases += other.not_enough_bases;
        self.failed_filter += other.failed_filter;
        self.dropped += other.dropped;
    }
}

impl std::fmt::Display for ReadCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "NotEnoughBases\t{}", self.not_enough_bases)?;
        writeln!(f, "FailedFilter\t{}", self.failed_filter)?;
        write!(f, "Dropped\t{}", self.dropped)
    }
}

/// A location and both mates' `sequence quality filter` triples, in group order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedRecord {
    pub location: String,
    pub value: String,
}

impl PairedRecord {
    pub fn to_line(&self) -> String {
        format!("{}\t{}", self.location, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadVerdict {
    Passed,
    FailedFilter,
    NotEnoughBases,
}

/// Pairs mates and applies the per-read quality filters.
///
/// One reducer is owned by each worker; its counters are summed after the run.
#[derive(Debug, Default)]
pub struct PairReducer {
    config: PairingConfig,
    counters: ReadCounters,
}

impl PairReducer {
    pub fn new(config: PairingConfig) -> Self {
        PairReducer {
            config,
            counters: ReadCounters::default(),
        }
    }

    pub fn counters(&self) -> ReadCounters {
        self.counters
    }

    /// Reduce one location group.
    ///
    /// Returns `Ok(None)` when both mates are rejected. A group that is not
    /// exactly a pair aborts with [`SealError::UnpairedFragment`].
    pub fn reduce(
        &mut self,
        location: &str,
        group: &[FragmentRecord],
    ) -> Result<Option<PairedRecord>, SealError> {
        if group.len() != 2 {
            return Err(SealError::UnpairedFragment {
                location: location.to_string(),
                count: group.len(),
            });
        }

        let mut value = String::with_capacity(
            group
                .iter()
                .map(|r| r.payload.sequence.len() * 2 + 4)
                .sum(),
        );
        let mut bad_reads = 0;
        for (i, read) in group.iter().enumerate() {
            match self.check_read(&read.payload) {
                ReadVerdict::Passed => {}
                ReadVerdict::FailedFilter => {
                    self.counters.failed_filter += 1;
                    bad_reads += 1;
                }
                ReadVerdict::NotEnoughBases => {
                    self.counters.not_enough_bases += 1;
                    bad_reads += 1;
                }
            }

            if i > 0 {
                value.push('\t');
            }
            read.payload.write_to(&mut value);
        }

        if bad_reads == group.len() {
            self.counters.dropped += group.len() as u64;
            return Ok(None);
        }

        Ok(Some(PairedRecord {
            location: location.to_string(),
            value,
        }))
    }

    /// Reduce a group using the location of its first record.
    pub fn reduce_group(
        &mut self,
        group: &[FragmentRecord],
    ) -> Result<Option<PairedRecord>, SealError> {
        let location = group
            .first()
            .map(|r| r.key.location.clone())
            .unwrap_or_default();
        self.reduce(&location, group)
    }

    fn check_read(&self, read: &ReadPayload) -> ReadVerdict {
        if self.config.drop_failed_filter && !read.filter_passed {
            ReadVerdict::FailedFilter
        } else if !has_enough_bases(read.sequence.as_bytes(), self.config.min_bases_threshold) {
            ReadVerdict::NotEnoughBases
        } else {
            ReadVerdict::Passed
        }
    }
}

/// True if `sequence` holds at least `min_bases` known bases.
///
/// Checked as "at most `len - min_bases` unknowns" so the scan can stop early.
pub fn has_enough_bases(sequence: &[u8], min_bases: usize) -> bool {
    let Some(acceptable_unknowns) = sequence.len().checked_sub(min_bases) else {
        return false;
    };

    let mut unknowns = 0;
    for &base in sequence {
        if base == UNKNOWN_BASE {
            unknowns += 1;
            if unknowns > acceptable_unknowns {
                return false;
            }
        }
    }
    true
}
