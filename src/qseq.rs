use crate::error::SealError;
use std::cmp::Ordering;

pub const QSEQ_FIELDS: usize = 11;

/// Sort key of a fragment record: flowcell location, then read number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey {
    pub location: String,
    pub read_index: i32,
}

impl LocationKey {
    pub fn new(location: impl Into<String>, read_index: i32) -> Self {
        LocationKey {
            location: location.into(),
            read_index,
        }
    }

    /// Total order used to sort records within a shard.
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.location
            .cmp(&other.location)
            .then(self.read_index.cmp(&other.read_index))
    }

    /// Grouping relation: two records are mates iff their locations are
    /// byte-identical. The read number is ignored.
    pub fn same_fragment(&self, other: &Self) -> bool {
        self.location == other.location
    }
}

impl std::fmt::Display for LocationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.location, self.read_index)
    }
}

/// Bases, qualities and filter flag of one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPayload {
    /// Bases with the base-caller's `.` already replaced by `N`
    pub sequence: String,
    pub quality: String,
    pub filter_passed: bool,
}

impl ReadPayload {
    /// Append the tab-joined `sequence quality filter` triple to `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push_str(&self.sequence);
        out.push('\t');
        out.push_str(&self.quality);
        out.push('\t');
        out.push(if self.filter_passed { '1' } else { '0' });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRecord {
    pub key: LocationKey,
    pub payload: ReadPayload,
}

/// Parse one qseq line into its key and payload.
///
/// Fields are `machine run lane tile x y index read_number sequence quality filter`.
/// The first seven are folded into the location `machine_run:lane:tile:x:y#index`.
pub fn parse_qseq_line(line: &str) -> Result<FragmentRecord, SealError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != QSEQ_FIELDS {
        return Err(SealError::WrongFieldCount {
            expected: QSEQ_FIELDS,
            found: fields.len(),
            record: line.to_string(),
        });
    }

    let filter_passed = match fields[10] {
        "1" => true,
        "0" => false,
        other => {
            return Err(SealError::InvalidFilterFlag {
                value: other.to_string(),
                record: line.to_string(),
            })
        }
    };

    let mut location = String::with_capacity(64);
    location.push_str(fields[0]);
    location.push('_');
    location.push_str(fields[1]);
    for field in &fields[2..=5] {
        location.push(':');
        location.push_str(field);
    }
    location.push('#');
    location.push_str(fields[6]);

    let read_index = fields[7]
        .parse::<i32>()
        .map_err(|_| SealError::InvalidNumber {
            field: "read number",
            value: fields[7].to_string(),
        })?;

    Ok(FragmentRecord {
        key: LocationKey {
            location,
            read_index,
        },
        payload: ReadPayload {
            sequence: fields[8].replace('.', "N"),
            quality: fields[9].to_string(),
            filter_passed,
        },
    })
}
