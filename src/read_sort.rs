use crate::error::SealError;
use crate::partition::PartitionScheme;
use crate::reference::ReferenceAnnotation;

/// The fields of an aligned record the sort needs; the rest is opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedRecord<'a> {
    pub reference_name: &'a str,
    /// 1-based position on `reference_name`
    pub position: u64,
}

/// Pick the reference name and position out of a SAM line.
pub fn parse_alignment_line(line: &str) -> Result<AlignedRecord<'_>, SealError> {
    let mut fields = line.splitn(5, '\t');
    let (Some(_query_name), Some(_flag), Some(reference_name), Some(position), Some(_)) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(SealError::MalformedAlignmentRecord(line.to_string()));
    };

    let position = position
        .parse::<u64>()
        .map_err(|_| SealError::InvalidNumber {
            field: "position",
            value: position.to_string(),
        })?;

    Ok(AlignedRecord {
        reference_name,
        position,
    })
}

/// A SAM line together with its absolute coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedRecord {
    pub coordinate: u64,
    pub line: String,
}

/// Keys aligned records by absolute coordinate and assigns their shard.
///
/// Holds only shared references, so one keyer per worker costs nothing.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateKeyer<'a> {
    annotation: &'a ReferenceAnnotation,
    scheme: &'a PartitionScheme,
}

impl<'a> CoordinateKeyer<'a> {
    pub fn new(annotation: &'a ReferenceAnnotation, scheme: &'a PartitionScheme) -> Self {
        CoordinateKeyer { annotation, scheme }
    }

    pub fn coordinate(&self, line: &str) -> Result<u64, SealError> {
        let record = parse_alignment_line(line)?;
        self.annotation
            .absolute_coordinate(record.reference_name, record.position)
    }

    /// Returns `(shard, keyed record)` for one SAM line.
    pub fn key(&self, line: &str) -> Result<(usize, KeyedRecord), SealError> {
        let coordinate = self.coordinate(line)?;
        let shard = self.scheme.partition_for(coordinate)?;
        Ok((
            shard,
            KeyedRecord {
                coordinate,
                line: line.to_string(),
            },
        ))
    }
}

/// Order a shard by coordinate. The sort is stable, so ties keep encounter order.
pub fn sort_by_coordinate(records: &mut [KeyedRecord]) {
    records.sort_by_key(|record| record.coordinate);
}
