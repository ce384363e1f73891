use crate::error::SealError;
use crate::reference::ReferenceAnnotation;
use log::info;

/// Equal-width ranges of the absolute coordinate space, `ceil(length / count)` wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionScheme {
    reference_length: u64,
    partition_count: usize,
    partition_width: u64,
}

impl PartitionScheme {
    /// A zero `partition_count` or `reference_length` yields an unconfigured
    /// scheme on which every [`partition_for`](Self::partition_for) call fails.
    pub fn new(reference_length: u64, partition_count: usize) -> Self {
        let partition_width = if partition_count == 0 {
            0
        } else {
            reference_length.div_ceil(partition_count as u64)
        };
        PartitionScheme {
            reference_length,
            partition_count,
            partition_width,
        }
    }

    pub fn from_annotation(annotation: &ReferenceAnnotation, partition_count: usize) -> Self {
        let scheme = Self::new(annotation.total_length(), partition_count);
        info!(
            "Reference size: {}; n partitions: {}. Set partition size to {}",
            scheme.reference_length, scheme.partition_count, scheme.partition_width
        );
        scheme
    }

    pub fn reference_length(&self) -> u64 {
        self.reference_length
    }

    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    pub fn partition_width(&self) -> u64 {
        self.partition_width
    }

    pub fn is_configured(&self) -> bool {
        self.partition_count > 0 && self.partition_width > 0
    }

    /// Shard index for an absolute coordinate.
    ///
    /// A coordinate landing exactly one partition past the end is folded into
    /// the last partition; anything further out means the coordinate model and
    /// the scheme disagree, and is reported as [`SealError::PartitionOverflow`].
    pub fn partition_for(&self, coord: u64) -> Result<usize, SealError> {
        if !self.is_configured() {
            return Err(SealError::PartitionerNotConfigured {
                partition_count: self.partition_count,
                partition_width: self.partition_width,
            });
        }

        let partition = coord / self.partition_width;
        let count = self.partition_count as u64;
        if partition == count {
            Ok(self.partition_count - 1)
        } else if partition > count {
            Err(SealError::PartitionOverflow {
                coordinate: coord,
                partition,
                partition_count: self.partition_count,
                reference_length: self.reference_length,
            })
        } else {
            Ok(partition as usize)
        }
    }
}
