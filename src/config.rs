use crate::error::SealError;
pub use crate::pair_reducer::PairingConfig;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Configuration of the mate-pairing job.
#[derive(Debug, Clone)]
pub struct PairReadsConfig {
    pub shard_count: usize,
    pub threads: NonZeroUsize,
    pub pairing: PairingConfig,
}

impl PairReadsConfig {
    pub fn validate(&self) -> Result<(), SealError> {
        validate_shard_count(self.shard_count)
    }
}

/// Configuration of the coordinate sort job.
#[derive(Debug, Clone)]
pub struct ReadSortConfig {
    pub annotation_path: Option<PathBuf>,
    pub shard_count: usize,
    pub threads: NonZeroUsize,
}

impl ReadSortConfig {
    pub fn validate(&self) -> Result<&PathBuf, SealError> {
        validate_shard_count(self.shard_count)?;
        self.annotation_path
            .as_ref()
            .ok_or_else(|| SealError::MissingOption("reference annotation path".to_string()))
    }
}

/// Configuration of the shard merge.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub annotation_path: Option<PathBuf>,
}

impl MergeConfig {
    pub fn validate(&self) -> Result<&PathBuf, SealError> {
        self.annotation_path
            .as_ref()
            .ok_or_else(|| SealError::MissingOption("reference annotation path".to_string()))
    }
}

fn validate_shard_count(shard_count: usize) -> Result<(), SealError> {
    if shard_count == 0 {
        return Err(SealError::InvalidOption {
            option: "shard count".to_string(),
            value: shard_count.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(())
}
