use crate::annotation::load_annotation;
use crate::config::MergeConfig;
use crate::error::SealError;
use crate::files::collect_input_files;
use crate::merge::merge_files;
use std::path::Path;

/// Merge the sorted part files found at `input` into a single SAM file.
///
/// The destination is checked before the annotation is even loaded, so an
/// existing file is never touched.
pub fn run_merge(input: &Path, output: &Path, config: &MergeConfig) -> Result<u64, SealError> {
    let annotation_path = config.validate()?;
    if output.as_os_str() != "-" && output.exists() {
        return Err(SealError::OutputAlreadyExists(output.to_path_buf()));
    }

    let sources = collect_input_files(input)?;
    let annotation = load_annotation(annotation_path)?;
    merge_files(&sources, &annotation, output)
}
