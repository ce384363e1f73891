use crate::annotation::load_annotation;
use crate::config::ReadSortConfig;
use crate::error::SealError;
use crate::files::{collect_all_input_files, create_output_dir, for_each_record, part_file_name};
use crate::partition::PartitionScheme;
use crate::read_sort::{sort_by_coordinate, CoordinateKeyer, KeyedRecord};
use log::{debug, info};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Outcome of a coordinate sort run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSummary {
    /// Number of records written to each shard, in shard order
    pub shard_sizes: Vec<usize>,
    /// `@` header lines found in the inputs and not carried over
    pub header_lines: usize,
}

impl SortSummary {
    pub fn records(&self) -> usize {
        self.shard_sizes.iter().sum()
    }
}

/// Sort the aligned records in `inputs` by absolute coordinate into one part
/// file per shard under `output_dir`.
pub fn run_read_sort(
    inputs: &[PathBuf],
    output_dir: &Path,
    config: &ReadSortConfig,
) -> Result<SortSummary, SealError> {
    let annotation_path = config.validate()?;
    let annotation = load_annotation(annotation_path)?;
    let scheme = PartitionScheme::from_annotation(&annotation, config.shard_count);
    let files = collect_all_input_files(inputs)?;
    create_output_dir(output_dir)?;

    let keyer = CoordinateKeyer::new(&annotation, &scheme);

    // Phase 1: key and route every file in parallel
    let per_file: Vec<(Vec<Vec<KeyedRecord>>, usize)> = files
        .par_iter()
        .map(|path| key_file(path, &keyer, config.shard_count, config.threads))
        .collect::<Result<_, _>>()?;

    // Concatenating in file order keeps encounter order within each shard
    let mut shards: Vec<Vec<KeyedRecord>> = vec![Vec::new(); config.shard_count];
    let mut header_lines = 0;
    for (file_shards, file_header_lines) in per_file {
        header_lines += file_header_lines;
        for (shard, records) in shards.iter_mut().zip(file_shards) {
            shard.extend(records);
        }
    }

    // Phase 2: sort and write each shard
    let shard_sizes: Vec<usize> = shards
        .into_par_iter()
        .enumerate()
        .map(|(index, records)| write_sorted_shard(index, records, output_dir))
        .collect::<Result<_, _>>()?;

    let summary = SortSummary {
        shard_sizes,
        header_lines,
    };
    info!(
        "Sorted {} records into {} shards",
        summary.records(),
        summary.shard_sizes.len()
    );
    Ok(summary)
}

fn key_file(
    path: &Path,
    keyer: &CoordinateKeyer,
    shard_count: usize,
    threads: NonZeroUsize,
) -> Result<(Vec<Vec<KeyedRecord>>, usize), SealError> {
    let mut shards: Vec<Vec<KeyedRecord>> = vec![Vec::new(); shard_count];
    let mut header_lines = 0;
    for_each_record(path, threads, |line| {
        if line.starts_with('@') {
            header_lines += 1;
            return Ok(());
        }
        let (shard, record) = keyer.key(line)?;
        shards[shard].push(record);
        Ok(())
    })?;
    if header_lines > 0 {
        debug!("Skipped {} header lines in {}", header_lines, path.display());
    }
    Ok((shards, header_lines))
}

/// Sort one shard by coordinate and write its records, unchanged, to `part-r-NNNNN`.
pub fn write_sorted_shard(
    index: usize,
    mut records: Vec<KeyedRecord>,
    output_dir: &Path,
) -> Result<usize, SealError> {
    sort_by_coordinate(&mut records);

    let path = output_dir.join(part_file_name(index));
    let mut writer = BufWriter::new(File::create(&path)?);
    for record in &records {
        writer.write_all(record.line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    debug!("Shard {}: wrote {} records to {}", index, records.len(), path.display());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn sam(name: &str, contig: &str, pos: u64) -> String {
        format!("{name}\t0\t{contig}\t{pos}\t60\t4M\t*\t0\t0\tACGT\tIIII")
    }

    fn setup(dir: &Path) -> PathBuf {
        let fai = dir.join("ref.fa.fai");
        std::fs::write(&fai, "chr1\t1000\t6\t60\t61\nchr2\t500\t1029\t60\t61\n").unwrap();
        fai
    }

    fn config(annotation: PathBuf, shard_count: usize) -> ReadSortConfig {
        ReadSortConfig {
            annotation_path: Some(annotation),
            shard_count,
            threads: NonZeroUsize::new(1).unwrap(),
        }
    }

    #[test]
    fn test_run_read_sort_shards_by_coordinate() {
        let dir = TempDir::new().unwrap();
        let fai = setup(dir.path());
        let input = dir.path().join("aligned.sam");
        let lines = [
            "@HD\tVN:1.0".to_string(),
            sam("r1", "chr2", 500),
            sam("r2", "chr1", 1),
            sam("r3", "chr1", 999),
            sam("r4", "chr1", 600),
            sam("r5", "chr2", 1),
        ];
        std::fs::write(&input, lines.join("\n") + "\n").unwrap();

        let out = dir.path().join("sorted");
        let summary = run_read_sort(&[input], &out, &config(fai, 3)).unwrap();
        assert_eq!(summary.shard_sizes, vec![1, 2, 2]);
        assert_eq!(summary.header_lines, 1);

        let shard = |i| std::fs::read_to_string(out.join(part_file_name(i))).unwrap();
        assert_eq!(shard(0), sam("r2", "chr1", 1) + "\n");
        assert_eq!(
            shard(1),
            format!("{}\n{}\n", sam("r4", "chr1", 600), sam("r3", "chr1", 999))
        );
        assert_eq!(
            shard(2),
            format!("{}\n{}\n", sam("r5", "chr2", 1), sam("r1", "chr2", 500))
        );
    }

    #[test]
    fn test_run_read_sort_unknown_contig_aborts() {
        let dir = TempDir::new().unwrap();
        let fai = setup(dir.path());
        let input = dir.path().join("aligned.sam");
        std::fs::write(&input, sam("r1", "chrX", 10)).unwrap();

        let err = run_read_sort(&[input], &dir.path().join("sorted"), &config(fai, 2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Coordinate);
    }

    #[test]
    fn test_run_read_sort_requires_annotation() {
        let dir = TempDir::new().unwrap();
        let config = ReadSortConfig {
            annotation_path: None,
            shard_count: 2,
            threads: NonZeroUsize::new(1).unwrap(),
        };
        let err = run_read_sort(&[], &dir.path().join("sorted"), &config).unwrap_err();
        assert!(matches!(err, SealError::MissingOption(_)));
    }
}
