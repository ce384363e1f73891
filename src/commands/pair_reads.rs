use crate::config::PairReadsConfig;
use crate::error::SealError;
use crate::files::{collect_all_input_files, create_output_dir, for_each_record, part_file_name};
use crate::pair_reducer::{PairReducer, PairingConfig, ReadCounters};
use crate::pairing::{route_to_shards, sort_shard, LocationGroups};
use crate::qseq::{parse_qseq_line, FragmentRecord};
use log::{debug, info};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Pair the mates found in qseq `inputs` and write one part file per shard
/// into `output_dir`.
///
/// Returns the summed quality counters of all shards.
pub fn run_pair_reads(
    inputs: &[PathBuf],
    output_dir: &Path,
    config: &PairReadsConfig,
) -> Result<ReadCounters, SealError> {
    config.validate()?;
    let files = collect_all_input_files(inputs)?;
    create_output_dir(output_dir)?;
    info!(
        "Pairing reads from {} file(s) into {} shard(s)",
        files.len(),
        config.shard_count
    );

    // Phase 1: parse every input in parallel, failing on the first bad record
    let per_file: Vec<Vec<FragmentRecord>> = files
        .par_iter()
        .map(|path| read_fragments(path, config.threads))
        .collect::<Result<_, _>>()?;
    let n_reads: usize = per_file.iter().map(|records| records.len()).sum();
    info!("Read {} fragment records", n_reads);

    // Phase 2: route by location, then sort, group and reduce each shard on its own
    let shards = route_to_shards(per_file.into_iter().flatten(), config.shard_count);
    let shard_counters: Vec<ReadCounters> = shards
        .into_par_iter()
        .enumerate()
        .map(|(index, records)| reduce_shard(index, records, output_dir, &config.pairing))
        .collect::<Result<_, _>>()?;

    let mut total = ReadCounters::default();
    for counters in shard_counters {
        total += counters;
    }
    info!(
        "NotEnoughBases: {}, FailedFilter: {}, Dropped: {}",
        total.not_enough_bases, total.failed_filter, total.dropped
    );
    Ok(total)
}

fn read_fragments(path: &Path, threads: NonZeroUsize) -> Result<Vec<FragmentRecord>, SealError> {
    let mut records = Vec::new();
    for_each_record(path, threads, |line| {
        records.push(parse_qseq_line(line)?);
        Ok(())
    })?;
    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Sort, group and reduce one shard, writing its pairs to `part-r-NNNNN`.
pub fn reduce_shard(
    index: usize,
    mut records: Vec<FragmentRecord>,
    output_dir: &Path,
    config: &PairingConfig,
) -> Result<ReadCounters, SealError> {
    sort_shard(&mut records);

    let path = output_dir.join(part_file_name(index));
    let mut writer = BufWriter::new(File::create(&path)?);
    let mut reducer = PairReducer::new(config.clone());
    let mut n_pairs = 0;

    for group in LocationGroups::new(records) {
        if let Some(paired) = reducer.reduce_group(&group)? {
            writeln!(writer, "{}", paired.to_line())?;
            n_pairs += 1;
        }
    }
    writer.flush()?;

    debug!("Shard {}: wrote {} pairs to {}", index, n_pairs, path.display());
    Ok(reducer.counters())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn qseq_line(tile: &str, read: u32, seq: &str, filter: &str) -> String {
        let qual = "I".repeat(seq.len());
        format!("M1\tR1\t1\t{tile}\t3\t4\t7\t{read}\t{seq}\t{qual}\t{filter}")
    }

    fn config(shard_count: usize) -> PairReadsConfig {
        PairReadsConfig {
            shard_count,
            threads: NonZeroUsize::new(2).unwrap(),
            pairing: PairingConfig::default(),
        }
    }

    fn read_output(dir: &Path, shard_count: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for i in 0..shard_count {
            let content = std::fs::read_to_string(dir.join(part_file_name(i))).unwrap();
            lines.extend(content.lines().map(|l| l.to_string()));
        }
        lines.sort();
        lines
    }

    #[test]
    fn test_reduce_shard_pairs_mates() {
        let dir = TempDir::new().unwrap();
        let seq = "ACGT".repeat(10);
        let records = vec![
            parse_qseq_line(&qseq_line("2", 2, &seq, "1")).unwrap(),
            parse_qseq_line(&qseq_line("2", 1, &seq, "1")).unwrap(),
        ];
        let counters = reduce_shard(0, records, dir.path(), &PairingConfig::default()).unwrap();
        assert_eq!(counters, ReadCounters::default());

        let output = std::fs::read_to_string(dir.path().join("part-r-00000")).unwrap();
        let qual = "I".repeat(40);
        assert_eq!(
            output,
            format!("M1_R1:1:2:3:4#7\t{seq}\t{qual}\t1\t{seq}\t{qual}\t1\n")
        );
    }

    #[test]
    fn test_run_pair_reads_across_files_and_shards() {
        let dir = TempDir::new().unwrap();
        let seq = "ACGT".repeat(10);
        let read1 = dir.path().join("reads_1.qseq");
        let read2 = dir.path().join("reads_2.qseq");
        let mut first = Vec::new();
        let mut second = Vec::new();
        for tile in 0..20 {
            first.push(qseq_line(&tile.to_string(), 1, &seq, "1"));
            second.push(qseq_line(&tile.to_string(), 2, &seq, "1"));
        }
        // one fragment where both mates fail the filter
        first.push(qseq_line("99", 1, &seq, "0"));
        second.push(qseq_line("99", 2, &seq, "0"));
        std::fs::write(&read1, first.join("\n") + "\n").unwrap();
        std::fs::write(&read2, second.join("\n") + "\n").unwrap();

        let out = dir.path().join("paired");
        let counters = run_pair_reads(&[read1, read2], &out, &config(4)).unwrap();
        assert_eq!(
            counters,
            ReadCounters {
                not_enough_bases: 0,
                failed_filter: 2,
                dropped: 2
            }
        );

        let lines = read_output(&out, 4);
        assert_eq!(lines.len(), 20);
        assert!(lines.iter().all(|l| l.split('\t').count() == 7));
    }

    #[test]
    fn test_run_pair_reads_unpaired_fragment_aborts() {
        let dir = TempDir::new().unwrap();
        let seq = "ACGT".repeat(10);
        let input = dir.path().join("reads.qseq");
        let lines = [
            qseq_line("2", 1, &seq, "1"),
            qseq_line("2", 2, &seq, "1"),
            qseq_line("2", 3, &seq, "1"),
        ];
        std::fs::write(&input, lines.join("\n")).unwrap();

        let result = run_pair_reads(&[input], &dir.path().join("out"), &config(3));
        assert!(matches!(
            result,
            Err(SealError::UnpairedFragment { count: 3, .. })
        ));
    }

    #[test]
    fn test_run_pair_reads_format_error_names_the_line() {
        let dir = TempDir::new().unwrap();
        let seq = "ACGT".repeat(10);
        let input = dir.path().join("reads.qseq");
        let lines = [qseq_line("2", 1, &seq, "1"), qseq_line("2", 2, &seq, "2")];
        std::fs::write(&input, lines.join("\n")).unwrap();

        let err = run_pair_reads(&[input], &dir.path().join("out"), &config(1)).unwrap_err();
        match err {
            SealError::AtLine { line, source, .. } => {
                assert_eq!(line, 2);
                assert!(matches!(*source, SealError::InvalidFilterFlag { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
