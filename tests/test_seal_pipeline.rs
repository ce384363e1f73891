//! End-to-end runs of the seal binary: pair-reads, then sort and merge of
//! aligned records against a small two-contig reference.

use seal::annotation::load_annotation;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_seal(work_dir: &Path, args: &[&str]) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_seal"))
        .current_dir(work_dir)
        .args(args)
        .output()
}

fn write_reference(dir: &Path) -> PathBuf {
    let ann = dir.join("ref.fa.ann");
    fs::write(
        &ann,
        "1500 2 11\n0 chr1 (null)\n0 1000 0\n0 chr2 (null)\n1000 500 0\n",
    )
    .unwrap();
    ann
}

fn sam_line(name: &str, contig: &str, pos: u64) -> String {
    format!("{name}\t0\t{contig}\t{pos}\t60\t4M\t*\t0\t0\tACGT\tIIII")
}

fn qseq_line(tile: u32, read: u32, seq: &str, filter: u8) -> String {
    let qual = "B".repeat(seq.len());
    format!("HWI-ST1\t42\t3\t{tile}\t1021\t2044\t0\t{read}\t{seq}\t{qual}\t{filter}")
}

#[test]
fn test_pair_reads_command() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    let good = "ACGT".repeat(12);
    let short = format!("{}{}", "A".repeat(29), ".".repeat(19));

    let mut mate1 = Vec::new();
    let mut mate2 = Vec::new();
    for tile in 1..=8 {
        mate1.push(qseq_line(tile, 1, &good, 1));
        mate2.push(qseq_line(tile, 2, &good, 1));
    }
    // one weak mate is kept alongside its good partner
    mate1.push(qseq_line(9, 1, &short, 1));
    mate2.push(qseq_line(9, 2, &good, 1));
    fs::create_dir(work_dir.join("qseq"))?;
    fs::write(work_dir.join("qseq/s_3_1.qseq"), mate1.join("\n") + "\n")?;
    fs::write(work_dir.join("qseq/s_3_2.qseq"), mate2.join("\n") + "\n")?;

    let output = run_seal(
        work_dir,
        &["pair-reads", "-o", "paired", "-r", "3", "-t", "2", "qseq"],
    )?;
    assert!(
        output.status.success(),
        "pair-reads failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("NotEnoughBases\t1"));
    assert!(stdout.contains("FailedFilter\t0"));
    assert!(stdout.contains("Dropped\t0"));

    let mut pairs = Vec::new();
    for shard in 0..3 {
        let content = fs::read_to_string(work_dir.join(format!("paired/part-r-{shard:05}")))?;
        pairs.extend(content.lines().map(str::to_string));
    }
    assert_eq!(pairs.len(), 9);
    let weak = pairs
        .iter()
        .find(|l| l.starts_with("HWI-ST1_42:3:9:1021:2044#0\t"))
        .expect("fragment with a weak mate should be emitted");
    let fields: Vec<&str> = weak.split('\t').collect();
    assert_eq!(fields.len(), 7);
    assert_eq!(fields[1], format!("{}{}", "A".repeat(29), "N".repeat(19)));
    assert_eq!(fields[4], good);
    Ok(())
}

#[test]
fn test_pair_reads_rejects_existing_output() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    fs::write(work_dir.join("reads.qseq"), qseq_line(1, 1, "ACGT", 1) + "\n")?;
    fs::create_dir(work_dir.join("paired"))?;

    let output = run_seal(work_dir, &["pair-reads", "-o", "paired", "reads.qseq"])?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn test_sort_then_merge_is_globally_ordered() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    let ann = write_reference(work_dir);

    let positions = [
        ("chr2", 17),
        ("chr1", 999),
        ("chr1", 1),
        ("chr2", 500),
        ("chr1", 500),
        ("chr1", 501),
        ("chr2", 1),
        ("chr1", 1000),
        ("chr1", 250),
    ];
    fs::create_dir(work_dir.join("aligned"))?;
    let (first, second) = positions.split_at(5);
    for (i, chunk) in [first, second].iter().enumerate() {
        let lines: Vec<String> = chunk
            .iter()
            .enumerate()
            .map(|(j, (contig, pos))| sam_line(&format!("r{i}_{j}"), contig, *pos))
            .collect();
        fs::write(
            work_dir.join(format!("aligned/part-{i}.sam")),
            lines.join("\n") + "\n",
        )?;
    }
    fs::write(work_dir.join("aligned/_logs"), "")?;

    let ann_arg = ann.to_string_lossy().to_string();
    let output = run_seal(
        work_dir,
        &["sort", "-a", &ann_arg, "-o", "sorted", "-r", "4", "aligned"],
    )?;
    assert!(
        output.status.success(),
        "sort failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output = run_seal(
        work_dir,
        &["merge", "-a", &ann_arg, "-o", "merged.sam", "sorted"],
    )?;
    assert!(
        output.status.success(),
        "merge failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let merged = fs::read_to_string(work_dir.join("merged.sam"))?;
    let mut lines = merged.lines();
    assert_eq!(lines.next(), Some("@HD\tVN:1.0\tSO:coordinate"));
    assert_eq!(lines.next(), Some("@SQ\tSN:chr1\tLN:1000"));
    assert_eq!(lines.next(), Some("@SQ\tSN:chr2\tLN:500"));
    assert_eq!(lines.next(), Some("@PG\tID:seal"));

    let annotation = load_annotation(&ann).unwrap();
    let coordinates: Vec<u64> = lines
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            annotation
                .absolute_coordinate(fields[2], fields[3].parse().unwrap())
                .unwrap()
        })
        .collect();
    assert_eq!(coordinates.len(), positions.len());
    assert!(coordinates.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(coordinates.first(), Some(&0));
    assert_eq!(coordinates.last(), Some(&1499));
    Ok(())
}

#[test]
fn test_merge_refuses_to_overwrite() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    let ann = write_reference(work_dir);
    fs::create_dir(work_dir.join("sorted"))?;
    fs::write(work_dir.join("sorted/part-r-00000"), sam_line("r1", "chr1", 5) + "\n")?;
    fs::write(work_dir.join("merged.sam"), "keep me\n")?;

    let ann_arg = ann.to_string_lossy().to_string();
    let output = run_seal(
        work_dir,
        &["merge", "-a", &ann_arg, "-o", "merged.sam", "sorted"],
    )?;
    assert!(!output.status.success());
    assert_eq!(fs::read_to_string(work_dir.join("merged.sam"))?, "keep me\n");
    Ok(())
}

#[test]
fn test_sort_without_annotation_fails() -> std::io::Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path();
    fs::write(work_dir.join("in.sam"), sam_line("r1", "chr1", 5) + "\n")?;

    let output = run_seal(work_dir, &["sort", "-o", "sorted", "in.sam"])?;
    assert!(!output.status.success());
    assert!(!work_dir.join("sorted").exists());
    Ok(())
}
