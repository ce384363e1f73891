use crate::error::SealError;
use crate::reference::ReferenceAnnotation;
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load a reference annotation, picking the parser from the file extension.
pub fn load_annotation<P: AsRef<Path>>(path: P) -> Result<ReferenceAnnotation, SealError> {
    let path = path.as_ref();
    info!("Reading reference annotation from {}", path.display());

    let file = File::open(path).map_err(|e| {
        SealError::InvalidAnnotation(format!(
            "Failed to open annotation file '{}': {}",
            path.display(),
            e
        ))
    })?;
    let reader = BufReader::new(file);

    let annotation = if path.extension().is_some_and(|ext| ext == "fai") {
        parse_fai(reader)?
    } else {
        parse_bwa_ann(reader)?
    };
    if annotation.is_empty() {
        return Err(SealError::InvalidAnnotation(format!(
            "No contigs declared in '{}'",
            path.display()
        )));
    }

    info!(
        "Read {} contigs, total reference length {} bp",
        annotation.len(),
        annotation.total_length()
    );
    Ok(annotation)
}

/// Parse a BWA `.ann` file.
///
/// Declared offsets must match the running sum of contig lengths, and the
/// declared total must match the sum of all lengths.
pub fn parse_bwa_ann<R: BufRead>(reader: R) -> Result<ReferenceAnnotation, SealError> {
    let mut lines = reader.lines();

    let first_line = lines
        .next()
        .ok_or_else(|| SealError::InvalidAnnotation("Missing first line in .ann file".to_string()))??;
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(SealError::InvalidAnnotation(format!(
            "Invalid first line in .ann file: '{}'",
            first_line
        )));
    }
    let declared_total = parse_ann_number(parts[0], "total length")?;
    let n_seqs = parse_ann_number(parts[1], "sequence count")?;

    let mut contigs = Vec::new();
    let mut running_offset = 0u64;
    for i in 0..n_seqs {
        let name_line = lines.next().ok_or_else(|| {
            SealError::InvalidAnnotation(format!("Missing name line for contig {} in .ann file", i))
        })??;
        let name_parts: Vec<&str> = name_line.splitn(3, ' ').collect();
        if name_parts.len() < 2 || name_parts[1].is_empty() {
            return Err(SealError::InvalidAnnotation(format!(
                "Invalid name line in .ann file: '{}'",
                name_line
            )));
        }
        let name = name_parts[1].to_string();

        let coord_line = lines.next().ok_or_else(|| {
            SealError::InvalidAnnotation(format!(
                "Missing offset/length line for contig '{}' in .ann file",
                name
            ))
        })??;
        let coord_parts: Vec<&str> = coord_line.split_whitespace().collect();
        if coord_parts.len() < 2 {
            return Err(SealError::InvalidAnnotation(format!(
                "Invalid offset/length line in .ann file: '{}'",
                coord_line
            )));
        }
        let offset = parse_ann_number(coord_parts[0], "offset")?;
        let length = parse_ann_number(coord_parts[1], "length")?;

        if offset != running_offset {
            return Err(SealError::InvalidAnnotation(format!(
                "Contig '{}' declares offset {} but preceding contigs sum to {}",
                name, offset, running_offset
            )));
        }
        running_offset = running_offset.checked_add(length).ok_or_else(|| {
            SealError::InvalidAnnotation(format!(
                "Contig lengths overflow the reference length at contig '{}'",
                name
            ))
        })?;

        debug!("  Contig: {}, offset: {}, len: {}", name, offset, length);
        contigs.push((name, length));
    }

    if running_offset != declared_total {
        return Err(SealError::InvalidAnnotation(format!(
            "Declared reference length {} does not match the sum of contig lengths {}",
            declared_total, running_offset
        )));
    }

    ReferenceAnnotation::from_contigs(contigs)
}

/// Parse a samtools `.fai` index.
pub fn parse_fai<R: BufRead>(reader: R) -> Result<ReferenceAnnotation, SealError> {
    let mut contigs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return Err(SealError::InvalidAnnotation(format!(
                "Invalid .fai line: '{}'",
                line
            )));
        }
        let length = parse_ann_number(fields[1], "length")?;
        contigs.push((fields[0].to_string(), length));
    }
    ReferenceAnnotation::from_contigs(contigs)
}

fn parse_ann_number(value: &str, what: &str) -> Result<u64, SealError> {
    value.parse::<u64>().map_err(|_| {
        SealError::InvalidAnnotation(format!("Invalid {} '{}'", what, value))
    })
}
