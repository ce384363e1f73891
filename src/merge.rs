use crate::error::SealError;
use crate::reference::ReferenceAnnotation;
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const PROGRAM_ID: &str = "seal";

/// Write the `@HD`, `@SQ` and `@PG` header lines.
pub fn write_sam_header<W: Write>(
    annotation: &ReferenceAnnotation,
    out: &mut W,
) -> io::Result<()> {
    out.write_all(b"@HD\tVN:1.0\tSO:coordinate\n")?;
    for contig in annotation.contigs() {
        writeln!(out, "@SQ\tSN:{}\tLN:{}", contig.name, contig.length)?;
    }
    writeln!(out, "@PG\tID:{}", PROGRAM_ID)?;
    Ok(())
}

/// Write the header, then copy every shard byte for byte, in order.
///
/// Shards are opened lazily by the iterator. The first one that fails to open
/// or read stops the merge, leaving a partial, invalid stream in `out`.
/// Shard `i` must cover coordinates entirely below shard `i + 1`.
pub fn merge_sorted<I, R, W>(
    shards: I,
    annotation: &ReferenceAnnotation,
    out: &mut W,
) -> io::Result<u64>
where
    I: IntoIterator<Item = io::Result<R>>,
    R: Read,
    W: Write,
{
    write_sam_header(annotation, out)?;
    let mut copied = 0;
    for shard in shards {
        copied += io::copy(&mut shard?, out)?;
    }
    out.flush()?;
    Ok(copied)
}

/// Merge shard files into `destination`, or to stdout when it is `-`.
///
/// An existing destination is refused before anything is written.
pub fn merge_files(
    sources: &[PathBuf],
    annotation: &ReferenceAnnotation,
    destination: &Path,
) -> Result<u64, SealError> {
    let to_stdout = destination.as_os_str() == "-";
    let mut out: Box<dyn Write> = if to_stdout {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        // create_new fails if the destination exists
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    SealError::OutputAlreadyExists(destination.to_path_buf())
                }
                _ => SealError::Io(e),
            })?;
        Box::new(BufWriter::new(file))
    };

    info!(
        "Merging {} sources to {}",
        sources.len(),
        if to_stdout { "stdout".to_string() } else { destination.display().to_string() }
    );

    let shards = sources.iter().map(|source| {
        debug!("Copying {}", source.display());
        File::open(source).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to open shard '{}': {}", source.display(), e),
            )
        })
    });
    let copied = merge_sorted(shards, annotation, &mut out)?;

    info!("Finished, copied {} bytes of records", copied);
    Ok(copied)
}
