use crate::error::SealError;
use log::debug;
use noodles::bgzf;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

const BGZF_HEADER_SIZE: usize = 18;

/// Check whether a file starts with a valid BGZF header.
/// Returns `Ok(false)` for regular gzip, too-small files, or plain text.
fn is_bgzf<R: Read + Seek>(reader: &mut R) -> io::Result<bool> {
    let mut header = [0u8; BGZF_HEADER_SIZE];
    let result = match reader.read_exact(&mut header) {
        Ok(()) => {
            Ok(header[0..2] == [0x1f, 0x8b]      // gzip magic
                && header[2] == 0x08              // DEFLATE
                && header[3] == 0x04              // FEXTRA
                && header[10..12] == [0x06, 0x00] // XLEN=6
                && header[12..14] == [b'B', b'C'] // BC subfield
                && header[14..16] == [0x02, 0x00]) // SLEN=2
        }
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    };
    reader.seek(SeekFrom::Start(0))?;
    result
}

/// Open a text input, transparently decompressing `.gz`/`.bgz` BGZF files.
pub fn open_input(path: &Path, threads: NonZeroUsize) -> io::Result<Box<dyn BufRead>> {
    let mut file = File::open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Failed to open input file '{}': {}", path.display(), e),
        )
    })?;

    let name = path.to_string_lossy();
    if [".gz", ".bgz"].iter().any(|e| name.ends_with(e)) {
        if !is_bgzf(&mut file)? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "'{}' is regular gzip, not BGZF. Convert with: zcat '{}' | bgzip > {}",
                    name, name, name
                ),
            ));
        }
        debug!("Reading {} with {} BGZF worker(s)", name, threads);
        let reader = bgzf::io::MultithreadedReader::with_worker_count(threads, file);
        Ok(Box::new(BufReader::new(reader)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Feed every non-empty line of `path` to `f` along with its 1-based line number.
///
/// Read errors and errors returned by `f` are tagged with the file and line
/// they came from.
pub fn for_each_record<F>(path: &Path, threads: NonZeroUsize, mut f: F) -> Result<(), SealError>
where
    F: FnMut(&str) -> Result<(), SealError>,
{
    let reader = open_input(path, threads)?;
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SealError::from(e).at_line(path, i + 1))?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            continue;
        }
        f(line).map_err(|e| e.at_line(path, i + 1))?;
    }
    Ok(())
}

/// Hidden entries (`_SUCCESS`, `_logs`, dotfiles) are not part files.
fn is_part_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| !n.starts_with('_') && !n.starts_with('.'))
}

/// Expand an input path into the files to read.
///
/// A directory yields its visible regular files in natural name order, so
/// `part-r-10` sorts after `part-r-9`. A file path is returned unchanged.
pub fn collect_input_files(path: &Path) -> io::Result<Vec<PathBuf>> {
    if !path.is_dir() {
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Input path '{}' doesn't exist", path.display()),
            ));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    debug!("Input path {} is a directory, listing its part files", path.display());
    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.is_file() && is_part_file(&entry_path) {
            files.push(entry_path);
        }
    }
    files.sort_by(|a, b| natord::compare(&a.to_string_lossy(), &b.to_string_lossy()));

    if files.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("No input files found in '{}'", path.display()),
        ));
    }
    for file in &files {
        debug!("  Source: {}", file.display());
    }
    Ok(files)
}

/// Expand several input paths, keeping the order they were given in.
pub fn collect_all_input_files(paths: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(collect_input_files(path)?);
    }
    Ok(files)
}

/// Create a fresh output directory. An existing one is never reused.
pub fn create_output_dir(path: &Path) -> Result<(), SealError> {
    if path.exists() {
        return Err(SealError::OutputAlreadyExists(path.to_path_buf()));
    }
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Name of the file holding shard `index`.
pub fn part_file_name(index: usize) -> String {
    format!("part-r-{:05}", index)
}
