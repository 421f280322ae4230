//! Plaintext and gzip-compressed file input.
//!
//! Variant tables are often shipped gzipped; [`InputFile`] hides the
//! difference so the track parser only ever sees a line-oriented reader.
//!
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("could not open '{path}': {source}")]
    OpenError { path: String, source: io::Error },
}

/// Check if a file is gzipped by looking for the magic numbers.
///
/// Files shorter than the two magic bytes are plaintext.
fn is_gzipped_file(file_path: &Path) -> io::Result<bool> {
    let mut file = File::open(file_path)?;
    let mut buffer = [0; 2];
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..])?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    Ok(buffer == [0x1f, 0x8b])
}

/// Represents an input file.
///
/// Plaintext and gzip-compressed input are read through a common interface.
pub struct InputFile {
    pub filepath: PathBuf,
}

impl InputFile {
    /// Constructs a new `InputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - The path to the file. Compression is detected from the
    /// file contents, not the extension.
    pub fn new(filepath: impl AsRef<Path>) -> Self {
        Self {
            filepath: filepath.as_ref().to_path_buf(),
        }
    }

    /// Opens the file and returns a buffered reader.
    ///
    /// # Returns
    ///
    /// A result containing a `BufReader<Box<dyn Read>>` on success, or a `FileError` on failure.
    ///
    pub fn reader(&self) -> Result<BufReader<Box<dyn Read>>, FileError> {
        let open_error = |source| FileError::OpenError {
            path: self.filepath.display().to_string(),
            source,
        };
        let file = File::open(&self.filepath).map_err(open_error)?;
        let is_gzipped = is_gzipped_file(&self.filepath)?;
        let reader: Box<dyn Read> = if is_gzipped {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(BufReader::new(reader))
    }

    /// Iterate over the lines of the file.
    pub fn lines(&self) -> Result<impl Iterator<Item = io::Result<String>>, FileError> {
        Ok(self.reader()?.lines())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_plaintext_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, "a b\nc d\n").unwrap();

        let lines: Vec<String> = InputFile::new(&path)
            .lines()
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines, vec!["a b", "c d"]);
    }

    #[test]
    fn test_gzipped_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("calls.txt.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(b"chr1 POS A B R\nchr1 10 1 0 1\n").unwrap();
        encoder.finish().unwrap();

        assert!(is_gzipped_file(&path).unwrap());
        let lines: Vec<String> = InputFile::new(&path)
            .lines()
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines, vec!["chr1 POS A B R", "chr1 10 1 0 1"]);
    }

    #[test]
    fn test_short_files_are_plaintext() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "").unwrap();
        let one = dir.path().join("one.txt");
        std::fs::write(&one, "x").unwrap();

        assert!(!is_gzipped_file(&empty).unwrap());
        assert!(!is_gzipped_file(&one).unwrap());
        assert_eq!(InputFile::new(&empty).lines().unwrap().count(), 0);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = InputFile::new(dir.path().join("nope.txt")).reader();
        assert!(matches!(result, Err(FileError::OpenError { .. })));
    }
}
