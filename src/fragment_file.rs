use std::fs::File;
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt};

use super::error::FragmentFileError;
use super::fragment::Fragment;

/// # FragmentFile
/// A fragment dump file holds the readout of one or more events as a flat
/// big-endian word stream. Each record is 5 envelope words (source id, L1 id,
/// BCID, status word count, payload word count) followed by the status block
/// and the payload.
///
/// The functional purpose of the FragmentFile is to provide an interface to
/// the underlying binary data, yielding one Fragment per call until the file
/// ends.
#[allow(dead_code)]
#[derive(Debug)]
pub struct FragmentFile {
    file_handle: File,
    file_path: PathBuf,
    size_bytes: u64,
    is_eof: bool,
}

impl FragmentFile {
    /// Open a fragment dump file in read-only mode.
    pub fn new(path: &Path) -> Result<Self, FragmentFileError> {
        if !path.exists() {
            return Err(FragmentFileError::BadFilePath(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let size_bytes = file.metadata()?.len();

        Ok(FragmentFile {
            file_handle: file,
            file_path: path.to_path_buf(),
            size_bytes,
            is_eof: false,
        })
    }

    /// Retrieve the next fragment from the file
    pub fn get_next_fragment(&mut self) -> Result<Fragment, FragmentFileError> {
        // end of file is only legal on the first word of a record
        let source_id = match self.file_handle.read_u32::<BigEndian>() {
            Ok(word) => word,
            Err(e) => match e.kind() {
                std::io::ErrorKind::UnexpectedEof => {
                    self.is_eof = true;
                    return Err(FragmentFileError::EndOfFile);
                }
                _ => {
                    return Err(FragmentFileError::IOError(e));
                }
            },
        };

        let l1_id = self.read_word()?;
        let bcid = self.read_word()?;
        let n_status = self.read_word()? as usize;
        let n_payload = self.read_word()? as usize;

        let mut status: Vec<u32> = Vec::with_capacity(n_status);
        for _ in 0..n_status {
            status.push(self.read_word()?);
        }
        let mut payload: Vec<u32> = Vec::with_capacity(n_payload);
        for _ in 0..n_payload {
            payload.push(self.read_word()?);
        }

        Ok(Fragment { source_id, l1_id, bcid, status, payload })
    }

    fn read_word(&mut self) -> Result<u32, FragmentFileError> {
        match self.file_handle.read_u32::<BigEndian>() {
            Ok(word) => Ok(word),
            Err(e) => match e.kind() {
                std::io::ErrorKind::UnexpectedEof => {
                    self.is_eof = true;
                    Err(FragmentFileError::TruncatedRecord)
                }
                _ => Err(FragmentFileError::IOError(e)),
            },
        }
    }

    /// Check to see if the file has ended
    pub fn is_eof(&self) -> &bool {
        &self.is_eof
    }

    #[allow(dead_code)]
    pub fn get_filename(&self) -> &Path {
        &self.file_path
    }

    pub fn get_size_bytes(&self) -> u64 {
        self.size_bytes
    }
}
