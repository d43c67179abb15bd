use std::error::Error;
use std::fmt::Display;
use std::path::PathBuf;

use super::constants::*;

/*
    Fragment decode errors

    Only conditions which force the current fragment to be dropped live here.
    Soft conditions (marker mismatches, BCID gaps, padding slips) are logged
    by the decoding code and never surfaced as errors.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Truncated(usize, usize),
    HeaderSizeInvalid(u32),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Truncated(word, len) => write!(
                f,
                "Fragment payload truncated! Needed word {} of a {} word payload",
                word, len
            ),
            DecodeError::HeaderSizeInvalid(size) => write!(
                f,
                "Monitoring header size {} is below the minimum of {}! Are you reading an old data file?",
                size, MIN_MON_HEADER_SIZE
            ),
        }
    }
}

impl Error for DecodeError {}

/*
    FragmentFile errors
 */
#[derive(Debug)]
pub enum FragmentFileError {
    BadFilePath(PathBuf),
    EndOfFile,
    TruncatedRecord,
    IOError(std::io::Error),
}

impl From<std::io::Error> for FragmentFileError {
    fn from(value: std::io::Error) -> Self {
        FragmentFileError::IOError(value)
    }
}

impl Display for FragmentFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentFileError::BadFilePath(path) => {
                write!(f, "File {} does not exist at FragmentFile::new!", path.display())
            }
            FragmentFileError::EndOfFile => write!(f, "File reached end!"),
            FragmentFileError::TruncatedRecord => {
                write!(f, "File ended in the middle of a fragment record!")
            }
            FragmentFileError::IOError(e) => write!(f, "FragmentFile recieved an io error: {}!", e),
        }
    }
}

impl Error for FragmentFileError {}

/*
    ChannelMap errors
 */
#[derive(Debug)]
pub enum ChannelMapError {
    IOError(std::io::Error),
    ParsingError(std::num::ParseIntError),
    BadFileFormat,
}

impl From<std::io::Error> for ChannelMapError {
    fn from(value: std::io::Error) -> Self {
        ChannelMapError::IOError(value)
    }
}

impl From<std::num::ParseIntError> for ChannelMapError {
    fn from(value: std::num::ParseIntError) -> Self {
        ChannelMapError::ParsingError(value)
    }
}

impl Display for ChannelMapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelMapError::IOError(e) => write!(f, "ChannelMap recieved an io error: {}", e),
            ChannelMapError::ParsingError(e) => {
                write!(f, "ChannelMap recieved a parsing error: {}", e)
            }
            ChannelMapError::BadFileFormat => write!(
                f,
                "ChannelMap found a bad file format while reading the map file! Expected .csv without whitespaces"
            ),
        }
    }
}

impl Error for ChannelMapError {}

/*
    Config errors
 */
#[derive(Debug)]
pub enum ConfigError {
    BadFilePath(PathBuf),
    IOError(std::io::Error),
    ParsingError(serde_yaml::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::IOError(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        ConfigError::ParsingError(value)
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::BadFilePath(path) => {
                write!(f, "File {} given to Config does not exist!", path.display())
            }
            ConfigError::IOError(e) => write!(f, "Config received an io error: {}", e),
            ConfigError::ParsingError(e) => write!(f, "Config received a parsing error: {}", e),
        }
    }
}

impl Error for ConfigError {}

/*
    Top level processing errors, for main
 */
#[derive(Debug)]
pub enum ProcessorError {
    ConfigError(ConfigError),
    MapError(ChannelMapError),
    FileError(FragmentFileError),
}

impl From<ConfigError> for ProcessorError {
    fn from(value: ConfigError) -> Self {
        ProcessorError::ConfigError(value)
    }
}

impl From<ChannelMapError> for ProcessorError {
    fn from(value: ChannelMapError) -> Self {
        ProcessorError::MapError(value)
    }
}

impl From<FragmentFileError> for ProcessorError {
    fn from(value: FragmentFileError) -> Self {
        ProcessorError::FileError(value)
    }
}

impl Display for ProcessorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessorError::ConfigError(e) => write!(f, "The processor recieved a config error: {}", e),
            ProcessorError::MapError(e) => write!(f, "The processor recieved a map error: {}", e),
            ProcessorError::FileError(e) => write!(f, "The processor recieved a file error: {}", e),
        }
    }
}

impl Error for ProcessorError {}
