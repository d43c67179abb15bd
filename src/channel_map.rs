use std::fs::File;
use std::io::Read;
use std::path::Path;

use fxhash::FxHashMap;

use super::error::ChannelMapError;

const MAP_ENTRIES_PER_LINE: usize = 4; //Number of elements in a single row in the CSV file

/// Detector side a channel belongs to, used by the region ignore filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Barrel,
    Endcap,
}

/// # ChannelId
/// The external identifier of one logical channel: which readout board and
/// input it came from, the online identifier used downstream, and the
/// detector region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelId {
    pub source_id: u32,
    pub channel: u32,
    pub online_id: u32,
    pub region: Region,
}

/// Generate a unique id number for a given board input
fn generate_uuid(source_id: u32, channel: u32) -> u64 {
    (channel as u64) + (source_id as u64) * 1_000
}

/// # ChannelMap
/// Maps (readout source id, logical channel) to the channel's external
/// identifier. The mapping changes with detector cabling, so it is read from
/// a CSV file where each row is: source id, channel, online id, region
/// (0 for barrel, anything else endcap). Channels absent from the map are
/// expected (disconnected inputs) and simply skipped by the caller.
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    map: FxHashMap<u64, ChannelId>,
}

impl ChannelMap {
    /// Create a new ChannelMap using the CSV file at the given path
    pub fn new(path: &Path) -> Result<Self, ChannelMapError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        ChannelMap::parse(&contents)
    }

    pub(crate) fn parse(contents: &str) -> Result<Self, ChannelMapError> {
        let mut cm = ChannelMap::default();

        for line in contents.lines() {
            let entries: Vec<&str> = line.split_terminator(",").collect();

            if entries.len() < MAP_ENTRIES_PER_LINE {
                return Err(ChannelMapError::BadFileFormat);
            }

            let source_id: u32 = entries[0].parse()?;
            let channel: u32 = entries[1].parse()?;
            let online_id: u32 = entries[2].parse()?;
            let region_flag: u32 = entries[3].parse()?;
            let region = if region_flag == 0 { Region::Barrel } else { Region::Endcap };

            let uuid = generate_uuid(source_id, channel);
            cm.map.insert(uuid, ChannelId { source_id, channel, online_id, region });
        }

        Ok(cm)
    }

    /// Get the identifier for a given board input. None means the input is
    /// not cabled.
    pub fn lookup(&self, source_id: u32, channel: u32) -> Option<&ChannelId> {
        self.map.get(&generate_uuid(source_id, channel))
    }
}

/// # OnlineToOfflineMap
/// Maps one online identifier to the offline cell identifiers it covers.
/// Only used on the calibration decoding path.
#[derive(Debug, Clone, Default)]
pub struct OnlineToOfflineMap {
    map: FxHashMap<u32, Vec<u32>>,
}

impl OnlineToOfflineMap {
    pub fn new(path: &Path) -> Result<Self, ChannelMapError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        OnlineToOfflineMap::parse(&contents)
    }

    pub(crate) fn parse(contents: &str) -> Result<Self, ChannelMapError> {
        let mut om = OnlineToOfflineMap::default();
        for line in contents.lines() {
            let entries: Vec<&str> = line.split_terminator(",").collect();
            if entries.len() < 2 {
                return Err(ChannelMapError::BadFileFormat);
            }
            let online_id: u32 = entries[0].parse()?;
            let offline_id: u32 = entries[1].parse()?;
            om.map.entry(online_id).or_default().push(offline_id);
        }
        Ok(om)
    }

    pub fn offline_cells(&self, online_id: u32) -> &[u32] {
        self.map.get(&online_id).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// # CalibLineMap
/// Maps one offline cell identifier to the calibration lines pulsing it.
/// Only used on the calibration decoding path.
#[derive(Debug, Clone, Default)]
pub struct CalibLineMap {
    map: FxHashMap<u32, Vec<u32>>,
}

impl CalibLineMap {
    pub fn new(path: &Path) -> Result<Self, ChannelMapError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        CalibLineMap::parse(&contents)
    }

    pub(crate) fn parse(contents: &str) -> Result<Self, ChannelMapError> {
        let mut clm = CalibLineMap::default();
        for line in contents.lines() {
            let entries: Vec<&str> = line.split_terminator(",").collect();
            if entries.len() < 2 {
                return Err(ChannelMapError::BadFileFormat);
            }
            let offline_id: u32 = entries[0].parse()?;
            let calib_line: u32 = entries[1].parse()?;
            clm.map.entry(offline_id).or_default().push(calib_line);
        }
        Ok(clm)
    }

    pub fn calib_lines(&self, offline_id: u32) -> &[u32] {
        self.map.get(&offline_id).map(|v| v.as_slice()).unwrap_or(&[])
    }
}
