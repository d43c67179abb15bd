use super::assembler::{fill_accumulated, fill_header, fill_raw, AccumulatedSinks, RawSinks};
use super::channel_map::{CalibLineMap, ChannelMap, OnlineToOfflineMap};
use super::fragment::Fragment;
use super::processor::{DecodeMode, FragmentProcessor};

/// Caller-selected decode behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub protect_source_id: bool,
    pub ignore_barrel: bool,
    pub ignore_endcap: bool,
    pub keep_only_pulsed: bool,
}

/// # LatomeDecoder
/// Front door of the decoder: walks a list of fragments, runs one fresh
/// FragmentProcessor per fragment and hands the decoded buffers to the
/// output assembly. A corrupted fragment is dropped with a warning and never
/// stops the rest of the event; because sinks are only filled after a
/// fragment decodes completely, a dropped fragment contributes nothing
/// rather than something partial.
#[derive(Debug, Clone, Default)]
pub struct LatomeDecoder {
    options: DecodeOptions,
}

impl LatomeDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        LatomeDecoder { options }
    }

    fn accept_source(&self, fragment: &Fragment) -> bool {
        if self.options.protect_source_id && !fragment.has_latome_source_id() {
            log::debug!("discarding non latome source ID {:#x}", fragment.source_id);
            return false;
        }
        true
    }

    /// Decode multiplexed raw-mode fragments (ADC / baseline / energy /
    /// selected energy streams) into the requested sinks. Returns the number
    /// of fragments that decoded successfully.
    pub fn decode_raw(
        &self,
        fragments: &[Fragment],
        map: &ChannelMap,
        sinks: &mut RawSinks,
    ) -> usize {
        let mut decoded = 0;
        for fragment in fragments {
            if !self.accept_source(fragment) {
                continue;
            }
            let mut processor = FragmentProcessor::new(DecodeMode::Raw);
            match processor.decode(fragment) {
                Ok(true) => {
                    fill_raw(&processor, fragment, map, &self.options, sinks);
                    fill_header(&processor, fragment, &mut sinks.header);
                    decoded += 1;
                }
                Ok(false) => continue,
                Err(e) => {
                    log::warn!(
                        "badly corrupted fragment from source {:#x}, dropping it: {}",
                        fragment.source_id,
                        e
                    );
                    continue;
                }
            }
        }
        decoded
    }

    /// Decode averaged or auto-correlation fragments (calibration runs).
    /// Passing a calib-digit sink selects averaged decoding, an accumulated
    /// digit sink selects auto-correlation; the recipe in the data must
    /// agree or the fragment is skipped.
    pub fn decode_accumulated(
        &self,
        fragments: &[Fragment],
        map: &ChannelMap,
        online_offline: Option<&OnlineToOfflineMap>,
        calib_lines: Option<&CalibLineMap>,
        sinks: &mut AccumulatedSinks,
    ) -> usize {
        let mode = if sinks.calib_digits.is_some() {
            DecodeMode::Averaged
        } else if sinks.digits.is_some() {
            DecodeMode::AutoCorr
        } else {
            log::warn!("accumulated decoding requested without any sink");
            return 0;
        };

        let mut decoded = 0;
        for fragment in fragments {
            if !self.accept_source(fragment) {
                continue;
            }
            let mut processor = FragmentProcessor::new(mode);
            match processor.decode(fragment) {
                Ok(true) => {
                    fill_accumulated(
                        &processor,
                        fragment,
                        map,
                        online_offline,
                        calib_lines,
                        &self.options,
                        sinks,
                    );
                    fill_header(&processor, fragment, &mut sinks.header);
                    decoded += 1;
                }
                Ok(false) => continue,
                Err(e) => {
                    log::warn!(
                        "badly corrupted fragment from source {:#x}, dropping it: {}",
                        fragment.source_id,
                        e
                    );
                    continue;
                }
            }
        }
        decoded
    }
}
