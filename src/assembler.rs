use super::channel_map::{CalibLineMap, ChannelMap, OnlineToOfflineMap, Region};
use super::constants::*;
use super::decoder::DecodeOptions;
use super::fragment::Fragment;
use super::processor::{FragmentProcessor, StreamWindow};

/// One channel's sample train for an ADC-kind stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScDigit {
    pub online_id: u32,
    pub channel: u32,
    pub source_id: u32,
    pub samples: Vec<i16>,
    pub bcids: Vec<u32>,
}

/// One channel's sample train for an energy-kind stream, with the saturation
/// flags alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScEnergy {
    pub online_id: u32,
    pub channel: u32,
    pub source_id: u32,
    pub energies: Vec<i32>,
    pub bcids: Vec<u32>,
    pub saturation: Vec<bool>,
}

/// One channel's accumulator train for averaged/auto-correlation runs,
/// rescaled to the common trigger count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatedDigit {
    pub online_id: u32,
    pub channel: u32,
    pub source_id: u32,
    pub sums: Vec<u64>,
    pub sum_squares: Vec<u64>,
    pub n_triggers: u32,
}

/// An AccumulatedDigit plus the calibration pulsing context it was taken in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibAccumulatedDigit {
    pub online_id: u32,
    pub channel: u32,
    pub source_id: u32,
    pub sums: Vec<u64>,
    pub sum_squares: Vec<u64>,
    pub n_triggers: u32,
    pub dac: u32,
    pub delay: u32,
    pub is_pulsed: bool,
}

/// Per-fragment header metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub source_id: u32,
    pub latome_id: u32,
    pub n_active_channels: u32,
    pub bcid: u32,
    pub l1_id: u32,
    pub payload_size: u32,
}

/// Output destinations for raw-mode decoding. A stream nobody asked for is
/// simply absent.
#[derive(Debug, Default)]
pub struct RawSinks<'a> {
    pub adc: Option<&'a mut Vec<ScDigit>>,
    pub adc_bas: Option<&'a mut Vec<ScDigit>>,
    pub et: Option<&'a mut Vec<ScEnergy>>,
    pub et_id: Option<&'a mut Vec<ScEnergy>>,
    pub header: Option<&'a mut Vec<HeaderRecord>>,
}

/// Output destinations for accumulated decoding. Passing `calib_digits`
/// requests averaged calibration decoding, passing `digits` requests
/// auto-correlation decoding.
#[derive(Debug, Default)]
pub struct AccumulatedSinks<'a> {
    pub digits: Option<&'a mut Vec<AccumulatedDigit>>,
    pub calib_digits: Option<&'a mut Vec<CalibAccumulatedDigit>>,
    pub header: Option<&'a mut Vec<HeaderRecord>>,
}

/// The decoded BCIDs restricted to one stream's window.
fn bcid_window(bcids: &[u32], window: &StreamWindow) -> Vec<u32> {
    if window.n_bc == bcids.len() {
        return bcids.to_vec();
    }
    if window.start_bc + window.n_bc > bcids.len() {
        log::warn!(
            "stream window [{}, {}) exceeds the {} decoded crossings",
            window.start_bc,
            window.start_bc + window.n_bc,
            bcids.len()
        );
    }
    bcids.iter().skip(window.start_bc).take(window.n_bc).copied().collect()
}

fn passes_region_filters(region: Region, options: &DecodeOptions) -> bool {
    if options.ignore_barrel && region == Region::Barrel {
        return false;
    }
    if options.ignore_endcap && region == Region::Endcap {
        return false;
    }
    true
}

/// Emit the per-channel records of a raw-mode fragment into the requested
/// sinks. Channels without a mapping are expected (disconnected inputs) and
/// skipped silently.
pub fn fill_raw(
    processor: &FragmentProcessor,
    fragment: &Fragment,
    map: &ChannelMap,
    options: &DecodeOptions,
    sinks: &mut RawSinks,
) {
    for ch in 0..N_LATOME_CHANNELS {
        let id = match map.lookup(fragment.source_id, ch as u32) {
            Some(id) => id,
            None => {
                log::debug!("No mapping for ch: {}", ch);
                continue;
            }
        };
        if !passes_region_filters(id.region, options) {
            continue;
        }
        let values = match processor.raw_values.get(ch) {
            Some(values) => values,
            None => continue,
        };

        if processor.raw_adc.present {
            if let Some(sink) = &mut sinks.adc {
                sink.push(ScDigit {
                    online_id: id.online_id,
                    channel: values.latome_channel,
                    source_id: fragment.source_id,
                    samples: values.adc.clone(),
                    bcids: bcid_window(&processor.bcids, &processor.raw_adc),
                });
            }
        }
        if processor.adc_bas.present {
            if let Some(sink) = &mut sinks.adc_bas {
                sink.push(ScDigit {
                    online_id: id.online_id,
                    channel: values.latome_channel,
                    source_id: fragment.source_id,
                    samples: values.adc_bas.clone(),
                    bcids: bcid_window(&processor.bcids, &processor.adc_bas),
                });
            }
        }
        if processor.et.present {
            if let Some(sink) = &mut sinks.et {
                sink.push(ScEnergy {
                    online_id: id.online_id,
                    channel: values.latome_channel,
                    source_id: fragment.source_id,
                    energies: values.et.clone(),
                    bcids: bcid_window(&processor.bcids, &processor.et),
                    saturation: values.saturation.clone(),
                });
            }
        }
        if processor.et_id.present {
            if let Some(sink) = &mut sinks.et_id {
                sink.push(ScEnergy {
                    online_id: id.online_id,
                    channel: values.latome_channel,
                    source_id: fragment.source_id,
                    energies: values.et_id.clone(),
                    bcids: bcid_window(&processor.bcids, &processor.et_id),
                    saturation: values.saturation.clone(),
                });
            }
        }
    }
}

/// Emit the accumulator records of an averaged/auto-correlation fragment.
/// Sums are rescaled to the smallest per-slot trigger count since there is
/// only one count per record downstream. The calibration path additionally
/// resolves which calibration lines pulsed the channel.
pub fn fill_accumulated(
    processor: &FragmentProcessor,
    fragment: &Fragment,
    map: &ChannelMap,
    online_offline: Option<&OnlineToOfflineMap>,
    calib_lines: Option<&CalibLineMap>,
    options: &DecodeOptions,
    sinks: &mut AccumulatedSinks,
) {
    let want_calib = sinks.calib_digits.is_some();
    let (online_offline, calib_lines) = match (online_offline, calib_lines) {
        (Some(om), Some(cl)) => (Some(om), Some(cl)),
        _ if want_calib => {
            log::error!("Do not have the calibration mappings!");
            return;
        }
        _ => (None, None),
    };
    let patterns = match fragment.calib_patterns() {
        Some(patterns) => patterns,
        None => {
            log::error!("Status block too short for calibration patterns!");
            return;
        }
    };
    let pattern_type = fragment.pattern_type();

    for ch in 0..N_LATOME_CHANNELS {
        let id = match map.lookup(fragment.source_id, ch as u32) {
            Some(id) => id,
            None => {
                log::debug!("No mapping for ch: {}", ch);
                continue;
            }
        };
        if !passes_region_filters(id.region, options) {
            continue;
        }
        let values = match processor.averaged_values.get(ch) {
            Some(values) => values,
            None => continue,
        };

        let ntmin = values.n_trig_valid.iter().copied().min().unwrap_or(0);
        let mut sums = Vec::with_capacity(values.sum.len());
        let mut sum_squares = Vec::with_capacity(values.sum.len());
        for slot in 0..values.sum.len() {
            let nt = values.n_trig_valid[slot];
            if nt == 0 {
                sums.push(0);
                sum_squares.push(0);
                continue;
            }
            let scale = ntmin as f64 / nt as f64;
            sums.push((values.sum[slot] as f64 * scale).round() as u64);
            sum_squares.push((values.sum_sq[slot] as f64 * scale).round() as u64);
        }

        if let Some(sink) = &mut sinks.digits {
            sink.push(AccumulatedDigit {
                online_id: id.online_id,
                channel: values.latome_channel,
                source_id: fragment.source_id,
                sums: sums.clone(),
                sum_squares: sum_squares.clone(),
                n_triggers: ntmin,
            });
        }

        if sinks.calib_digits.is_none() {
            continue;
        }
        let (online_offline, calib_lines) = match (online_offline, calib_lines) {
            (Some(om), Some(cl)) => (om, cl),
            _ => continue,
        };

        // which of the three patterns drives this channel depends on the
        // pattern type tag in the source id
        let pattern = if pattern_type == 0x49 || pattern_type == 0x4a {
            if id.region == Region::Barrel {
                &patterns[0]
            } else {
                &patterns[2]
            }
        } else if pattern_type > 0x48 {
            if id.region == Region::Endcap {
                &patterns[1]
            } else {
                &patterns[2]
            }
        } else {
            &patterns[0]
        };

        let mut n_lines: u32 = 0;
        let mut n_pulsed: u32 = 0;
        for cell in online_offline.offline_cells(id.online_id) {
            for line in calib_lines.calib_lines(*cell) {
                n_lines += 1;
                if pattern.is_pulsed(*line) {
                    n_pulsed += 1;
                }
            }
        }
        let mut is_pulsed = true;
        if n_pulsed != n_lines {
            if options.keep_only_pulsed {
                continue;
            }
            is_pulsed = false;
        }

        if let Some(sink) = &mut sinks.calib_digits {
            sink.push(CalibAccumulatedDigit {
                online_id: id.online_id,
                channel: values.latome_channel,
                source_id: fragment.source_id,
                sums: sums.clone(),
                sum_squares: sum_squares.clone(),
                n_triggers: ntmin,
                dac: pattern.dac * n_pulsed,
                delay: pattern.delay,
                is_pulsed,
            });
        }
    }
}

/// Emit the per-fragment header metadata record.
pub fn fill_header(
    processor: &FragmentProcessor,
    fragment: &Fragment,
    sink: &mut Option<&mut Vec<HeaderRecord>>,
) {
    if let Some(sink) = sink {
        sink.push(HeaderRecord {
            source_id: fragment.source_id,
            latome_id: processor.header.latome_id,
            n_active_channels: processor.header.active_channels,
            bcid: fragment.bcid,
            l1_id: fragment.l1_id,
            payload_size: fragment.payload.len() as u32,
        });
    }
}
