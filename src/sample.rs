use super::cursor::PayloadCursor;
use super::error::DecodeError;
use super::stream::{bytes_per_channel, StreamType};

/// One channel's decoded payload for one bunch crossing: up to two stream
/// values with their valid bits, plus the saturation flag when an energy
/// stream is active.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelSample {
    pub at0_data: u32,
    pub at1_data: u32,
    pub at0_valid: bool,
    pub at1_valid: bool,
    pub saturated: bool,
}

/// Accumulator pair for averaged and auto-correlation recipes. The sum of
/// squares is a 36-bit quantity, its top 4 bits ride in the first word.
#[derive(Debug, Clone, Copy, Default)]
pub struct AveragedSample {
    pub sum: u64,
    pub sum_sq: u64,
    pub n_trig_valid: u32,
}

/// Energies are 18-bit two's complement after the quality-byte repacking.
pub fn sign_energy(energy: u32) -> i32 {
    if energy & (1 << 17) != 0 {
        energy as i32 - (1 << 18)
    } else {
        energy as i32
    }
}

/// Decode one channel for the active stream pair of this bunch crossing.
///
/// The layout is always 2, 3, 4 or 5 bytes depending on the recipe: 15-bit
/// value plus valid bit per stream, and one quality/saturation byte if either
/// stream is an energy. The energy's 3 least significant bits and the
/// saturation flags live in that extra byte and get repacked here; ADC values
/// need no rearrangement.
pub fn decode_channel(
    cursor: &mut PayloadCursor,
    at0: StreamType,
    at1: StreamType,
) -> Result<ChannelSample, DecodeError> {
    let n_bytes = bytes_per_channel(at0, at1);
    let has_sat_byte = n_bytes % 2 == 1;

    let mut sample = ChannelSample::default();

    let word1 = cursor.next_u16()?;
    sample.at0_data = word1 & 0x7fff;
    sample.at0_valid = word1 & 0x8000 != 0;
    if n_bytes > 3 {
        let word2 = cursor.next_u16()?;
        sample.at1_data = word2 & 0x7fff;
        sample.at1_valid = word2 & 0x8000 != 0;
    }
    let mut sat_data: u32 = 0;
    if has_sat_byte {
        sat_data = cursor.next_byte()?;
    }

    if at0 == StreamType::Energy && at1 == StreamType::SelectedEnergy {
        sample.at0_data = (sample.at0_data << 3) | (sat_data & 0x7);
        sample.at1_data = (sample.at1_data << 3) | ((sat_data & 0x70) >> 4);
        sample.saturated = (sat_data & 0x88) == 0x88;
    } else if at1 == StreamType::Energy && at0 == StreamType::SelectedEnergy {
        sample.at0_data = (sample.at0_data << 3) | ((sat_data & 0x70) >> 4);
        sample.at1_data = (sample.at1_data << 3) | (sat_data & 0x7);
        sample.saturated = (sat_data & 0x88) == 0x88;
    } else {
        if at0.is_energy() {
            sample.at0_data = (sample.at0_data << 3) | (sat_data & 0x7);
            sample.saturated = sat_data & 0x20 != 0;
        }
        if at1.is_energy() {
            sample.at1_data = (sample.at1_data << 3) | (sat_data & 0x7);
            sample.saturated = sat_data & 0x20 != 0;
        }
    }

    Ok(sample)
}

/// Decode the two-word accumulator record of an averaged/auto-correlation
/// channel.
pub fn decode_averaged(cursor: &mut PayloadCursor) -> Result<AveragedSample, DecodeError> {
    let word_a = cursor.next_word()?;
    let word_b = cursor.next_word()?;
    let sum_sq_msb = ((word_a >> 28) as u64) << 32;
    Ok(AveragedSample {
        sum: (word_a & 0xFFFFF) as u64,
        sum_sq: word_b as u64 | sum_sq_msb,
        n_trig_valid: (word_a >> 20) & 0xFF,
    })
}
