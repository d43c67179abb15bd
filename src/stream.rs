
const RAW_ADC_VAL: u32 = 0;
const ADC_VAL: u32 = 1;
const ENERGY_VAL: u32 = 2;
const SELECTED_ENERGY_VAL: u32 = 3;
const AVERAGED_VAL: u32 = 4;
const AUTOCORR_VAL: u32 = 5;

/// One of the data kinds the firmware can multiplex onto a monitoring stream.
/// Anything outside the known range maps to Invalid, which is also the value
/// used for "this slot has no second stream".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    RawAdc,
    Adc,
    Energy,
    SelectedEnergy,
    Averaged,
    AutoCorr,
    Invalid,
}

impl From<u32> for StreamType {
    fn from(value: u32) -> Self {
        match value {
            RAW_ADC_VAL => StreamType::RawAdc,
            ADC_VAL => StreamType::Adc,
            ENERGY_VAL => StreamType::Energy,
            SELECTED_ENERGY_VAL => StreamType::SelectedEnergy,
            AVERAGED_VAL => StreamType::Averaged,
            AUTOCORR_VAL => StreamType::AutoCorr,
            _ => StreamType::Invalid,
        }
    }
}

impl StreamType {
    pub fn is_energy(&self) -> bool {
        matches!(self, StreamType::Energy | StreamType::SelectedEnergy)
    }
}

/// Number of payload bytes one channel occupies for the active stream pair.
/// Averaged and auto-correlation data are packed as two full words; otherwise
/// 2 bytes per active stream plus a quality/saturation byte when either
/// stream carries an energy.
pub fn bytes_per_channel(at0: StreamType, at1: StreamType) -> usize {
    if at0 == StreamType::Averaged || at0 == StreamType::AutoCorr {
        return 8;
    }
    let mut b = 0;
    if at0 != StreamType::Invalid {
        b += 2;
    }
    if at1 != StreamType::Invalid {
        b += 2;
    }
    if at0.is_energy() || at1.is_energy() {
        b += 1;
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_type_from_word() {
        assert_eq!(StreamType::from(0), StreamType::RawAdc);
        assert_eq!(StreamType::from(3), StreamType::SelectedEnergy);
        assert_eq!(StreamType::from(5), StreamType::AutoCorr);
        assert_eq!(StreamType::from(15), StreamType::Invalid);
        assert_eq!(StreamType::from(0xbeef), StreamType::Invalid);
    }

    #[test]
    fn test_bytes_per_channel() {
        assert_eq!(bytes_per_channel(StreamType::Averaged, StreamType::Invalid), 8);
        assert_eq!(bytes_per_channel(StreamType::AutoCorr, StreamType::Invalid), 8);
        assert_eq!(bytes_per_channel(StreamType::RawAdc, StreamType::Invalid), 2);
        assert_eq!(bytes_per_channel(StreamType::RawAdc, StreamType::Adc), 4);
        assert_eq!(bytes_per_channel(StreamType::Energy, StreamType::Invalid), 3);
        assert_eq!(bytes_per_channel(StreamType::Energy, StreamType::SelectedEnergy), 5);
        assert_eq!(bytes_per_channel(StreamType::Adc, StreamType::Energy), 5);
        assert_eq!(bytes_per_channel(StreamType::Invalid, StreamType::Invalid), 0);
    }
}
