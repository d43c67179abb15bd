use super::constants::*;
use super::cursor::PayloadCursor;
use super::error::DecodeError;
use super::fragment::Fragment;
use super::header::{decode_trailer, MonHeader};
use super::sample::{decode_averaged, decode_channel, sign_energy, ChannelSample};
use super::stream::{bytes_per_channel, StreamType};

/// Which decoding the caller asked for. Averaged and auto-correlation data
/// are requested explicitly (calibration runs), never inferred from the
/// payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    Raw,
    Averaged,
    AutoCorr,
}

/// Decoded samples of one logical channel in a raw-mode event. Vectors are
/// sized to the stream's bunch-crossing window, empty when the stream is not
/// in the recipe.
#[derive(Debug, Clone, Default)]
pub struct RawChannelValues {
    pub adc: Vec<i16>,
    pub adc_bas: Vec<i16>,
    pub et: Vec<i32>,
    pub et_id: Vec<i32>,
    pub saturation: Vec<bool>,
    pub latome_channel: u32,
}

/// Accumulator buffers of one logical channel in averaged/auto-correlation
/// mode.
#[derive(Debug, Clone, Default)]
pub struct AveragedChannelValues {
    pub sum: Vec<u64>,
    pub sum_sq: Vec<u64>,
    pub n_trig_valid: Vec<u32>,
    pub latome_channel: u32,
}

/// Marks a channel that never appeared in any timeslot of the payload.
pub const UNSEEN_CHANNEL: u32 = 99999;

/// Bunch-crossing window of one output stream: how many slots it covers and
/// where the window starts relative to slot 0 of the event.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamWindow {
    pub present: bool,
    pub n_bc: usize,
    pub start_bc: usize,
}

/// # FragmentProcessor
/// Carries every piece of cross-packet decode state for exactly one
/// fragment: the compared-across-packets header, the packet boundaries, the
/// per-channel sample buffers and the decoded bunch-crossing ids. Built
/// fresh per fragment, never shared.
///
/// Output sinks are untouched until the whole slot loop has finished, so a
/// fatal error (truncation, bad header size) leaves nothing half-filled.
#[derive(Debug)]
pub struct FragmentProcessor {
    mode: DecodeMode,
    pub header: MonHeader,
    packet_ends: Vec<usize>,
    pub bcids: Vec<u32>,
    pub raw_values: Vec<RawChannelValues>,
    pub averaged_values: Vec<AveragedChannelValues>,
    pub raw_adc: StreamWindow,
    pub adc_bas: StreamWindow,
    pub et: StreamWindow,
    pub et_id: StreamWindow,
    pub n_bc_averaged: usize,
}

fn store_i16(values: &mut [i16], index: i64, value: i16) {
    match usize::try_from(index).ok().and_then(|i| values.get_mut(i)) {
        Some(slot) => *slot = value,
        None => log::warn!("sample index {} outside the stream window, dropping", index),
    }
}

fn store_i32(values: &mut [i32], index: i64, value: i32) {
    match usize::try_from(index).ok().and_then(|i| values.get_mut(i)) {
        Some(slot) => *slot = value,
        None => log::warn!("sample index {} outside the stream window, dropping", index),
    }
}

fn store_sat(values: &mut [bool], index: i64, value: bool) {
    if let Some(slot) = usize::try_from(index).ok().and_then(|i| values.get_mut(i)) {
        *slot = value;
    }
}

impl FragmentProcessor {
    pub fn new(mode: DecodeMode) -> Self {
        FragmentProcessor {
            mode,
            header: MonHeader::new(),
            packet_ends: Vec::new(),
            bcids: Vec::new(),
            raw_values: Vec::new(),
            averaged_values: Vec::new(),
            raw_adc: StreamWindow::default(),
            adc_bas: StreamWindow::default(),
            et: StreamWindow::default(),
            et_id: StreamWindow::default(),
            n_bc_averaged: 0,
        }
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Decode the fragment into the per-channel buffers. Ok(true) means data
    /// was decoded and is ready for assembly, Ok(false) means the fragment
    /// was skipped (empty, malformed envelope, wrong recipe for the requested
    /// mode). Err is fatal for this fragment only.
    pub fn decode(&mut self, fragment: &Fragment) -> Result<bool, DecodeError> {
        let p = fragment.payload.as_slice();
        if p.is_empty() {
            log::debug!("Empty fragment, skip");
            return Ok(false);
        }
        if fragment.status.len() != N_ROD_STATUS_WORDS {
            log::warn!(
                "Inconsistent number of rod header status elements: nstatus = {}",
                fragment.status.len()
            );
            return Ok(false);
        }

        // Walk every packet header before touching channel data, recording
        // where each packet's payload ends.
        let mut offset = self.header.decode(p, 0)?;
        if self.header.l1_id != fragment.l1_id {
            log::debug!(
                "Mon header L1ID {} different from envelope L1ID {}",
                self.header.l1_id,
                fragment.l1_id
            );
        }
        self.packet_ends.push(offset);
        offset = decode_trailer(p, offset, self.header.packet_index)?;
        for _ip in 1..self.header.n_packets {
            offset = self.header.decode(p, offset)?;
            self.packet_ends.push(offset);
            offset = decode_trailer(p, offset, self.header.packet_index)?;
        }
        log::debug!("end of header check, computed offset = {} nwords in payload = {}", offset, p.len());

        if let Some(last_end) = self.packet_ends.last() {
            if last_end + MON_TRAILER_SIZE != p.len() {
                log::warn!(
                    "problem in packet size loop {} != {}",
                    last_end + MON_TRAILER_SIZE,
                    p.len()
                );
            }
        }

        let (n_bc, n_bc1, start_bc1, type0, type1) = match self.mode {
            DecodeMode::Raw => match self.raw_stream_layout(fragment) {
                Some(layout) => layout,
                None => return Ok(false),
            },
            DecodeMode::Averaged | DecodeMode::AutoCorr => {
                // the recipe type rides in the high byte of the stream record
                let at0 = StreamType::from(self.header.at0_type_rec >> 24);
                let wanted = if self.mode == DecodeMode::Averaged {
                    StreamType::Averaged
                } else {
                    StreamType::AutoCorr
                };
                if at0 != wanted {
                    log::warn!(
                        "inconsistent data type {:?} with requested {:?} decoding, l1id {:#x} source {:#x}",
                        at0,
                        wanted,
                        fragment.l1_id,
                        fragment.source_id
                    );
                    return Ok(false);
                }
                let n_bc = self.header.at0_n_bc as usize;
                self.n_bc_averaged = n_bc;
                self.averaged_values = vec![
                    AveragedChannelValues {
                        sum: vec![0; n_bc],
                        sum_sq: vec![0; n_bc],
                        n_trig_valid: vec![0; n_bc],
                        latome_channel: UNSEEN_CHANNEL,
                    };
                    N_LATOME_CHANNELS
                ];
                (n_bc, self.header.at1_n_bc as usize, 0i64, at0, StreamType::Invalid)
            }
        };

        self.bcids = vec![0; n_bc];

        let header_size = self.header.header_size as usize;
        let packet_ends = self.packet_ends.clone();
        let mut cursor = PayloadCursor::new(p, &packet_ends, header_size, MON_TRAILER_SIZE);
        let mut bcid = N_BUNCHES;

        for i_bc in 0..n_bc {
            let at0 = type0;
            let mut at1 = type1;
            if type1 != StreamType::Invalid
                && ((i_bc as i64) < start_bc1 || (i_bc as i64) >= start_bc1 + n_bc1 as i64)
            {
                at1 = StreamType::Invalid;
            }
            let n_bytes = bytes_per_channel(at0, at1);

            let mut nsc: usize = 0;
            for timeslot in 0..N_TIMESLOTS {
                let slot_word = cursor.next_word()?;
                let l_bcid = slot_word >> 16;
                let mux = (slot_word >> 8) & 0xff;
                if timeslot != 0 {
                    if l_bcid != bcid {
                        log::warn!("inconsistent BCID between time slots: {} != {}", l_bcid, bcid);
                    }
                } else {
                    if bcid != N_BUNCHES {
                        // should increase by one, taking care of the wrap
                        let mut bcid_c = bcid + 1;
                        if bcid_c == N_BUNCHES {
                            bcid_c = 0;
                        }
                        if bcid_c != l_bcid {
                            log::warn!(
                                "BCID not increasing properly between samples, L1ID: {}, BCID from payload: {}, expected: {}",
                                fragment.l1_id,
                                l_bcid,
                                bcid_c
                            );
                        }
                    }
                    self.bcids[i_bc] = l_bcid;
                }
                bcid = l_bcid;
                // skip the trailing zero word after the BCID word
                cursor.advance_word();

                let timeslot_count = self.header.timeslot_channels[timeslot] as usize;
                let total_bytes = timeslot_count * n_bytes;
                // channel data is packed in 64 bit words, zero padded at the
                // end of the timeslot
                let mut n64 = total_bytes / 8;
                if total_bytes % 8 != 0 {
                    n64 += 1;
                }
                log::debug!(
                    "at BC {} timeslot {} bcid {} mux {} n64word {} at0 {:?} at1 {:?}",
                    i_bc,
                    timeslot,
                    l_bcid,
                    mux,
                    n64,
                    at0,
                    at1
                );

                let slot_start_word = cursor.word_index();
                let slot_start_packet = cursor.packet_index();

                for _ich in 0..timeslot_count {
                    match self.mode {
                        DecodeMode::Raw => {
                            let sample = decode_channel(&mut cursor, at0, at1)?;
                            self.record_raw(nsc, i_bc, at0, at1, start_bc1, &sample);
                        }
                        DecodeMode::Averaged | DecodeMode::AutoCorr => {
                            if !cursor.is_word_aligned() {
                                log::warn!("averaged data not word aligned, realigning");
                                cursor.align_word();
                            }
                            let sample = decode_averaged(&mut cursor)?;
                            let values = &mut self.averaged_values[nsc];
                            values.sum[i_bc] = sample.sum;
                            values.sum_sq[i_bc] = sample.sum_sq;
                            values.n_trig_valid[i_bc] = sample.n_trig_valid;
                            values.latome_channel = nsc as u32;
                        }
                    }
                    nsc += 1;
                }

                // consume the zero padding up to the 64 bit boundary
                cursor.align_word();
                if (cursor.word_index() - slot_start_word) % 2 == 1 {
                    cursor.advance_word();
                }
                let skips = (cursor.packet_index() - slot_start_packet)
                    * (header_size + MON_TRAILER_SIZE);
                let consumed = cursor.word_index() - slot_start_word - skips;
                if consumed != n64 * 2 {
                    log::warn!(
                        "time slice end is not padded properly: {} != {} at packet {}",
                        consumed,
                        n64 * 2,
                        cursor.packet_index()
                    );
                    // resume from the declared size, not the observed one
                    cursor.resync(slot_start_word + n64 * 2 + skips);
                }
            }
        }

        Ok(true)
    }

    /// Work out which stream covers the full slot range (type0) and where the
    /// shorter second stream's window sits, from the envelope status block
    /// and the header's per-stream BC counts.
    fn raw_stream_layout(
        &mut self,
        fragment: &Fragment,
    ) -> Option<(usize, usize, i64, StreamType, StreamType)> {
        let (at0, mut at1) = fragment.stream_types()?;
        let at0_n_bc = self.header.at0_n_bc as usize;
        let at1_n_bc = self.header.at1_n_bc as usize;
        if at1_n_bc == 0 {
            // recipe does not carry a second stream
            at1 = StreamType::Invalid;
        }

        let n_bc;
        let mut n_bc1 = 0;
        let mut start_bc1: i64 = 0;
        let type0;
        let mut type1 = StreamType::Invalid;

        if at0 != StreamType::Invalid && at1 != StreamType::Invalid {
            if at0_n_bc >= at1_n_bc {
                n_bc = at0_n_bc;
                n_bc1 = at1_n_bc;
                start_bc1 = self.header.at1_bc as i64 - self.header.at0_bc as i64;
                type0 = at0;
                type1 = at1;
            } else {
                n_bc = at1_n_bc;
                n_bc1 = at0_n_bc;
                start_bc1 = self.header.at0_bc as i64 - self.header.at1_bc as i64;
                type0 = at1;
                type1 = at0;
            }
            if start_bc1 < 0 || start_bc1 + n_bc1 as i64 > n_bc as i64 {
                log::warn!(
                    "second stream window [{}, {}) falls outside the event range of {} slots",
                    start_bc1,
                    start_bc1 + n_bc1 as i64,
                    n_bc
                );
            }
        } else if at0 != StreamType::Invalid {
            n_bc = at0_n_bc;
            type0 = at0;
        } else if at1 != StreamType::Invalid {
            n_bc = at1_n_bc;
            type0 = at1;
        } else {
            log::error!("No valid data type in the stream recipe");
            return None;
        }

        self.set_window(type0, n_bc, 0);
        if type1 != StreamType::Invalid {
            self.set_window(type1, n_bc1, start_bc1.max(0) as usize);
        }

        let n_sat = self.et.n_bc.max(self.et_id.n_bc);
        self.raw_values = vec![
            RawChannelValues {
                adc: vec![0; self.raw_adc.n_bc],
                adc_bas: vec![0; self.adc_bas.n_bc],
                et: vec![0; self.et.n_bc],
                et_id: vec![0; self.et_id.n_bc],
                saturation: vec![false; n_sat],
                latome_channel: UNSEEN_CHANNEL,
            };
            N_LATOME_CHANNELS
        ];

        Some((n_bc, n_bc1, start_bc1, type0, type1))
    }

    fn set_window(&mut self, stream: StreamType, n_bc: usize, start_bc: usize) {
        let window = StreamWindow { present: true, n_bc, start_bc };
        match stream {
            StreamType::RawAdc => self.raw_adc = window,
            StreamType::Adc => self.adc_bas = window,
            StreamType::Energy => self.et = window,
            StreamType::SelectedEnergy => self.et_id = window,
            _ => (),
        }
    }

    fn record_raw(
        &mut self,
        nsc: usize,
        i_bc: usize,
        at0: StreamType,
        at1: StreamType,
        start_bc1: i64,
        sample: &ChannelSample,
    ) {
        let values = &mut self.raw_values[nsc];
        values.latome_channel = nsc as u32;

        match at0 {
            StreamType::RawAdc => store_i16(
                &mut values.adc,
                i_bc as i64,
                if sample.at0_valid { sample.at0_data as i16 } else { DEFAULT_ADC_VALUE },
            ),
            StreamType::Adc => store_i16(
                &mut values.adc_bas,
                i_bc as i64,
                if sample.at0_valid { sample.at0_data as i16 } else { DEFAULT_ADC_VALUE },
            ),
            StreamType::Energy => {
                store_i32(
                    &mut values.et,
                    i_bc as i64,
                    if sample.at0_valid { sign_energy(sample.at0_data) } else { DEFAULT_E_VALUE },
                );
                store_sat(&mut values.saturation, i_bc as i64, sample.saturated);
            }
            StreamType::SelectedEnergy => {
                store_i32(
                    &mut values.et_id,
                    i_bc as i64,
                    if sample.at0_valid { sign_energy(sample.at0_data) } else { DEFAULT_E_VALUE },
                );
                store_sat(&mut values.saturation, i_bc as i64, sample.saturated);
            }
            _ => (),
        }

        // the second stream writes relative to its own window start
        let index1 = i_bc as i64 - start_bc1;
        match at1 {
            StreamType::RawAdc => store_i16(
                &mut values.adc,
                index1,
                if sample.at1_valid { sample.at1_data as i16 } else { DEFAULT_ADC_VALUE },
            ),
            StreamType::Adc => store_i16(
                &mut values.adc_bas,
                index1,
                if sample.at1_valid { sample.at1_data as i16 } else { DEFAULT_ADC_VALUE },
            ),
            StreamType::Energy => {
                store_i32(
                    &mut values.et,
                    index1,
                    if sample.at1_valid { sign_energy(sample.at1_data) } else { DEFAULT_E_VALUE },
                );
                store_sat(&mut values.saturation, index1, sample.saturated);
            }
            StreamType::SelectedEnergy => {
                store_i32(
                    &mut values.et_id,
                    index1,
                    if sample.at1_valid { sign_energy(sample.at1_data) } else { DEFAULT_E_VALUE },
                );
                store_sat(&mut values.saturation, index1, sample.saturated);
            }
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MonHeader;

    // Builds the payload of a well formed single packet fragment from the
    // header and the slot data.
    fn assemble_payload(header: &MonHeader, slot_words: &[u32]) -> Vec<u32> {
        let mut payload = header.encode();
        payload.extend_from_slice(slot_words);
        payload.push(MON_TRAILER_MARKER);
        payload.push(MON_TRAILER_CHECK);
        payload
    }

    fn raw_adc_header(n_bc: u32, slot_words: u32) -> MonHeader {
        MonHeader {
            latome_id: 7,
            l1_id: 0x42,
            n_packets: 1,
            packet_index: 0,
            words_per_packet: slot_words,
            header_size: 18,
            at0_type_rec: 0,
            at1_type_rec: 0,
            at0_n_bc: n_bc,
            at1_n_bc: 0,
            at0_bc: 0,
            at1_bc: 0,
            active_channels: 3,
            timeslot_channels: [2, 1, 0, 0, 0, 0],
            ..MonHeader::default()
        }
    }

    fn raw_fragment(payload: Vec<u32>) -> Fragment {
        let mut status = vec![0; N_ROD_STATUS_WORDS];
        status[8] = 0; // at0 = RawADC, at1 = RawADC (disabled via at1_n_bc = 0)
        Fragment { source_id: 0x1234, l1_id: 0x42, bcid: 77, status, payload }
    }

    // One bunch crossing of slot data for the raw_adc_header layout:
    // timeslot 0 carries two channels, timeslot 1 one, the rest are empty.
    fn raw_adc_slot(bcid: u32, ch0: u32, ch1: u32, ch2: u32) -> Vec<u32> {
        let mut words = Vec::new();
        // timeslot 0: bcid word, zero word, 2 ch x 2 bytes -> one 64 bit word
        words.push(bcid << 16);
        words.push(0);
        words.push((ch0 << 16) | ch1);
        words.push(0);
        // timeslot 1: one channel
        words.push(bcid << 16);
        words.push(0);
        words.push(ch2 << 16);
        words.push(0);
        // timeslots 2-5: only the bcid word and the trailing zero
        for _ in 2..N_TIMESLOTS {
            words.push(bcid << 16);
            words.push(0);
        }
        words
    }

    #[test]
    fn test_raw_decode_with_sentinels() {
        let mut slots = raw_adc_slot(100, 0x8064, 0x0032, 0x80c8);
        slots.extend(raw_adc_slot(101, 0x8065, 0x8033, 0x0001));
        let header = raw_adc_header(2, slots.len() as u32);
        let fragment = raw_fragment(assemble_payload(&header, &slots));

        let mut processor = FragmentProcessor::new(DecodeMode::Raw);
        assert!(processor.decode(&fragment).unwrap());

        assert_eq!(processor.bcids, vec![100, 101]);
        assert!(processor.raw_adc.present);
        assert_eq!(processor.raw_adc.n_bc, 2);
        // channel 0: valid both crossings
        assert_eq!(processor.raw_values[0].adc, vec![0x64, 0x65]);
        // channel 1: invalid in the first crossing -> sentinel
        assert_eq!(processor.raw_values[1].adc, vec![DEFAULT_ADC_VALUE, 0x33]);
        // channel 2 (timeslot 1): invalid in the second crossing
        assert_eq!(processor.raw_values[2].adc, vec![0xc8, DEFAULT_ADC_VALUE]);
        // channels never addressed stay empty
        assert!(processor.raw_values[3].adc.iter().all(|v| *v == 0));
    }

    #[test]
    fn test_bcid_gap_is_soft() {
        let mut slots = raw_adc_slot(100, 0x8064, 0x8032, 0x80c8);
        slots.extend(raw_adc_slot(102, 0x8065, 0x8033, 0x8001)); // gap of 2
        let header = raw_adc_header(2, slots.len() as u32);
        let fragment = raw_fragment(assemble_payload(&header, &slots));

        let mut processor = FragmentProcessor::new(DecodeMode::Raw);
        assert!(processor.decode(&fragment).unwrap());
        // all slots still decoded, the gap is only logged
        assert_eq!(processor.bcids, vec![100, 102]);
        assert_eq!(processor.raw_values[0].adc, vec![0x64, 0x65]);
    }

    #[test]
    fn test_bcid_wrap_is_not_a_gap() {
        let mut slots = raw_adc_slot(N_BUNCHES - 1, 0x8064, 0x8032, 0x80c8);
        slots.extend(raw_adc_slot(0, 0x8065, 0x8033, 0x8001));
        let header = raw_adc_header(2, slots.len() as u32);
        let fragment = raw_fragment(assemble_payload(&header, &slots));

        let mut processor = FragmentProcessor::new(DecodeMode::Raw);
        assert!(processor.decode(&fragment).unwrap());
        assert_eq!(processor.bcids, vec![N_BUNCHES - 1, 0]);
    }

    #[test]
    fn test_truncated_slot_data_aborts() {
        // the header promises more slot data than the packet holds
        let slots = raw_adc_slot(100, 0x8064, 0x8032, 0x80c8);
        let mut header = raw_adc_header(2, slots.len() as u32);
        header.words_per_packet = 4; // lies: real slot data is longer
        let mut payload = header.encode();
        payload.extend_from_slice(&slots[..4]);
        payload.push(MON_TRAILER_MARKER);
        payload.push(MON_TRAILER_CHECK);
        let fragment = raw_fragment(payload);

        let mut processor = FragmentProcessor::new(DecodeMode::Raw);
        match processor.decode(&fragment) {
            Err(DecodeError::Truncated(_, _)) => (),
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_two_packet_fragment() {
        let slots = raw_adc_slot(200, 0x8011, 0x8022, 0x8033);
        // split the 16 slot words over two packets of 8
        let mut first = raw_adc_header(1, 8);
        let mut second = raw_adc_header(1, 8);
        first.n_packets = 2;
        second.n_packets = 2;
        second.packet_index = 1;

        let mut payload = first.encode();
        payload.extend_from_slice(&slots[..8]);
        payload.push(MON_TRAILER_MARKER);
        payload.push(MON_TRAILER_CHECK);
        payload.extend(second.encode());
        payload.extend_from_slice(&slots[8..]);
        payload.push(MON_TRAILER_MARKER);
        payload.push(MON_TRAILER_CHECK);
        let fragment = raw_fragment(payload);

        let mut processor = FragmentProcessor::new(DecodeMode::Raw);
        assert!(processor.decode(&fragment).unwrap());
        assert_eq!(processor.header.n_packets, 2);
        assert_eq!(processor.bcids, vec![200]);
        assert_eq!(processor.raw_values[0].adc, vec![0x11]);
        assert_eq!(processor.raw_values[1].adc, vec![0x22]);
        assert_eq!(processor.raw_values[2].adc, vec![0x33]);
    }

    #[test]
    fn test_padding_consumption_with_odd_byte_total() {
        // 5 channels x 2 bytes = 10 bytes: data ends mid word, the timeslot
        // still advances by ceil(10/8) 64 bit words
        let mut header = raw_adc_header(1, 0);
        header.timeslot_channels = [5, 1, 0, 0, 0, 0];
        header.active_channels = 6;

        let mut slots = Vec::new();
        slots.push(300 << 16);
        slots.push(0);
        // 5 channels: 2.5 words of data, padded to 4
        slots.push(0x80018002);
        slots.push(0x80038004);
        slots.push(0x80050000);
        slots.push(0);
        // timeslot 1, one channel
        slots.push(300 << 16);
        slots.push(0);
        slots.push(0x80770000);
        slots.push(0);
        for _ in 2..N_TIMESLOTS {
            slots.push(300 << 16);
            slots.push(0);
        }
        header.words_per_packet = slots.len() as u32;
        let fragment = raw_fragment(assemble_payload(&header, &slots));

        let mut processor = FragmentProcessor::new(DecodeMode::Raw);
        assert!(processor.decode(&fragment).unwrap());
        assert_eq!(processor.raw_values[4].adc, vec![0x5]);
        // timeslot 1 decoded from the right offset after the padding skip
        assert_eq!(processor.raw_values[5].adc, vec![0x77]);
    }

    fn averaged_header(n_bc: u32, slot_words: u32) -> MonHeader {
        MonHeader {
            latome_id: 7,
            l1_id: 0x42,
            n_packets: 1,
            words_per_packet: slot_words,
            header_size: 18,
            at0_type_rec: 4 << 24, // averaged recipe
            at0_n_bc: n_bc,
            active_channels: 1,
            timeslot_channels: [1, 0, 0, 0, 0, 0],
            ..MonHeader::default()
        }
    }

    #[test]
    fn test_averaged_decode() {
        let mut slots = Vec::new();
        for bc in 0..2u32 {
            // timeslot 0: one channel, two full words
            slots.push((500 + bc) << 16);
            slots.push(0);
            slots.push((0x2 << 28) | (10 << 20) | (1000 + bc));
            slots.push(2000 + bc);
            for _ in 1..N_TIMESLOTS {
                slots.push((500 + bc) << 16);
                slots.push(0);
            }
        }
        let header = averaged_header(2, slots.len() as u32);
        let fragment = raw_fragment(assemble_payload(&header, &slots));

        let mut processor = FragmentProcessor::new(DecodeMode::Averaged);
        assert!(processor.decode(&fragment).unwrap());
        assert_eq!(processor.n_bc_averaged, 2);
        let values = &processor.averaged_values[0];
        assert_eq!(values.sum, vec![1000, 1001]);
        assert_eq!(values.n_trig_valid, vec![10, 10]);
        assert_eq!(values.sum_sq, vec![0x2_0000_07d0, 0x2_0000_07d1]);
    }

    #[test]
    fn test_wrong_recipe_for_requested_mode_is_skipped() {
        let header = averaged_header(1, 0);
        let mut payload = header.encode();
        payload.push(MON_TRAILER_MARKER);
        payload.push(MON_TRAILER_CHECK);
        let fragment = raw_fragment(payload);

        // header says averaged, caller asked for auto-correlation
        let mut processor = FragmentProcessor::new(DecodeMode::AutoCorr);
        assert_eq!(processor.decode(&fragment).unwrap(), false);
    }

    #[test]
    fn test_empty_and_malformed_envelopes_are_skipped() {
        let mut processor = FragmentProcessor::new(DecodeMode::Raw);
        let empty = Fragment::default();
        assert_eq!(processor.decode(&empty).unwrap(), false);

        let mut processor = FragmentProcessor::new(DecodeMode::Raw);
        let bad_status = Fragment {
            status: vec![0; 5],
            payload: vec![0; 30],
            ..Fragment::default()
        };
        assert_eq!(processor.decode(&bad_status).unwrap(), false);
    }

    #[test]
    fn test_two_stream_energy_recipe() {
        // at0 = Energy covering 2 crossings, at1 = SelectedEnergy covering
        // just the second one
        let mut header = raw_adc_header(2, 0);
        header.at0_n_bc = 2;
        header.at1_n_bc = 1;
        header.at0_bc = 20;
        header.at1_bc = 21;
        header.timeslot_channels = [1, 0, 0, 0, 0, 0];
        header.active_channels = 1;

        let mut slots = Vec::new();
        // BC 0: only energy active, 3 bytes per channel
        slots.push(40 << 16);
        slots.push(0);
        slots.push(0x80012000); // value 1, saturation bit set
        slots.push(0);
        for _ in 1..N_TIMESLOTS {
            slots.push(40 << 16);
            slots.push(0);
        }
        // BC 1: both active, 5 bytes per channel
        slots.push(41 << 16);
        slots.push(0);
        slots.push(0x80028003); // energy word, selected energy word
        slots.push(0x88000000); // both saturation flags
        for _ in 1..N_TIMESLOTS {
            slots.push(41 << 16);
            slots.push(0);
        }
        header.words_per_packet = slots.len() as u32;

        let mut status = vec![0; N_ROD_STATUS_WORDS];
        status[8] = 2 | (3 << 2); // at0 = Energy, at1 = SelectedEnergy
        let fragment = Fragment {
            source_id: 0x1234,
            l1_id: 0x42,
            bcid: 77,
            status,
            payload: assemble_payload(&header, &slots),
        };

        let mut processor = FragmentProcessor::new(DecodeMode::Raw);
        assert!(processor.decode(&fragment).unwrap());
        assert!(processor.et.present);
        assert!(processor.et_id.present);
        assert_eq!(processor.et.n_bc, 2);
        assert_eq!(processor.et_id.n_bc, 1);
        assert_eq!(processor.et_id.start_bc, 1);
        let values = &processor.raw_values[0];
        assert_eq!(values.et, vec![1 << 3, 2 << 3]);
        assert_eq!(values.et_id, vec![3 << 3]);
        assert_eq!(values.saturation, vec![true, true]);
    }
}
