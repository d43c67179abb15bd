use super::constants::*;
use super::error::DecodeError;

/// Set the field on the first packet, compare against it on later ones.
fn compare_or_set(param: &mut u32, value: u32, compare: bool) -> bool {
    if !compare {
        *param = value;
        return true;
    }
    *param == value
}

/// # MonHeader
/// The fixed-layout monitoring header opening every packet of a fragment.
/// One MonHeader lives for the whole fragment: the first packet sets every
/// field, each later packet is compared word by word against it and any
/// mismatch is collected into a bitmask and logged, never fatal. The header
/// size is the one hard requirement.
#[derive(Debug, Clone, Default)]
pub struct MonHeader {
    pub latome_id: u32,
    pub l1_id: u32,
    pub n_packets: u32,
    pub packet_index: u32,
    pub words_per_packet: u32,
    pub header_size: u32,
    pub at0_type_rec: u32,
    pub at1_type_rec: u32,
    pub at0_n_bc: u32,
    pub at1_n_bc: u32,
    pub at0_bc: u32,
    pub at1_bc: u32,
    pub active_channels: u32,
    pub timeslot_channels: [u32; 6],
    pub decoded: bool,
}

impl MonHeader {
    pub fn new() -> Self {
        MonHeader::default()
    }

    /// Decode one packet header starting at `offset` and return the word
    /// offset of the packet's trailer (start of header + header size + packet
    /// payload size).
    pub fn decode(&mut self, p: &[u32], offset: usize) -> Result<usize, DecodeError> {
        if p.len() < offset + MIN_MON_HEADER_SIZE as usize {
            return Err(DecodeError::Truncated(offset + MIN_MON_HEADER_SIZE as usize - 1, p.len()));
        }

        let mut error_bits: u32 = 0;
        let mut error_bit: u32 = 0;
        let decoded = self.decoded;

        if !compare_or_set(&mut self.latome_id, p[offset], decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;
        if !compare_or_set(&mut self.l1_id, p[offset + 1], decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;
        log::debug!("latomeID: {} l1ID: {}", self.latome_id, self.l1_id);

        let marker = p[offset + 2];
        let checkpoint = p[offset + 4];
        if marker != MON_HEADER_MARKER {
            error_bits |= 1 << error_bit;
            log::warn!("Problem in monHeaderMarker: {:#010x}", marker);
        }
        error_bit += 1;
        if checkpoint != MON_CHECKPOINT {
            error_bits |= 1 << error_bit;
            log::warn!("Problem in monCheckPoint: {:#010x}", checkpoint);
        }
        error_bit += 1;

        if !compare_or_set(&mut self.n_packets, p[offset + 3] >> 24, decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;

        if self.n_packets == 0xFF {
            // single packet recipe, the size takes the full low 24 bits
            self.n_packets = 1;
            self.packet_index = 0;
            self.words_per_packet = (p[offset + 3] & 0xffffff) / 4;
        } else {
            if decoded {
                self.packet_index += 1;
            } else {
                self.packet_index = 0;
            }
            if !compare_or_set(&mut self.packet_index, (p[offset + 3] >> 16) & 0xf, decoded) {
                error_bits |= 1 << error_bit;
            }
            self.words_per_packet = (p[offset + 3] & 0xffff) / 4;
        }
        error_bit += 1;

        if !compare_or_set(&mut self.header_size, p[offset + 5], decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;

        // Newer firmware may only ever append words, so anything shorter than
        // 18 cannot be this format.
        if self.header_size < MIN_MON_HEADER_SIZE {
            log::error!("Mon header size should not be less than 18: {}", self.header_size);
            return Err(DecodeError::HeaderSizeInvalid(self.header_size));
        }

        log::debug!(
            "nPackets: {} iPacket: {} nWordsPerPacket: {} monHeaderSize: {}",
            self.n_packets,
            self.packet_index,
            self.words_per_packet,
            self.header_size
        );

        // Stream records here are informational, the authoritative types come
        // from the envelope status block.
        if !compare_or_set(&mut self.at0_type_rec, p[offset + 9], decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;
        if !compare_or_set(&mut self.at1_type_rec, p[offset + 12], decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;

        if !compare_or_set(&mut self.at0_n_bc, p[offset + 10], decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;
        if !compare_or_set(&mut self.at1_n_bc, p[offset + 13], decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;
        if !compare_or_set(&mut self.at0_bc, p[offset + 11], decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;
        if !compare_or_set(&mut self.at1_bc, p[offset + 14], decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;
        if !compare_or_set(&mut self.active_channels, p[offset + 15], decoded) {
            error_bits |= 1 << error_bit;
        }
        error_bit += 1;

        let counts = [
            p[offset + 16] >> 24,
            (p[offset + 16] >> 16) & 0xff,
            (p[offset + 16] >> 8) & 0xff,
            p[offset + 16] & 0xff,
            p[offset + 17] >> 24,
            (p[offset + 17] >> 16) & 0xff,
        ];
        for (slot, count) in counts.iter().enumerate() {
            if !compare_or_set(&mut self.timeslot_channels[slot], *count, decoded) {
                error_bits |= 1 << error_bit;
            }
            error_bit += 1;
        }

        if error_bits != 0 {
            log::warn!(
                "consistency error in mon header at packet {} errorbits {:#x}",
                self.packet_index,
                error_bits
            );
        }

        self.decoded = true;
        Ok(offset + self.header_size as usize + self.words_per_packet as usize)
    }

    /// Re-encode the header fields into `header_size` words. Words the decoder
    /// does not interpret are zero.
    #[allow(dead_code)]
    pub fn encode(&self) -> Vec<u32> {
        let mut words = vec![0u32; self.header_size as usize];
        words[0] = self.latome_id;
        words[1] = self.l1_id;
        words[2] = MON_HEADER_MARKER;
        words[3] = (self.n_packets << 24) | (self.packet_index << 16) | (self.words_per_packet * 4);
        words[4] = MON_CHECKPOINT;
        words[5] = self.header_size;
        words[9] = self.at0_type_rec;
        words[10] = self.at0_n_bc;
        words[11] = self.at0_bc;
        words[12] = self.at1_type_rec;
        words[13] = self.at1_n_bc;
        words[14] = self.at1_bc;
        words[15] = self.active_channels;
        words[16] = (self.timeslot_channels[0] << 24)
            | (self.timeslot_channels[1] << 16)
            | (self.timeslot_channels[2] << 8)
            | self.timeslot_channels[3];
        words[17] = (self.timeslot_channels[4] << 24) | (self.timeslot_channels[5] << 16);
        words
    }
}

/// Check the fixed two-word trailer closing a packet and return the offset of
/// the next packet's header. A wrong trailer is logged but never fatal.
pub fn decode_trailer(p: &[u32], offset: usize, packet_index: u32) -> Result<usize, DecodeError> {
    if p.len() < offset + MON_TRAILER_SIZE {
        return Err(DecodeError::Truncated(offset + MON_TRAILER_SIZE - 1, p.len()));
    }
    if p[offset] != MON_TRAILER_MARKER || p[offset + 1] != MON_TRAILER_CHECK {
        log::warn!(
            "Problem in trailer at packet {} words {:#010x}, {:#010x}",
            packet_index,
            p[offset],
            p[offset + 1]
        );
    }
    Ok(offset + MON_TRAILER_SIZE)
}
