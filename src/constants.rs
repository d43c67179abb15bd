
// Monitoring packet framing
pub const MON_HEADER_MARKER: u32 = 0xff1234ff;
pub const MON_CHECKPOINT: u32 = 0xdeadbeef;
pub const MON_TRAILER_MARKER: u32 = 0xc0ffee00;
pub const MON_TRAILER_CHECK: u32 = 0xaaaaaaaa;
pub const MIN_MON_HEADER_SIZE: u32 = 18;
pub const MON_TRAILER_SIZE: usize = 2;

// Readout electronics constants
pub const N_LATOME_CHANNELS: usize = 320;
pub const N_TIMESLOTS: usize = 6;
pub const N_BUNCHES: u32 = 3564; //BCID wraps back to 0 here
pub const N_ROD_STATUS_WORDS: usize = 27;
pub const LATOME_SOURCE_ID_BIT: u32 = 0x1000;

// Sample sentinels for channels whose valid bit is off
pub const DEFAULT_ADC_VALUE: i16 = -1;
pub const DEFAULT_E_VALUE: i32 = -99999;
