use super::assembler::{AccumulatedSinks, RawSinks};
use super::channel_map::{CalibLineMap, ChannelMap, OnlineToOfflineMap};
use super::config::Config;
use super::decoder::LatomeDecoder;
use super::error::{FragmentFileError, ProcessorError};
use super::fragment::Fragment;
use super::fragment_file::FragmentFile;
use super::processor::DecodeMode;

/// Read every fragment out of the dump file.
fn read_fragments(config: &Config) -> Result<Vec<Fragment>, ProcessorError> {
    let mut fragment_file = FragmentFile::new(&config.fragment_path)?;
    log::info!(
        "Total input size: {}",
        human_bytes::human_bytes(fragment_file.get_size_bytes() as f64)
    );

    let mut fragments: Vec<Fragment> = Vec::new();
    loop {
        match fragment_file.get_next_fragment() {
            Ok(fragment) => fragments.push(fragment),
            Err(FragmentFileError::EndOfFile) => break,
            Err(e) => return Err(ProcessorError::FileError(e)),
        }
    }
    log::info!("Read {} fragments.", fragments.len());
    Ok(fragments)
}

pub fn process_run(config: Config) -> Result<(), ProcessorError> {
    let channel_map = ChannelMap::new(&config.channel_map_path)?;
    let fragments = read_fragments(&config)?;
    let decoder = LatomeDecoder::new(config.options());

    match config.mode() {
        Some(DecodeMode::Raw) => {
            let mut adc = Vec::new();
            let mut adc_bas = Vec::new();
            let mut et = Vec::new();
            let mut et_id = Vec::new();
            let mut headers = Vec::new();
            let mut sinks = RawSinks {
                adc: Some(&mut adc),
                adc_bas: Some(&mut adc_bas),
                et: Some(&mut et),
                et_id: Some(&mut et_id),
                header: Some(&mut headers),
            };
            let decoded = decoder.decode_raw(&fragments, &channel_map, &mut sinks);
            log::info!(
                "Decoded {} of {} fragments: {} adc, {} baseline, {} energy, {} selected energy records.",
                decoded,
                fragments.len(),
                adc.len(),
                adc_bas.len(),
                et.len(),
                et_id.len()
            );
        }
        Some(mode @ (DecodeMode::Averaged | DecodeMode::AutoCorr)) => {
            let online_offline = match &config.online_offline_map_path {
                Some(path) => Some(OnlineToOfflineMap::new(path)?),
                None => None,
            };
            let calib_lines = match &config.calib_line_map_path {
                Some(path) => Some(CalibLineMap::new(path)?),
                None => None,
            };

            let mut digits = Vec::new();
            let mut calib_digits = Vec::new();
            let mut headers = Vec::new();
            let mut sinks = AccumulatedSinks {
                digits: if mode == DecodeMode::AutoCorr { Some(&mut digits) } else { None },
                calib_digits: if mode == DecodeMode::Averaged { Some(&mut calib_digits) } else { None },
                header: Some(&mut headers),
            };
            let decoded = decoder.decode_accumulated(
                &fragments,
                &channel_map,
                online_offline.as_ref(),
                calib_lines.as_ref(),
                &mut sinks,
            );
            log::info!(
                "Decoded {} of {} fragments: {} accumulated, {} calibration records.",
                decoded,
                fragments.len(),
                digits.len(),
                calib_digits.len()
            );
        }
        None => {
            log::error!("Unrecognized decode mode: {}", config.decode_mode);
        }
    }

    Ok(())
}
