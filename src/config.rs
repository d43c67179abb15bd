use std::path::{Path, PathBuf};

use serde_derive::{Deserialize, Serialize};

use super::decoder::DecodeOptions;
use super::error::ConfigError;
use super::processor::DecodeMode;

/// # Config
/// Structure representing the application configuration: where the fragment
/// dump and mapping files live, which decoding to run and the channel
/// filters. Configs are serializable and deserializable to YAML using serde
/// and serde_yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub fragment_path: PathBuf,
    pub channel_map_path: PathBuf,
    pub online_offline_map_path: Option<PathBuf>,
    pub calib_line_map_path: Option<PathBuf>,
    pub decode_mode: String,
    pub ignore_barrel: bool,
    pub ignore_endcap: bool,
    pub protect_source_id: bool,
    pub keep_only_pulsed: bool,
}

impl Config {
    #[allow(dead_code)]
    pub fn default() -> Self {
        Self {
            fragment_path: PathBuf::from("None"),
            channel_map_path: PathBuf::from("None"),
            online_offline_map_path: None,
            calib_line_map_path: None,
            decode_mode: String::from("raw"),
            ignore_barrel: false,
            ignore_endcap: false,
            protect_source_id: true,
            keep_only_pulsed: false,
        }
    }

    /// Read the configuration in a YAML file
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    pub fn options(&self) -> DecodeOptions {
        DecodeOptions {
            protect_source_id: self.protect_source_id,
            ignore_barrel: self.ignore_barrel,
            ignore_endcap: self.ignore_endcap,
            keep_only_pulsed: self.keep_only_pulsed,
        }
    }

    /// The requested decoding, None if the mode string is not recognized
    pub fn mode(&self) -> Option<DecodeMode> {
        match self.decode_mode.as_str() {
            "raw" => Some(DecodeMode::Raw),
            "averaged" => Some(DecodeMode::Averaged),
            "autocorr" => Some(DecodeMode::AutoCorr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let yaml = "fragment_path: /data/run_0042.dat\n\
                    channel_map_path: /maps/channels.csv\n\
                    online_offline_map_path: /maps/on_off.csv\n\
                    calib_line_map_path: null\n\
                    decode_mode: averaged\n\
                    ignore_barrel: false\n\
                    ignore_endcap: true\n\
                    protect_source_id: true\n\
                    keep_only_pulsed: false\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.fragment_path, PathBuf::from("/data/run_0042.dat"));
        assert_eq!(config.mode(), Some(DecodeMode::Averaged));
        assert!(config.calib_line_map_path.is_none());
        assert!(config.options().ignore_endcap);
        assert!(!config.options().ignore_barrel);

        let back = serde_yaml::to_string(&config).unwrap();
        let again: Config = serde_yaml::from_str(&back).unwrap();
        assert_eq!(again.decode_mode, config.decode_mode);
        assert_eq!(again.fragment_path, config.fragment_path);
    }

    #[test]
    fn test_unknown_mode() {
        let mut config = Config::default();
        config.decode_mode = String::from("transverse");
        assert_eq!(config.mode(), None);
    }
}
