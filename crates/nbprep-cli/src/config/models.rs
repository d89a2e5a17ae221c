use nbprep::engine::config::DownsampleConfig;

/// Fully resolved settings for a downsampling run.
#[derive(Debug, Clone, PartialEq)]
pub struct DownsampleSettings {
    pub core_config: DownsampleConfig,
    pub removal_probability: f64,
    pub seed: u64,
}
