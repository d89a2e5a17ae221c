use thiserror::Error;

use super::config::ConfigError;
use super::downsample::DownsampleError;
use super::mask::MaskError;
use crate::core::io::chi_angles::ChiTableError;
use crate::core::io::dataset::DatasetError;
use crate::core::models::ids::ResidueId;
use crate::core::params::ParamLoadError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to load reconstruction parameters: {source}")]
    Params {
        #[from]
        source: ParamLoadError,
    },

    #[error("Dataset error: {source}")]
    Dataset {
        #[from]
        source: DatasetError,
    },

    #[error("Chi-angle table error: {source}")]
    ChiTable {
        #[from]
        source: ChiTableError,
    },

    #[error("Mask computation failed: {source}")]
    Mask {
        #[from]
        source: MaskError,
    },

    #[error("Downsampling record {index} ({res_id}) failed: {source}")]
    Downsample {
        index: usize,
        res_id: Box<ResidueId>,
        source: DownsampleError,
    },
}
