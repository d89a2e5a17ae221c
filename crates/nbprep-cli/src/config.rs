mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_downsample_settings, resolve_params_path};
