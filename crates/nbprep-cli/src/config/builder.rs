use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::DownsampleSettings;
use crate::cli::{ConfigArgs, SamplingArgs};
use crate::error::{CliError, Result};
use nbprep::engine::config::{DownsampleConfigBuilder, check_probability};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Resolves downsampling settings. Precedence: `--set` values, then flags, then the config
/// file, then built-in defaults.
pub fn build_downsample_settings(
    config: &ConfigArgs,
    sampling: &SamplingArgs,
) -> Result<DownsampleSettings> {
    let defaults = DefaultsConfig::default();

    let mut file_config = FileConfig::load_optional(config.config.as_deref())?;
    let mut overrides = apply_set_values(FileConfig::default(), &config.set_values)?;

    let file = file_config.downsampling.take().unwrap_or_default();
    let set = overrides.downsampling.take().unwrap_or_default();

    let capacity = set
        .capacity
        .or(sampling.capacity)
        .or(file.capacity)
        .unwrap_or(defaults.capacity);
    let max_sites = set
        .max_sites
        .or(file.max_sites)
        .unwrap_or(defaults.max_sites);
    let backbone_atoms = set
        .backbone_atoms
        .or(file.backbone_atoms)
        .unwrap_or(defaults.backbone_atoms);
    let removal_probability = set
        .removal_probability
        .or(sampling.removal_probability)
        .or(file.removal_probability)
        .unwrap_or(defaults.removal_probability);
    let seed = set
        .seed
        .or(sampling.seed)
        .or(file.seed)
        .unwrap_or(defaults.seed);

    let removal_probability =
        check_probability(removal_probability).map_err(|e| CliError::Config(e.to_string()))?;
    let core_config = DownsampleConfigBuilder::new()
        .capacity(capacity)
        .max_sites(max_sites)
        .backbone_atoms(backbone_atoms)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(DownsampleSettings {
        core_config,
        removal_probability,
        seed,
    })
}

/// Resolves the reconstruction parameter table path, if one was given anywhere.
pub fn resolve_params_path(config: &ConfigArgs, cli_params: Option<&Path>) -> Result<Option<PathBuf>> {
    let file_config = FileConfig::load_optional(config.config.as_deref())?;
    let overrides = apply_set_values(FileConfig::default(), &config.set_values)?;

    let path = overrides
        .reconstruction
        .and_then(|r| r.params_path)
        .or_else(|| cli_params.map(Path::to_path_buf))
        .or_else(|| file_config.reconstruction.and_then(|r| r.params_path));

    if let Some(path) = &path {
        if !path.exists() {
            return Err(CliError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Provided path does not exist: {}", path.display()),
            )));
        }
    }
    Ok(path)
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        match key {
            "downsampling.capacity" => {
                config
                    .downsampling
                    .get_or_insert_with(Default::default)
                    .capacity = Some(parse_value(key, value_str, "integer")?);
            }
            "downsampling.max-sites" => {
                config
                    .downsampling
                    .get_or_insert_with(Default::default)
                    .max_sites = Some(parse_value(key, value_str, "integer")?);
            }
            "downsampling.removal-probability" => {
                config
                    .downsampling
                    .get_or_insert_with(Default::default)
                    .removal_probability = Some(parse_value(key, value_str, "float")?);
            }
            "downsampling.seed" => {
                config.downsampling.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "downsampling.backbone-atoms" => {
                config
                    .downsampling
                    .get_or_insert_with(Default::default)
                    .backbone_atoms = Some(
                    value_str
                        .split(',')
                        .map(|name| name.trim().to_string())
                        .collect(),
                );
            }
            "reconstruction.params-path" => {
                config
                    .reconstruction
                    .get_or_insert_with(Default::default)
                    .params_path = Some(PathBuf::from(value_str.trim()));
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use nbprep::core::models::neighborhood::DEFAULT_CAPACITY;
    use once_cell::sync::Lazy;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    fn write_config_file(name: &str, content: &str) -> PathBuf {
        let file_path = TEST_DIR.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn parse_downsample(extra: &[&str]) -> (ConfigArgs, SamplingArgs) {
        let mut argv = vec!["nbprep", "downsample", "-i", "in.json", "-o", "out.json"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Downsample(args) => (args.config, args.sampling),
            _ => unreachable!(),
        }
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let settings =
            build_downsample_settings(&ConfigArgs::default(), &SamplingArgs::default()).unwrap();
        assert_eq!(settings.core_config.capacity, DEFAULT_CAPACITY);
        assert_eq!(settings.core_config.backbone_atoms, vec!["N", "CA", "C", "O"]);
        assert_eq!(settings.removal_probability, 0.5);
        assert_eq!(settings.seed, 0);
    }

    #[test]
    fn file_values_are_loaded() {
        let path = write_config_file(
            "file_values.toml",
            r#"
            [downsampling]
            capacity = 300
            max-sites = 50
            backbone-atoms = ["N", "CA", "C"]
            removal-probability = 0.25
            seed = 42
            "#,
        );
        let (config, sampling) = parse_downsample(&["-c", path.to_str().unwrap()]);
        let settings = build_downsample_settings(&config, &sampling).unwrap();

        assert_eq!(settings.core_config.capacity, 300);
        assert_eq!(settings.core_config.max_sites, 50);
        assert_eq!(settings.core_config.backbone_atoms, vec!["N", "CA", "C"]);
        assert_eq!(settings.removal_probability, 0.25);
        assert_eq!(settings.seed, 42);
    }

    #[test]
    fn flags_override_file_and_set_overrides_flags() {
        let path = write_config_file(
            "precedence.toml",
            "[downsampling]\ncapacity = 300\nseed = 42\nremoval-probability = 0.25\n",
        );
        let (config, sampling) = parse_downsample(&[
            "-c",
            path.to_str().unwrap(),
            "--seed",
            "7",
            "--capacity",
            "400",
            "-S",
            "downsampling.capacity=500",
            "downsampling.backbone-atoms=N, CA",
        ]);
        let settings = build_downsample_settings(&config, &sampling).unwrap();

        assert_eq!(settings.seed, 7);
        assert_eq!(settings.core_config.capacity, 500);
        assert_eq!(settings.removal_probability, 0.25);
        assert_eq!(settings.core_config.backbone_atoms, vec!["N", "CA"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let path = write_config_file("unknown.toml", "[downsampling]\nmystery = 1\n");
        let (config, sampling) = parse_downsample(&["-c", path.to_str().unwrap()]);
        assert!(matches!(
            build_downsample_settings(&config, &sampling),
            Err(CliError::FileParsing { .. })
        ));

        let (config, sampling) = parse_downsample(&["-S", "downsampling.mystery=1"]);
        assert!(matches!(
            build_downsample_settings(&config, &sampling),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for extra in [
            vec!["-p", "1.5"],
            vec!["--capacity", "0"],
            vec!["-S", "downsampling.seed=abc"],
            vec!["-S", "no-equals-sign"],
        ] {
            let (config, sampling) = parse_downsample(&extra);
            assert!(
                matches!(
                    build_downsample_settings(&config, &sampling),
                    Err(CliError::Config(_))
                ),
                "{:?}",
                extra
            );
        }
    }

    #[test]
    fn params_path_precedence_and_existence() {
        let params = write_config_file("params.json", "{}");
        let other = write_config_file("other.json", "{}");
        let path = write_config_file(
            "reconstruction.toml",
            &format!(
                "[reconstruction]\nparams-path = \"{}\"\n",
                other.display()
            ),
        );
        let config = ConfigArgs {
            config: Some(path),
            set_values: vec![],
        };

        assert_eq!(resolve_params_path(&config, None).unwrap(), Some(other.clone()));
        assert_eq!(
            resolve_params_path(&config, Some(&params)).unwrap(),
            Some(params.clone())
        );
        assert_eq!(resolve_params_path(&ConfigArgs::default(), None).unwrap(), None);

        let missing = ConfigArgs {
            config: None,
            set_values: vec!["reconstruction.params-path=/no/such/file.json".to_string()],
        };
        assert!(matches!(
            resolve_params_path(&missing, Some(&params)),
            Err(CliError::Io(_))
        ));
    }
}
