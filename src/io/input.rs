use crate::defaults::CONFIG_FILE_NAME;
use crate::io::Configuration;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Reads the configuration file from the working directory. If it does not exist, the default
/// settings are used and written to the directory so that the user can see all used options.
pub fn read_input() -> Result<Configuration> {
    read_input_from(Path::new(CONFIG_FILE_NAME))
}

pub fn read_input_from(config_file_path: &Path) -> Result<Configuration> {
    let config_string: String = if config_file_path.exists() {
        fs::read_to_string(config_file_path)
            .with_context(|| format!("Unable to read {}", config_file_path.display()))?
    } else {
        String::new()
    };
    let config: Configuration = toml::from_str(&config_string)
        .with_context(|| format!("Invalid configuration in {}", config_file_path.display()))?;

    if !config_file_path.exists() {
        let config_string: String =
            toml::to_string(&config).context("Unable to serialize the configuration")?;
        fs::write(config_file_path, config_string)
            .with_context(|| format!("Unable to write {}", config_file_path.display()))?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_is_written_with_defaults() {
        let dir = std::env::temp_dir().join("tbbse_input_missing");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tbbse.toml");
        let _ = fs::remove_file(&path);
        let config: Configuration = read_input_from(&path).unwrap();
        assert!(path.exists());
        let again: Configuration = read_input_from(&path).unwrap();
        assert_eq!(config.bse.nstates, again.bse.nstates);
        assert_eq!(config.jobtype, again.jobtype);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let dir = std::env::temp_dir().join("tbbse_input_invalid");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tbbse.toml");
        fs::write(&path, "[bse]\nvalence_bands = \"four\"\n").unwrap();
        assert!(read_input_from(&path).is_err());
    }
}
