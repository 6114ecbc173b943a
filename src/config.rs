use anyhow::Result;
use std::path::PathBuf;

const DEFAULT_CSV_PATH: &str = "kwh_hourly_with_losses_ids2.csv";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub csv_path: PathBuf,
}

impl AppConfig {
    /// CLI override wins over the environment; both fall back to the
    /// dataset shipped alongside the binary.
    pub fn from_env(cli_csv_path: Option<PathBuf>) -> Result<Self> {
        let csv_path = cli_csv_path
            .or_else(|| env_optional_path("HPP_CSV_PATH"))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CSV_PATH));
        if csv_path.as_os_str().is_empty() {
            anyhow::bail!("HPP_CSV_PATH resolved to an empty path");
        }
        Ok(Self { csv_path })
    }
}

fn env_optional_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_optional_path(key: &str) -> Option<PathBuf> {
    env_optional_string(key).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_path_wins_over_default() {
        let config = AppConfig::from_env(Some(PathBuf::from("/data/feb25.csv"))).expect("config");
        assert_eq!(config.csv_path, PathBuf::from("/data/feb25.csv"));
    }

    #[test]
    fn falls_back_to_bundled_dataset() {
        let config = AppConfig::from_env(None).expect("config");
        assert_eq!(config.csv_path, PathBuf::from(DEFAULT_CSV_PATH));
    }
}
