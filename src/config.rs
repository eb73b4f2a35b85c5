// Dashboard configuration
// The data directory is fixed by layout, not by flags or environment.

use std::path::{Path, PathBuf};

pub const AFFORDABILITY_FILE: &str = "affordability_final.csv";
pub const FOOD_PRICES_FILE: &str = "food_afford.csv";
pub const ITEM_SUMMARY_FILE: &str = "item_summary.csv";
pub const TAG_SUMMARY_FILE: &str = "tag_summary.csv";

pub const DATA_DIR_NAME: &str = "data";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub bind_addr: String,
}

impl DashboardConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }

    /// Resolve `data/` one level above the running executable's directory,
    /// falling back to `./data` when that directory does not exist.
    pub fn from_executable() -> Self {
        let exe_relative = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(data_dir_for));

        match exe_relative {
            Some(dir) if dir.is_dir() => Self::new(dir),
            _ => Self::new(PathBuf::from(DATA_DIR_NAME)),
        }
    }

    pub fn affordability_path(&self) -> PathBuf {
        self.data_dir.join(AFFORDABILITY_FILE)
    }

    pub fn food_prices_path(&self) -> PathBuf {
        self.data_dir.join(FOOD_PRICES_FILE)
    }

    pub fn item_summary_path(&self) -> PathBuf {
        self.data_dir.join(ITEM_SUMMARY_FILE)
    }

    pub fn tag_summary_path(&self) -> PathBuf {
        self.data_dir.join(TAG_SUMMARY_FILE)
    }
}

/// `<exe_dir>/../data`
pub fn data_dir_for(exe_dir: &Path) -> PathBuf {
    exe_dir.join("..").join(DATA_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_is_sibling_of_exe_dir() {
        let dir = data_dir_for(Path::new("/opt/dashboard/bin"));
        assert_eq!(dir, PathBuf::from("/opt/dashboard/bin/../data"));
    }

    #[test]
    fn test_file_paths() {
        let config = DashboardConfig::new("/srv/data");
        assert_eq!(config.affordability_path(), PathBuf::from("/srv/data/affordability_final.csv"));
        assert_eq!(config.food_prices_path(), PathBuf::from("/srv/data/food_afford.csv"));
        assert_eq!(config.item_summary_path(), PathBuf::from("/srv/data/item_summary.csv"));
        assert_eq!(config.tag_summary_path(), PathBuf::from("/srv/data/tag_summary.csv"));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }
}
