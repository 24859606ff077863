use std::path::{Path, PathBuf};

pub const DB_ENV: &str = "JOBBOARD_DB";
pub const DEFAULT_COLLECTION: &str = "jobs";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub collection: String,
}

impl Config {
    /// `--db` wins, then `JOBBOARD_DB`, then the platform data directory.
    pub fn resolve(db_override: Option<&Path>) -> Self {
        let env_path = std::env::var_os(DB_ENV).map(PathBuf::from);
        Self::from_sources(db_override, env_path)
    }

    fn from_sources(db_override: Option<&Path>, env_path: Option<PathBuf>) -> Self {
        let db_path = db_override
            .map(Path::to_path_buf)
            .or(env_path.filter(|p| !p.as_os_str().is_empty()))
            .unwrap_or_else(default_db_path);
        Self {
            db_path,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

fn default_db_path() -> PathBuf {
    // Use XDG data directory or fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobboard") {
        proj_dirs.data_dir().join("jobboard.db")
    } else {
        PathBuf::from("jobboard.db")
    }
}
