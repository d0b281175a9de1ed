use std::{
    env, fs,
    path::{Path, PathBuf},
};

use dotenvy::dotenv;

use crate::error::{Error, Result};

pub const DEFAULT_DB_ENGINE: &str = "sqlite://data/history_bot.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_engine: String,
    pub data_dir: PathBuf,
    pub media_dir: PathBuf,
    pub questions_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".into()));
        let mut config = Self::with_data_dir(data_dir);
        if let Ok(engine) = env::var("DB_ENGINE") {
            config.db_engine = engine;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            config.log_level = level;
        }
        config
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            db_engine: DEFAULT_DB_ENGINE.to_owned(),
            media_dir: data_dir.join("media"),
            questions_dir: data_dir.join("questions"),
            data_dir,
            log_level: "info".to_owned(),
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.media_dir.join("images")
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            self.data_dir.as_path(),
            self.media_dir.as_path(),
            self.images_dir().as_path(),
            self.questions_dir.as_path(),
        ] {
            create_dir(dir)?;
        }
        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}
