use clap::Args;
use std::{fs, io, path::PathBuf};

#[derive(Debug, Clone, Args)]
pub struct BackendConfig {
    #[arg(
        long,
        env = "SONGLIB_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/songlib.db"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "SONGLIB_DATA_DIR",
        help = "Data directory (database etc.), default like ~/.local/share/songlib",
        default_value_t = default_data_dir()
    )]
    data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("songlib"))
        .unwrap_or_else(|| PathBuf::from("songlib"))
        .to_string_lossy()
        .to_string()
}

impl BackendConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Creates data directory if missing
    pub fn ensure_data_dir(&self) -> io::Result<PathBuf> {
        let dir = self.data_dir();
        if !fs::exists(&dir)? {
            fs::create_dir_all(&dir)?;
        } else if !dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Data directory {dir:?} is not a directory"),
            ));
        }
        Ok(dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/songlib.db", self.data_dir))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        backend: BackendConfig,
    }

    #[test]
    fn test_database_url_defaults_to_data_dir() {
        let cli = TestCli::try_parse_from(["test", "--data-dir", "/tmp/songs"]).unwrap();
        assert_eq!(cli.backend.database_url(), "sqlite:///tmp/songs/songlib.db");

        let cli = TestCli::try_parse_from([
            "test",
            "--data-dir",
            "/tmp/songs",
            "--database-url",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(cli.backend.database_url(), "sqlite::memory:");
    }
}
