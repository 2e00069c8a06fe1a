use std::path::PathBuf;

use crate::error::ServerError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_MAX_WORKERS: usize = 4;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub max_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl ServerConfig {
    /// Reads `SERVER_HOST`, `SERVER_PORT`, `FLASHGEN_DATA_DIR`, and
    /// `FLASHGEN_MAX_WORKERS`, falling back to defaults where unset.
    pub fn from_env() -> Result<Self, ServerError> {
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = match std::env::var("SERVER_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ServerError::Config(format!("SERVER_PORT must be a port number, got '{raw}'")))?,
            Err(_) => DEFAULT_PORT,
        };

        let data_dir = std::env::var("FLASHGEN_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let max_workers = match std::env::var("FLASHGEN_MAX_WORKERS") {
            Ok(raw) => {
                let parsed: usize = raw.parse().map_err(|_| {
                    ServerError::Config(format!(
                        "FLASHGEN_MAX_WORKERS must be a positive integer, got '{raw}'"
                    ))
                })?;
                if parsed == 0 {
                    return Err(ServerError::Config(
                        "FLASHGEN_MAX_WORKERS must be at least 1".to_string(),
                    ));
                }
                parsed
            }
            Err(_) => DEFAULT_MAX_WORKERS,
        };

        Ok(Self {
            host,
            port,
            data_dir,
            max_workers,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
