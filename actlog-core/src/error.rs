use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActlogError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IPC error: {0}")]
    Ipc(String),
}

impl From<rmp_serde::decode::Error> for ActlogError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        ActlogError::Ipc(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for ActlogError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        ActlogError::Ipc(err.to_string())
    }
}
