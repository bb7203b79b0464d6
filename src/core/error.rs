use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupplierError {
    #[error("Config load error: {0}")]
    ConfigLoad(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Interrupted wait: {0}")]
    InterruptedWait(String),
}

pub type Result<T> = std::result::Result<T, SupplierError>;

impl From<std::io::Error> for SupplierError {
    fn from(err: std::io::Error) -> Self {
        Self::ConfigLoad(err.to_string())
    }
}
