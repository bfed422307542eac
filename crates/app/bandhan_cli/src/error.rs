use bandhan_core::api::ApiError;
use bandhan_core::auth::AuthError;
use bandhan_core::auth::normalize::ErrorRecord;
use bandhan_core::config::ConfigError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    /// A failure already shown to the user as an error banner.
    #[error("{}", .0)]
    Reported(ErrorRecord),

    #[error("IO::{:?}: {}", .0, .0)]
    Io(#[from] std::io::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("Config: {}", .0)]
    Config(#[from] ConfigError),

    #[error("Api: {}", .0)]
    Api(#[from] ApiError),

    #[error("Auth: {}", .0)]
    Auth(#[from] AuthError),
}
