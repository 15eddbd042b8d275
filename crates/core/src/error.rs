use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("The game {0:?} does not exist")]
    ProfileNotFound(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
