use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("population parse error: {0}")]
    Parse(String),

    #[error("invalid schedule {0:?}: expected \"HH:MM-HH:MM\"")]
    Schedule(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EventResult<T> = Result<T, EventError>;
