#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Chaintree(#[from] chaintree::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
