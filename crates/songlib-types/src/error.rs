pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid date {0:?}, expected format dd.mm.yyyy: {1}")]
    InvalidDate(String, #[source] time::error::Parse),
}
