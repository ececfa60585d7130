use thiserror::Error;

/// Typed failures surfaced by registry mutations. Everything else comes back
/// as a plain `anyhow::Error` from the sqlite layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A host mapping referenced a target domain we have no record of. The
    /// whole call is rejected before anything is written.
    #[error("no target domain record found for '{0}'")]
    UnknownTarget(String),
    /// A success report carried content that does not base64-decode.
    #[error("result content cannot be base64-decoded")]
    InvalidContent,
}
