/// Errors returned by ring lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The ring has no registered nodes, so no key can be placed.
    #[error("no nodes available")]
    NoNodesAvailable,
}

pub type Result<T> = std::result::Result<T, Error>;
