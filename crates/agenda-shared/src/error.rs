use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgendaError {
    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    #[error("Unknown friendship status: {0}")]
    UnknownFriendshipStatus(String),
}
