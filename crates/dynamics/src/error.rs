use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DynamicsError {
    #[error("ensemble has not been fitted yet")]
    NotFitted,
    #[error("cannot fit an ensemble on an empty dataset")]
    EmptyDataset,
    #[error("{what} dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("ensemble member {index} out of range ({members} members)")]
    InvalidMember { index: usize, members: usize },
    #[error("normal equations of member {member} are not positive definite")]
    SingularSystem { member: usize },
    #[error("invalid action space: {0}")]
    InvalidActionSpace(String),
}
