use thiserror::Error;

/// Message compilation, signing and parsing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),
}

pub type Result<T> = std::result::Result<T, TxError>;
