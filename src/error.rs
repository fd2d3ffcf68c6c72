use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Random source unavailable: {0}")]
    RandomSource(String),
    #[error("Invalid Private Key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid Public Key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid Signature: {0}")]
    InvalidSignature(String),
    #[error("Deserializer DER Signature")]
    InvalidDER,
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Encoding(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
