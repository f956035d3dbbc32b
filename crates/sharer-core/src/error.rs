use thiserror::Error;

pub type SharerResult<T> = Result<T, SharerError>;

/// Text shown for every failed decrypt attempt, whatever the cause.
pub const DECRYPT_FAILED_MESSAGE: &str =
    "Decryption failed. Stored partial data was cleared; scan both QR codes again.";

#[derive(Debug, Error)]
pub enum SharerError {
    /// The OS random source could not be read. Fatal.
    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    /// Wrong security code, wrong base key, or a tampered payload.
    #[error("authentication failed")]
    AuthenticationFailure,

    #[error("decompression failed")]
    DecompressionFailure,

    #[error("relay unavailable: {0}")]
    RelayUnavailable(String),

    #[error("malformed scan: {0}")]
    MalformedScan(String),

    #[error("invalid security code: {0}")]
    InvalidSecurityCode(String),

    #[error("invalid base key: {0}")]
    InvalidKey(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SharerError {
    /// True for the failures that end a decrypt attempt and force a rescan.
    pub fn is_decrypt_failure(&self) -> bool {
        matches!(
            self,
            SharerError::AuthenticationFailure | SharerError::DecompressionFailure
        )
    }

    /// Message suitable for an end user.
    ///
    /// Authentication and decompression failures share one message so the
    /// user cannot tell a wrong code from a damaged payload.
    pub fn user_message(&self) -> String {
        match self {
            SharerError::AuthenticationFailure | SharerError::DecompressionFailure => {
                DECRYPT_FAILED_MESSAGE.to_string()
            }
            SharerError::RelayUnavailable(_) => {
                "Temporary storage is unavailable; scan both codes in one session.".to_string()
            }
            SharerError::MalformedScan(_) => {
                "That QR code is not part of a secret. Keep scanning.".to_string()
            }
            SharerError::InvalidSecurityCode(_) => {
                "The security code must be exactly 8 characters.".to_string()
            }
            other => other.to_string(),
        }
    }
}
