use thiserror::Error;

use crate::types::{codes, OperationKind};

/// Classification of a non-success WeChat result code.
///
/// The raw code is preserved alongside the classification in
/// [`BridgeError::Vendor`] so callers can branch on vendor specifics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorFault {
    /// The user dismissed the WeChat screen without completing the operation.
    UserCancelled,
    /// The user refused the authorization request.
    AuthDenied,
    /// WeChat accepted the request but failed to deliver it.
    SendFailed,
    /// The installed WeChat version does not support this operation.
    Unsupported,
    /// Any other vendor-reported failure.
    Other,
}

impl VendorFault {
    /// Classify a raw `BaseResp` error code.
    pub fn from_code(code: i32) -> Self {
        match code {
            codes::USER_CANCELLED => VendorFault::UserCancelled,
            codes::AUTH_DENIED => VendorFault::AuthDenied,
            codes::SENT_FAILED => VendorFault::SendFailed,
            codes::UNSUPPORTED => VendorFault::Unsupported,
            _ => VendorFault::Other,
        }
    }
}

impl std::fmt::Display for VendorFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            VendorFault::UserCancelled => "user cancelled",
            VendorFault::AuthDenied => "authorization denied",
            VendorFault::SendFailed => "send request failed",
            VendorFault::Unsupported => "operation not supported by WeChat",
            VendorFault::Other => "WeChat error",
        };
        f.write_str(message)
    }
}

/// Failures while fetching or decoding an image source.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unrecognized media source scheme: {0}")]
    UnsupportedScheme(String),

    #[error("media source not found: {0}")]
    NotFound(String),

    #[error("media fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("media fetch returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid inline media data: {0}")]
    InlineData(#[from] base64::DecodeError),

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("media worker failed: {0}")]
    Worker(String),
}

/// Bridge error types
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge has no WeChat credentials, or a credential is malformed.
    #[error("WeChat SDK is not configured: {0}")]
    Config(String),

    /// The WeChat application is absent from the device.
    #[error("WeChat is not installed on this device")]
    NotInstalled,

    /// A request of the same operation kind is already awaiting its response.
    #[error("another {0} request is already in progress")]
    InProgress(OperationKind),

    /// A required parameter is missing or empty.
    #[error("missing or empty parameter: {0}")]
    Validation(&'static str),

    /// An image source could not be loaded for sharing.
    #[error("unable to load media content for sharing: {0}")]
    Media(#[from] MediaError),

    /// The vendor SDK refused the dispatch synchronously, or the bridge
    /// shut down before a response arrived.
    #[error("failed to send request to WeChat: {0}")]
    Dispatch(String),

    /// WeChat delivered a non-success response; `code` is the raw vendor code.
    #[error("{fault} (code={code})")]
    Vendor { fault: VendorFault, code: i32 },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_classification() {
        assert_eq!(VendorFault::from_code(-2), VendorFault::UserCancelled);
        assert_eq!(VendorFault::from_code(-4), VendorFault::AuthDenied);
        assert_eq!(VendorFault::from_code(-3), VendorFault::SendFailed);
        assert_eq!(VendorFault::from_code(-5), VendorFault::Unsupported);
        assert_eq!(VendorFault::from_code(-1), VendorFault::Other);
        assert_eq!(VendorFault::from_code(-99), VendorFault::Other);
    }

    #[test]
    fn test_vendor_error_keeps_raw_code() {
        let err = BridgeError::Vendor {
            fault: VendorFault::UserCancelled,
            code: -2,
        };
        assert_eq!(err.to_string(), "user cancelled (code=-2)");
    }

    #[test]
    fn test_in_progress_names_kind() {
        let err = BridgeError::InProgress(OperationKind::Pay);
        assert!(err.to_string().contains("pay"));
    }
}
