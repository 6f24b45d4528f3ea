use log::error;
use serde::{Deserialize, Serialize};

/// Successful authorization result: the OAuth code plus the state echo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub code: String,
    pub state: String,
}

/// Result of a mini-program launch: the extension message the mini-program
/// handed back on exit, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MiniProgramResult {
    pub ext_msg: Option<String>,
}

/// One selected invoice card from the WeChat card package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCard {
    #[serde(default)]
    pub card_id: String,
    #[serde(default)]
    pub encrypt_code: String,
}

/// Parse the JSON card list WeChat attaches to an invoice-selection response.
///
/// An empty or malformed list yields no cards; malformed input is logged
/// rather than surfaced, matching how WeChat clients tolerate this payload.
pub fn parse_card_list(raw: &str) -> Vec<InvoiceCard> {
    if raw.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(cards) => cards,
        Err(e) => {
            error!("failed to parse invoice card list: {e}");
            Vec::new()
        }
    }
}
