//! Request builders per operation kind
//!
//! Converts a typed, validated call into the request shape the vendor SDK
//! dispatches. Validation failures surface before anything touches the
//! pending-call registry.

use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use uuid::Uuid;

use crate::error::BridgeError;
use crate::media::{self, MediaLoader, PRIMARY_MAX_EDGE, THUMB_MAX_EDGE};
use crate::types::{AppId, MiniProgramType, OperationKind, Scene};

/// One of the five request shapes understood by the WeChat Open SDK.
#[derive(Debug, Clone, PartialEq)]
pub enum VendorRequest {
    Share(ShareRequest),
    Auth(AuthRequest),
    Pay(PayRequest),
    LaunchMiniProgram(MiniProgramRequest),
    ChooseInvoice(InvoiceRequest),
}

impl VendorRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            VendorRequest::Share(_) => OperationKind::Share,
            VendorRequest::Auth(_) => OperationKind::Auth,
            VendorRequest::Pay(_) => OperationKind::Pay,
            VendorRequest::LaunchMiniProgram(_) => OperationKind::MiniProgram,
            VendorRequest::ChooseInvoice(_) => OperationKind::Invoice,
        }
    }
}

/// `SendMessageToWX.Req`: a media message plus its destination scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRequest {
    /// Opaque correlation string handed to the vendor layer. The bridge
    /// itself correlates by [`OperationKind`], never by transaction.
    pub transaction: String,
    pub scene: Scene,
    pub message: MediaMessage,
}

/// `WXMediaMessage`: shared envelope around the media object.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaMessage {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumb_data: Option<Vec<u8>>,
    pub media: MediaObject,
}

/// The vendor media object variants the bridge can build.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaObject {
    Text(String),
    /// PNG-encoded primary image bytes.
    Image(Vec<u8>),
    Webpage(String),
    Music(String),
    Video(String),
    MiniProgramCard {
        username: String,
        path: Option<String>,
        program_type: MiniProgramType,
        web_page_url: Option<String>,
    },
}

/// `SendAuth.Req`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub scope: String,
    pub state: String,
}

/// `PayReq`: the six server-signed payment fields plus the app id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayRequest {
    pub app_id: String,
    pub partner_id: String,
    pub prepay_id: String,
    pub nonce_str: String,
    pub time_stamp: String,
    pub package_value: String,
    pub sign: String,
}

/// `WXLaunchMiniProgram.Req`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiniProgramRequest {
    pub username: String,
    pub path: Option<String>,
    pub program_type: MiniProgramType,
}

/// `ChooseCardFromWXCardPackage.Req` restricted to invoice selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
    pub app_id: String,
    pub sign_type: String,
    pub card_sign: String,
    pub time_stamp: String,
    pub nonce_str: String,
    pub can_multi_select: String,
}

/// Caller-supplied payment parameters, as signed by the merchant server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayParams {
    pub partner_id: String,
    pub prepay_id: String,
    pub nonce_str: String,
    pub time_stamp: String,
    /// The `package` field of the signed order (a Rust keyword, hence the name).
    pub package_value: String,
    pub sign: String,
}

/// Caller-supplied invoice selection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceParams {
    pub app_id: String,
    pub sign_type: String,
    pub card_sign: String,
    pub time_stamp: String,
    pub nonce_str: String,
}

/// Typed share content, one variant per vendor media object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharePayload {
    Text {
        text: Option<String>,
    },
    Image {
        /// Image source (inline / remote / local). Mandatory and must decode.
        image: String,
    },
    Link {
        link: String,
        title: Option<String>,
        description: Option<String>,
        /// Optional cosmetic thumbnail source.
        thumb: Option<String>,
    },
    Music {
        media_url: String,
        title: Option<String>,
        description: Option<String>,
        thumb: Option<String>,
    },
    Video {
        media_url: String,
        title: Option<String>,
        description: Option<String>,
        thumb: Option<String>,
    },
    MiniProgram {
        username: String,
        path: Option<String>,
        program_type: MiniProgramType,
        web_page_url: Option<String>,
        /// High-definition card image source, preferred over `thumb`.
        image: Option<String>,
        title: Option<String>,
        description: Option<String>,
        thumb: Option<String>,
    },
}

impl SharePayload {
    /// Subtype tag used in the transaction identifier.
    pub fn subtype(&self) -> &'static str {
        match self {
            SharePayload::Text { .. } => "text",
            SharePayload::Image { .. } => "image",
            SharePayload::Link { .. } => "link",
            SharePayload::Music { .. } => "music",
            SharePayload::Video { .. } => "video",
            SharePayload::MiniProgram { .. } => "miniprogram",
        }
    }
}

pub fn build_auth(scope: &str, state: Option<&str>) -> Result<VendorRequest, BridgeError> {
    let scope = required(scope, "scope")?;
    let state = match state {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => Uuid::new_v4().to_string(),
    };
    Ok(VendorRequest::Auth(AuthRequest { scope, state }))
}

pub fn build_pay(app_id: &AppId, params: &PayParams) -> Result<VendorRequest, BridgeError> {
    Ok(VendorRequest::Pay(PayRequest {
        app_id: app_id.as_str().to_string(),
        partner_id: required(&params.partner_id, "partnerId")?,
        prepay_id: required(&params.prepay_id, "prepayId")?,
        nonce_str: required(&params.nonce_str, "nonceStr")?,
        time_stamp: required(&params.time_stamp, "timeStamp")?,
        package_value: required(&params.package_value, "package")?,
        sign: required(&params.sign, "sign")?,
    }))
}

pub fn build_mini_program(
    username: &str,
    path: Option<&str>,
    program_type: MiniProgramType,
) -> Result<VendorRequest, BridgeError> {
    Ok(VendorRequest::LaunchMiniProgram(MiniProgramRequest {
        username: required(username, "username")?,
        path: path.filter(|p| !p.is_empty()).map(|p| p.to_string()),
        program_type,
    }))
}

pub fn build_invoice(params: &InvoiceParams) -> Result<VendorRequest, BridgeError> {
    Ok(VendorRequest::ChooseInvoice(InvoiceRequest {
        app_id: required(&params.app_id, "appId")?,
        sign_type: required(&params.sign_type, "signType")?,
        card_sign: required(&params.card_sign, "cardSign")?,
        time_stamp: required(&params.time_stamp, "timeStamp")?,
        nonce_str: required(&params.nonce_str, "nonceStr")?,
        // WeChat expects this as the literal string flag.
        can_multi_select: "1".to_string(),
    }))
}

/// Build a share request, loading whatever media the payload references.
///
/// A mandatory image that fails to load fails the share; a cosmetic
/// thumbnail that fails to load is logged and omitted.
pub async fn build_share(
    loader: &MediaLoader,
    scene: Scene,
    payload: SharePayload,
) -> Result<VendorRequest, BridgeError> {
    let subtype = payload.subtype();
    let (scene, message) = match payload {
        SharePayload::Text { text } => {
            let text = text.unwrap_or_default();
            let message = MediaMessage {
                title: None,
                description: Some(text.clone()),
                thumb_data: None,
                media: MediaObject::Text(text),
            };
            (scene, message)
        }
        SharePayload::Image { image } => {
            required(&image, "imageUrl")?;
            let decoded = loader.load(&image).await?;
            let primary = media::encode_png(&decoded)?;
            let thumb = media::build_thumbnail(decoded, PRIMARY_MAX_EDGE)?;
            let message = MediaMessage {
                title: None,
                description: None,
                thumb_data: Some(thumb),
                media: MediaObject::Image(primary),
            };
            (scene, message)
        }
        SharePayload::Link {
            link,
            title,
            description,
            thumb,
        } => {
            let link = required(&link, "link")?;
            let thumb_data = load_optional_thumb(loader, thumb.as_deref()).await;
            let message = MediaMessage {
                title,
                description,
                thumb_data,
                media: MediaObject::Webpage(link),
            };
            (scene, message)
        }
        SharePayload::Music {
            media_url,
            title,
            description,
            thumb,
        } => {
            let media_url = required(&media_url, "mediaUrl")?;
            let thumb_data = load_optional_thumb(loader, thumb.as_deref()).await;
            let message = MediaMessage {
                title,
                description,
                thumb_data,
                media: MediaObject::Music(media_url),
            };
            (scene, message)
        }
        SharePayload::Video {
            media_url,
            title,
            description,
            thumb,
        } => {
            let media_url = required(&media_url, "mediaUrl")?;
            let thumb_data = load_optional_thumb(loader, thumb.as_deref()).await;
            let message = MediaMessage {
                title,
                description,
                thumb_data,
                media: MediaObject::Video(media_url),
            };
            (scene, message)
        }
        SharePayload::MiniProgram {
            username,
            path,
            program_type,
            web_page_url,
            image,
            title,
            description,
            thumb,
        } => {
            let username = required(&username, "miniProgramUsername")?;
            let mut thumb_data = load_optional_thumb(loader, image.as_deref()).await;
            // A dedicated thumb source supersedes the hd card image.
            if let Some(data) = load_optional_thumb(loader, thumb.as_deref()).await {
                thumb_data = Some(data);
            }
            let message = MediaMessage {
                title,
                description,
                thumb_data,
                media: MediaObject::MiniProgramCard {
                    username,
                    path,
                    program_type,
                    web_page_url,
                },
            };
            // WeChat only accepts mini-program cards in a conversation;
            // the caller's scene is deliberately overridden.
            (Scene::Session, message)
        }
    };

    Ok(VendorRequest::Share(ShareRequest {
        transaction: transaction_id(subtype),
        scene,
        message,
    }))
}

async fn load_optional_thumb(loader: &MediaLoader, source: Option<&str>) -> Option<Vec<u8>> {
    let source = source.filter(|s| !s.is_empty())?;
    match loader.load(source).await {
        Ok(decoded) => match media::build_thumbnail(decoded, THUMB_MAX_EDGE) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("dropping share thumbnail, encode failed: {e}");
                None
            }
        },
        Err(e) => {
            warn!("dropping share thumbnail, source unusable: {e}");
            None
        }
    }
}

fn required(value: &str, field: &'static str) -> Result<String, BridgeError> {
    if value.is_empty() {
        return Err(BridgeError::Validation(field));
    }
    Ok(value.to_string())
}

/// Subtype plus current unix millis, for vendor-side correlation.
fn transaction_id(subtype: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{subtype}{millis}")
}
