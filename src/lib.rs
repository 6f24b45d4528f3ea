//! WeChat Open SDK bridge core
//!
//! The coordination core of a host-application plugin that exposes WeChat
//! authentication, sharing, payment, mini-program launch, and invoice
//! selection as asynchronous operations. The closed-source Open SDK and the
//! OS redirect component that delivers its callbacks stay behind ports; this
//! crate owns request validation, the per-operation pending-call registry,
//! response demultiplexing and translation, media loading with thumbnail
//! reduction, and credential persistence.
//!
//! ## Operations
//!
//! | Operation | Resolves with |
//! |-----------|---------------|
//! | `initialize` | `()` after credentials are registered and persisted |
//! | `is_installed` | whether WeChat is on the device |
//! | `auth` | OAuth code plus state echo |
//! | `share` | `()` once WeChat confirms delivery |
//! | `send_payment_request` | `()` once the payment flow completes |
//! | `open_mini_program` | the mini-program's exit extension message |
//! | `choose_invoice` | the selected invoice cards |
//! | `plugin_version` | the crate version |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wechat_open_bridge::{WechatBridge, SharePayload, Scene};
//!
//! let bridge = WechatBridge::builder()
//!     .sdk(platform_sdk)                      // your OpenSdk binding
//!     .config_store(Arc::new(store))          // durable credential store
//!     .build()?;
//!
//! bridge.initialize("wx1234567890", None)?;
//!
//! let auth = bridge.auth("snsapi_userinfo", None).await?;
//! println!("OAuth code: {}", auth.code);
//!
//! bridge
//!     .share(
//!         Scene::Timeline,
//!         SharePayload::Link {
//!             link: "https://example.com".into(),
//!             title: Some("My Website".into()),
//!             description: None,
//!             thumb: Some("https://example.com/thumb.jpg".into()),
//!         },
//!     )
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`bridge`] - the facade and its builder
//! - [`config`] - credential persistence
//! - [`media`] - image loading and thumbnail reduction
//! - [`request`] - typed request builders per operation kind
//! - [`registry`] - the per-kind pending-call registry
//! - [`inbound`] - buffering port between the OS redirect component and the bridge
//! - [`sdk`] - the vendor SDK seam
//! - [`error`] - error types
//! - [`types`] - identifiers, scenes, result codes, response payloads
//!
//! ## Error Handling
//!
//! Everything surfaces as [`BridgeError`]; vendor-reported failures keep the
//! raw result code:
//!
//! ```rust,ignore
//! use wechat_open_bridge::{BridgeError, VendorFault};
//!
//! match bridge.auth("snsapi_userinfo", None).await {
//!     Ok(auth) => { /* exchange auth.code on your server */ }
//!     Err(BridgeError::Vendor { fault: VendorFault::UserCancelled, .. }) => {
//!         // the user backed out; not a failure worth logging loudly
//!     }
//!     Err(e) => eprintln!("WeChat operation failed: {e}"),
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod inbound;
pub mod media;
pub mod registry;
pub mod request;
pub mod sdk;
pub mod types;

pub use bridge::{WechatBridge, WechatBridgeBuilder};
pub use error::{BridgeError, MediaError, VendorFault};
pub use request::{InvoiceParams, PayParams, SharePayload};
pub use types::{AppId, MiniProgramType, OperationKind, Scene};
