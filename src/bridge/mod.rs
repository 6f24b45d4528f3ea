//! The bridge facade
//!
//! [`WechatBridge`] is the public operation surface. It is an explicitly
//! constructed coordinator: the host's composition root builds one with its
//! SDK binding, config store, and inbound port, and passes it wherever the
//! operations are invoked.

mod builder;
mod facade;

pub use builder::WechatBridgeBuilder;
pub use facade::WechatBridge;
