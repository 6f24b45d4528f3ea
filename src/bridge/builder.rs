use std::sync::{Arc, Mutex, Weak};

use log::warn;

use crate::bridge::facade::BridgeInner;
use crate::bridge::WechatBridge;
use crate::config::{BridgeConfig, ConfigStore, MemoryConfigStore};
use crate::error::BridgeError;
use crate::inbound::{InboundPort, ResponseListener};
use crate::media::MediaLoader;
use crate::registry::PendingRegistry;
use crate::sdk::OpenSdk;

/// Builder for [`WechatBridge`]
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use wechat_open_bridge::{WechatBridge, config::FileConfigStore};
///
/// let bridge = WechatBridge::builder()
///     .sdk(platform_sdk)
///     .config_store(Arc::new(FileConfigStore::new(config_path)))
///     .build()?;
///
/// // Wire the OS redirect adapter to bridge.port(), then:
/// bridge.initialize("wx1234567890", Some("https://example.com/app/".into()))?;
/// ```
pub struct WechatBridgeBuilder {
    sdk: Option<Arc<dyn OpenSdk>>,
    store: Option<Arc<dyn ConfigStore>>,
    port: Option<Arc<InboundPort>>,
    static_config: Option<BridgeConfig>,
    media: Option<MediaLoader>,
}

impl WechatBridgeBuilder {
    pub(crate) fn new() -> Self {
        Self {
            sdk: None,
            store: None,
            port: None,
            static_config: None,
            media: None,
        }
    }

    /// Set the platform's vendor SDK binding. Required.
    pub fn sdk(mut self, sdk: Arc<dyn OpenSdk>) -> Self {
        self.sdk = Some(sdk);
        self
    }

    /// Set the credential store.
    ///
    /// Default: an in-memory store (nothing survives a restart).
    pub fn config_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Share an inbound port with the OS redirect adapter.
    ///
    /// Default: a fresh port, reachable via [`WechatBridge::port`].
    pub fn inbound_port(mut self, port: Arc<InboundPort>) -> Self {
        self.port = Some(port);
        self
    }

    /// Bundle static credentials, like a shipped plugin configuration.
    /// They take precedence over persisted ones and are not persisted
    /// themselves; `initialize` remains the only writer.
    pub fn static_config(mut self, config: BridgeConfig) -> Self {
        self.static_config = Some(config);
        self
    }

    /// Override the media loader (custom HTTP client, test doubles).
    pub fn media_loader(mut self, media: MediaLoader) -> Self {
        self.media = Some(media);
        self
    }

    /// Build the bridge and attach it to the inbound port.
    ///
    /// # Errors
    /// Returns an error if no SDK binding was provided, or the config
    /// store fails to load.
    pub fn build(self) -> Result<WechatBridge, BridgeError> {
        let sdk = self
            .sdk
            .ok_or_else(|| BridgeError::Config("an OpenSdk binding is required".to_string()))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryConfigStore::new()));
        let port = self.port.unwrap_or_else(|| Arc::new(InboundPort::new()));
        let media = match self.media {
            Some(media) => media,
            None => MediaLoader::new()?,
        };

        // Static config wins; otherwise pick up what a previous session
        // persisted, so cold-start callbacks find a registered SDK.
        let config = match self.static_config {
            Some(config) => Some(config),
            None => store.load()?,
        };
        if let Some(ref config) = config {
            if !sdk.register_app(&config.app_id) {
                warn!("failed to register stored app id {} with the SDK", config.app_id);
            }
        }

        let inner = Arc::new(BridgeInner {
            sdk,
            store,
            media,
            registry: PendingRegistry::new(),
            config: Mutex::new(config),
        });

        let listener: Weak<dyn ResponseListener> = {
            let as_listener: Arc<dyn ResponseListener> = Arc::clone(&inner) as _;
            Arc::downgrade(&as_listener)
        };
        let token = port.attach(listener);

        Ok(WechatBridge::assemble(inner, port, token))
    }
}
