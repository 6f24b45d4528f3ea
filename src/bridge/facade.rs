use std::sync::{Arc, Mutex};

use log::{debug, warn};

use crate::config::{BridgeConfig, ConfigStore};
use crate::error::{BridgeError, VendorFault};
use crate::inbound::{
    InboundPort, ListenerToken, ResponseListener, ResponsePayload, VendorInbound, VendorResponse,
};
use crate::media::MediaLoader;
use crate::registry::{CallResult, PendingCall, PendingRegistry};
use crate::request::{self, InvoiceParams, PayParams, SharePayload, VendorRequest};
use crate::sdk::OpenSdk;
use crate::types::{
    parse_card_list, AppId, AuthResult, InvoiceCard, MiniProgramResult, MiniProgramType,
    OperationKind, Scene,
};

/// Coordinator between application code and the WeChat Open SDK.
///
/// Every vendor-bound operation follows the same path: precondition checks,
/// request building (validation and media loading), pending-call
/// registration, SDK send, then an asynchronous wait for the response the
/// inbound port demultiplexes back. At most one request per
/// [`OperationKind`] is in flight; a second is rejected, never queued.
pub struct WechatBridge {
    pub(crate) inner: Arc<BridgeInner>,
    port: Arc<InboundPort>,
    token: ListenerToken,
}

pub(crate) struct BridgeInner {
    pub(crate) sdk: Arc<dyn OpenSdk>,
    pub(crate) store: Arc<dyn ConfigStore>,
    pub(crate) media: MediaLoader,
    pub(crate) registry: PendingRegistry,
    pub(crate) config: Mutex<Option<BridgeConfig>>,
}

impl WechatBridge {
    pub fn builder() -> super::WechatBridgeBuilder {
        super::WechatBridgeBuilder::new()
    }

    pub(crate) fn assemble(
        inner: Arc<BridgeInner>,
        port: Arc<InboundPort>,
        token: ListenerToken,
    ) -> Self {
        Self { inner, port, token }
    }

    /// The inbound port this bridge listens on; the host wires the OS
    /// redirect component to it.
    pub fn port(&self) -> Arc<InboundPort> {
        Arc::clone(&self.port)
    }

    /// Configure (or reconfigure) the bridge and persist the credentials.
    ///
    /// Idempotent; this is the only operation that writes configuration.
    pub fn initialize(
        &self,
        app_id: impl Into<String>,
        universal_link: Option<String>,
    ) -> Result<(), BridgeError> {
        let app_id = AppId::new(app_id).map_err(BridgeError::Config)?;
        if !self.inner.sdk.register_app(&app_id) {
            return Err(BridgeError::Dispatch(
                "failed to initialize the WeChat SDK".to_string(),
            ));
        }
        let config = BridgeConfig::new(app_id, universal_link);
        self.inner.store.persist(&config)?;
        let mut current = self.inner.config.lock().unwrap_or_else(|e| e.into_inner());
        *current = Some(config);
        Ok(())
    }

    /// Whether the WeChat application is installed. Needs no configuration.
    pub fn is_installed(&self) -> bool {
        self.inner.sdk.is_installed()
    }

    /// The bridge crate version. Always succeeds.
    pub fn plugin_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Request an OAuth authorization; resolves with the code and state echo.
    pub async fn auth(
        &self,
        scope: &str,
        state: Option<&str>,
    ) -> Result<AuthResult, BridgeError> {
        self.ensure_ready()?;
        let request = request::build_auth(scope, state)?;
        match self.dispatch(request).await? {
            ResponsePayload::Auth(result) => Ok(result),
            other => Err(payload_mismatch(OperationKind::Auth, &other)),
        }
    }

    /// Share content to a WeChat scene.
    ///
    /// Media referenced by the payload is fetched and reduced before the
    /// pending-call registry is touched, so validation and media failures
    /// never occupy the share slot.
    pub async fn share(&self, scene: Scene, payload: SharePayload) -> Result<(), BridgeError> {
        self.ensure_ready()?;
        let request = request::build_share(&self.inner.media, scene, payload).await?;
        self.dispatch(request).await?;
        Ok(())
    }

    /// Hand a server-signed payment order to WeChat Pay.
    pub async fn send_payment_request(&self, params: &PayParams) -> Result<(), BridgeError> {
        self.ensure_ready()?;
        let app_id = self.configured_app_id()?;
        let request = request::build_pay(&app_id, params)?;
        self.dispatch(request).await?;
        Ok(())
    }

    /// Open a mini-program; resolves with its exit extension message.
    pub async fn open_mini_program(
        &self,
        username: &str,
        path: Option<&str>,
        program_type: MiniProgramType,
    ) -> Result<MiniProgramResult, BridgeError> {
        self.ensure_ready()?;
        let request = request::build_mini_program(username, path, program_type)?;
        match self.dispatch(request).await? {
            ResponsePayload::MiniProgram(result) => Ok(result),
            other => Err(payload_mismatch(OperationKind::MiniProgram, &other)),
        }
    }

    /// Let the user pick invoices from their WeChat card package.
    pub async fn choose_invoice(
        &self,
        params: &InvoiceParams,
    ) -> Result<Vec<InvoiceCard>, BridgeError> {
        self.ensure_ready()?;
        let request = request::build_invoice(params)?;
        match self.dispatch(request).await? {
            ResponsePayload::Invoice(cards) => Ok(cards),
            other => Err(payload_mismatch(OperationKind::Invoice, &other)),
        }
    }

    /// Detach from the inbound port and discard every pending call.
    ///
    /// Waiting callers observe a terminal [`BridgeError::Dispatch`]
    /// rejection. Dropping the bridge does the same.
    pub fn shutdown(&self) {
        self.port.detach(self.token);
        let discarded = self.inner.registry.clear();
        if discarded > 0 {
            warn!("bridge teardown discarded {discarded} pending call(s)");
        }
    }

    /// Currently effective configuration, if any.
    pub fn current_config(&self) -> Option<BridgeConfig> {
        let config = self.inner.config.lock().unwrap_or_else(|e| e.into_inner());
        config.clone()
    }

    fn configured_app_id(&self) -> Result<AppId, BridgeError> {
        let config = self.inner.config.lock().unwrap_or_else(|e| e.into_inner());
        config
            .as_ref()
            .map(|c| c.app_id.clone())
            .ok_or_else(not_configured)
    }

    fn ensure_ready(&self) -> Result<(), BridgeError> {
        {
            let config = self.inner.config.lock().unwrap_or_else(|e| e.into_inner());
            if config.is_none() {
                return Err(not_configured());
            }
        }
        if !self.inner.sdk.is_installed() {
            return Err(BridgeError::NotInstalled);
        }
        Ok(())
    }

    /// Register, send, and await the asynchronous vendor response.
    async fn dispatch(&self, request: VendorRequest) -> Result<ResponsePayload, BridgeError> {
        let kind = request.kind();
        let (call, rx) = PendingCall::channel();
        if !self.inner.registry.register(kind, call) {
            return Err(BridgeError::InProgress(kind));
        }

        if !self.inner.sdk.send(&request) {
            // A failed send frees the slot immediately.
            drop(self.inner.registry.resolve(kind));
            return Err(BridgeError::Dispatch(
                "the vendor SDK refused the request".to_string(),
            ));
        }
        debug!("dispatched {kind} request to WeChat");

        rx.await.map_err(|_| {
            BridgeError::Dispatch("bridge shut down before WeChat responded".to_string())
        })?
    }
}

impl Drop for WechatBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ResponseListener for BridgeInner {
    fn on_response(&self, response: VendorResponse) {
        let Some(call) = self.registry.resolve(response.kind) else {
            // Stale, duplicate, or unsolicited; not an error state.
            warn!(
                "no pending {} call for vendor response (code {})",
                response.kind, response.code
            );
            return;
        };
        call.complete(classify(response));
    }

    fn on_request(&self, request: VendorInbound) {
        debug!("received vendor request (command {})", request.command);
    }
}

/// Translate a raw vendor response into the pending call's result.
fn classify(response: VendorResponse) -> CallResult {
    if response.code != crate::types::codes::OK {
        return Err(BridgeError::Vendor {
            fault: VendorFault::from_code(response.code),
            code: response.code,
        });
    }
    let payload = match response.kind {
        OperationKind::Auth => ResponsePayload::Auth(AuthResult {
            code: response.auth_code.unwrap_or_default(),
            state: response.state.unwrap_or_default(),
        }),
        OperationKind::MiniProgram => ResponsePayload::MiniProgram(MiniProgramResult {
            ext_msg: response.ext_msg,
        }),
        OperationKind::Invoice => ResponsePayload::Invoice(parse_card_list(
            response.card_item_list.as_deref().unwrap_or_default(),
        )),
        OperationKind::Share | OperationKind::Pay => ResponsePayload::None,
    };
    Ok(payload)
}

fn not_configured() -> BridgeError {
    BridgeError::Config(
        "call initialize() or supply static configuration first".to_string(),
    )
}

fn payload_mismatch(kind: OperationKind, payload: &ResponsePayload) -> BridgeError {
    BridgeError::Dispatch(format!(
        "vendor response payload {payload:?} does not match a {kind} request"
    ))
}
