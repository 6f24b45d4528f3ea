//! Inbound port for vendor callbacks
//!
//! WeChat delivers its results through an OS-launched redirect component,
//! which may fire before the bridge exists (cold start through a payment
//! callback, for instance). The port therefore buffers arrivals until a
//! listener attaches, then flushes them in arrival order and delivers live
//! from that point on.
//!
//! The listener is held weakly: the port never extends its lifetime, and a
//! detach only takes effect if it comes from the currently attached
//! listener (a stale detach from a superseded listener is ignored).

use std::collections::VecDeque;
use std::sync::{Mutex, Weak};

use crate::types::{AuthResult, InvoiceCard, MiniProgramResult, OperationKind};

/// Raw asynchronous response reported by the redirect component, tagged
/// with the operation kind WeChat multiplexes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorResponse {
    pub kind: OperationKind,
    /// Raw `BaseResp` error code; `0` is success.
    pub code: i32,
    pub err_msg: Option<String>,
    /// Authorization code (auth responses).
    pub auth_code: Option<String>,
    /// State echo (auth responses).
    pub state: Option<String>,
    /// Extension message (mini-program launch responses).
    pub ext_msg: Option<String>,
    /// JSON card list (invoice selection responses).
    pub card_item_list: Option<String>,
}

impl VendorResponse {
    pub fn new(kind: OperationKind, code: i32) -> Self {
        Self {
            kind,
            code,
            err_msg: None,
            auth_code: None,
            state: None,
            ext_msg: None,
            card_item_list: None,
        }
    }
}

/// Unsolicited vendor-initiated request (WeChat opening the host app).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorInbound {
    /// Raw `BaseReq` command value.
    pub command: i32,
}

/// Translated success payload attached to a resolved pending call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    /// Share and payment successes carry no data.
    None,
    Auth(AuthResult),
    MiniProgram(MiniProgramResult),
    Invoice(Vec<InvoiceCard>),
}

/// Receiver side of the inbound port.
pub trait ResponseListener: Send + Sync {
    fn on_response(&self, response: VendorResponse);
    fn on_request(&self, request: VendorInbound);
}

/// Identity of one attached listener generation. A token only detaches the
/// listener it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerToken(u64);

#[derive(Default)]
struct PortState {
    listener: Option<Weak<dyn ResponseListener>>,
    generation: u64,
    responses: VecDeque<VendorResponse>,
    requests: VecDeque<VendorInbound>,
}

/// Buffering demux point between the OS redirect component and the bridge.
#[derive(Default)]
pub struct InboundPort {
    state: Mutex<PortState>,
}

impl InboundPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener, flushing anything buffered while no listener was
    /// present. Items are flushed in arrival order, responses first.
    pub fn attach(&self, listener: Weak<dyn ResponseListener>) -> ListenerToken {
        let (token, responses, requests) = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.generation += 1;
            state.listener = Some(listener.clone());
            (
                ListenerToken(state.generation),
                state.responses.drain(..).collect::<Vec<_>>(),
                state.requests.drain(..).collect::<Vec<_>>(),
            )
        };

        if let Some(target) = listener.upgrade() {
            for response in responses {
                target.on_response(response);
            }
            for request in requests {
                target.on_request(request);
            }
        }
        token
    }

    /// Clear the listener, but only if `token` identifies the currently
    /// attached generation.
    pub fn detach(&self, token: ListenerToken) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.generation == token.0 {
            state.listener = None;
        }
    }

    /// Deliver a response to the attached listener, or buffer it.
    pub fn push_response(&self, response: VendorResponse) {
        match self.current_listener() {
            Some(target) => target.on_response(response),
            None => {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                // Re-check under the lock; a listener may have attached in
                // between, and buffering now would strand the item.
                if let Some(target) = upgrade(&state.listener) {
                    drop(state);
                    target.on_response(response);
                } else {
                    state.responses.push_back(response);
                }
            }
        }
    }

    /// Deliver an unsolicited vendor request, or buffer it.
    pub fn push_request(&self, request: VendorInbound) {
        match self.current_listener() {
            Some(target) => target.on_request(request),
            None => {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(target) = upgrade(&state.listener) {
                    drop(state);
                    target.on_request(request);
                } else {
                    state.requests.push_back(request);
                }
            }
        }
    }

    fn current_listener(&self) -> Option<std::sync::Arc<dyn ResponseListener>> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        upgrade(&state.listener)
    }
}

fn upgrade(
    listener: &Option<Weak<dyn ResponseListener>>,
) -> Option<std::sync::Arc<dyn ResponseListener>> {
    listener.as_ref().and_then(Weak::upgrade)
}
