//! Pending-call registry
//!
//! Maps each [`OperationKind`] to at most one in-flight caller handle.
//! Registration for an occupied kind refuses rather than overwrites, which
//! is what turns a second concurrent request of the same kind into a
//! synchronous "in progress" rejection. Independent kinds never contend
//! beyond the brief map lock.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use log::debug;
use tokio::sync::oneshot;

use crate::error::BridgeError;
use crate::inbound::ResponsePayload;
use crate::types::OperationKind;

pub type CallResult = Result<ResponsePayload, BridgeError>;

/// Caller handle for one outstanding vendor dispatch.
///
/// Dropping the handle without completing it wakes the waiting caller with
/// a terminal shutdown error.
#[derive(Debug)]
pub struct PendingCall {
    tx: oneshot::Sender<CallResult>,
}

impl PendingCall {
    pub fn channel() -> (Self, oneshot::Receiver<CallResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn complete(self, result: CallResult) {
        if self.tx.send(result).is_err() {
            debug!("pending call receiver dropped before completion");
        }
    }
}

#[derive(Debug, Default)]
pub struct PendingRegistry {
    calls: Mutex<HashMap<OperationKind, PendingCall>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a call for `kind`. Returns false (leaving the existing call
    /// untouched) when one is already registered.
    pub fn register(&self, kind: OperationKind, call: PendingCall) -> bool {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        match calls.entry(kind) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(call);
                true
            }
        }
    }

    /// Atomically remove and return the call registered for `kind`.
    pub fn resolve(&self, kind: OperationKind) -> Option<PendingCall> {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.remove(&kind)
    }

    pub fn is_pending(&self, kind: OperationKind) -> bool {
        let calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.contains_key(&kind)
    }

    /// Discard every registered call, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        let discarded = calls.len();
        calls.clear();
        discarded
    }
}
