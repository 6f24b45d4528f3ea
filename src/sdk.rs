//! Vendor SDK port
//!
//! The WeChat Open SDK is a closed-source platform binding (`IWXAPI` on
//! Android, `WXApi` on iOS). The bridge only needs this seam; the host's
//! platform adapter implements it and owns main-thread affinity for the
//! underlying calls.

use crate::request::VendorRequest;
use crate::types::AppId;

pub trait OpenSdk: Send + Sync {
    /// Register the application identifier with the vendor SDK.
    /// Returns false when the SDK could not be initialized.
    fn register_app(&self, app_id: &AppId) -> bool;

    /// Whether the WeChat application is installed on the device.
    fn is_installed(&self) -> bool;

    /// Hand a request to the vendor SDK for inter-app dispatch. Returns
    /// false when the SDK refused the request synchronously; the matching
    /// response arrives later through the inbound port.
    fn send(&self, request: &VendorRequest) -> bool;
}
