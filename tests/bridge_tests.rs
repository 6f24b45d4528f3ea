//! Bridge facade tests
//!
//! Drive the full dispatch path against a recording vendor SDK double:
//! precondition chain, per-kind single-flight, send failure recovery,
//! response translation, and teardown semantics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wechat_open_bridge::config::{BridgeConfig, ConfigStore, FileConfigStore, MemoryConfigStore};
use wechat_open_bridge::inbound::VendorResponse;
use wechat_open_bridge::request::{InvoiceParams, PayParams, SharePayload, VendorRequest};
use wechat_open_bridge::sdk::OpenSdk;
use wechat_open_bridge::types::codes;
use wechat_open_bridge::{
    AppId, BridgeError, MiniProgramType, OperationKind, Scene, VendorFault, WechatBridge,
};

#[derive(Default)]
struct MockSdk {
    installed: AtomicBool,
    refuse_send: AtomicBool,
    refuse_register: AtomicBool,
    sent: Mutex<Vec<VendorRequest>>,
    registered: Mutex<Vec<String>>,
}

impl MockSdk {
    fn installed() -> Arc<Self> {
        let sdk = Self::default();
        sdk.installed.store(true, Ordering::SeqCst);
        Arc::new(sdk)
    }

    fn sent(&self) -> Vec<VendorRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl OpenSdk for MockSdk {
    fn register_app(&self, app_id: &AppId) -> bool {
        if self.refuse_register.load(Ordering::SeqCst) {
            return false;
        }
        self.registered.lock().unwrap().push(app_id.as_str().to_string());
        true
    }

    fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    fn send(&self, request: &VendorRequest) -> bool {
        if self.refuse_send.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().unwrap().push(request.clone());
        true
    }
}

fn configured_bridge(sdk: Arc<MockSdk>) -> Arc<WechatBridge> {
    let bridge = WechatBridge::builder().sdk(sdk).build().unwrap();
    bridge.initialize("wx123", None).unwrap();
    Arc::new(bridge)
}

/// Wait until the mock has seen `count` dispatches.
async fn wait_for_sends(sdk: &MockSdk, count: usize) {
    for _ in 0..200 {
        if sdk.sent().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("vendor SDK never saw {count} dispatch(es)");
}

fn pay_params() -> PayParams {
    PayParams {
        partner_id: "p1".into(),
        prepay_id: "pre1".into(),
        nonce_str: "n1".into(),
        time_stamp: "1234567890".into(),
        package_value: "Sign=WXPay".into(),
        sign: "s1".into(),
    }
}

#[tokio::test]
async fn test_operations_require_configuration() {
    let sdk = MockSdk::installed();
    let bridge = WechatBridge::builder().sdk(sdk).build().unwrap();

    let err = bridge.auth("snsapi_userinfo", None).await.unwrap_err();
    assert!(matches!(err, BridgeError::Config(_)));

    let err = bridge.send_payment_request(&pay_params()).await.unwrap_err();
    assert!(matches!(err, BridgeError::Config(_)));
}

#[tokio::test]
async fn test_operations_require_wechat_installed() {
    let sdk = Arc::new(MockSdk::default());
    let bridge = WechatBridge::builder().sdk(sdk).build().unwrap();
    bridge.initialize("wx123", None).unwrap();

    let err = bridge.auth("snsapi_userinfo", None).await.unwrap_err();
    assert!(matches!(err, BridgeError::NotInstalled));
}

#[tokio::test]
async fn test_install_check_and_version_need_no_configuration() {
    let sdk = MockSdk::installed();
    let bridge = WechatBridge::builder().sdk(sdk.clone()).build().unwrap();

    assert!(bridge.is_installed());
    sdk.installed.store(false, Ordering::SeqCst);
    assert!(!bridge.is_installed());

    assert_eq!(bridge.plugin_version(), env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_initialize_validates_and_persists() {
    let sdk = MockSdk::installed();
    let store = Arc::new(MemoryConfigStore::new());
    let bridge = WechatBridge::builder()
        .sdk(sdk.clone())
        .config_store(store.clone())
        .build()
        .unwrap();

    let err = bridge.initialize("", None).unwrap_err();
    assert!(matches!(err, BridgeError::Config(_)));
    assert!(store.load().unwrap().is_none());

    bridge
        .initialize("wx123", Some("https://x".into()))
        .unwrap();
    let stored = store.load().unwrap().unwrap();
    assert_eq!(stored.app_id.as_str(), "wx123");
    assert_eq!(stored.universal_link.as_deref(), Some("https://x"));
    assert_eq!(*sdk.registered.lock().unwrap(), vec!["wx123".to_string()]);

    // Reconfiguring without a link clears the stored one.
    bridge.initialize("wx123", None).unwrap();
    let stored = store.load().unwrap().unwrap();
    assert_eq!(stored.universal_link, None);
}

#[tokio::test]
async fn test_initialize_reports_sdk_failure() {
    let sdk = MockSdk::installed();
    sdk.refuse_register.store(true, Ordering::SeqCst);
    let bridge = WechatBridge::builder().sdk(sdk).build().unwrap();

    let err = bridge.initialize("wx123", None).unwrap_err();
    assert!(matches!(err, BridgeError::Dispatch(_)));
    assert!(bridge.current_config().is_none());
}

#[tokio::test]
async fn test_persisted_config_restores_on_next_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wechat.json");

    {
        let sdk = MockSdk::installed();
        let bridge = WechatBridge::builder()
            .sdk(sdk)
            .config_store(Arc::new(FileConfigStore::new(&path)))
            .build()
            .unwrap();
        bridge.initialize("wx123", Some("https://x".into())).unwrap();
    }

    let sdk = MockSdk::installed();
    let bridge = WechatBridge::builder()
        .sdk(sdk.clone())
        .config_store(Arc::new(FileConfigStore::new(&path)))
        .build()
        .unwrap();

    let config = bridge.current_config().unwrap();
    assert_eq!(config.app_id.as_str(), "wx123");
    // The stored id was re-registered with the SDK at build time.
    assert_eq!(*sdk.registered.lock().unwrap(), vec!["wx123".to_string()]);
}

#[tokio::test]
async fn test_static_config_takes_precedence_and_is_not_persisted() {
    let store = Arc::new(MemoryConfigStore::new());
    store
        .persist(&BridgeConfig::new(AppId::new("wx_old").unwrap(), None))
        .unwrap();

    let sdk = MockSdk::installed();
    let bridge = WechatBridge::builder()
        .sdk(sdk)
        .config_store(store.clone())
        .static_config(BridgeConfig::new(AppId::new("wx_new").unwrap(), None))
        .build()
        .unwrap();

    assert_eq!(bridge.current_config().unwrap().app_id.as_str(), "wx_new");
    assert_eq!(store.load().unwrap().unwrap().app_id.as_str(), "wx_old");
}

#[tokio::test]
async fn test_auth_round_trip() {
    let sdk = MockSdk::installed();
    let bridge = configured_bridge(sdk.clone());
    let port = bridge.port();

    let task = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.auth("snsapi_userinfo", Some("my_state")).await }
    });
    wait_for_sends(&sdk, 1).await;

    let dispatched = sdk.sent();
    let VendorRequest::Auth(ref sent) = dispatched[0] else {
        panic!("expected an auth dispatch");
    };
    assert_eq!(sent.scope, "snsapi_userinfo");
    assert_eq!(sent.state, "my_state");

    let mut response = VendorResponse::new(OperationKind::Auth, codes::OK);
    response.auth_code = Some("the_code".into());
    response.state = Some("my_state".into());
    port.push_response(response);

    let auth = task.await.unwrap().unwrap();
    assert_eq!(auth.code, "the_code");
    assert_eq!(auth.state, "my_state");
}

#[tokio::test]
async fn test_second_request_of_same_kind_rejects_first_stays_pending() {
    let sdk = MockSdk::installed();
    let bridge = configured_bridge(sdk.clone());
    let port = bridge.port();

    let task = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.auth("snsapi_userinfo", Some("first")).await }
    });
    wait_for_sends(&sdk, 1).await;

    let err = bridge.auth("snsapi_userinfo", None).await.unwrap_err();
    assert!(matches!(err, BridgeError::InProgress(OperationKind::Auth)));

    // A different kind is unaffected by the occupied auth slot.
    let mini_task = tokio::spawn({
        let bridge = bridge.clone();
        async move {
            bridge
                .open_mini_program("gh_abc", None, MiniProgramType::Release)
                .await
        }
    });
    wait_for_sends(&sdk, 2).await;

    let mut mini_response = VendorResponse::new(OperationKind::MiniProgram, codes::OK);
    mini_response.ext_msg = Some("bye".into());
    port.push_response(mini_response);
    let mini = mini_task.await.unwrap().unwrap();
    assert_eq!(mini.ext_msg.as_deref(), Some("bye"));

    // The first auth call is still alive and resolves normally.
    let mut response = VendorResponse::new(OperationKind::Auth, codes::OK);
    response.auth_code = Some("late".into());
    response.state = Some("first".into());
    port.push_response(response);
    assert_eq!(task.await.unwrap().unwrap().code, "late");
}

#[tokio::test]
async fn test_send_failure_frees_the_slot() {
    let sdk = MockSdk::installed();
    let bridge = configured_bridge(sdk.clone());

    sdk.refuse_send.store(true, Ordering::SeqCst);
    let err = bridge.auth("snsapi_userinfo", None).await.unwrap_err();
    assert!(matches!(err, BridgeError::Dispatch(_)));

    // The failed dispatch released the auth slot.
    sdk.refuse_send.store(false, Ordering::SeqCst);
    let port = bridge.port();
    let task = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.auth("snsapi_userinfo", Some("retry")).await }
    });
    wait_for_sends(&sdk, 1).await;

    let mut response = VendorResponse::new(OperationKind::Auth, codes::OK);
    response.auth_code = Some("ok".into());
    response.state = Some("retry".into());
    port.push_response(response);
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_payment_validation_never_reaches_the_sdk() {
    let sdk = MockSdk::installed();
    let bridge = configured_bridge(sdk.clone());

    let mut params = pay_params();
    params.sign.clear();
    let err = bridge.send_payment_request(&params).await.unwrap_err();
    assert!(matches!(err, BridgeError::Validation("sign")));
    assert!(sdk.sent().is_empty());
}

#[tokio::test]
async fn test_payment_injects_configured_app_id() {
    let sdk = MockSdk::installed();
    let bridge = configured_bridge(sdk.clone());
    let port = bridge.port();

    let task = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.send_payment_request(&pay_params()).await }
    });
    wait_for_sends(&sdk, 1).await;

    let dispatched = sdk.sent();
    let VendorRequest::Pay(ref sent) = dispatched[0] else {
        panic!("expected a pay dispatch");
    };
    assert_eq!(sent.app_id, "wx123");
    assert_eq!(sent.prepay_id, "pre1");

    port.push_response(VendorResponse::new(OperationKind::Pay, codes::OK));
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_user_cancellation_surfaces_with_raw_code() {
    let sdk = MockSdk::installed();
    let bridge = configured_bridge(sdk.clone());
    let port = bridge.port();

    let task = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.send_payment_request(&pay_params()).await }
    });
    wait_for_sends(&sdk, 1).await;
    port.push_response(VendorResponse::new(OperationKind::Pay, codes::USER_CANCELLED));

    let err = task.await.unwrap().unwrap_err();
    let BridgeError::Vendor { fault, code } = err else {
        panic!("expected a vendor error, got {err}");
    };
    assert_eq!(fault, VendorFault::UserCancelled);
    assert_eq!(code, -2);
}

#[tokio::test]
async fn test_choose_invoice_round_trip() {
    let sdk = MockSdk::installed();
    let bridge = configured_bridge(sdk.clone());
    let port = bridge.port();

    let params = InvoiceParams {
        app_id: "wx123".into(),
        sign_type: "SHA1".into(),
        card_sign: "cs".into(),
        time_stamp: "ts".into(),
        nonce_str: "ns".into(),
    };
    let task = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.choose_invoice(&params).await }
    });
    wait_for_sends(&sdk, 1).await;

    let mut response = VendorResponse::new(OperationKind::Invoice, codes::OK);
    response.card_item_list =
        Some(r#"[{"card_id":"c1","encrypt_code":"e1"},{"card_id":"c2","encrypt_code":"e2"}]"#.into());
    port.push_response(response);

    let cards = task.await.unwrap().unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[1].card_id, "c2");
    assert_eq!(cards[1].encrypt_code, "e2");
}

#[tokio::test]
async fn test_share_dispatch_carries_forced_mini_program_scene() {
    let sdk = MockSdk::installed();
    let bridge = configured_bridge(sdk.clone());
    let port = bridge.port();

    let task = tokio::spawn({
        let bridge = bridge.clone();
        async move {
            bridge
                .share(
                    Scene::Timeline,
                    SharePayload::MiniProgram {
                        username: "gh_abc".into(),
                        path: Some("pages/index".into()),
                        program_type: MiniProgramType::Release,
                        web_page_url: None,
                        image: None,
                        title: Some("card".into()),
                        description: None,
                        thumb: None,
                    },
                )
                .await
        }
    });
    wait_for_sends(&sdk, 1).await;

    let dispatched = sdk.sent();
    let VendorRequest::Share(ref sent) = dispatched[0] else {
        panic!("expected a share dispatch");
    };
    assert_eq!(sent.scene, Scene::Session);

    port.push_response(VendorResponse::new(OperationKind::Share, codes::OK));
    assert!(task.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_unmatched_response_is_dropped_quietly() {
    let sdk = MockSdk::installed();
    let bridge = configured_bridge(sdk.clone());
    let port = bridge.port();

    // Nothing pending; a stale response must not disturb anything.
    port.push_response(VendorResponse::new(OperationKind::Auth, codes::OK));

    let task = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.auth("snsapi_base", None).await }
    });
    wait_for_sends(&sdk, 1).await;

    let mut response = VendorResponse::new(OperationKind::Auth, codes::OK);
    response.auth_code = Some("fresh".into());
    port.push_response(response);
    assert_eq!(task.await.unwrap().unwrap().code, "fresh");
}

#[tokio::test]
async fn test_shutdown_rejects_pending_calls() {
    let sdk = MockSdk::installed();
    let bridge = configured_bridge(sdk.clone());

    let task = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.auth("snsapi_userinfo", None).await }
    });
    wait_for_sends(&sdk, 1).await;

    bridge.shutdown();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, BridgeError::Dispatch(_)));
}

#[tokio::test]
async fn test_responses_before_build_are_consumed_without_effect() {
    let port = Arc::new(wechat_open_bridge::inbound::InboundPort::new());
    port.push_response(VendorResponse::new(OperationKind::Auth, codes::OK));

    let sdk = MockSdk::installed();
    let bridge = WechatBridge::builder()
        .sdk(sdk.clone())
        .inbound_port(port.clone())
        .build()
        .unwrap();
    bridge.initialize("wx123", None).unwrap();
    let bridge = Arc::new(bridge);

    // The flushed stale response found no pending call; a fresh auth still
    // runs end to end.
    let task = tokio::spawn({
        let bridge = bridge.clone();
        async move { bridge.auth("snsapi_base", None).await }
    });
    wait_for_sends(&sdk, 1).await;

    let mut response = VendorResponse::new(OperationKind::Auth, codes::OK);
    response.auth_code = Some("after-flush".into());
    port.push_response(response);
    assert_eq!(task.await.unwrap().unwrap().code, "after-flush");
}
