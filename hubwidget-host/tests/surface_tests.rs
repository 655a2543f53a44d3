mod common;

use common::*;
use hubwidget_host::*;
use hubwidget_types::{RequestParams, ServiceId};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Surface whose Hub is only contacted during setup.
async fn offline_surface(
    context: Arc<HostContext>,
) -> (MockServer, Arc<CapabilitySurface>, Arc<LifecycleController>) {
    let server = MockServer::start().await;
    let (surface, lifecycle) = surface(&server, context, json!({"project": "HUB"})).await;
    (server, surface, lifecycle)
}

#[tokio::test]
async fn each_rejected_operation_warns_exactly_once() {
    let context = HostContext::new(PAGE);
    let (_hub, surface, _) = offline_surface(Arc::clone(&context)).await;

    let rejected = [
        (CapabilityCall::EnterConfigMode, RejectedOperation::EnterConfigMode),
        (CapabilityCall::ExitConfigMode, RejectedOperation::ExitConfigMode),
        (CapabilityCall::StoreCache(json!({"a": 1})), RejectedOperation::StoreCache),
        (CapabilityCall::StoreConfig(json!({"b": 2})), RejectedOperation::StoreConfig),
        (CapabilityCall::RemoveWidget, RejectedOperation::RemoveWidget),
    ];

    for (n, (call, expected)) in rejected.into_iter().enumerate() {
        let reply = surface.call(call).await.unwrap();
        assert_eq!(reply, CapabilityReply::Rejected(expected));

        let entries = context.notifications().entries();
        assert_eq!(entries.len(), n + 1);
        let last = entries.last().unwrap();
        assert_eq!(last.kind, AlertKind::Warning);
        assert_eq!(last.text, expected.reason());
    }
}

#[tokio::test]
async fn surface_takes_identity_from_loaded_manifest() {
    let (_hub, surface, _) = offline_surface(HostContext::new(PAGE)).await;
    assert_eq!(surface.widget(), WIDGET);
    assert_eq!(surface.application_name(), Some("YouTrack"));
}

#[tokio::test]
async fn store_config_leaves_read_config_unchanged() {
    let context = HostContext::new(PAGE);
    let (_hub, surface, _) = offline_surface(context).await;

    surface
        .call(CapabilityCall::StoreConfig(json!({"project": "OTHER"})))
        .await
        .unwrap();
    assert_eq!(
        surface.call(CapabilityCall::ReadConfig).await.unwrap(),
        CapabilityReply::Json(json!({"project": "HUB"}))
    );
    assert_eq!(
        surface.call(CapabilityCall::ReadCache).await.unwrap(),
        CapabilityReply::Json(Value::Null)
    );
}

#[tokio::test]
async fn chrome_operations_edit_rendered_chrome() {
    let context = HostContext::new(PAGE);
    let (_hub, surface, lifecycle) = offline_surface(context).await;

    surface
        .dispatch("setTitle", json!(["Issues", "https://yt.example.com/issues"]))
        .await
        .unwrap();
    surface
        .dispatch("setLoadingAnimationEnabled", json!([true]))
        .await
        .unwrap();
    surface
        .dispatch("setError", json!([{"data": {"description": "Forbidden"}}]))
        .await
        .unwrap();

    let chrome = lifecycle.chrome().unwrap();
    let title = chrome.title.unwrap();
    assert_eq!(title.text, "Issues");
    assert!(title.is_link());
    assert!(chrome.loading);
    assert_eq!(chrome.error.as_deref(), Some("Forbidden"));

    surface.dispatch("clearError", Value::Null).await.unwrap();
    surface
        .dispatch("setLoadingAnimationEnabled", json!([false]))
        .await
        .unwrap();
    let chrome = lifecycle.chrome().unwrap();
    assert_eq!(chrome.error, None);
    assert!(!chrome.loading);
}

#[tokio::test]
async fn alerts_close_after_their_timeout() {
    let context = HostContext::new(PAGE);
    let (_hub, surface, _) = offline_surface(Arc::clone(&context)).await;
    tokio::time::pause();

    surface
        .dispatch("alert", json!(["Saved", "success", 500]))
        .await
        .unwrap();
    surface.dispatch("alert", json!(["Hello"])).await.unwrap();
    surface
        .dispatch("alert", json!(["Soon", "loading", 1499.6]))
        .await
        .unwrap();

    let entries = context.notifications().entries();
    assert_eq!(entries[0].kind, AlertKind::Success);
    assert_eq!(entries[0].timeout, Duration::from_millis(500));
    assert_eq!(entries[1].kind, AlertKind::Message);
    assert_eq!(entries[1].timeout, DEFAULT_ALERT_TIMEOUT);
    assert_eq!(entries[2].kind, AlertKind::Loading);
    assert_eq!(entries[2].timeout, Duration::from_millis(1500));
    assert!(entries.iter().all(|n| n.phase() == NotificationPhase::Shown));

    tokio::time::advance(Duration::from_millis(500)).await;
    let sink = context.notifications();
    assert_eq!(sink.get(entries[0].id).unwrap().phase(), NotificationPhase::Closing);
    assert_eq!(sink.get(entries[1].id).unwrap().phase(), NotificationPhase::Shown);
    assert_eq!(sink.get(entries[2].id).unwrap().phase(), NotificationPhase::Shown);

    tokio::time::advance(Duration::from_millis(2500)).await;
    assert!(sink.visible_at(tokio::time::Instant::now()).is_empty());
}

#[tokio::test]
async fn malformed_and_unknown_calls_fail_on_the_wire() {
    let context = HostContext::new(PAGE);
    let (_hub, surface, _) = offline_surface(Arc::clone(&context)).await;

    let unknown = surface.dispatch("eval", json!(["1+1"])).await.unwrap_err();
    assert_eq!(unknown["name"], "UnknownOperationError");

    let missing_id = surface.dispatch("fetch", json!([])).await.unwrap_err();
    assert_eq!(missing_id["name"], "InvalidArgumentsError");

    assert!(context.notifications().is_empty());
}

#[tokio::test]
async fn fetch_hub_sends_authenticated_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rest/users/me/profile"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("Hub-API-Version", "3"))
        .and(body_json(json!({"theme": "dark"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (surface, _) = surface(&server, HostContext::new(PAGE), Value::Null).await;
    let reply = surface
        .call(CapabilityCall::FetchHub {
            relative_url: "/api/rest/users/me/profile".into(),
            params: RequestParams::get().with_body("post", json!({"theme": "dark"})),
        })
        .await
        .unwrap();
    assert_eq!(reply, CapabilityReply::Json(json!({"ok": true})));
}

#[tokio::test]
async fn http_failure_carries_status_to_the_widget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/secret"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let (surface, _) = surface(&server, HostContext::new(PAGE), Value::Null).await;
    let wire = surface
        .dispatch("fetchHub", json!(["api/rest/secret"]))
        .await
        .unwrap_err();
    assert_eq!(wire["name"], "RequestError");
    assert_eq!(wire["status"], 403);
}

#[tokio::test]
async fn load_services_and_fetch_share_the_page_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rest/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_services(&server)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/teamcity/app/rest/builds"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
        .mount(&server)
        .await;

    let context = HostContext::new(PAGE);
    let (first, _) = surface(&server, Arc::clone(&context), Value::Null).await;
    let (second, _) = surface(&server, Arc::clone(&context), Value::Null).await;

    let services = first
        .call(CapabilityCall::LoadServices {
            application_name: Some("B".into()),
        })
        .await
        .unwrap();
    match services {
        CapabilityReply::Services(list) => {
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].id, ServiceId::from("3"));
        }
        other => panic!("unexpected reply {other:?}"),
    }

    let body = second
        .dispatch("fetch", json!([3, "app/rest/builds"]))
        .await
        .unwrap();
    assert_eq!(body, json!("plain text"));

    let missing = second.dispatch("fetch", json!([99, "x"])).await.unwrap_err();
    assert_eq!(missing["name"], "ServiceNotFoundError");
    assert!(
        missing["message"]
            .as_str()
            .unwrap()
            .contains(r#"Could not find service with ID "99""#)
    );
    assert_eq!(context.directory().fetch_count(), 1);
}
