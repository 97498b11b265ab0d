//! Fallback handler that dispatches `*.action` requests to published endpoints.

use actiongate_core::HttpMethod;
use axum::body::{self, Body};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use super::AppState;
use crate::network::routes::RequestTarget;
use crate::service::ActionRequest;

/// Resolves the request against the route table and runs the matching
/// endpoint's pipeline on the blocking pool.
///
/// Anything that does not reach an endpoint answers a bare status: 404 for
/// unknown routes and unsupported methods, 413 for oversized bodies, 503
/// while draining.
pub async fn action_handler(State(state): State<AppState>, request: Request) -> Response {
    if !state.shutdown.accepting() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    let _guard = state.shutdown.in_flight_guard();

    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let Some(method) = HttpMethod::from_http(&parts.method) else {
        debug!(method = %parts.method, path = %path, "Unsupported method");
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(target) = RequestTarget::parse(&path).filter(RequestTarget::is_action) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let resource = state.resources.resolve(&target.resource_path);
    let Some(endpoint) = state.routes.lookup(&target, method, resource.as_ref()) else {
        debug!(%method, path = %path, "No action registered");
        return StatusCode::NOT_FOUND.into_response();
    };

    let body = match body::to_bytes(body, state.config.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(error = %err, path = %path, "Unable to read request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let mut action_request = ActionRequest::new(method, path);
    action_request.query = parts.uri.query().map(str::to_string);
    action_request.headers = parts.headers;
    action_request.body = body;
    action_request.resource = resource;

    if !endpoint.accepts(&action_request) {
        return StatusCode::NOT_FOUND.into_response();
    }

    match tokio::task::spawn_blocking(move || endpoint.handle(action_request).into_http()).await {
        Ok(response) => response.map(Body::from).into_response(),
        Err(err) => {
            error!(error = %err, "Action task did not complete");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use actiongate_core::Resource;
    use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::service::fixtures::{
        test_app_state, EchoEntityAction, FailingAction, HelloPathAction, HelloPrimaryTypeAction,
        HelloResourceTypePostAction, PageAction, RawTeapotAction, MODULE, REMOTE_USER_HEADER,
    };
    use crate::service::{ActionProvider, CheckAuthenticationAction};

    fn router(state: AppState) -> Router {
        Router::new().fallback(action_handler).with_state(state)
    }

    async fn send(state: &AppState, request: axum::http::Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::get(uri).body(Body::empty()).unwrap()
    }

    fn json_of(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn path_action_answers_success_envelope() {
        let (state, _resources) = test_app_state();
        state.registry.register(ActionProvider::new(HelloPathAction)).unwrap();

        let response = router(state)
            .oneshot(get(&format!("/apps/{MODULE}/bin/hello-path.action?name=Bob")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/json;charset=UTF-8"
        );
        assert_eq!(response.headers()[CACHE_CONTROL], "no-store");
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            json_of(&bytes),
            json!({
                "status": "SUCCESS",
                "message": "Hello Bob!",
                "messageDetails": "Your name is Bob",
                "authContext": {"userId": "anonymous"}
            })
        );
    }

    #[tokio::test]
    async fn validation_failure_answers_400() {
        let (state, _resources) = test_app_state();
        state.registry.register(ActionProvider::new(HelloPathAction)).unwrap();

        let (status, bytes) = send(
            &state,
            get(&format!("/apps/{MODULE}/bin/hello-path.action?name=bob")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let envelope = json_of(&bytes);
        assert_eq!(envelope["status"], "VALIDATION_FAILURE");
        assert_eq!(envelope["entity"][0]["path"], "name");
        assert_eq!(envelope["entity"][0]["message"], "Name should not start lower case");
    }

    #[tokio::test]
    async fn action_error_answers_500_without_detail() {
        let (state, _resources) = test_app_state();
        state.registry.register(ActionProvider::new(FailingAction)).unwrap();

        let request = axum::http::Request::post(format!("/apps/{MODULE}/bin/failing.action"))
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = send(&state, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = json_of(&bytes);
        assert_eq!(envelope["status"], "ERROR");
        assert!(!String::from_utf8_lossy(&bytes).contains("connection refused"));
    }

    #[tokio::test]
    async fn json_body_binds_entity() {
        let (state, _resources) = test_app_state();
        state.registry.register(ActionProvider::new(EchoEntityAction)).unwrap();

        let request = axum::http::Request::post(format!("/apps/{MODULE}/bin/echo-entity.action"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text":"hi","count":3}"#))
            .unwrap();
        let (status, bytes) = send(&state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&bytes)["entity"], json!({"text": "hi", "count": 3}));
    }

    #[tokio::test]
    async fn typed_query_fields_bind_over_http() {
        let (state, _resources) = test_app_state();
        state.registry.register(ActionProvider::new(PageAction)).unwrap();

        let request = axum::http::Request::post(format!("/apps/{MODULE}/bin/page.action?name=Bob&limit=5"))
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = send(&state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_of(&bytes)["entity"],
            json!({"name": "Bob", "limit": 5, "exact": false})
        );
    }

    #[tokio::test]
    async fn missing_required_json_field_answers_400() {
        let (state, _resources) = test_app_state();
        state.registry.register(ActionProvider::new(PageAction)).unwrap();

        let request = axum::http::Request::post(format!("/apps/{MODULE}/bin/page.action"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"limit":5}"#))
            .unwrap();
        let (status, bytes) = send(&state, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let envelope = json_of(&bytes);
        assert_eq!(envelope["status"], "VALIDATION_FAILURE");
        assert_eq!(envelope["entity"][0]["path"], "name");
    }

    #[tokio::test]
    async fn unknown_route_answers_bare_404() {
        let (state, _resources) = test_app_state();
        state.registry.register(ActionProvider::new(HelloPathAction)).unwrap();

        let (status, bytes) = send(&state, get("/apps/greeter/bin/nothing.action")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn wrong_method_or_extension_is_404() {
        let (state, _resources) = test_app_state();
        state.registry.register(ActionProvider::new(HelloPathAction)).unwrap();

        let post = axum::http::Request::post(format!("/apps/{MODULE}/bin/hello-path.action"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&state, post).await.0, StatusCode::NOT_FOUND);

        let html = get(&format!("/apps/{MODULE}/bin/hello-path.html"));
        assert_eq!(send(&state, html).await.0, StatusCode::NOT_FOUND);

        let put = axum::http::Request::put(format!("/apps/{MODULE}/bin/hello-path.action"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&state, put).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn primary_type_route_requires_matching_resource() {
        let (state, resources) = test_app_state();
        state
            .registry
            .register(ActionProvider::new(HelloPrimaryTypeAction))
            .unwrap();
        resources.insert(Resource::new("/content/docs", "site/folder").with_primary_type("nt:folder"));
        resources.insert(Resource::new("/content/page", "site/page").with_primary_type("nt:unstructured"));

        let folder = axum::http::Request::post("/content/docs.greeter.hello-primary-type.action")
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = send(&state, folder).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&bytes)["message"], "Hello folder!");

        let page = axum::http::Request::post("/content/page.greeter.hello-primary-type.action")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&state, page).await.0, StatusCode::NOT_FOUND);

        let missing = axum::http::Request::post("/content/none.greeter.hello-primary-type.action")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&state, missing).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn resource_type_route_matches_resource_type() {
        let (state, resources) = test_app_state();
        state
            .registry
            .register(ActionProvider::new(HelloResourceTypePostAction))
            .unwrap();
        resources.insert(Resource::new("/content/example", "some/example/resource/type"));

        let request =
            axum::http::Request::post("/content/example.greeter.hello-resource-type-post.action")
                .body(Body::empty())
                .unwrap();
        let (status, bytes) = send(&state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&bytes)["message"], "Hello resource!");
    }

    #[tokio::test]
    async fn check_authentication_reports_caller() {
        let (state, _resources) = test_app_state();
        state
            .registry
            .register(ActionProvider::new(CheckAuthenticationAction::new(MODULE)))
            .unwrap();

        let request = axum::http::Request::get(format!(
            "/apps/{MODULE}/bin/check-authentication.action"
        ))
        .header(REMOTE_USER_HEADER, "alice")
        .body(Body::empty())
        .unwrap();
        let (status, bytes) = send(&state, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_of(&bytes),
            json!({"status": "SUCCESS", "authContext": {"userId": "alice"}})
        );
    }

    #[tokio::test]
    async fn raw_writer_owns_the_response() {
        let (state, _resources) = test_app_state();
        state.registry.register(ActionProvider::new(RawTeapotAction)).unwrap();

        let (status, bytes) = send(&state, get(&format!("/apps/{MODULE}/bin/raw-teapot.action"))).await;

        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(bytes, b"short and stout");
    }

    #[tokio::test]
    async fn draining_server_refuses_actions() {
        let (state, _resources) = test_app_state();
        state.registry.register(ActionProvider::new(HelloPathAction)).unwrap();
        state.shutdown.set_ready();
        state.shutdown.trigger_shutdown();

        let (status, _) = send(
            &state,
            get(&format!("/apps/{MODULE}/bin/hello-path.action?name=Bob")),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(state.shutdown.in_flight_count(), 0);
    }
}
