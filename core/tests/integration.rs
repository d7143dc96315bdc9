//! End-to-end tests against the live fixture server.
//!
//! # Design
//! Each test starts the fixture server on a random port and drives the
//! client over real HTTP, covering both the blocking and the async surface:
//! content negotiation on request bodies, typed/dynamic/raw decoding,
//! header handling, address resolution and error translation.

use std::sync::{Arc, Mutex};

use rest_client::{
    Binary, Deferred, Discard, Dynamic, Method, Raw, RestBody, RestClient, RestHeader,
    RestRequest, Text, Typed,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TestModel {
    id: i32,
    name: String,
}

fn gino() -> TestModel {
    TestModel {
        id: 1,
        name: "Gino".to_string(),
    }
}

/// Start the fixture server on a random port from a plain (non-async) test,
/// returning its base address with a trailing slash.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}/")
}

/// Async twin of [`start_server`], running the server on the test runtime.
async fn start_server_async() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}/")
}

// --- typed decoding ---

#[test]
fn get_decodes_json_into_model() {
    let client = RestClient::new(start_server());
    let model = client.get_blocking::<Typed<TestModel>>("api/test/1", &[]).unwrap();
    assert_eq!(model, Some(gino()));
}

#[test]
fn get_decodes_json_array() {
    let client = RestClient::new(start_server());
    let models = client
        .get_blocking::<Typed<Vec<TestModel>>>("api/test", &[])
        .unwrap()
        .unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0], gino());
    assert_eq!(models[1].name, "Pino");
}

#[test]
fn get_decodes_xml_by_content_type() {
    let client = RestClient::new(start_server());
    let model = client.get_blocking::<Typed<TestModel>>("api/test/xml", &[]).unwrap();
    assert_eq!(model, Some(gino()));
}

#[test]
fn get_returns_raw_bytes() {
    let client = RestClient::new(start_server());
    let bytes = client.get_blocking::<Binary>("api/test/1", &[]).unwrap();
    let model: TestModel = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(model, gino());
}

#[test]
fn get_dynamic_exposes_fields_without_schema() {
    let client = RestClient::new(start_server());
    let value = client.get_blocking::<Dynamic>("api/test/1", &[]).unwrap();
    assert_eq!(value["Id"], 1);
    assert_eq!(value["Name"], "Gino");
}

#[test]
fn non_json_content_yields_null_dynamic() {
    let client = RestClient::new(start_server());
    let value = client.get_blocking::<Dynamic>("api/test/html", &[]).unwrap();
    assert_eq!(value, serde_json::Value::Null);
}

#[test]
fn no_content_yields_empty_values() {
    let client = RestClient::new(start_server());
    let value = client.get_blocking::<Dynamic>("api/test/returnnocontent", &[]).unwrap();
    assert_eq!(value, serde_json::Value::Null);
    let model = client
        .get_blocking::<Typed<TestModel>>("api/test/returnnocontent", &[])
        .unwrap();
    assert_eq!(model, None);
}

// --- request bodies ---

#[test]
fn post_echoes_structured_body() {
    let client = RestClient::new(start_server());
    let sent = TestModel {
        id: 3,
        name: "Paperino".to_string(),
    };
    let body = RestBody::serialize(&sent).unwrap();
    let received = client
        .post_blocking::<Typed<TestModel>>("api/test", Some(body), &[])
        .unwrap();
    assert_eq!(received, Some(sent));
}

#[test]
fn post_text_body_roundtrips() {
    let client = RestClient::new(start_server());
    let value = client
        .post_blocking::<Text>("api/test/text", Some("ciao".into()), &[])
        .unwrap();
    assert_eq!(value, "ciao");
}

#[test]
fn post_bytes_with_explicit_content_type() {
    let client = RestClient::new(start_server());
    let received = client
        .post_blocking::<Binary>(
            "api/test/textecho",
            Some(b"ciaone".as_slice().into()),
            &[RestHeader::content_type("text/plain")],
        )
        .unwrap();
    assert_eq!(received, b"ciaone");
}

#[test]
fn put_string_body_echoes() {
    let client = RestClient::new(start_server());
    let value = client
        .put_blocking::<Text>(
            "api/test/textecho",
            Some("ciaone".into()),
            &[RestHeader::content_type("text/plain")],
        )
        .unwrap();
    assert_eq!(value, "ciaone");
}

#[test]
fn post_without_body_sends_nothing() {
    let client = RestClient::new(start_server());
    let value = client
        .post_blocking::<Text>("api/test/textecho", None, &[])
        .unwrap();
    assert_eq!(value, "");
}

// --- headers ---

#[test]
fn per_call_header_reaches_the_server() {
    let client = RestClient::new(start_server());
    let value = client
        .get_blocking::<Text>("api/test/mykey", &[RestHeader::new("MyKey", "MyValue")])
        .unwrap();
    assert_eq!(value, "MyValue");
}

#[test]
fn default_header_applies_to_every_call() {
    let mut client = RestClient::new(start_server());
    client.add_default_header(RestHeader::new("MyKey", "MyValue"));
    let value = client.get_blocking::<Text>("api/test/mykey", &[]).unwrap();
    assert_eq!(value, "MyValue");
}

#[test]
fn authorization_header_passes_verbatim() {
    let client = RestClient::new(start_server());
    let value = client
        .get_blocking::<Text>(
            "api/test/authorization",
            &[RestHeader::authorization("MySchema MyUser:MyPassword")],
        )
        .unwrap();
    assert_eq!(value, "MySchema MyUser:MyPassword");
}

#[test]
fn date_header_roundtrips_with_offset() {
    let offset = chrono::FixedOffset::east_opt(4 * 3600).unwrap();
    let ts = chrono::TimeZone::with_ymd_and_hms(&offset, 2024, 5, 17, 10, 30, 0).unwrap();

    let client = RestClient::new(start_server());
    let value = client
        .get_blocking::<Text>("api/test/date", &[RestHeader::date(ts)])
        .unwrap();
    assert_eq!(chrono::DateTime::parse_from_rfc3339(&value).unwrap(), ts);
}

// --- errors ---

#[test]
fn missing_url_raises_call_failed_with_empty_content() {
    let client = RestClient::new(start_server());
    let err = client
        .get_blocking::<Text>("ooooooooooo/test/1", &[])
        .unwrap_err();
    match err {
        rest_client::RestError::CallFailed {
            status,
            content,
            content_text,
            ..
        } => {
            assert_eq!(status.as_u16(), 404);
            assert!(content.is_none());
            assert_eq!(content_text, "");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn structured_error_body_is_parsed() {
    let client = RestClient::new(start_server());
    let err = client.get_blocking::<Discard>("api/test/error", &[]).unwrap_err();
    match err {
        rest_client::RestError::CallFailed { status, content, content_text, .. } => {
            assert_eq!(status.as_u16(), 400);
            let content = content.unwrap();
            assert_eq!(content["Error"]["Code"], "MyErrorCode");
            assert_eq!(content["Error"]["Message"], "MyErrorMessage");
            assert_eq!(
                content_text,
                r#"{"Error":{"Code":"MyErrorCode","Message":"MyErrorMessage"}}"#
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unparseable_error_body_keeps_raw_text() {
    let client = RestClient::new(start_server());
    let err = client
        .get_blocking::<Discard>("api/test/errorashtml", &[])
        .unwrap_err();
    match err {
        rest_client::RestError::CallFailed { status, content, content_text, .. } => {
            assert_eq!(status.as_u16(), 400);
            assert!(content.is_none());
            assert_eq!(content_text, "<html><body>bad request</body></html>");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn delete_with_error_status_raises() {
    let client = RestClient::new(start_server());
    let err = client
        .delete_blocking::<Discard>("api/test/1?errorCode=500", &[])
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}

#[test]
fn redirect_counts_as_failure() {
    let client = RestClient::new(start_server());
    let err = client.get_blocking::<Dynamic>("api/test/redirect", &[]).unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(302));
}

// --- escape hatches ---

#[test]
fn raw_response_never_raises() {
    let client = RestClient::new(start_server());
    let raw = client.get_blocking::<Raw>("api1234/test/1", &[]).unwrap();
    assert_eq!(raw.status.as_u16(), 404);
    assert!(!raw.is_success());
}

#[test]
fn deferred_response_decodes_on_demand() {
    let client = RestClient::new(start_server());
    let response = client.get_blocking::<Deferred>("api/test/1", &[]).unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers().get("x-name").unwrap(), "gino");

    let model = response.content::<Typed<TestModel>>().unwrap();
    assert_eq!(model, Some(gino()));
}

// --- verbs and custom requests ---

#[test]
fn delete_succeeds_silently() {
    let client = RestClient::new(start_server());
    client.delete_blocking::<Discard>("api/test/1", &[]).unwrap();
}

#[test]
fn send_executes_a_prebuilt_request() {
    let client = RestClient::new(start_server());
    let sent = TestModel {
        id: 3,
        name: "Paperino".to_string(),
    };
    let request = RestRequest::new(Method::POST, "api/test")
        .body(RestBody::serialize(&sent).unwrap());
    let received = client.send_blocking::<Typed<TestModel>>(request).unwrap();
    assert_eq!(received, Some(sent));
}

// --- address resolution ---

#[test]
fn base_address_joins_with_and_without_slashes() {
    let root = start_server();
    for base in [format!("{root}api"), format!("{root}api/")] {
        for address in ["test/1", "/test/1"] {
            let client = RestClient::new(base.clone());
            let model = client.get_blocking::<Typed<TestModel>>(address, &[]).unwrap();
            assert_eq!(model, Some(gino()), "base={base} address={address}");
        }
    }
}

#[test]
fn empty_base_requires_absolute_addresses() {
    let root = start_server();
    let client = RestClient::new("");
    let model = client
        .get_blocking::<Typed<TestModel>>(&format!("{root}api/test/1"), &[])
        .unwrap();
    assert_eq!(model, Some(gino()));
}

// --- observers ---

#[test]
fn observer_sees_the_resolved_request() {
    let root = start_server();
    let seen = Arc::new(Mutex::new(None::<String>));

    let mut client = RestClient::new(root.clone());
    let seen_by_observer = Arc::clone(&seen);
    client.on_sending_request(move |wire| {
        *seen_by_observer.lock().unwrap() = Some(wire.url.clone());
    });

    client.get_blocking::<Typed<TestModel>>("api/test/1", &[]).unwrap();

    let url = seen.lock().unwrap().clone().unwrap();
    assert_eq!(url, format!("{root}api/test/1"));
}

// --- async surface ---

#[tokio::test]
async fn async_get_decodes_json() {
    let client = RestClient::new(start_server_async().await);
    let model = client.get::<Typed<TestModel>>("api/test/1", &[]).await.unwrap();
    assert_eq!(model, Some(gino()));
}

#[tokio::test]
async fn async_post_echoes_structured_body() {
    let client = RestClient::new(start_server_async().await);
    let sent = TestModel {
        id: 3,
        name: "Paperino".to_string(),
    };
    let body = RestBody::serialize(&sent).unwrap();
    let received = client
        .post::<Typed<TestModel>>("api/test", Some(body), &[])
        .await
        .unwrap();
    assert_eq!(received, Some(sent));
}

#[tokio::test]
async fn async_put_and_delete() {
    let client = RestClient::new(start_server_async().await);

    let sent = gino();
    let body = RestBody::serialize(&sent).unwrap();
    let updated = client
        .put::<Typed<TestModel>>("api/test/1", Some(body), &[])
        .await
        .unwrap();
    assert_eq!(updated, Some(sent));

    client.delete::<Discard>("api/test/1", &[]).await.unwrap();
}

#[tokio::test]
async fn async_failure_raises_call_failed() {
    let client = RestClient::new(start_server_async().await);
    let err = client.get::<Text>("missing", &[]).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}

#[tokio::test]
async fn async_deferred_response() {
    let client = RestClient::new(start_server_async().await);
    let response = client.get::<Deferred>("api/test/1", &[]).await.unwrap();
    assert!(response.is_success());
    assert_eq!(response.content::<Typed<TestModel>>().unwrap(), Some(gino()));
}
