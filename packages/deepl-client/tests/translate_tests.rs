//! DeepL client against a local stand-in for the translation endpoint.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use serde_json::json;

use deepl_client::{DeepLClient, DeepLError, TargetLang};

#[derive(Default)]
struct MockDeepL {
    fail_with: Option<StatusCode>,
    /// Drop the last translation from every response
    short_response: bool,
    forms: Mutex<Vec<Vec<(String, String)>>>,
    auth: Mutex<Vec<String>>,
}

async fn translate(
    State(mock): State<Arc<MockDeepL>>,
    headers: HeaderMap,
    Form(form): Form<Vec<(String, String)>>,
) -> Response {
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        mock.auth.lock().unwrap().push(auth.to_string());
    }
    mock.forms.lock().unwrap().push(form.clone());

    if let Some(status) = mock.fail_with {
        return (status, "Quota exceeded").into_response();
    }

    let target = form
        .iter()
        .find(|(k, _)| k == "target_lang")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    let mut translations: Vec<_> = form
        .iter()
        .filter(|(k, _)| k == "text")
        .map(|(_, v)| json!({ "detected_source_language": "EN", "text": format!("{target}:{v}") }))
        .collect();
    if mock.short_response {
        translations.pop();
    }

    Json(json!({ "translations": translations })).into_response()
}

async fn spawn(mock: MockDeepL) -> (DeepLClient, Arc<MockDeepL>) {
    let mock = Arc::new(mock);
    let app = Router::new()
        .route("/v2/translate", post(translate))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client =
        DeepLClient::new("secret-key").with_api_url(format!("http://{addr}/v2/translate"));
    (client, mock)
}

#[tokio::test]
async fn test_batch_maps_results_back_over_blanks() {
    let (client, mock) = spawn(MockDeepL::default()).await;

    let out = client
        .translate_batch(
            &["Pool".into(), " ".into(), "Waterfront".into()],
            TargetLang::Es,
        )
        .await
        .unwrap();

    assert_eq!(
        out,
        vec![
            Some("ES:Pool".to_string()),
            Some(" ".to_string()),
            Some("ES:Waterfront".to_string()),
        ]
    );

    let forms = mock.forms.lock().unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(
        forms[0],
        vec![
            ("text".to_string(), "Pool".to_string()),
            ("text".to_string(), "Waterfront".to_string()),
            ("target_lang".to_string(), "ES".to_string()),
        ]
    );
    assert_eq!(
        mock.auth.lock().unwrap().as_slice(),
        ["DeepL-Auth-Key secret-key".to_string()]
    );
}

#[tokio::test]
async fn test_single_translate() {
    let (client, _mock) = spawn(MockDeepL::default()).await;

    let out = client.translate("For Sale", TargetLang::Es).await.unwrap();
    assert_eq!(out.as_deref(), Some("ES:For Sale"));
}

#[tokio::test]
async fn test_short_response_yields_none() {
    let (client, _mock) = spawn(MockDeepL {
        short_response: true,
        ..Default::default()
    })
    .await;

    let out = client
        .translate_batch(&["Pool".into(), "Spa".into()], TargetLang::Es)
        .await
        .unwrap();
    assert_eq!(out, vec![Some("ES:Pool".to_string()), None]);
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let (client, _mock) = spawn(MockDeepL {
        fail_with: Some(StatusCode::from_u16(456).unwrap()),
        ..Default::default()
    })
    .await;

    let err = client
        .translate_batch(&["Pool".into()], TargetLang::Es)
        .await
        .unwrap_err();

    match err {
        DeepLError::Api { status, message } => {
            assert_eq!(status, 456);
            assert_eq!(message, "Quota exceeded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
