use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Query, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;

/// What the server saw, returned as the response body.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub json: Option<Value>,
    pub parts: Vec<EchoPart>,
}

/// One decoded multipart entry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EchoPart {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub text: Option<String>,
}

type Rejection = (StatusCode, String);

pub fn app() -> Router {
    Router::new().fallback(echo)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(request: Request) -> Result<Json<Echo>, Rejection> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let Query(query) = Query::<Vec<(String, String)>>::try_from_uri(request.uri())
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let headers: BTreeMap<String, String> = request
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    let content_type = headers.get(CONTENT_TYPE.as_str()).cloned();

    let mut echo = Echo {
        method,
        path,
        query,
        headers,
        content_type: content_type.clone(),
        json: None,
        parts: Vec::new(),
    };

    match content_type.as_deref() {
        Some(ct) if ct.starts_with("multipart/form-data") => {
            let mut multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
            {
                let name = field.name().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
                echo.parts.push(EchoPart {
                    name,
                    file_name,
                    content_type,
                    size: data.len(),
                    text: String::from_utf8(data.to_vec()).ok(),
                });
            }
        }
        Some(ct) if ct.starts_with("application/json") => {
            let data = Bytes::from_request(request, &())
                .await
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            let json = serde_json::from_slice(&data)
                .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
            echo.json = Some(json);
        }
        _ => {}
    }

    tracing::info!(
        method = %echo.method,
        path = %echo.path,
        parts = echo.parts.len(),
        "echoed request"
    );
    Ok(Json(echo))
}
