use crate::core::client::{Body, FilePart, RequestConfig};
use crate::core::error::TransportError;
use crate::core::services::Transport;
use futures::future::BoxFuture;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use url::Url;

const DEFAULT_PART_MIME: &str = "application/xml";

/// [`Transport`] over a shared `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        base_url: &'a Url,
        request: &'a RequestConfig,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(async move {
            let url = build_url(base_url, request)?;
            let mut req = self
                .http
                .request(request.method.clone(), url.clone())
                .headers(request.headers.clone());

            req = match &request.body {
                Body::Empty => req,
                Body::Json(v) => req.json(v),
                // Form is single-use; rebuilt from parts on every attempt.
                Body::Multipart(parts) => req.multipart(build_form(parts)?),
            };

            let resp = req.send().await?;
            let status = resp.status();
            let text = resp.text().await?;

            if !status.is_success() {
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                    body: serde_json::from_str(&text).ok(),
                });
            }
            decode_body(&text)
        })
    }
}

/// `{base}{endpoint}?{query}`; the endpoint is appended to the base path, not resolved against it.
pub(crate) fn build_url(base_url: &Url, request: &RequestConfig) -> Result<Url, TransportError> {
    let base = base_url.as_str().trim_end_matches('/');
    let endpoint = request.endpoint.trim_start_matches('/');
    let mut url = Url::parse(&format!("{base}/{endpoint}"))?;
    if !request.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in &request.query {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

fn build_form(parts: &[FilePart]) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for p in parts {
        let part = Part::bytes(p.bytes.clone())
            .file_name(p.file_name.clone())
            .mime_str(p.mime.as_deref().unwrap_or(DEFAULT_PART_MIME))?;
        form = form.part(p.field.clone(), part);
    }
    Ok(form)
}

fn decode_body(text: &str) -> Result<Value, TransportError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| TransportError::Data(e.to_string()))
}
