//! HTTP boundary: URL construction relative to the API base, CSRF handling,
//! JSON and multipart bodies, and classification of replies.

use std::path::Path;

use bytes::Bytes;
use reqwest::{
    Client, Method, Response, StatusCode,
    header::{CONTENT_TYPE, HeaderValue},
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ApiSettings;

use super::error::{ApiError, ErrorBody};

const CSRF_HEADER: &str = "X-CSRFToken";

/// Request body variants accepted by the transport.
#[derive(Debug, Clone)]
pub(crate) enum Body {
    Empty,
    Json(Value),
    Multipart(Vec<FormField>),
}

#[derive(Debug, Clone)]
pub(crate) enum FormField {
    Text { name: &'static str, value: String },
    File { name: &'static str, upload: Upload },
}

/// A file prepared for a multipart upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let data = tokio::fs::read(path).await.map_err(|err| ApiError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        Ok(Self::new(file_name, data))
    }

    fn to_part(&self) -> Result<Part, ApiError> {
        Part::bytes(self.bytes.to_vec())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
            .map_err(ApiError::from)
    }
}

/// Classified successful reply.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reply {
    /// `204 No Content`; never parsed.
    NoContent,
    Json(Value),
    Text(String),
}

impl Reply {
    pub(crate) fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }

    /// Body as JSON. A 204 reads as `true`; text that is not JSON is kept as a string.
    pub(crate) fn into_value(self) -> Value {
        match self {
            Self::NoContent => Value::Bool(true),
            Self::Json(value) => value,
            Self::Text(text) if text.trim().is_empty() => Value::Null,
            Self::Text(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        }
    }

    pub(crate) fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.into_value()).map_err(ApiError::from)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    client: Client,
    base: Url,
    csrf_token: Option<String>,
}

impl HttpTransport {
    pub(crate) fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            base: settings.base_url.clone(),
            csrf_token: settings.csrf_token.clone(),
        })
    }

    pub(crate) fn base(&self) -> &Url {
        &self.base
    }

    pub(crate) fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.base.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            url.set_query(None);
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub(crate) async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Reply, ApiError> {
        self.send(Method::GET, path, query, Body::Empty).await
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Body,
    ) -> Result<Reply, ApiError> {
        let url = self.url(path, query)?;
        debug!(target = "postwire::transport", %method, %url, "sending request");

        let mut request = self.client.request(method.clone(), url);
        if method != Method::GET {
            if let Some(token) = self.csrf_token.as_deref() {
                let value = HeaderValue::from_str(token)
                    .map_err(|err| ApiError::invalid_input(format!("csrf token: {err}")))?;
                request = request.header(CSRF_HEADER, value);
            }
        }

        request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(&value),
            // The boundary-bearing content type is set by reqwest.
            Body::Multipart(fields) => request.multipart(build_form(fields)?),
        };

        let response = request.send().await?;
        classify(response).await
    }
}

fn build_form(fields: Vec<FormField>) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name, value),
            FormField::File { name, upload } => form.part(name, upload.to_part()?),
        };
    }
    Ok(form)
}

async fn classify(response: Response) -> Result<Reply, ApiError> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Ok(Reply::NoContent);
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("json"));
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            status,
            body: ErrorBody::from_bytes(&bytes),
        });
    }

    if is_json && !bytes.is_empty() {
        return Ok(Reply::Json(serde_json::from_slice(&bytes)?));
    }
    Ok(Reply::Text(String::from_utf8_lossy(&bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn transport(base: &str) -> HttpTransport {
        let settings = ApiSettings::new(Url::parse(base).expect("base url")).expect("settings");
        HttpTransport::new(&settings).expect("transport")
    }

    #[test]
    fn paths_join_beneath_base_prefix() {
        let transport = transport("https://blog.example.com/backend");
        let url = transport
            .url("/api/posts/5/", &[("page", "2".to_string())])
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://blog.example.com/backend/api/posts/5/?page=2"
        );
    }

    #[test]
    fn no_content_reads_as_true() {
        assert_eq!(Reply::NoContent.into_value(), Value::Bool(true));
    }

    #[test]
    fn text_reply_parses_json_when_possible() {
        assert_eq!(
            Reply::Text(r#"{"count":3}"#.into()).into_value(),
            json!({"count": 3})
        );
        assert_eq!(
            Reply::Text("ok".into()).into_value(),
            Value::String("ok".into())
        );
    }

    #[test]
    fn upload_guesses_content_type() {
        let upload = Upload::new("cover.png", vec![1_u8, 2, 3]);
        assert_eq!(upload.content_type, "image/png");
        let unknown = Upload::new("blob", vec![0_u8]);
        assert_eq!(unknown.content_type, "application/octet-stream");
    }
}
