//! JSON/HTTP client for the document store API
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET    api/xml/files`            -> `{ success, files }`
//! - `POST   api/xml/save`             <- `{ filename, content }`
//! - `GET    api/xml/load/{filename}`  -> `{ success, content }`
//! - `DELETE api/xml/delete/{filename}`
//!
//! Failures carry `message` or `error` from the response body when present.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{RemoteError, RemoteResult, RemoteStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response envelope shared by all endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreResponse {
    success: bool,
    files: Option<Vec<String>>,
    content: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct SaveBody<'a> {
    filename: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    List,
    Save,
    Load,
    Delete,
}

impl Endpoint {
    fn default_reason(self) -> &'static str {
        match self {
            Endpoint::List => "Failed to list files",
            Endpoint::Save => "Failed to save file",
            Endpoint::Load => "Failed to load file",
            Endpoint::Delete => "Failed to delete file",
        }
    }
}

/// Remote store reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base: Url,
}

impl HttpStore {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: &str) -> RemoteResult<Self> {
        let base = Url::parse(base_url.trim()).map_err(|e| {
            RemoteError::Connection(format!("invalid store URL {}: {}", base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::Connection(format!(
                "invalid store URL {}: not a base URL",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        tracing::info!("Using document store at {}", base);
        Ok(Self { client, base })
    }

    /// Base URL followed by `segments`, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> RemoteResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                RemoteError::Connection(format!("invalid store URL {}", self.base))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn send(&self, request: RequestBuilder, endpoint: Endpoint) -> RemoteResult<StoreResponse> {
        let response = request
            .send()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.json::<StoreResponse>();
        if let Err(e) = &body {
            tracing::warn!("Unreadable store response ({}): {}", status, e);
        }
        interpret(endpoint, status, body.ok())
    }
}

/// Turn a status code and optional body into a result.
///
/// Non-2xx statuses map by code: 404 is not found, 409 is a conflict, and
/// anything else is a rejection. A 2xx body with `success: false` is a
/// conflict for saves and a rejection otherwise.
fn interpret(endpoint: Endpoint, status: u16, body: Option<StoreResponse>) -> RemoteResult<StoreResponse> {
    let ok_status = (200..300).contains(&status);

    let Some(body) = body else {
        return Err(if ok_status {
            RemoteError::Connection(format!("invalid response from store ({})", status))
        } else {
            status_error(status, endpoint.default_reason().to_string())
        });
    };

    let reason = body
        .message
        .clone()
        .or_else(|| body.error.clone())
        .unwrap_or_else(|| endpoint.default_reason().to_string());

    if !ok_status {
        return Err(status_error(status, reason));
    }
    if !body.success {
        return Err(match endpoint {
            Endpoint::Save => RemoteError::Conflict(reason),
            _ => RemoteError::Rejected { status, reason },
        });
    }
    Ok(body)
}

fn status_error(status: u16, reason: String) -> RemoteError {
    match status {
        404 => RemoteError::NotFound(reason),
        409 => RemoteError::Conflict(reason),
        _ => RemoteError::Rejected { status, reason },
    }
}

impl HttpStore {
    fn list_request(&self) -> RemoteResult<RequestBuilder> {
        Ok(self.client.get(self.endpoint(&["api", "xml", "files"])?))
    }

    fn save_request(&self, filename: &str, content: &str) -> RemoteResult<RequestBuilder> {
        let url = self.endpoint(&["api", "xml", "save"])?;
        Ok(self.client.post(url).json(&SaveBody { filename, content }))
    }

    fn load_request(&self, filename: &str) -> RemoteResult<RequestBuilder> {
        Ok(self.client.get(self.endpoint(&["api", "xml", "load", filename])?))
    }

    fn delete_request(&self, filename: &str) -> RemoteResult<RequestBuilder> {
        Ok(self.client.delete(self.endpoint(&["api", "xml", "delete", filename])?))
    }
}

impl RemoteStore for HttpStore {
    fn list(&self) -> RemoteResult<Vec<String>> {
        let body = self.send(self.list_request()?, Endpoint::List)?;
        Ok(body.files.unwrap_or_default())
    }

    fn save(&self, filename: &str, content: &str) -> RemoteResult<()> {
        tracing::info!("Saving {} ({} bytes) to store", filename, content.len());
        self.send(self.save_request(filename, content)?, Endpoint::Save)?;
        Ok(())
    }

    fn load(&self, filename: &str) -> RemoteResult<String> {
        let body = self.send(self.load_request(filename)?, Endpoint::Load)?;
        Ok(body.content.unwrap_or_default())
    }

    fn delete(&self, filename: &str) -> RemoteResult<()> {
        self.send(self.delete_request(filename)?, Endpoint::Delete)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::json;

    fn body(json: &str) -> Option<StoreResponse> {
        Some(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_endpoint_urls() {
        let store = HttpStore::new("http://localhost:5000").unwrap();
        assert_eq!(
            store.endpoint(&["api", "xml", "files"]).unwrap().as_str(),
            "http://localhost:5000/api/xml/files"
        );

        let store = HttpStore::new("https://example.com/editor/").unwrap();
        assert_eq!(
            store
                .endpoint(&["api", "xml", "load", "my file.xml"])
                .unwrap()
                .as_str(),
            "https://example.com/editor/api/xml/load/my%20file.xml"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpStore::new("not a url"),
            Err(RemoteError::Connection(_))
        ));
        assert!(HttpStore::new("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_interpret_success() {
        let ok = interpret(Endpoint::List, 200, body(r#"{"success":true,"files":["a.xml"]}"#))
            .unwrap();
        assert_eq!(ok.files, Some(vec!["a.xml".to_string()]));
    }

    #[test]
    fn test_interpret_prefers_message_over_error() {
        let err = interpret(
            Endpoint::Load,
            500,
            body(r#"{"success":false,"error":"boom","message":"Disk full"}"#),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RemoteError::Rejected {
                status: 500,
                reason: "Disk full".to_string()
            }
        );
    }

    #[test]
    fn test_interpret_status_mapping() {
        let err = interpret(Endpoint::Load, 404, body(r#"{"success":false,"error":"File not found"}"#))
            .unwrap_err();
        assert_eq!(err, RemoteError::NotFound("File not found".to_string()));

        let err = interpret(Endpoint::Save, 409, None).unwrap_err();
        assert_eq!(err, RemoteError::Conflict("Failed to save file".to_string()));
    }

    #[test]
    fn test_interpret_unsuccessful_body() {
        let err = interpret(Endpoint::Save, 200, body(r#"{"success":false}"#)).unwrap_err();
        assert_eq!(err, RemoteError::Conflict("Failed to save file".to_string()));

        let err = interpret(Endpoint::Delete, 200, body(r#"{"success":false,"error":"locked"}"#))
            .unwrap_err();
        assert!(matches!(err, RemoteError::Rejected { status: 200, .. }));
    }

    #[test]
    fn test_interpret_unreadable_body() {
        assert!(matches!(
            interpret(Endpoint::List, 200, None),
            Err(RemoteError::Connection(_))
        ));
    }

    #[test]
    fn test_save_body_shape() {
        let body = SaveBody {
            filename: "a.xml",
            content: "<metadata/>",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "filename": "a.xml", "content": "<metadata/>" })
        );
    }

    #[test]
    fn test_requests() {
        let store = HttpStore::new("http://localhost:5000/").unwrap();

        let list = store.list_request().unwrap().build().unwrap();
        assert_eq!(list.method(), &Method::GET);
        assert_eq!(list.url().as_str(), "http://localhost:5000/api/xml/files");

        let save = store
            .save_request("notes.xml", "<metadata/>")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(save.method(), &Method::POST);
        assert_eq!(save.url().path(), "/api/xml/save");
        assert_eq!(
            save.headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        let sent: serde_json::Value =
            serde_json::from_slice(save.body().and_then(|b| b.as_bytes()).unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({ "filename": "notes.xml", "content": "<metadata/>" })
        );

        let load = store.load_request("a/b.xml").unwrap().build().unwrap();
        assert_eq!(load.method(), &Method::GET);
        assert_eq!(load.url().path(), "/api/xml/load/a%2Fb.xml");

        let delete = store.delete_request("old.xml").unwrap().build().unwrap();
        assert_eq!(delete.method(), &Method::DELETE);
        assert_eq!(delete.url().path(), "/api/xml/delete/old.xml");
    }
}
