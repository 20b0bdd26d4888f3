//! Remote document store client.
//!
//! Every operation is a `POST {endpoint}/action/{verb}` carrying
//! `{dataSource, database, collection, ...}` and an `api-key` header.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::RemoteSettings;

/// Remote store errors.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote store verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteVerb {
    Find,
    InsertOne,
    UpdateOne,
    DeleteOne,
}

impl RemoteVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteVerb::Find => "find",
            RemoteVerb::InsertOne => "insertOne",
            RemoteVerb::UpdateOne => "updateOne",
            RemoteVerb::DeleteOne => "deleteOne",
        }
    }
}

/// Document-level access to a remote store.
pub trait RemoteStore: Send + Sync {
    /// Documents in `collection` matching `filter`.
    fn find(&self, collection: &str, filter: &Value) -> RemoteResult<Vec<Value>>;

    fn insert_one(&self, collection: &str, document: &Value) -> RemoteResult<()>;

    fn update_one(&self, collection: &str, filter: &Value, update: &Value) -> RemoteResult<()>;

    fn delete_one(&self, collection: &str, filter: &Value) -> RemoteResult<()>;
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    documents: Option<Vec<Value>>,
}

/// HTTP client for the remote data API.
pub struct DataApiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    data_source: String,
    database: String,
}

impl DataApiClient {
    /// Create a client with the configured request timeout.
    pub fn new(settings: &RemoteSettings) -> RemoteResult<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            data_source: settings.data_source.clone(),
            database: settings.database.clone(),
        })
    }

    pub(crate) fn action_url(&self, verb: RemoteVerb) -> String {
        format!("{}/action/{}", self.endpoint, verb.as_str())
    }

    pub(crate) fn request_body(&self, collection: &str, fields: Vec<(&str, Value)>) -> Value {
        let mut body = Map::new();
        body.insert("dataSource".into(), json!(self.data_source));
        body.insert("database".into(), json!(self.database));
        body.insert("collection".into(), json!(collection));
        for (key, value) in fields {
            body.insert(key.to_string(), value);
        }
        Value::Object(body)
    }

    fn post(&self, verb: RemoteVerb, body: &Value) -> RemoteResult<Value> {
        let url = self.action_url(verb);
        debug!(%url, verb = verb.as_str(), "remote store request");

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text()?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl RemoteStore for DataApiClient {
    fn find(&self, collection: &str, filter: &Value) -> RemoteResult<Vec<Value>> {
        let body = self.request_body(collection, vec![("filter", filter.clone())]);
        let response: FindResponse = serde_json::from_value(self.post(RemoteVerb::Find, &body)?)
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;

        response
            .documents
            .ok_or_else(|| RemoteError::MalformedResponse("missing documents".into()))
    }

    fn insert_one(&self, collection: &str, document: &Value) -> RemoteResult<()> {
        let body = self.request_body(collection, vec![("document", document.clone())]);
        self.post(RemoteVerb::InsertOne, &body)?;
        Ok(())
    }

    fn update_one(&self, collection: &str, filter: &Value, update: &Value) -> RemoteResult<()> {
        let body = self.request_body(
            collection,
            vec![("filter", filter.clone()), ("update", update.clone())],
        );
        self.post(RemoteVerb::UpdateOne, &body)?;
        Ok(())
    }

    fn delete_one(&self, collection: &str, filter: &Value) -> RemoteResult<()> {
        let body = self.request_body(collection, vec![("filter", filter.clone())]);
        self.post(RemoteVerb::DeleteOne, &body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client(endpoint: &str) -> DataApiClient {
        let mut settings = RemoteSettings::new(endpoint, "key-123");
        settings.timeout = Duration::from_secs(2);
        DataApiClient::new(&settings).unwrap()
    }

    #[test]
    fn test_action_url() {
        let api = client("https://data.example.com/app/v1/");
        assert_eq!(
            api.action_url(RemoteVerb::Find),
            "https://data.example.com/app/v1/action/find"
        );
        assert_eq!(
            api.action_url(RemoteVerb::UpdateOne),
            "https://data.example.com/app/v1/action/updateOne"
        );
    }

    #[test]
    fn test_request_body() {
        let api = client("https://data.example.com");
        let body = api.request_body("patients", vec![("filter", json!({"id": "p1"}))]);

        assert_eq!(
            body,
            json!({
                "dataSource": "Cluster0",
                "database": "upa_pediatrica",
                "collection": "patients",
                "filter": {"id": "p1"}
            })
        );
    }

    #[test]
    fn test_unreachable_endpoint_is_error() {
        // Port 9 (discard) is not listening on loopback in test environments.
        let api = client("http://127.0.0.1:9");
        let result = api.find("patients", &json!({}));
        assert!(matches!(result, Err(RemoteError::Http(_))));
    }

    #[test]
    fn test_find_response_shape() {
        let parsed: FindResponse =
            serde_json::from_value(json!({"documents": [{"id": "p1"}]})).unwrap();
        assert_eq!(parsed.documents.unwrap().len(), 1);

        let parsed: FindResponse = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.documents.is_none());
    }
}
