//! GraphQL transport.
//!
//! Loaders and mutations only see the [`GraphqlTransport`] trait; the HTTP
//! implementation below is what the binary wires in, tests use an in-memory
//! one.

use crate::errors::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Execute one document and return its `data` object.
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, ClientError>;
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

/// GraphQL over HTTP POST.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, ClientError> {
        debug!(endpoint = %self.endpoint, "graphql request");
        let response: GraphqlResponse = self
            .client
            .post(&self.endpoint)
            .json(&GraphqlRequest {
                query: document,
                variables,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.errors.is_empty() {
            let message = response
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%message, "graphql errors");
            return Err(ClientError::Graphql(message));
        }
        response.data.ok_or(ClientError::EmptyResponse)
    }
}

/// The `{ result, error }` envelope every mutation returns.
///
/// A rejected operation is `error: Some(..)`, not an `Err`; callers must
/// check it and surface the message to the user.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MutationOutcome {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MutationOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.as_deref().is_none_or(str::is_empty)
    }
}

/// Run a mutation and pull the envelope out of `data.<field>`.
pub async fn mutate<V: Serialize>(
    transport: &dyn GraphqlTransport,
    document: &str,
    field: &str,
    variables: &V,
) -> Result<MutationOutcome, ClientError> {
    let data = transport
        .execute(document, serde_json::to_value(variables)?)
        .await?;
    let envelope = data.get(field).cloned().ok_or(ClientError::EmptyResponse)?;
    let outcome: MutationOutcome = serde_json::from_value(envelope)?;
    if let Some(error) = outcome.error.as_deref().filter(|e| !e.is_empty()) {
        warn!(field, error, "mutation rejected");
    }
    Ok(outcome)
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory transport keyed on the document text.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<String, Result<Value, String>>>,
        pub calls: Mutex<Vec<(String, Value)>>,
    }

    impl MockTransport {
        pub fn respond(&self, document: &str, data: Value) {
            self.responses.lock().insert(document.to_string(), Ok(data));
        }

        pub fn fail(&self, document: &str, message: &str) {
            self.responses
                .lock()
                .insert(document.to_string(), Err(message.to_string()));
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl GraphqlTransport for MockTransport {
        async fn execute(&self, document: &str, variables: Value) -> Result<Value, ClientError> {
            self.calls.lock().push((document.to_string(), variables));
            match self.responses.lock().get(document) {
                Some(Ok(data)) => Ok(data.clone()),
                Some(Err(message)) => Err(ClientError::Graphql(message.clone())),
                None => Err(ClientError::EmptyResponse),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn mutation_envelope_carries_business_errors() {
        let transport = MockTransport::default();
        transport.respond(
            "mutation { x }",
            json!({"do_x": {"result": null, "error": "insufficient funds"}}),
        );
        let outcome = mutate(&transport, "mutation { x }", "do_x", &json!({"amount": 5}))
            .await
            .unwrap();
        assert!(!outcome.is_ok());
        assert_eq!(outcome.error.as_deref(), Some("insufficient funds"));
        assert_eq!(transport.calls.lock()[0].1, json!({"amount": 5}));
    }

    #[tokio::test]
    async fn missing_envelope_is_an_error() {
        let transport = MockTransport::default();
        transport.respond("mutation { y }", json!({"other": {}}));
        let err = mutate(&transport, "mutation { y }", "do_y", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::EmptyResponse));
    }

    #[test]
    fn empty_error_string_counts_as_success() {
        let outcome = MutationOutcome {
            result: Some(json!("ok")),
            error: Some(String::new()),
        };
        assert!(outcome.is_ok());
    }
}
