use sharer_core::{Half, Halves, SharerError, SharerResult};
use tokio::sync::{mpsc, oneshot};

use crate::actor::Envelope;
use crate::protocol::{RelayRequest, RelayResponse};

/// Client side of the relay. Cheap to clone; one per page context.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<Envelope>,
}

impl std::fmt::Debug for RelayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl RelayHandle {
    pub(crate) fn new(tx: mpsc::Sender<Envelope>) -> Self {
        Self { tx }
    }

    /// Send one request and wait for its reply.
    pub async fn request(&self, request: RelayRequest) -> SharerResult<RelayResponse> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| SharerError::RelayUnavailable("relay is not running".into()))?;
        response
            .await
            .map_err(|_| SharerError::RelayUnavailable("relay dropped the request".into()))
    }

    pub async fn store(&self, half: Half, payload: &str) -> SharerResult<()> {
        match self.request(RelayRequest::store(half, payload.to_string())).await? {
            RelayResponse::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn store_data(&self, payload: &str) -> SharerResult<()> {
        self.store(Half::Data, payload).await
    }

    pub async fn store_key(&self, payload: &str) -> SharerResult<()> {
        self.store(Half::Key, payload).await
    }

    pub async fn get_data(&self) -> SharerResult<Option<String>> {
        match self.request(RelayRequest::GetData).await? {
            RelayResponse::Data(data) => Ok(data),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_key(&self) -> SharerResult<Option<String>> {
        match self.request(RelayRequest::GetKey).await? {
            RelayResponse::Key(key) => Ok(key),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_all(&self) -> SharerResult<Halves> {
        match self.request(RelayRequest::GetAll).await? {
            RelayResponse::All(halves) => Ok(halves),
            other => Err(unexpected(other)),
        }
    }

    pub async fn clear(&self) -> SharerResult<()> {
        match self.request(RelayRequest::Clear).await? {
            RelayResponse::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Serve one JSON-encoded request and return the JSON reply.
    ///
    /// Unknown request types and malformed input get an `{"error": ...}`
    /// reply; they are never silently dropped.
    pub async fn handle_json(&self, raw: &str) -> String {
        let response = match RelayRequest::from_json(raw) {
            Ok(request) => match self.request(request).await {
                Ok(response) => response,
                Err(e) => RelayResponse::Error(e.to_string()),
            },
            Err(message) => {
                tracing::warn!(error = %message, "rejected relay message");
                RelayResponse::Error(message)
            }
        };
        response.to_json()
    }

    /// True once the relay actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

fn unexpected(response: RelayResponse) -> SharerError {
    let shape = match response {
        RelayResponse::Ack => "ack",
        RelayResponse::Data(_) => "data",
        RelayResponse::Key(_) => "key",
        RelayResponse::All(_) => "all",
        RelayResponse::Error(message) => return SharerError::RelayUnavailable(message),
    };
    SharerError::Other(anyhow::anyhow!("unexpected relay response: {shape}"))
}
