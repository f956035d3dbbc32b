use std::time::Duration;

use sharer_core::config::RelayConfig;
use sharer_core::Half;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::handle::RelayHandle;
use crate::protocol::{RelayRequest, RelayResponse};
use crate::slot::RelaySlot;

/// One request plus its private reply channel.
pub(crate) struct Envelope {
    pub(crate) request: RelayRequest,
    pub(crate) reply: oneshot::Sender<RelayResponse>,
}

/// The relay actor. Owns the slot; nothing else can reach it.
pub struct Relay {
    slot: RelaySlot,
    max_age: Duration,
    rx: mpsc::Receiver<Envelope>,
}

/// Build a relay and its handle without starting it.
pub fn channel(config: &RelayConfig) -> (Relay, RelayHandle) {
    let (tx, rx) = mpsc::channel(config.queue_depth.max(1));
    let relay = Relay {
        slot: RelaySlot::new(),
        max_age: config.max_age(),
        rx,
    };
    (relay, RelayHandle::new(tx))
}

/// Start a relay on the current tokio runtime.
///
/// The relay lives until every handle has been dropped.
pub fn spawn(config: &RelayConfig) -> RelayHandle {
    let (relay, handle) = channel(config);
    tokio::spawn(relay.run());
    handle
}

impl Relay {
    /// Serve requests one at a time until all handles are gone.
    pub async fn run(mut self) {
        info!(max_age_secs = self.max_age.as_secs(), "relay started");

        while let Some(Envelope { request, reply }) = self.rx.recv().await {
            let kind = request.kind();
            let response = self.handle(request, Instant::now());
            // The requester may have given up; the request still took effect.
            if reply.send(response).is_err() {
                debug!(kind, "relay reply dropped by requester");
            }
        }

        self.slot.clear();
        info!("relay stopped");
    }

    fn handle(&mut self, request: RelayRequest, now: Instant) -> RelayResponse {
        debug!(kind = request.kind(), "relay request");

        match request {
            RelayRequest::StoreData(payload) => {
                self.slot.store(Half::Data, payload, now, self.max_age);
                RelayResponse::Ack
            }
            RelayRequest::StoreKey(payload) => {
                self.slot.store(Half::Key, payload, now, self.max_age);
                RelayResponse::Ack
            }
            RelayRequest::GetData => RelayResponse::Data(self.slot.read(now, self.max_age).data),
            RelayRequest::GetKey => RelayResponse::Key(self.slot.read(now, self.max_age).key),
            RelayRequest::GetAll => RelayResponse::All(self.slot.read(now, self.max_age)),
            RelayRequest::Clear => {
                self.slot.clear();
                RelayResponse::Ack
            }
        }
    }
}
