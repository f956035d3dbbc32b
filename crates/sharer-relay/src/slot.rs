use std::time::Duration;

use sharer_core::{Half, Halves};
use tokio::time::Instant;
use zeroize::Zeroize;

/// The relay's only state.
///
/// `written_at` is `Some` exactly when at least one payload is stored.
#[derive(Default)]
pub struct RelaySlot {
    data: Option<String>,
    key: Option<String>,
    written_at: Option<Instant>,
}

impl RelaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one half and restart the age clock. Last writer wins.
    ///
    /// An expired slot is evicted first, so the other half cannot come back
    /// to life under the new timestamp.
    pub fn store(&mut self, half: Half, payload: String, now: Instant, max_age: Duration) {
        if self.is_expired(now, max_age) {
            tracing::debug!("relay slot expired before write, evicting");
            self.clear();
        }
        let field = match half {
            Half::Data => &mut self.data,
            Half::Key => &mut self.key,
        };
        wipe(field);
        *field = Some(payload);
        self.written_at = Some(now);
    }

    /// Current contents, evicting first when the slot has expired.
    pub fn read(&mut self, now: Instant, max_age: Duration) -> Halves {
        if self.is_expired(now, max_age) {
            tracing::debug!("relay slot expired, evicting");
            self.clear();
        }
        Halves {
            data: self.data.clone(),
            key: self.key.clone(),
        }
    }

    pub fn is_expired(&self, now: Instant, max_age: Duration) -> bool {
        self.written_at
            .is_some_and(|written| now.saturating_duration_since(written) > max_age)
    }

    /// Evict both halves unconditionally.
    pub fn clear(&mut self) {
        wipe(&mut self.data);
        wipe(&mut self.key);
        self.written_at = None;
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.key.is_none()
    }
}

impl Drop for RelaySlot {
    fn drop(&mut self) {
        self.clear();
    }
}

fn wipe(field: &mut Option<String>) {
    if let Some(mut old) = field.take() {
        old.zeroize();
    }
}
