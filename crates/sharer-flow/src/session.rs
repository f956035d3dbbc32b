//! Decrypt orchestrator
//!
//! A [`DecryptSession`] lives for one page load. On load it takes the half
//! embedded in the page URL, mirrors it into the relay so a later load can
//! find it, and merges in whatever the relay still holds from earlier loads
//! (the URL value wins for the same slot). Once both halves are present the
//! user must type the security code; only then is decryption attempted.
//!
//! The outcome of an attempt always purges the relay and the in-memory
//! halves. After a failure there is no retry with the same halves: both codes
//! must be scanned again, since a mismatch may mean a substituted QR code.

use secrecy::SecretString;
use sharer_core::config::SharerConfig;
use sharer_core::{Half, Halves, SharerError, SharerResult};
use sharer_crypto::{decompress, decrypt, import_key, KdfParams, SecurityCode};
use sharer_relay::RelayHandle;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::carrier::parse_carrier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptState {
    /// Nothing scanned yet
    WaitingForFirst,
    /// One half known, the other still needed
    WaitingForSecond { have: Half },
    /// Both halves known; waiting for the security code
    ReadyToDecrypt,
    /// Plaintext was revealed and all partial material purged
    Done,
    /// Decryption failed; everything purged, rescan both codes
    Failed,
}

impl DecryptState {
    fn from_halves(halves: &Halves) -> Self {
        match (halves.data.is_some(), halves.key.is_some()) {
            (false, false) => DecryptState::WaitingForFirst,
            (true, false) => DecryptState::WaitingForSecond { have: Half::Data },
            (false, true) => DecryptState::WaitingForSecond { have: Half::Key },
            (true, true) => DecryptState::ReadyToDecrypt,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DecryptState::Done | DecryptState::Failed)
    }
}

pub struct DecryptSession {
    relay: Option<RelayHandle>,
    relay_degraded: bool,
    halves: Halves,
    state: DecryptState,
    params: KdfParams,
}

impl std::fmt::Debug for DecryptSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptSession")
            .field("state", &self.state)
            .field("relay_degraded", &self.relay_degraded)
            .finish_non_exhaustive()
    }
}

impl DecryptSession {
    /// Start a session. Without a relay, both halves must arrive in this load.
    pub fn new(relay: Option<RelayHandle>, config: &SharerConfig) -> Self {
        let relay_degraded = relay.is_none();
        if relay_degraded {
            warn!("no relay available; both codes must be scanned in this session");
        }
        Self {
            relay,
            relay_degraded,
            halves: Halves::default(),
            state: DecryptState::WaitingForFirst,
            params: KdfParams::new(config.crypto.pbkdf2_iterations),
        }
    }

    pub fn state(&self) -> DecryptState {
        self.state
    }

    /// True once the relay turned out to be unreachable.
    pub fn relay_degraded(&self) -> bool {
        self.relay_degraded
    }

    pub fn has(&self, half: Half) -> bool {
        self.halves.get(half).is_some()
    }

    /// Process a page load.
    ///
    /// A URL that carries no half is logged and ignored; the relay is still
    /// consulted.
    pub async fn load(&mut self, page_url: Option<&str>) -> SharerResult<DecryptState> {
        let from_url = match page_url {
            Some(url) => parse_logged(url),
            None => Halves::default(),
        };
        self.absorb(from_url).await
    }

    /// Process one camera scan inside the current load.
    pub async fn scan(&mut self, text: &str) -> SharerResult<DecryptState> {
        let scanned = parse_logged(text);
        if scanned.is_empty() {
            return Ok(self.state);
        }
        self.absorb(scanned).await
    }

    /// Try to decrypt with a manually entered security code.
    ///
    /// A badly formatted code is rejected without touching any state. Any
    /// other outcome ends the attempt and purges partial material.
    pub async fn submit_code(&mut self, code: &str) -> SharerResult<SecretString> {
        if self.state != DecryptState::ReadyToDecrypt {
            return Err(SharerError::InvalidState(format!(
                "cannot decrypt while {:?}",
                self.state
            )));
        }
        let code = SecurityCode::parse(code)?;

        let (Some(data), Some(key)) = (self.halves.data.clone(), self.halves.key.clone()) else {
            return Err(SharerError::InvalidState("halves missing".into()));
        };
        let params = self.params.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            let data = Zeroizing::new(data);
            let key = Zeroizing::new(key);
            // A key that does not even decode fails exactly like a wrong one.
            let base = import_key(&key).map_err(|_| SharerError::AuthenticationFailure)?;
            let packed = Zeroizing::new(decrypt(&data, &base, &code, &params)?);
            decompress(&packed)
        })
        .await
        .map_err(|e| SharerError::Other(anyhow::anyhow!("decrypt task failed: {e}")));

        match outcome.and_then(|result| result) {
            Ok(text) => {
                info!("secret decrypted");
                self.state = DecryptState::Done;
                self.purge().await;
                Ok(SecretString::from(text))
            }
            Err(e) => {
                warn!(error = %e, "decryption failed; purging partial data");
                self.state = DecryptState::Failed;
                self.purge().await;
                Err(e)
            }
        }
    }

    /// Abandon the current attempt (user abort or "start over").
    pub async fn reset(&mut self) {
        self.purge().await;
        self.state = DecryptState::WaitingForFirst;
    }

    async fn absorb(&mut self, incoming: Halves) -> SharerResult<DecryptState> {
        if self.state.is_terminal() {
            debug!(previous = ?self.state, "new scan after finished attempt, starting over");
            self.state = DecryptState::WaitingForFirst;
        }

        for (half, payload) in incoming.present() {
            self.halves.set(half, payload.to_string());
            // One write at a time: the next begins only after this reply.
            if let Err(e) = self.mirror(half, payload).await {
                return Err(self.fail_on_relay_error(e).await);
            }
        }

        match self.fetch_relay().await {
            Ok(stored) => self.halves.merge_missing(stored),
            Err(e) => return Err(self.fail_on_relay_error(e).await),
        }

        self.state = DecryptState::from_halves(&self.halves);
        debug!(state = ?self.state, "halves reconciled");
        Ok(self.state)
    }

    async fn mirror(&mut self, half: Half, payload: &str) -> SharerResult<()> {
        let Some(relay) = self.live_relay() else {
            return Ok(());
        };
        match relay.store(half, payload).await {
            Err(SharerError::RelayUnavailable(reason)) => {
                self.degrade(&reason);
                Ok(())
            }
            other => other,
        }
    }

    async fn fetch_relay(&mut self) -> SharerResult<Halves> {
        let Some(relay) = self.live_relay() else {
            return Ok(Halves::default());
        };
        match relay.get_all().await {
            Err(SharerError::RelayUnavailable(reason)) => {
                self.degrade(&reason);
                Ok(Halves::default())
            }
            other => other,
        }
    }

    fn live_relay(&self) -> Option<RelayHandle> {
        if self.relay_degraded {
            None
        } else {
            self.relay.clone()
        }
    }

    fn degrade(&mut self, reason: &str) {
        warn!(reason, "relay unreachable; continuing with this page's data only");
        self.relay_degraded = true;
    }

    /// Relay misbehavior other than being unreachable resets everything.
    async fn fail_on_relay_error(&mut self, e: SharerError) -> SharerError {
        warn!(error = %e, "relay error; purging partial data");
        self.state = DecryptState::Failed;
        self.purge().await;
        e
    }

    async fn purge(&mut self) {
        if let Some(mut data) = self.halves.data.take() {
            data.zeroize();
        }
        if let Some(mut key) = self.halves.key.take() {
            key.zeroize();
        }

        if let Some(relay) = self.live_relay() {
            if let Err(e) = relay.clear().await {
                warn!(error = %e, "could not clear relay");
            }
        }
    }
}

fn parse_logged(text: &str) -> Halves {
    match parse_carrier(text) {
        Ok(halves) => halves,
        Err(e) => {
            warn!(error = %e, "ignoring scan");
            Halves::default()
        }
    }
}
