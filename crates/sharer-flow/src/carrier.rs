//! Turning scanned text back into halves
//!
//! Accepted forms:
//! - `<base>#data=<payload>` / `<base>#key=<payload>` (what we print)
//! - `<base>?data=<payload>` / `<base>?key=<payload>` (older QR codes)
//! - a bare base64 payload from a data-only QR code: 32 decoded bytes is a
//!   key, anything at least IV + tag long is encrypted data

use sharer_core::{Half, Halves, SharerError, SharerResult};
use sharer_crypto::encoding::from_base64;
use sharer_crypto::{IV_SIZE, KEY_SIZE, TAG_SIZE};
use url::{form_urlencoded, Url};

/// Extract whatever halves `text` carries.
pub fn parse_carrier(text: &str) -> SharerResult<Halves> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SharerError::MalformedScan("empty scan".into()));
    }

    match Url::parse(text) {
        Ok(url) => parse_url(&url),
        Err(_) => classify_bare(text),
    }
}

fn parse_url(url: &Url) -> SharerResult<Halves> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SharerError::MalformedScan(format!(
            "unsupported scheme {:?}",
            url.scheme()
        )));
    }

    let mut halves = Halves::default();
    // The fragment is the current form; query values only fill gaps.
    let fragment = url.fragment().unwrap_or_default();
    let sources = [
        form_urlencoded::parse(fragment.as_bytes()),
        form_urlencoded::parse(url.query().unwrap_or_default().as_bytes()),
    ];
    for pairs in sources {
        let mut found = Halves::default();
        for (name, value) in pairs {
            if let Some(half) = Half::from_param(&name) {
                if !value.is_empty() && found.get(half).is_none() {
                    found.set(half, value.into_owned());
                }
            }
        }
        halves.merge_missing(found);
    }

    if halves.is_empty() {
        return Err(SharerError::MalformedScan(
            "URL has no data= or key= parameter".into(),
        ));
    }
    Ok(halves)
}

fn classify_bare(text: &str) -> SharerResult<Halves> {
    let raw = from_base64(text)
        .map_err(|_| SharerError::MalformedScan("not a URL or base64 payload".into()))?;

    let mut halves = Halves::default();
    if raw.len() == KEY_SIZE {
        halves.set(Half::Key, text.to_string());
    } else if raw.len() >= IV_SIZE + TAG_SIZE {
        halves.set(Half::Data, text.to_string());
    } else {
        return Err(SharerError::MalformedScan(format!(
            "payload of {} bytes is neither a key nor encrypted data",
            raw.len()
        )));
    }
    Ok(halves)
}
