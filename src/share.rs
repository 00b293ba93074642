//! Shareable-link codec: the full pasted text travels in a `data` query
//! parameter, percent-encoded and then base64-armored so it survives as a
//! single opaque value.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{debug, warn};
use thiserror::Error;

use crate::platform::{Clipboard, SessionHistory};

/// Query parameter carrying the armored text.
pub const DATA_PARAM: &str = "data";

/// Failures while unpacking a shared payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid share payload: {0}")]
    Armor(#[from] base64::DecodeError),

    #[error("share payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Percent-encode `text`, then armor the result.
pub fn encode_text(text: &str) -> String {
    BASE64.encode(urlencoding::encode(text).as_bytes())
}

/// Inverse of [`encode_text`].
pub fn decode_text(payload: &str) -> Result<String, DecodeError> {
    let armored = BASE64.decode(payload)?;
    let bytes = urlencoding::decode_binary(&armored);
    Ok(String::from_utf8(bytes.into_owned())?)
}

/// Build the shareable link for `text` on top of `location`, replacing any
/// query already present.
pub fn share_url(location: &str, text: &str) -> String {
    let path = location.split('?').next().unwrap_or(location);
    format!("{}?{}={}", path, DATA_PARAM, encode_text(text))
}

/// Extract and decode the `data` parameter from a location, if present. The
/// raw parameter value is used verbatim; no form-decoding is applied, so the
/// base64 alphabet passes through intact.
pub fn text_from_location(location: &str) -> Option<Result<String, DecodeError>> {
    let (_, query) = location.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == DATA_PARAM {
            Some(decode_text(value))
        } else {
            None
        }
    })
}

/// Restore the text encoded in `location`. A decode failure is logged and
/// swallowed; the caller gets an empty text either way.
pub fn restore_text(location: &str) -> String {
    match text_from_location(location) {
        Some(Ok(text)) => text,
        Some(Err(err)) => {
            warn!("ignoring undecodable share payload in {}: {}", location, err);
            String::new()
        }
        None => String::new(),
    }
}

/// Save action: push the share link onto the navigation history and copy it
/// to the clipboard. The clipboard write is fire-and-forget; failure is
/// logged and never blocks the save. Returns the link.
pub fn save(text: &str, history: &mut SessionHistory, clipboard: &mut dyn Clipboard) -> String {
    let url = share_url(history.location(), text);
    history.push(url.clone());

    match clipboard.set_text(&url) {
        Ok(()) => debug!("share link copied to clipboard ({} chars)", url.len()),
        Err(err) => warn!("could not copy share link: {}", err),
    }

    url
}
