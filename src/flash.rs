//! One-shot messages carried across a redirect.
//!
//! A write handler stores a single [`FlashMessage`] in the `flash` cookie and
//! redirects. The page it lands on calls [`take`], which reads the cookie and
//! removes it in the same response, so the message renders exactly once.

use std::str::FromStr;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use strum::{AsRefStr, EnumString};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FlashKind {
    Updated,
    DeletedUser,
    Upgraded,
    AlreadyUpgraded,
    Demoted,
    AlreadyDemoted,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    /// Usually the affected operator's user name; the requested id for `NotFound`.
    pub value: String,
}

impl FlashMessage {
    pub fn new(kind: FlashKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    fn encode(&self) -> String {
        format!("{}:{}", self.kind.as_ref(), urlencoding::encode(&self.value))
    }

    fn decode(raw: &str) -> Option<Self> {
        let (kind, value) = raw.split_once(':')?;
        let kind = FlashKind::from_str(kind).ok()?;
        let value = urlencoding::decode(value).ok()?.into_owned();
        Some(Self { kind, value })
    }
}

/// Store a message for the next request, replacing any pending one.
pub fn set(jar: CookieJar, message: &FlashMessage) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, message.encode()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Read the pending message, if any, and schedule its removal.
/// A malformed cookie is removed and ignored.
pub fn take(jar: CookieJar) -> (CookieJar, Option<FlashMessage>) {
    let Some(raw) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };
    let message = FlashMessage::decode(&raw);
    if message.is_none() {
        tracing::debug!("Dropping malformed flash cookie");
    }
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), message)
}
