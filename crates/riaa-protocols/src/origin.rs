//! Origin validation and first-contact trust pinning.
//!
//! Panel and bridge run in different browsing contexts connected only by a
//! generic cross-origin messaging primitive, so every inbound envelope is
//! validated before use. The trust model is first-writer-wins: the first
//! message from an acceptable origin pins both the origin and the specific
//! sender window for the rest of the session, and the pin is never
//! renegotiated.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::channel::WindowRef;

#[cfg(test)]
#[path = "origin_tests.rs"]
mod tests;

/// Host domains a bridge will accept panel traffic from outside development.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["sitepilot.io", "sitepilot.app"];

/// Origins a panel falls back to during the handshake window when the
/// document referrer cannot be parsed.
pub const KNOWN_HOST_ORIGINS: &[&str] = &["https://canvas.sitepilot.io", "https://sitepilot.io"];

/// Hostnames treated as development environments.
const DEV_HOSTNAMES: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "::1"];

/// Hostname suffixes treated as development environments.
const DEV_HOST_SUFFIXES: &[&str] = &[".local", ".localhost", ".test"];

/// A browsing-context origin: scheme, host, and optional explicit port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    /// Parse an origin from a URL or serialized origin string.
    pub fn parse(input: &str) -> Option<Self> {
        let url = Url::parse(input).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();
        Some(Self {
            scheme: url.scheme().to_ascii_lowercase(),
            host,
            port: url.port(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// True when this origin's host equals `domain` or is a subdomain of it.
    pub fn is_host_or_subdomain_of(&self, domain: &str) -> bool {
        let domain = domain.to_ascii_lowercase();
        self.host == domain || self.host.ends_with(&format!(".{domain}"))
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}://{}:{}", self.scheme, self.host, port),
            None => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

impl Serialize for Origin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Origin::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid origin: {s}")))
    }
}

/// Deployment environment, inferred from the hostname the script runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Infer the environment from a hostname, honoring an explicit override
    /// when one is configured.
    pub fn detect(hostname: &str, dev_override: Option<bool>) -> Self {
        if let Some(forced) = dev_override {
            return if forced {
                Environment::Development
            } else {
                Environment::Production
            };
        }
        let hostname = hostname.to_ascii_lowercase();
        let dev = DEV_HOSTNAMES.contains(&hostname.as_str())
            || DEV_HOST_SUFFIXES.iter().any(|s| hostname.ends_with(s));
        if dev {
            Environment::Development
        } else {
            Environment::Production
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Which origins a side of the bridge will accept first contact from.
///
/// In development every origin is acceptable. In production the acceptable
/// origins are the one the current script was loaded from (or, on the panel
/// side, the referrer-derived hint) plus exact or subdomain matches against
/// a fixed allow-list of known host domains.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    environment: Environment,
    own_origin: Option<Origin>,
    allowed_hosts: Vec<String>,
}

impl OriginPolicy {
    pub fn new(
        environment: Environment,
        own_origin: Option<Origin>,
        allowed_hosts: Vec<String>,
    ) -> Self {
        Self {
            environment,
            own_origin,
            allowed_hosts,
        }
    }

    /// Policy for a bridge validating panel traffic.
    pub fn for_host(environment: Environment, script_origin: Option<Origin>) -> Self {
        Self::new(
            environment,
            script_origin,
            DEFAULT_ALLOWED_HOSTS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Policy for a panel validating bridge traffic. The referrer is only a
    /// hint: when it cannot be parsed, the fixed known-host origins still
    /// satisfy the allow-list during the handshake.
    pub fn for_panel(environment: Environment, referrer: Option<&str>) -> Self {
        let hint = referrer.and_then(Origin::parse);
        let known_hosts = KNOWN_HOST_ORIGINS
            .iter()
            .filter_map(|o| Origin::parse(o))
            .map(|o| o.host().to_string())
            .collect();
        Self::new(environment, hint, known_hosts)
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Whether first contact from `origin` is acceptable under this policy.
    pub fn accepts(&self, origin: &Origin) -> bool {
        if self.environment.is_development() {
            return true;
        }
        if let Some(own) = &self.own_origin {
            if own == origin {
                return true;
            }
        }
        self.allowed_hosts
            .iter()
            .any(|host| origin.is_host_or_subdomain_of(host))
    }
}

/// The pinned remote identity: origin plus the specific sender window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    pub origin: Origin,
    pub window: WindowRef,
}

/// Outcome of admitting one inbound envelope against the trust cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// First acceptable contact; the sender is now pinned.
    Pinned,
    /// Sender matches the existing pin.
    Accepted,
    /// Origin is unacceptable or differs from the pinned origin.
    RejectedOrigin,
    /// Origin matches but the message came from a different window.
    RejectedWindow,
}

impl TrustDecision {
    /// True when the envelope may be acted upon.
    pub fn is_trusted(&self) -> bool {
        matches!(self, TrustDecision::Pinned | TrustDecision::Accepted)
    }
}

/// Single-session trust pin. First acceptable sender wins; the pin holds
/// origin and window together and is never replaced.
#[derive(Debug, Default)]
pub struct TrustCell {
    pinned: parking_lot::RwLock<Option<TrustAnchor>>,
}

impl TrustCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a sender identified by `origin` and `window`.
    pub fn admit(&self, policy: &OriginPolicy, origin: &Origin, window: WindowRef) -> TrustDecision {
        let mut pinned = self.pinned.write();
        match pinned.as_ref() {
            None => {
                if policy.accepts(origin) {
                    *pinned = Some(TrustAnchor {
                        origin: origin.clone(),
                        window,
                    });
                    TrustDecision::Pinned
                } else {
                    TrustDecision::RejectedOrigin
                }
            }
            Some(anchor) => {
                if anchor.origin != *origin {
                    TrustDecision::RejectedOrigin
                } else if anchor.window != window {
                    TrustDecision::RejectedWindow
                } else {
                    TrustDecision::Accepted
                }
            }
        }
    }

    /// The currently pinned sender, if any.
    pub fn anchor(&self) -> Option<TrustAnchor> {
        self.pinned.read().clone()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.read().is_some()
    }
}
