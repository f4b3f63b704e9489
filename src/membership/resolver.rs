//! Turning raw user entities into participant addresses.

use crate::types::ParticipantAddress;

/// Interprets a raw `user` entity as an addressable identity.
pub trait IdentityResolver: Send + Sync {
    fn interpret(&self, raw: &str) -> ParticipantAddress;
}

/// Resolver for SIP-style user entities.
///
/// Entities that already carry a scheme (`sip:`, `sips:`, `tel:`) are kept as
/// sent. Bare user parts get a `sip:` scheme, plus `default_domain` when one
/// is configured and the entity has no host.
#[derive(Clone, Debug, Default)]
pub struct DefaultIdentityResolver {
    pub default_domain: Option<String>,
}

impl DefaultIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(domain: impl Into<String>) -> Self {
        Self {
            default_domain: Some(domain.into()),
        }
    }
}

/// A scheme starts with a letter. `host:port` is not a scheme.
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, rest)) = raw.split_once(':') else {
        return false;
    };
    let is_port = !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit());

    scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !is_port
}

impl IdentityResolver for DefaultIdentityResolver {
    fn interpret(&self, raw: &str) -> ParticipantAddress {
        let raw = raw.trim();
        if has_scheme(raw) {
            return ParticipantAddress::new(raw);
        }

        let has_host = raw.contains('@') || raw.contains(':');
        match &self.default_domain {
            Some(domain) if !has_host => {
                ParticipantAddress::new(format!("sip:{}@{}", raw, domain))
            }
            _ => ParticipantAddress::new(format!("sip:{}", raw)),
        }
    }
}
