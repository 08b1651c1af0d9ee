//! Peer addressing.
//!
//! A `PeerAddress` is a normalised SIP URI of the form
//! `sip[s]:[user@]host[:port]`. Rooms treat it as an opaque key; parsing only
//! guarantees that two spellings of the same peer compare equal.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Sip,
    Sips,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sip => "sip",
            Self::Sips => "sips",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("unsupported address scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("address has no host part")]
    MissingHost,
    #[error("invalid port `{0}`")]
    InvalidPort(String),
    #[error("invalid character `{0}` in address")]
    InvalidCharacter(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddress {
    scheme: Scheme,
    username: Option<String>,
    host: String,
    port: Option<u16>,
}

impl PeerAddress {
    /// Parses `input`, assuming the `sip:` scheme when none is given.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let (scheme, rest) = split_scheme(trimmed)?;
        let (username, host_port) = match rest.rsplit_once('@') {
            Some((user, host_port)) => (Some(user), host_port),
            None => (None, rest),
        };

        let username = match username {
            Some(user) if user.is_empty() => return Err(AddressError::InvalidCharacter('@')),
            Some(user) => {
                validate_chars(user, is_user_char)?;
                Some(user.to_owned())
            }
            None => None,
        };

        let (host, port) = split_port(host_port)?;
        if host.is_empty() {
            return Err(AddressError::MissingHost);
        }
        validate_chars(host, is_host_char)?;

        Ok(Self {
            scheme,
            username,
            host: host.to_ascii_lowercase(),
            port,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Short label for display: the user part when present, the host otherwise.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.host)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme.as_str())?;
        if let Some(user) = &self.username {
            write!(f, "{user}@")?;
        }
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

impl FromStr for PeerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PeerAddress> for String {
    fn from(value: PeerAddress) -> Self {
        value.to_string()
    }
}

fn split_scheme(input: &str) -> Result<(Scheme, &str), AddressError> {
    let Some((scheme, rest)) = input.split_once(':') else {
        return Ok((Scheme::Sip, input));
    };

    // `user@host:port` and `host.tld:port` carry a ':' that is not a scheme separator.
    if scheme.contains('@') || scheme.contains('.') {
        return Ok((Scheme::Sip, input));
    }

    match scheme.to_ascii_lowercase().as_str() {
        "sip" => Ok((Scheme::Sip, rest)),
        "sips" => Ok((Scheme::Sips, rest)),
        _ if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) => {
            Ok((Scheme::Sip, input))
        }
        other => Err(AddressError::UnsupportedScheme(other.to_owned())),
    }
}

fn split_port(host_port: &str) -> Result<(&str, Option<u16>), AddressError> {
    match host_port.rsplit_once(':') {
        Some((host, port)) => port
            .parse::<u16>()
            .map(|port| (host, Some(port)))
            .map_err(|_| AddressError::InvalidPort(port.to_owned())),
        None => Ok((host_port, None)),
    }
}

fn validate_chars(value: &str, allowed: fn(char) -> bool) -> Result<(), AddressError> {
    match value.chars().find(|ch| !allowed(*ch)) {
        Some(ch) => Err(AddressError::InvalidCharacter(ch)),
        None => Ok(()),
    }
}

fn is_user_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || "-_.!~*'()&=+$,;?/%".contains(ch)
}

fn is_host_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_sip_uri() {
        let address = PeerAddress::parse("sip:alice@example.org:5070").expect("valid address");

        assert_eq!(address.scheme(), Scheme::Sip);
        assert_eq!(address.username(), Some("alice"));
        assert_eq!(address.host(), "example.org");
        assert_eq!(address.port(), Some(5070));
        assert_eq!(address.to_string(), "sip:alice@example.org:5070");
    }

    #[test]
    fn interprets_bare_user_at_host_as_sip() {
        let address = PeerAddress::parse("bob@example.org").expect("valid address");

        assert_eq!(address.to_string(), "sip:bob@example.org");
    }

    #[test]
    fn normalises_scheme_and_host_case() {
        let upper = PeerAddress::parse("SIPS:carol@Example.ORG").expect("valid address");
        let lower = PeerAddress::parse("sips:carol@example.org").expect("valid address");

        assert_eq!(upper, lower);
        assert_eq!(upper.to_string(), "sips:carol@example.org");
    }

    #[test]
    fn keeps_user_part_case() {
        let a = PeerAddress::parse("sip:Alice@example.org").expect("valid address");
        let b = PeerAddress::parse("sip:alice@example.org").expect("valid address");

        assert_ne!(a, b);
    }

    #[test]
    fn accepts_host_only_address() {
        let address = PeerAddress::parse("sip:conference.example.org").expect("valid address");

        assert_eq!(address.username(), None);
        assert_eq!(address.display_name(), "conference.example.org");
    }

    #[test]
    fn treats_numeric_suffix_as_port() {
        let address = PeerAddress::parse("localhost:5060").expect("valid address");

        assert_eq!(address.host(), "localhost");
        assert_eq!(address.port(), Some(5060));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(PeerAddress::parse("   "), Err(AddressError::Empty));
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert_eq!(
            PeerAddress::parse("tel:+331234"),
            Err(AddressError::UnsupportedScheme("tel".to_owned()))
        );
    }

    #[test]
    fn rejects_missing_host() {
        assert_eq!(
            PeerAddress::parse("sip:alice@"),
            Err(AddressError::MissingHost)
        );
    }

    #[test]
    fn rejects_bad_port() {
        assert_eq!(
            PeerAddress::parse("sip:alice@example.org:99999"),
            Err(AddressError::InvalidPort("99999".to_owned()))
        );
    }

    #[test]
    fn rejects_whitespace_inside_host() {
        assert_eq!(
            PeerAddress::parse("sip:alice@exa mple.org"),
            Err(AddressError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn deserializes_from_plain_string() {
        #[derive(Deserialize)]
        struct Holder {
            peer: PeerAddress,
        }

        let holder: Holder = toml::from_str("peer = \"dave@example.org\"").expect("must parse");

        assert_eq!(holder.peer.to_string(), "sip:dave@example.org");
    }
}
