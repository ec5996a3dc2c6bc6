//! Host identity verification for TLS handshakes
//!
//! Certificates claim identities through their subject-alternative-name
//! extension and, for older issuers, the subject common name.
//! [`verify_hostname`] decides whether the hostname a peer was addressed by is
//! covered by those claims, extending them with a fixed allow-list of loopback
//! names so connections to the local host succeed against any certificate.

use rustls::pki_types::{IpAddr, ServerName};
use thiserror::Error;

/// Identities every certificate is considered to claim
///
/// Connections addressed by one of these names are accepted regardless of
/// certificate content, so components on the same host can talk to each other
/// over TLS without the deployment certificate listing loopback names.
pub const ALLOWED_LOCAL_NAMES: [&str; 4] = ["::1", "127.0.0.1", "localhost", "localhost.localdomain"];

/// The identities a peer certificate claims
///
/// Subject-alternative names are the primary source; the subject common name
/// is carried separately because some issuers still omit it from the SAN
/// extension. An empty common name is treated as absent rather than as a
/// literal empty-string identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateIdentity {
    common_name: Option<String>,
    subject_alt_names: Vec<String>,
}

impl CertificateIdentity {
    /// Assemble an identity from the subject fields of a peer certificate
    pub fn new<'a>(
        common_name: Option<&str>,
        subject_alt_names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            common_name: common_name.filter(|cn| !cn.is_empty()).map(str::to_owned),
            subject_alt_names: subject_alt_names.into_iter().map(str::to_owned).collect(),
        }
    }

    /// The subject common name, if the certificate carried a non-empty one
    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// The subject-alternative names, in certificate order
    pub fn subject_alt_names(&self) -> &[String] {
        &self.subject_alt_names
    }

    /// Every name verification considers: the SANs, the loopback allow-list,
    /// and the common name when the SANs do not already carry it
    fn effective_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.subject_alt_names.iter().map(String::as_str).collect();
        names.extend(ALLOWED_LOCAL_NAMES);
        if let Some(cn) = self.common_name.as_deref() {
            if !self.subject_alt_names.iter().any(|san| san == cn) {
                names.push(cn);
            }
        }
        names
    }
}

/// Strategy deciding whether a single certificate identity covers a hostname
///
/// The handshake layer normally uses [`StandardMatcher`]; substituting an
/// implementation pins down verification behavior in tests without minting
/// real certificates.
pub trait IdentityMatcher {
    /// Whether `identity` covers `hostname`
    fn matches(&self, hostname: &str, identity: &str) -> bool;
}

/// Standard certificate hostname matching
///
/// DNS names compare ASCII-case-insensitively, either exactly or through a
/// wildcard consuming exactly the leftmost label: `*.example.com` covers
/// `foo.example.com` but neither `foo.bar.example.com` nor bare
/// `example.com`. IP-literal hostnames are compared as parsed addresses and
/// only ever match literal IP identities, never wildcards.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardMatcher;

impl IdentityMatcher for StandardMatcher {
    fn matches(&self, hostname: &str, identity: &str) -> bool {
        if let Ok(ServerName::IpAddress(host)) = ServerName::try_from(hostname) {
            return IpAddr::try_from(identity).map_or(false, |ip| ip == host);
        }
        if let Some(suffix) = identity.strip_prefix("*.") {
            return match hostname.split_once('.') {
                Some((label, rest)) => !label.is_empty() && rest.eq_ignore_ascii_case(suffix),
                None => false,
            };
        }
        hostname.eq_ignore_ascii_case(identity)
    }
}

/// A presented hostname matched none of a certificate's identities
///
/// Rejects exactly one handshake; unrelated connections are unaffected, and
/// retrying cannot succeed while the peer presents the same certificate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("hostname {hostname:?} matches none of the certificate identities {tried:?}")]
pub struct HostnameMismatch {
    /// The hostname the connection was addressed by
    pub hostname: String,
    /// Every identity that was considered, in the order tried
    pub tried: Vec<String>,
}

/// Decide whether `hostname` is covered by the identities in `identity`
///
/// Pure and reentrant; safe to call concurrently from any number of
/// handshake threads. Matching follows [`StandardMatcher`]; use
/// [`verify_hostname_with`] to supply different rules.
pub fn verify_hostname(
    hostname: &str,
    identity: &CertificateIdentity,
) -> Result<(), HostnameMismatch> {
    verify_hostname_with(&StandardMatcher, hostname, identity)
}

/// [`verify_hostname`] with a caller-supplied matching strategy
pub fn verify_hostname_with(
    matcher: &dyn IdentityMatcher,
    hostname: &str,
    identity: &CertificateIdentity,
) -> Result<(), HostnameMismatch> {
    let names = identity.effective_names();
    if names.iter().any(|name| matcher.matches(hostname, name)) {
        return Ok(());
    }
    Err(HostnameMismatch {
        hostname: hostname.to_owned(),
        tried: names.into_iter().map(str::to_owned).collect(),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn identity(cn: Option<&str>, sans: &[&str]) -> CertificateIdentity {
        CertificateIdentity::new(cn, sans.iter().copied())
    }

    #[test]
    fn local_names_always_accepted() {
        for name in ALLOWED_LOCAL_NAMES {
            verify_hostname(name, &identity(None, &[])).unwrap();
        }
    }

    #[test]
    fn exact_san_match() {
        verify_hostname("example.com", &identity(None, &["example.com"])).unwrap();
    }

    #[test]
    fn san_match_is_case_insensitive() {
        verify_hostname("FOO.Example.COM", &identity(None, &["foo.example.com"])).unwrap();
    }

    #[test]
    fn common_name_folded_in_when_missing_from_sans() {
        let id = identity(Some("example.com"), &["other.com"]);
        verify_hostname("example.com", &id).unwrap();
        assert_matches!(verify_hostname("nomatch.com", &id), Err(_));
    }

    #[test]
    fn wildcard_consumes_exactly_one_label() {
        let id = identity(None, &["*.example.com"]);
        verify_hostname("foo.example.com", &id).unwrap();
        assert_matches!(verify_hostname("foo.bar.example.com", &id), Err(_));
        assert_matches!(verify_hostname("example.com", &id), Err(_));
    }

    #[test]
    fn ip_hostname_requires_literal_ip_entry() {
        assert_matches!(
            verify_hostname("192.0.2.7", &identity(None, &["*.0.2.7"])),
            Err(_)
        );
        verify_hostname("192.0.2.7", &identity(None, &["192.0.2.7"])).unwrap();
    }

    #[test]
    fn ip_entries_compared_as_addresses() {
        // Non-canonical spelling of ::1 still hits the loopback allow-list
        verify_hostname("0:0:0:0:0:0:0:1", &identity(None, &[])).unwrap();
    }

    #[test]
    fn empty_common_name_is_absent() {
        let err = verify_hostname("example.com", &identity(Some(""), &[])).unwrap_err();
        assert!(!err.tried.contains(&String::new()));
    }

    #[test]
    fn duplicate_common_name_not_added_twice() {
        let err = verify_hostname("nomatch.com", &identity(Some("example.com"), &["example.com"]))
            .unwrap_err();
        assert_eq!(
            err.tried.iter().filter(|name| *name == "example.com").count(),
            1
        );
    }

    #[test]
    fn mismatch_reports_full_identity_set() {
        let err =
            verify_hostname("nomatch.com", &identity(Some("cn.com"), &["san.com"])).unwrap_err();
        assert_eq!(err.hostname, "nomatch.com");
        assert!(err.tried.contains(&"san.com".to_owned()));
        assert!(err.tried.contains(&"cn.com".to_owned()));
        for name in ALLOWED_LOCAL_NAMES {
            assert!(err.tried.contains(&name.to_owned()));
        }
    }

    #[test]
    fn matcher_is_injectable() {
        struct AcceptAll;
        impl IdentityMatcher for AcceptAll {
            fn matches(&self, _: &str, _: &str) -> bool {
                true
            }
        }
        verify_hostname_with(&AcceptAll, "anything.invalid", &identity(None, &[])).unwrap();
    }
}
