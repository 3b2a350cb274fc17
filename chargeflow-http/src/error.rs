//! Error types for the HTTP transport layer.

use std::error::Error;

use chargeflow::error::BackendError;

/// Errors that can occur while configuring an [`HttpWalletBackend`](crate::HttpWalletBackend).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// The base URL cannot have path segments (e.g. `mailto:`).
    #[error("base URL cannot be a base: {0}")]
    CannotBeABase(String),
    /// The timeout is not a whole number of seconds.
    #[error("invalid timeout {value:?}: expected whole seconds")]
    InvalidTimeout {
        /// The rejected value.
        value: String,
    },
}

/// Classifies a reqwest failure into a [`BackendError`].
///
/// `context` is a human-readable identifier of the call (e.g.
/// `"POST /charges/wallet/capture"`) prepended to the detail.
pub(crate) fn classify(context: &'static str, err: &reqwest::Error) -> BackendError {
    let detail = format!("{context}: {}", chain(err));
    if err.is_timeout() {
        BackendError::Timeout(detail)
    } else if err.is_decode() {
        BackendError::Serialization(detail)
    } else if err.is_connect() && is_dns_failure(err) {
        BackendError::UnknownHost(detail)
    } else {
        BackendError::Io(detail)
    }
}

/// Renders an error and its sources as `outer: inner: ...`.
fn chain(err: &(dyn Error + 'static)) -> String {
    std::iter::successors(Some(err), |e| (*e).source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

/// Returns `true` if host name resolution failed somewhere in the source chain.
fn is_dns_failure(err: &(dyn Error + 'static)) -> bool {
    std::iter::successors(Some(err), |e| (*e).source()).any(|e| {
        let text = e.to_string().to_ascii_lowercase();
        text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
            || text.contains("no such host")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("client error (Connect)")]
    struct Connect(#[source] std::io::Error);

    #[test]
    fn test_dns_failure_found_in_source_chain() {
        let err = Connect(std::io::Error::other(
            "dns error: failed to lookup address information: Name or service not known",
        ));
        assert!(is_dns_failure(&err));
        assert_eq!(
            chain(&err),
            "client error (Connect): dns error: failed to lookup address information: Name or service not known"
        );
    }

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct Request(#[source] Connect);

    #[test]
    fn test_source_chain_is_walked_to_the_root() {
        let err = Request(Connect(std::io::Error::other("No such host is known. (os error 11001)")));
        assert!(is_dns_failure(&err));
        assert_eq!(
            chain(&err),
            "error sending request: client error (Connect): No such host is known. (os error 11001)"
        );
    }

    #[test]
    fn test_refused_connection_is_not_dns() {
        let err = Connect(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));
        assert!(!is_dns_failure(&err));
    }
}
