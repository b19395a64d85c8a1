//! Peer identity from forwarded client-certificate metadata.
//!
//! A TLS-terminating proxy forwards the client certificate subject in
//! `x-forwarded-client-cert`. Each value holds `;`-separated `KEY=value`
//! fields; every `URI=` field across every value is part of the identity.

use http::HeaderMap;
use tonic::metadata::MetadataMap;

/// Header carrying forwarded client-certificate fields.
pub const FORWARDED_CLIENT_CERT: &str = "x-forwarded-client-cert";

const URI_FIELD: &str = "URI=";

/// Collects the `URI=` fields from raw header values.
///
/// Returns `None` when no value carries a URI.
///
/// # Example
///
/// ```
/// use beacon_server::metadata::peer_identity;
///
/// let values = ["By=spiffe://mesh/proxy;URI=spiffe://mesh/ns/default/sa/client"];
/// assert_eq!(
///     peer_identity(values).as_deref(),
///     Some("spiffe://mesh/ns/default/sa/client")
/// );
/// assert_eq!(peer_identity(["Hash=abc"]), None);
/// ```
pub fn peer_identity<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let uris: Vec<&str> = values
        .into_iter()
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .filter_map(|field| field.strip_prefix(URI_FIELD))
        .collect();

    if uris.is_empty() {
        None
    } else {
        Some(uris.join(","))
    }
}

/// Peer identity from gRPC request metadata.
///
/// Values that are not valid ASCII are skipped.
pub fn peer_identity_from_metadata(metadata: &MetadataMap) -> Option<String> {
    peer_identity(
        metadata
            .get_all(FORWARDED_CLIENT_CERT)
            .iter()
            .filter_map(|value| value.to_str().ok()),
    )
}

/// Peer identity from plain HTTP headers.
pub fn peer_identity_from_headers(headers: &HeaderMap) -> Option<String> {
    peer_identity(
        headers
            .get_all(FORWARDED_CLIENT_CERT)
            .iter()
            .filter_map(|value| value.to_str().ok()),
    )
}
