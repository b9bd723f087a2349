//! The Identity Provider collaborator.
//!
//! Authentication itself (login, OAuth) lives outside this repository; the
//! engine only asks "who is acting on this request?". A `None` answer means
//! an anonymous context, which may still observe a session and chat but
//! cannot moderate or estimate.

use axum::http::HeaderMap;

use tally_core::ids::UserId;
use tally_core::user::User;

/// Resolves the acting user for a request.
pub trait IdentityProvider: Send + Sync {
    /// The current actor, or `None` when unauthenticated.
    fn current_actor(&self, headers: &HeaderMap) -> Option<User>;
}

/// Header-based identity: trusts `x-user-id` (external id) and
/// `x-user-name` set by an authenticating reverse proxy.
///
/// The internal [`UserId`] mirrors the external id so the same person maps
/// to the same identity across requests and connections.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderIdentity;

impl IdentityProvider for HeaderIdentity {
    fn current_actor(&self, headers: &HeaderMap) -> Option<User> {
        let external = headers.get("x-user-id")?.to_str().ok()?.trim();
        if external.is_empty() {
            return None;
        }
        let name = headers
            .get("x-user-name")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(external);
        Some(User::new(UserId::from(external), external, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn resolves_user_from_headers() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-user-id", HeaderValue::from_static("ext-1"));
        let _ = headers.insert("x-user-name", HeaderValue::from_static("Alice"));
        let user = HeaderIdentity.current_actor(&headers).unwrap();
        assert_eq!(user.external_id, "ext-1");
        assert_eq!(user.display_name(), "Alice");
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert!(HeaderIdentity.current_actor(&HeaderMap::new()).is_none());
    }

    #[test]
    fn empty_id_is_anonymous() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-user-id", HeaderValue::from_static("  "));
        assert!(HeaderIdentity.current_actor(&headers).is_none());
    }

    #[test]
    fn name_falls_back_to_external_id() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-user-id", HeaderValue::from_static("ext-2"));
        let user = HeaderIdentity.current_actor(&headers).unwrap();
        assert_eq!(user.display_name(), "ext-2");
    }

    #[test]
    fn same_headers_same_identity() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-user-id", HeaderValue::from_static("ext-3"));
        let a = HeaderIdentity.current_actor(&headers).unwrap();
        let b = HeaderIdentity.current_actor(&headers).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.id, b.id);
    }
}
