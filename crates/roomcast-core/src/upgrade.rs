//! WebSocket upgrade negotiation.
//!
//! The room only ever sees a minimal view of the HTTP request: the method and
//! the `Upgrade` header. Rejections happen synchronously before any state
//! changes; the transport maps them to 4xx responses and the client retries.

/// Why an upgrade request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    /// The `Upgrade: websocket` header was missing or carried another value.
    ///
    /// Maps to HTTP 426 Upgrade Required.
    #[error("expected Upgrade: websocket")]
    UpgradeRequired,

    /// The request used a verb other than GET.
    ///
    /// Maps to HTTP 405 Method Not Allowed.
    #[error("expected GET, got {0}")]
    MethodNotAllowed(String),
}

/// Minimal view of the HTTP request negotiating a connection upgrade.
#[derive(Debug, Clone, Copy)]
pub struct UpgradeRequest<'a> {
    method: &'a str,
    upgrade: Option<&'a str>,
}

impl<'a> UpgradeRequest<'a> {
    /// Build the view from the request method and `Upgrade` header, if any.
    pub fn new(method: &'a str, upgrade: Option<&'a str>) -> Self {
        Self { method, upgrade }
    }

    /// Validate the upgrade intent.
    ///
    /// The header is checked before the method, so a POST without an upgrade
    /// header is answered 426 rather than 405. Header matching is
    /// case-insensitive; the method must be exactly `GET`.
    pub fn negotiate(&self) -> Result<(), NegotiationError> {
        match self.upgrade {
            Some(value) if value.eq_ignore_ascii_case("websocket") => {}
            _ => return Err(NegotiationError::UpgradeRequired),
        }

        if self.method != "GET" {
            return Err(NegotiationError::MethodNotAllowed(self.method.to_owned()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_with_websocket_upgrade_is_accepted() {
        assert!(UpgradeRequest::new("GET", Some("websocket")).negotiate().is_ok());
    }

    #[test]
    fn upgrade_header_is_case_insensitive() {
        assert!(UpgradeRequest::new("GET", Some("WebSocket")).negotiate().is_ok());
    }

    #[test]
    fn missing_header_requires_upgrade() {
        assert_eq!(
            UpgradeRequest::new("GET", None).negotiate(),
            Err(NegotiationError::UpgradeRequired)
        );
    }

    #[test]
    fn wrong_header_value_requires_upgrade() {
        assert_eq!(
            UpgradeRequest::new("GET", Some("h2c")).negotiate(),
            Err(NegotiationError::UpgradeRequired)
        );
    }

    #[test]
    fn post_with_upgrade_header_is_method_not_allowed() {
        assert_eq!(
            UpgradeRequest::new("POST", Some("websocket")).negotiate(),
            Err(NegotiationError::MethodNotAllowed("POST".to_owned()))
        );
    }

    #[test]
    fn post_without_upgrade_header_is_upgrade_required() {
        // Header check runs first, mirroring the order clients observe.
        assert_eq!(
            UpgradeRequest::new("POST", None).negotiate(),
            Err(NegotiationError::UpgradeRequired)
        );
    }
}
