//! Session data structure

use serde::{Deserialize, Serialize};

/// Current wallet connectivity.
///
/// `connected` is true exactly when `account` is set; the setters below are
/// the only way the manager changes either field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub connected: bool,
    pub account: Option<String>,
    /// Hex chain id reported by the wallet
    pub chain_id: Option<String>,
    /// Balance in native units
    pub balance: f64,
    /// A `connect` call is in flight
    pub loading: bool,
    /// Message from the last failed `connect`
    pub error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `account` the current account. Switching to a different account
    /// drops the balance, which belonged to the previous one.
    pub fn adopt_account(&mut self, account: String) {
        if self.account.as_deref() != Some(account.as_str()) {
            self.balance = 0.0;
        }
        self.account = Some(account);
        self.connected = true;
    }

    /// Back to the empty state. An in-flight `connect` keeps its flag so the
    /// loading indicator stays tied to that call.
    pub fn reset(&mut self) {
        *self = Self {
            loading: self.loading,
            ..Self::default()
        };
    }

    /// Balance for display: zero unless connected
    pub fn display_balance(&self) -> f64 {
        if self.connected {
            self.balance
        } else {
            0.0
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.connected == self.account.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = Session::new();
        assert!(!session.connected);
        assert!(session.account.is_none());
        assert!(session.chain_id.is_none());
        assert_eq!(session.balance, 0.0);
        assert!(!session.loading);
        assert!(session.error.is_none());
        assert!(session.is_consistent());
    }

    #[test]
    fn test_adopt_account() {
        let mut session = Session::new();
        session.adopt_account("0xaaa".to_string());
        session.balance = 3.0;
        assert!(session.connected);
        assert!(session.is_consistent());

        // Same account keeps the balance
        session.adopt_account("0xaaa".to_string());
        assert_eq!(session.balance, 3.0);

        session.adopt_account("0xbbb".to_string());
        assert_eq!(session.account.as_deref(), Some("0xbbb"));
        assert_eq!(session.balance, 0.0);
    }

    #[test]
    fn test_reset() {
        let mut session = Session::new();
        session.adopt_account("0xaaa".to_string());
        session.chain_id = Some("0x1".to_string());
        session.balance = 1.0;
        session.error = Some("boom".to_string());

        session.reset();
        assert_eq!(session, Session::default());

        session.loading = true;
        session.adopt_account("0xaaa".to_string());
        session.reset();
        assert!(session.loading);
        assert!(!session.connected);
    }

    #[test]
    fn test_display_balance() {
        let mut session = Session::new();
        session.balance = 5.0;
        assert_eq!(session.display_balance(), 0.0);

        session.adopt_account("0xaaa".to_string());
        session.balance = 5.0;
        assert_eq!(session.display_balance(), 5.0);
    }
}
