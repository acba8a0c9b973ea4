// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

/// Per-client protocol session: who we are, our credentials and the
/// command ID counter.
///
/// IDs start at 1 and only ever move forward for the lifetime of the
/// session; nothing resets them.
#[derive(Debug, Clone)]
pub struct Session {
    sender: String,
    pin: String,
    login_token: String,
    next_id: u64,
}

impl Session {
    pub fn new(sender: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            pin: pin.into(),
            login_token: String::new(),
            next_id: 1,
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    /// Token assigned by the panel at login. Empty before.
    pub fn login_token(&self) -> &str {
        &self.login_token
    }

    pub fn set_login_token(&mut self, token: impl Into<String>) {
        self.login_token = token.into();
    }

    pub fn is_authenticated(&self) -> bool {
        !self.login_token.is_empty()
    }

    /// The ID the next command will carry.
    pub fn peek_id(&self) -> u64 {
        self.next_id
    }

    /// Hand out the next command ID.
    pub(crate) fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let session = Session::new("monitor", "123456");
        assert_eq!(session.sender(), "monitor");
        assert_eq!(session.pin(), "123456");
        assert_eq!(session.login_token(), "");
        assert!(!session.is_authenticated());
        assert_eq!(session.peek_id(), 1);
    }

    #[test]
    fn test_ids_increase_without_gaps() {
        let mut session = Session::new("monitor", "0000");
        let ids: Vec<u64> = (0..5).map(|_| session.take_id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(session.peek_id(), 6);
    }

    #[test]
    fn test_login_token_does_not_reset_ids() {
        let mut session = Session::new("monitor", "0000");
        session.take_id();
        session.set_login_token("17");
        assert!(session.is_authenticated());
        assert_eq!(session.take_id(), 2);
    }
}
