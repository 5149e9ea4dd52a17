//! Wire protocol definitions
//!
//! Plain UTF-8 text over TCP. There are no length prefixes and no
//! delimiters: a message is whatever bytes one read returned. Split or
//! concatenated application messages are expected on both sides.

use crate::error::HandshakeError;

/// Handshake literal sent by viewers
pub const VIEWER_HANDSHAKE: &str = "viewer";

/// Handshake prefix sent by messengers, followed by the display name
pub const NAME_PREFIX: &str = "name:";

/// Client → Server handshake
///
/// The first bytes of every connection, read exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// Literal `viewer`
    Viewer,
    /// `name:<display name>`
    Messenger { name: String },
}

impl Handshake {
    /// Parse the payload of the single handshake read
    ///
    /// Matching is exact and case-sensitive, no whitespace is trimmed.
    pub fn parse(payload: &[u8]) -> Result<Self, HandshakeError> {
        if payload.is_empty() {
            return Err(HandshakeError::Empty);
        }

        let text = String::from_utf8_lossy(payload);
        if text == VIEWER_HANDSHAKE {
            return Ok(Handshake::Viewer);
        }

        match text.strip_prefix(NAME_PREFIX) {
            Some("") => Err(HandshakeError::EmptyName),
            Some(name) => Ok(Handshake::Messenger {
                name: name.to_string(),
            }),
            None => Err(HandshakeError::Unrecognized(text.to_string())),
        }
    }

    /// Encode for sending from a client session
    pub fn encode(&self) -> String {
        match self {
            Handshake::Viewer => VIEWER_HANDSHAKE.to_string(),
            Handshake::Messenger { name } => format!("{}{}", NAME_PREFIX, name),
        }
    }
}

/// A message waiting in the outbound queue for the next broadcast sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    /// Messenger display name, `None` for system notices
    pub sender: Option<String>,
    /// Text payload
    pub text: String,
}

impl PendingMessage {
    /// Chat text received from a messenger
    pub fn chat(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: Some(sender.into()),
            text: text.into(),
        }
    }

    /// System notice without a sender
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            sender: None,
            text: text.into(),
        }
    }

    /// Announcement queued when a messenger registers
    pub fn join(name: &str) -> Self {
        Self::system(format!("A new Messenger has joined the chat: {}", name))
    }

    /// Bytes written to every viewer: `<name>: <text>` or the bare text
    pub fn encode(&self) -> Vec<u8> {
        match &self.sender {
            Some(sender) => format!("{}: {}", sender, self.text).into_bytes(),
            None => self.text.clone().into_bytes(),
        }
    }
}

/// Line sent to a viewer right after its handshake
pub fn welcome_line(chat_name: &str) -> String {
    format!("Welcome to the \"{}\" Chat Server!", chat_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewer() {
        assert_eq!(Handshake::parse(b"viewer").unwrap(), Handshake::Viewer);
    }

    #[test]
    fn test_parse_messenger() {
        match Handshake::parse(b"name:alice").unwrap() {
            Handshake::Messenger { name } => assert_eq!(name, "alice"),
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_parse_name_keeps_later_colons() {
        let handshake = Handshake::parse(b"name:a:b").unwrap();
        assert_eq!(
            handshake,
            Handshake::Messenger {
                name: "a:b".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejections() {
        assert!(matches!(Handshake::parse(b""), Err(HandshakeError::Empty)));
        assert!(matches!(
            Handshake::parse(b"name:"),
            Err(HandshakeError::EmptyName)
        ));

        for payload in ["Viewer", "viewer\n", "hello", "nam:bob", " name:bob"] {
            assert!(
                matches!(
                    Handshake::parse(payload.as_bytes()),
                    Err(HandshakeError::Unrecognized(_))
                ),
                "payload {:?} should be rejected",
                payload
            );
        }
    }

    #[test]
    fn test_handshake_encode() {
        assert_eq!(Handshake::Viewer.encode(), "viewer");
        let messenger = Handshake::Messenger {
            name: "bob".to_string(),
        };
        assert_eq!(messenger.encode(), "name:bob");
    }

    #[test]
    fn test_pending_message_encode() {
        let chat = PendingMessage::chat("alice", "hello");
        assert_eq!(chat.encode(), b"alice: hello");

        let join = PendingMessage::join("alice");
        assert!(join.sender.is_none());
        assert_eq!(join.encode(), b"A new Messenger has joined the chat: alice");
    }

    #[test]
    fn test_welcome_line() {
        assert_eq!(
            welcome_line("TestChat"),
            "Welcome to the \"TestChat\" Chat Server!"
        );
    }
}
