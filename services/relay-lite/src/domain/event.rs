/// Event model and canonical hashing for NIP-01 events
///
/// The id of an event is the SHA-256 of `[0, pubkey, created_at, kind, tags, content]`
/// serialized as compact JSON. This exact form is shared with every other Nostr
/// signer and verifier, so field order and escaping must not change.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A signed event as it travels on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// 32-byte lowercase hex SHA-256 of the canonical serialization
    pub id: String,
    /// 32-byte lowercase hex x-only public key of the author
    pub pubkey: String,
    /// Unix timestamp in seconds
    pub created_at: u64,
    pub kind: u64,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    /// 64-byte lowercase hex Schnorr signature over `id`
    pub sig: String,
}

/// The identity-bearing fields of an event (everything except `id` and `sig`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedEvent {
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u64,
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

/// An event before the author's key is known
///
/// Signing a template fills `pubkey` from the secret key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTemplate {
    pub created_at: u64,
    pub kind: u64,
    pub tags: Vec<Vec<String>>,
    pub content: String,
}

impl Event {
    /// Strip `id` and `sig`, leaving the fields the id is computed from
    pub fn unsigned(&self) -> UnsignedEvent {
        UnsignedEvent {
            pubkey: self.pubkey.clone(),
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags.clone(),
            content: self.content.clone(),
        }
    }

    /// Values of every tag named `name` (the second element of each matching tag)
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.first().map(String::as_str) == Some(name))
            .filter_map(|tag| tag.get(1).map(String::as_str))
    }
}

impl UnsignedEvent {
    /// Attach an id and signature to produce a complete event
    pub fn into_signed(self, id: String, sig: String) -> Event {
        Event {
            id,
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig,
        }
    }
}

/// Canonical serialization and content hashing
pub struct EventCodec;

impl EventCodec {
    /// Serialize the identity fields as `[0,pubkey,created_at,kind,tags,content]`
    ///
    /// serde_json emits compact output and escapes strings the same way as
    /// `JSON.stringify` (only `"`, `\` and control characters), which is what
    /// NIP-01 requires.
    pub fn canonical_json(event: &UnsignedEvent) -> String {
        serde_json::json!([
            0,
            event.pubkey,
            event.created_at,
            event.kind,
            event.tags,
            event.content
        ])
        .to_string()
    }

    /// Raw 32-byte digest of the canonical serialization
    pub fn digest(event: &UnsignedEvent) -> [u8; 32] {
        Sha256::digest(Self::canonical_json(event).as_bytes()).into()
    }

    /// Lowercase hex event id
    pub fn compute_id(event: &UnsignedEvent) -> String {
        hex::encode(Self::digest(event))
    }
}
