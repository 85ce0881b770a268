//! nostrクレートとの相互運用性テスト
//!
//! 他実装で署名したイベントを受理でき、このクレートで署名したイベントを他実装が検証できること。

use nostr::{EventBuilder, Keys, Kind, Tag};
use relay_lite::domain::{Event, EventCodec, EventTemplate, EventValidator, SignatureService};

fn to_relay_event(event: &nostr::Event) -> Event {
    serde_json::from_value(serde_json::to_value(event).unwrap()).unwrap()
}

#[test]
fn test_accepts_events_signed_by_nostr_crate() {
    let keys = Keys::generate();
    let event = EventBuilder::text_note("hello from nostr")
        .sign_with_keys(&keys)
        .unwrap();

    let relay_event = to_relay_event(&event);

    assert_eq!(EventCodec::compute_id(&relay_event.unsigned()), event.id.to_hex());
    assert!(SignatureService::verify(&relay_event));
}

#[test]
fn test_accepts_tagged_events_signed_by_nostr_crate() {
    let keys = Keys::generate();
    let other = Keys::generate();
    let event = EventBuilder::new(Kind::Reaction, "+")
        .tag(Tag::public_key(other.public_key()))
        .sign_with_keys(&keys)
        .unwrap();

    let json = serde_json::to_value(&event).unwrap();

    assert!(EventValidator::validate_all(&json).is_ok());
}

#[test]
fn test_rejects_nostr_event_with_modified_content() {
    let keys = Keys::generate();
    let event = EventBuilder::text_note("original")
        .sign_with_keys(&keys)
        .unwrap();
    let mut json = serde_json::to_value(&event).unwrap();
    json["content"] = "modified".into();

    assert!(EventValidator::validate_all(&json).is_err());
}

#[test]
fn test_nostr_crate_verifies_our_signatures() {
    let secret = SignatureService::generate_key();
    let event = SignatureService::sign_template(
        EventTemplate {
            created_at: 1_700_000_000,
            kind: 1,
            tags: vec![vec!["t".to_string(), "rust".to_string()]],
            content: "hello \"quoted\"\nnewline".to_string(),
        },
        &secret,
    )
    .unwrap();

    let json = serde_json::to_string(&event).unwrap();
    let parsed: nostr::Event = serde_json::from_str(&json).unwrap();

    assert!(parsed.verify().is_ok());
}

#[test]
fn test_public_key_derivation_matches() {
    let keys = Keys::generate();
    let secret = keys.secret_key().to_secret_hex();

    assert_eq!(
        SignatureService::derive_public_key(&secret).unwrap(),
        keys.public_key().to_hex()
    );
}
