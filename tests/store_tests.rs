//! Integration tests for sessions and the encrypted secret store, run
//! against the in-memory remote.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use keepsake::crypto::{derive_key, encrypt, ScryptParams};
use keepsake::errors::{ErrorKind, KeepsakeError, Operation};
use keepsake::remote::InMemoryRemote;
use keepsake::vault::{Blob, Card, Credential, Secret, SecretData, SecretStore, Text};
use keepsake::{CancelToken, Client};

type Store = SecretStore<Arc<InMemoryRemote>>;

/// A remote with one registered user, and that user's open store.
fn setup() -> (Arc<InMemoryRemote>, Client<Arc<InMemoryRemote>>, Store) {
    let remote = Arc::new(InMemoryRemote::new());
    let client = Client::new(remote.clone());
    let store = client
        .register(&CancelToken::new(), "alice", "correct-horse")
        .expect("register");
    (remote, client, store)
}

fn credential() -> Secret {
    Secret::new(
        "mail",
        SecretData::Credential(Credential {
            login: "alice".into(),
            password: "s3cr3t".into(),
        }),
    )
    .with_metadata("work account")
}

fn note(content: &str) -> Secret {
    Secret::new(
        "note",
        SecretData::Text(Text {
            content: content.into(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Create / get / list / update / delete
// ---------------------------------------------------------------------------

#[test]
fn create_assigns_id_and_timestamps() {
    let (_remote, _client, store) = setup();
    let cancel = CancelToken::new();
    let before = chrono::Utc::now();

    let mut secret = credential();
    store.create(&cancel, &mut secret).unwrap();

    assert_eq!(secret.id, 1);
    assert_eq!(secret.created_at, secret.updated_at);
    assert!(secret.created_at >= before);

    let fetched = store.get(&cancel, secret.id).unwrap();
    assert_eq!(fetched.title, "mail");
    assert_eq!(fetched.metadata, "work account");
    assert_eq!(fetched.data, secret.data);
    assert_eq!(fetched.created_at, secret.created_at);
}

#[test]
fn every_kind_round_trips_through_the_store() {
    let (_remote, _client, store) = setup();
    let cancel = CancelToken::new();

    let mut secrets = vec![
        credential(),
        note("remember the milk"),
        Secret::new(
            "visa",
            SecretData::Card(Card {
                number: "4111111111111111".into(),
                expiry_year: 2030,
                expiry_month: 4,
                cvv: 123,
            }),
        ),
        Secret::new(
            "ssh key",
            SecretData::Blob(Blob {
                filename: "id_ed25519".into(),
                bytes: vec![0, 1, 2, 3, 254, 255],
            }),
        ),
    ];
    for secret in &mut secrets {
        store.create(&cancel, secret).unwrap();
    }

    let listed = store.list(&cancel).unwrap();
    assert_eq!(listed.len(), secrets.len());
    for want in &secrets {
        let got = listed
            .iter()
            .find(|s| s.id == want.id)
            .expect("created secret is listed");
        assert_eq!(got.secret_type, want.secret_type);
        assert_eq!(got.data, want.data);
    }
}

#[test]
fn list_puts_recently_updated_first() {
    let (_remote, _client, store) = setup();
    let cancel = CancelToken::new();

    let mut first = note("first");
    let mut second = note("second");
    let mut third = note("third");
    for secret in [&mut first, &mut second, &mut third] {
        store.create(&cancel, secret).unwrap();
        thread::sleep(Duration::from_millis(5));
    }
    first.title = "touched".into();
    store.update(&cancel, &mut first).unwrap();

    let ids: Vec<u64> = store.list(&cancel).unwrap().iter().map(|s| s.id).collect();
    assert_eq!(ids, [first.id, third.id, second.id]);
}

#[test]
fn create_does_not_fill_in_the_owner() {
    let (_remote, _client, store) = setup();
    let cancel = CancelToken::new();

    let mut secret = note("mine");
    store.create(&cancel, &mut secret).unwrap();
    assert_eq!(secret.user_id, 0);

    let fetched = store.get(&cancel, secret.id).unwrap();
    assert_ne!(fetched.user_id, 0);
    let listed = store.list(&cancel).unwrap();
    assert_eq!(listed[0].user_id, fetched.user_id);
}

#[test]
fn update_keeps_created_at_and_refreshes_updated_at() {
    let (_remote, _client, store) = setup();
    let cancel = CancelToken::new();

    let mut secret = note("v1");
    store.create(&cancel, &mut secret).unwrap();
    let created_at = secret.created_at;

    thread::sleep(Duration::from_millis(5));
    secret.set_data(SecretData::Text(Text {
        content: "v2".into(),
    }));
    secret.title = "renamed".into();
    store.update(&cancel, &mut secret).unwrap();

    assert_eq!(secret.created_at, created_at);
    assert!(secret.updated_at > created_at);

    let fetched = store.get(&cancel, secret.id).unwrap();
    assert_eq!(fetched.title, "renamed");
    assert_eq!(fetched.created_at, created_at);
    assert_eq!(fetched.updated_at, secret.updated_at);
    assert_eq!(
        fetched.data,
        Some(SecretData::Text(Text {
            content: "v2".into()
        }))
    );
}

#[test]
fn update_from_a_fresh_secret_keeps_the_stored_created_at() {
    let (_remote, _client, store) = setup();
    let cancel = CancelToken::new();

    let mut original = note("v1");
    store.create(&cancel, &mut original).unwrap();

    thread::sleep(Duration::from_millis(5));
    let mut replacement = note("v2");
    replacement.id = original.id;
    assert!(replacement.created_at > original.created_at);
    store.update(&cancel, &mut replacement).unwrap();

    let fetched = store.get(&cancel, original.id).unwrap();
    assert_eq!(fetched.created_at, original.created_at);
    assert_eq!(fetched.updated_at, replacement.updated_at);
    assert_ne!(fetched.user_id, 0);
    assert_eq!(
        fetched.data,
        Some(SecretData::Text(Text {
            content: "v2".into()
        }))
    );
}

#[test]
fn save_dispatches_on_id() {
    let (remote, _client, store) = setup();
    let cancel = CancelToken::new();

    let mut secret = note("a");
    store.save(&cancel, &mut secret).unwrap();
    let id = secret.id;
    assert_ne!(id, 0);

    store.save(&cancel, &mut secret).unwrap();
    assert_eq!(secret.id, id);
    assert_eq!(store.list(&cancel).unwrap().len(), 1);
    assert!(remote.record(id).is_some());
}

#[test]
fn delete_removes_the_secret() {
    let (_remote, _client, store) = setup();
    let cancel = CancelToken::new();

    let mut secret = note("gone soon");
    store.create(&cancel, &mut secret).unwrap();
    store.delete(&cancel, secret.id).unwrap();

    let err = store.get(&cancel, secret.id).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.kind(), ErrorKind::Transport);

    let err = store.delete(&cancel, secret.id).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn update_of_a_deleted_secret_leaves_it_untouched() {
    let (_remote, _client, store) = setup();
    let cancel = CancelToken::new();

    let mut secret = note("x");
    store.create(&cancel, &mut secret).unwrap();
    store.delete(&cancel, secret.id).unwrap();

    let before = secret.clone();
    let err = store.update(&cancel, &mut secret).unwrap_err();
    assert!(matches!(
        err,
        KeepsakeError::RemoteCall {
            op: Operation::Update,
            ..
        }
    ));
    assert_eq!(secret, before);
}

// ---------------------------------------------------------------------------
// Integrity and keys
// ---------------------------------------------------------------------------

#[test]
fn one_corrupted_record_fails_the_whole_list() {
    let (remote, _client, store) = setup();
    let cancel = CancelToken::new();

    let mut good = note("fine");
    let mut bad = note("about to be corrupted");
    store.create(&cancel, &mut good).unwrap();
    store.create(&cancel, &mut bad).unwrap();

    assert!(remote.tamper(bad.id, |record| {
        let last = record.payload.len() - 1;
        record.payload[last] = if record.payload[last] == b'0' { b'1' } else { b'0' };
    }));

    let err = store.list(&cancel).unwrap_err();
    match &err {
        KeepsakeError::DecryptionFailed { op, id, .. } => {
            assert_eq!(*op, Operation::List);
            assert_eq!(*id, bad.id);
        }
        other => panic!("expected DecryptionFailed, got {other:?}"),
    }
    assert!(matches!(err.root_cause(), KeepsakeError::AuthenticationFailed));

    // The untouched record is still readable on its own.
    assert!(store.get(&cancel, good.id).is_ok());
}

#[test]
fn a_different_key_sees_authentication_failure() {
    let (remote, _client, store) = setup();
    let cancel = CancelToken::new();
    let mut secret = credential();
    store.create(&cancel, &mut secret).unwrap();

    // Same account and password, different salt: the server accepts the
    // login but the derived key is not the one that sealed the secret.
    let other = Client::with_kdf(remote.clone(), ScryptParams::default(), "other-salt");
    let other_store = other
        .login(&cancel, "alice", "correct-horse")
        .expect("server accepts the password");

    let err = other_store.get(&cancel, secret.id).unwrap_err();
    assert!(matches!(err, KeepsakeError::DecryptionFailed { .. }));
    assert!(matches!(err.root_cause(), KeepsakeError::AuthenticationFailed));
    assert_eq!(err.kind(), ErrorKind::Crypto);
}

#[test]
fn logging_in_again_reads_earlier_secrets() {
    let (_remote, client, store) = setup();
    let cancel = CancelToken::new();
    let mut secret = credential();
    store.create(&cancel, &mut secret).unwrap();
    drop(store);

    let again = client.login(&cancel, "alice", "correct-horse").unwrap();
    assert_eq!(again.get(&cancel, secret.id).unwrap().data, secret.data);
}

#[test]
fn non_hex_payload_is_a_decryption_failure() {
    let (remote, _client, store) = setup();
    let cancel = CancelToken::new();
    let mut secret = note("x");
    store.create(&cancel, &mut secret).unwrap();

    remote.tamper(secret.id, |record| record.payload = b"zz-not-hex".to_vec());
    let err = store.get(&cancel, secret.id).unwrap_err();
    assert!(matches!(err, KeepsakeError::DecryptionFailed { .. }));
    assert!(matches!(err.root_cause(), KeepsakeError::InvalidEncoding(_)));
}

#[test]
fn truncated_plaintext_is_a_decode_failure() {
    let (remote, _client, store) = setup();
    let cancel = CancelToken::new();
    let mut secret = credential();
    store.create(&cancel, &mut secret).unwrap();

    let key = derive_key("correct-horse", "").unwrap();
    let sealed = encrypt(br#"{"login":"#, key.as_bytes()).unwrap();
    assert!(remote.tamper(secret.id, |record| record.payload = sealed.into_bytes()));

    let err = store.get(&cancel, secret.id).unwrap_err();
    assert!(matches!(
        err,
        KeepsakeError::DecodeFailed { op: Operation::Get, id, .. } if id == secret.id
    ));
    assert!(matches!(err.root_cause(), KeepsakeError::MalformedPayload(_)));
    assert_eq!(err.kind(), ErrorKind::Codec);
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[test]
fn failed_login_yields_no_store() {
    let (_remote, client, _store) = setup();
    let err = client
        .login(&CancelToken::new(), "alice", "wrong password")
        .unwrap_err();
    assert!(matches!(
        err,
        KeepsakeError::RemoteCall {
            op: Operation::Login,
            ..
        }
    ));
    assert!(matches!(err.root_cause(), KeepsakeError::Unauthenticated));
}

#[test]
fn duplicate_registration_fails() {
    let (_remote, client, _store) = setup();
    let err = client
        .register(&CancelToken::new(), "alice", "another-password")
        .unwrap_err();
    assert!(matches!(err.root_cause(), KeepsakeError::AlreadyExists(login) if login == "alice"));
}

#[test]
fn authenticated_calls_carry_token_and_client_id() {
    let (remote, client, store) = setup();
    store.list(&CancelToken::new()).unwrap();

    let calls = remote.calls();
    assert_eq!(calls[0].method, "register");
    assert!(!calls[0].token_attached);

    let list = calls
        .iter()
        .find(|c| c.method == "list_secrets")
        .expect("list call recorded");
    assert!(list.token_attached);
    assert!(list.user_id.is_some());
    assert_eq!(list.client_id, client.client_id());
    assert_eq!(store.session().client_id(), client.client_id());
    assert_eq!(store.session().login(), "alice");
}

// ---------------------------------------------------------------------------
// Cancellation, deadlines and outages
// ---------------------------------------------------------------------------

#[test]
fn cancelled_create_sends_nothing() {
    let (remote, _client, store) = setup();
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut secret = note("never sent");
    let err = store.create(&cancel, &mut secret).unwrap_err();
    assert!(matches!(err, KeepsakeError::Cancelled));
    assert_eq!(secret.id, 0);
    assert!(remote.calls().iter().all(|c| c.method != "save_secret"));
}

#[test]
fn cancelled_get_returns_no_plaintext() {
    let (_remote, _client, store) = setup();
    let mut secret = note("private");
    store.create(&CancelToken::new(), &mut secret).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = store.get(&cancel, secret.id).unwrap_err();
    assert!(matches!(err.root_cause(), KeepsakeError::Cancelled));
}

#[test]
fn expired_deadline_is_a_timeout() {
    let (_remote, _client, store) = setup();
    let cancel = CancelToken::with_deadline(Instant::now());
    let err = store.list(&cancel).unwrap_err();
    assert!(matches!(err.root_cause(), KeepsakeError::Timeout));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[test]
fn outages_surface_as_transport_errors() {
    let (remote, _client, store) = setup();
    remote.set_available(false);

    let err = store.list(&CancelToken::new()).unwrap_err();
    assert!(matches!(err.root_cause(), KeepsakeError::Unavailable(_)));
    assert_eq!(err.kind(), ErrorKind::Transport);

    remote.set_available(true);
    assert!(store.list(&CancelToken::new()).is_ok());
}

// ---------------------------------------------------------------------------
// Sharing
// ---------------------------------------------------------------------------

#[test]
fn store_can_be_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Store>();

    let (_remote, _client, store) = setup();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut secret = note(&format!("from thread {i}"));
                store.create(&CancelToken::new(), &mut secret).unwrap();
                secret.id
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(store.list(&CancelToken::new()).unwrap().len(), 4);
}
