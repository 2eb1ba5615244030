//! End-to-end pairing lifecycle over the in-memory store.
//!
//! Services are wired exactly as the server wires them without a database,
//! with a scripted random source and a manually advanced clock.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use futures::future::join_all;
use mockable::Clock;
use rstest::{fixture, rstest};

use runsight_backend::domain::ports::{
    DeviceCommand, DeviceQuery, PairingCommand, PairingQuery, PairingStatusRequest,
    RemoveDeviceRequest, RequestPairingCodeRequest, VerifyPairingCodeRequest,
};
use runsight_backend::domain::{
    DeviceRegistration, DeviceRegistrationDraft, DeviceService, ErrorCode, PairingService, UserId,
};
use runsight_backend::outbound::memory::InMemoryPairingStore;
use runsight_backend::test_support::{MutableClock, ScriptedRandomSource};

type Pairing = PairingService<InMemoryPairingStore, InMemoryPairingStore>;

struct Harness {
    pairing: Arc<Pairing>,
    devices: DeviceService<InMemoryPairingStore>,
    clock: Arc<MutableClock>,
}

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 7, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn harness(codes: &[&str], now: DateTime<Utc>) -> Harness {
    let store = Arc::new(InMemoryPairingStore::new());
    let clock = Arc::new(MutableClock::new(now));
    let pairing = PairingService::new(
        store.clone(),
        store.clone(),
        Arc::new(ScriptedRandomSource::with_codes(codes)),
        clock.clone() as Arc<dyn Clock>,
    );
    Harness {
        pairing: Arc::new(pairing),
        devices: DeviceService::new(store, clock.clone() as Arc<dyn Clock>),
        clock,
    }
}

fn verify(code: &str, device_id: &str) -> VerifyPairingCodeRequest {
    VerifyPairingCodeRequest {
        code: code.to_owned(),
        registration: DeviceRegistration::new(DeviceRegistrationDraft {
            device_id: device_id.to_owned(),
            device_type: "smart_glasses".to_owned(),
            firmware_version: Some("2.1.0".to_owned()),
            hardware_version: Some("rev-b".to_owned()),
            mac_address: Some("AA:BB:CC:DD:EE:FF".to_owned()),
        })
        .expect("valid registration"),
    }
}

async fn issue(harness: &Harness, user_id: UserId) -> (String, String) {
    let issued = harness
        .pairing
        .request_code(RequestPairingCodeRequest { user_id })
        .await
        .expect("code issued");
    (issued.code, issued.session_id)
}

async fn status(
    harness: &Harness,
    session_id: &str,
    user_id: UserId,
) -> runsight_backend::domain::ports::PairingStatusResponse {
    harness
        .pairing
        .status(PairingStatusRequest {
            session_id: session_id.to_owned(),
            user_id,
        })
        .await
        .expect("status readable")
}

#[rstest]
#[tokio::test]
async fn device_lifecycle_from_code_to_revocation(now: DateTime<Utc>) {
    let h = harness(&["482913"], now);
    let owner = UserId::random();

    let (code, session_id) = issue(&h, owner).await;
    assert_eq!(code, "482913");
    assert_eq!(status(&h, &session_id, owner).await.remaining_seconds, Some(300));

    h.clock.advance_seconds(40);
    let verified = h
        .pairing
        .verify_code(verify(&code, "GLS-00042"))
        .await
        .expect("code claimed");
    assert_eq!(verified.user_id, owner);

    let paired = status(&h, &session_id, owner).await;
    assert!(paired.paired);
    let device = paired.device.expect("paired device");
    assert_eq!(device.device_id, "GLS-00042");
    assert_eq!(device.mac_address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));

    let identity = h
        .devices
        .authenticate(verified.device_token.clone())
        .await
        .expect("token accepted");
    assert_eq!(identity.user_id, owner);
    assert_eq!(h.devices.list_devices(owner).await.expect("list").devices.len(), 1);

    h.devices
        .remove_device(RemoveDeviceRequest {
            device_id: "GLS-00042".to_owned(),
            user_id: owner,
        })
        .await
        .expect("device removed");

    let rejected = h
        .devices
        .authenticate(verified.device_token)
        .await
        .expect_err("revoked token");
    assert_eq!(rejected.code(), ErrorCode::Unauthorized);
    assert!(h.devices.list_devices(owner).await.expect("list").devices.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_succeed_exactly_once(now: DateTime<Utc>) {
    let h = harness(&["135790"], now);
    let (code, _) = issue(&h, UserId::random()).await;

    let attempts = (0..8).map(|n| {
        let pairing = Arc::clone(&h.pairing);
        let request = verify(&code, &format!("GLS-{n:05}"));
        tokio::spawn(async move { pairing.verify_code(request).await })
    });
    let outcomes: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task completes"))
        .collect();

    let winners = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(winners, 1);
    for outcome in outcomes.iter().filter_map(|outcome| outcome.as_ref().err()) {
        assert_eq!(outcome.code(), ErrorCode::InvalidPairingCode);
    }
}

#[rstest]
#[tokio::test]
async fn registered_device_cannot_claim_a_second_code(now: DateTime<Utc>) {
    let h = harness(&["111111", "222222"], now);
    let owner = UserId::random();
    let (first, _) = issue(&h, owner).await;
    let (second, second_session) = issue(&h, owner).await;

    h.pairing
        .verify_code(verify(&first, "GLS-00042"))
        .await
        .expect("first claim");
    let conflict = h
        .pairing
        .verify_code(verify(&second, "GLS-00042"))
        .await
        .expect_err("device already paired");

    assert_eq!(conflict.code(), ErrorCode::DeviceAlreadyRegistered);
    let untouched = status(&h, &second_session, owner).await;
    assert!(!untouched.paired);
    assert!(!untouched.expired);
}

#[rstest]
#[tokio::test]
async fn removed_device_still_counts_as_registered(now: DateTime<Utc>) {
    let h = harness(&["111111", "222222"], now);
    let owner = UserId::random();
    let (first, _) = issue(&h, owner).await;
    h.pairing
        .verify_code(verify(&first, "GLS-00042"))
        .await
        .expect("first claim");
    h.devices
        .remove_device(RemoveDeviceRequest {
            device_id: "GLS-00042".to_owned(),
            user_id: owner,
        })
        .await
        .expect("device removed");

    let (second, _) = issue(&h, owner).await;
    let conflict = h
        .pairing
        .verify_code(verify(&second, "GLS-00042"))
        .await
        .expect_err("no re-pair over a removed device");

    assert_eq!(conflict.code(), ErrorCode::DeviceAlreadyRegistered);
}

#[rstest]
#[tokio::test]
async fn unclaimed_code_expires_after_five_minutes(now: DateTime<Utc>) {
    let h = harness(&["654321"], now);
    let owner = UserId::random();
    let (code, session_id) = issue(&h, owner).await;

    h.clock.advance_seconds(301);

    let lapsed = status(&h, &session_id, owner).await;
    assert!(lapsed.expired);
    assert!(lapsed.remaining_seconds.is_none());
    let rejected = h
        .pairing
        .verify_code(verify(&code, "GLS-00042"))
        .await
        .expect_err("expired code");
    assert_eq!(rejected.code(), ErrorCode::InvalidPairingCode);
}

#[rstest]
#[tokio::test]
async fn live_codes_are_never_reissued(now: DateTime<Utc>) {
    let h = harness(&["777777", "777777", "888888"], now);

    let (first, _) = issue(&h, UserId::random()).await;
    let (second, _) = issue(&h, UserId::random()).await;

    assert_eq!(first, "777777");
    assert_eq!(second, "888888");
}

#[rstest]
#[tokio::test]
async fn lapsed_codes_may_be_reissued(now: DateTime<Utc>) {
    let h = harness(&["777777", "777777"], now);
    let owner = UserId::random();
    let (_, first_session) = issue(&h, owner).await;

    h.clock.advance_seconds(400);
    let (code, _) = issue(&h, owner).await;

    assert_eq!(code, "777777");
    assert!(status(&h, &first_session, owner).await.expired);
    h.pairing
        .verify_code(verify(&code, "GLS-00042"))
        .await
        .expect("fresh session claims the code");
}

#[rstest]
#[tokio::test]
async fn sessions_are_private_to_their_owner(now: DateTime<Utc>) {
    let h = harness(&["246810"], now);
    let (_, session_id) = issue(&h, UserId::random()).await;

    let hidden = h
        .pairing
        .status(PairingStatusRequest {
            session_id,
            user_id: UserId::random(),
        })
        .await
        .expect_err("foreign session");

    assert_eq!(hidden.code(), ErrorCode::NotFound);
}

#[rstest]
#[case("12345")]
#[case("abcdef")]
#[case("")]
#[tokio::test]
async fn malformed_codes_look_like_unknown_codes(now: DateTime<Utc>, #[case] code: &str) {
    let h = harness(&[], now);

    let rejected = h
        .pairing
        .verify_code(verify(code, "GLS-00042"))
        .await
        .expect_err("malformed code");

    assert_eq!(rejected.code(), ErrorCode::InvalidPairingCode);
}
