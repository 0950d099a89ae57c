mod support;

use std::time::Duration;

use secrecy::SecretString;

use owngate::{SessionConfig, SessionSupervisor, TestReason};
use support::{Auth, AckPolicy, FakeGateway};

fn config_for(gateway: &FakeGateway) -> SessionConfig {
    SessionConfig::new(gateway.addr.ip().to_string())
        .with_port(gateway.addr.port())
        .with_connect_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn unreachable_host_reports_unreachable() {
    let port = support::unreachable_port();
    let config = SessionConfig::new("127.0.0.1")
        .with_port(port)
        .with_connect_timeout(Duration::from_secs(1));

    let session = SessionSupervisor::new(config);
    let outcome = session.test().await;

    assert!(!outcome.success);
    assert_eq!(outcome.reason, TestReason::Unreachable);
    assert_eq!(outcome.reason.as_str(), "unreachable");
    assert!(session.identity().is_none());
}

#[tokio::test]
async fn open_gateway_reports_ok_and_populates_identity() {
    let gateway = FakeGateway::spawn(Auth::Open, AckPolicy::Ack).await;
    let session = SessionSupervisor::new(config_for(&gateway));

    let outcome = session.test().await;

    assert!(outcome.success);
    assert_eq!(outcome.reason, TestReason::Ok);
    assert_eq!(session.unique_id().as_deref(), Some(support::EXPECTED_MAC));
    assert_eq!(session.manufacturer(), Some("BTicino"));
    assert_eq!(session.model().as_deref(), Some(support::EXPECTED_MODEL));
    assert_eq!(
        session.firmware().as_deref(),
        Some(support::EXPECTED_FIRMWARE)
    );
    assert_eq!(session.name().as_deref(), Some("MHServer2 Gateway"));
}

#[tokio::test]
async fn correct_password_reports_ok() {
    let gateway = FakeGateway::spawn(
        Auth::Password {
            nonce: "603356072",
            password: 12345,
        },
        AckPolicy::Ack,
    )
    .await;

    let config = config_for(&gateway).with_password(SecretString::new("12345".into()));
    let session = SessionSupervisor::new(config);

    let outcome = session.test().await;
    assert!(outcome.success);
    assert_eq!(session.unique_id().as_deref(), Some(support::EXPECTED_MAC));
}

#[tokio::test]
async fn wrong_password_reports_password_error() {
    let gateway = FakeGateway::spawn(
        Auth::Password {
            nonce: "603356072",
            password: 12345,
        },
        AckPolicy::Ack,
    )
    .await;

    let config = config_for(&gateway).with_password(SecretString::new("99999".into()));
    let session = SessionSupervisor::new(config);

    let outcome = session.test().await;
    assert!(!outcome.success);
    assert_eq!(outcome.reason, TestReason::PasswordError);
}

#[tokio::test]
async fn missing_password_reports_password_required() {
    let gateway = FakeGateway::spawn(
        Auth::Password {
            nonce: "603356072",
            password: 12345,
        },
        AckPolicy::Ack,
    )
    .await;

    let session = SessionSupervisor::new(config_for(&gateway));

    let outcome = session.test().await;
    assert!(!outcome.success);
    assert_eq!(outcome.reason, TestReason::PasswordRequired);
}
