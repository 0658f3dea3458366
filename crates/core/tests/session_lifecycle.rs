//! Integration tests for session lifecycle guarantees.
//!
//! A session is created once, shut down exactly once, and every operation
//! on a shut-down (or dropped) session fails with an invalid-session error.

use std::time::Duration;

use mg::{DeviceType, IkInput, Pose, Session};

#[tokio::test]
async fn operations_after_shutdown_return_invalid_session() {
    let session = Session::emulated().await.unwrap();
    let glove = session.glove(DeviceType::Left);

    session.shutdown().await.unwrap();

    // Every operation class is gated: telemetry, haptics, sampling,
    // profiles, coordinate system, IK.
    assert!(
        glove
            .battery_voltage()
            .await
            .unwrap_err()
            .is_invalid_session()
    );
    assert!(
        glove
            .vibrate(0.5, Duration::from_millis(50))
            .await
            .unwrap_err()
            .is_invalid_session()
    );
    assert!(
        glove
            .hand(Duration::ZERO)
            .await
            .unwrap_err()
            .is_invalid_session()
    );
    assert!(
        session
            .profile_count()
            .await
            .unwrap_err()
            .is_invalid_session()
    );
    assert!(
        session
            .set_coordinate_system(mg::CoordUp::Z, mg::Handedness::Left)
            .await
            .unwrap_err()
            .is_invalid_session()
    );
    let input = IkInput {
        head: Pose::IDENTITY,
        left_lower_arm: Pose::IDENTITY,
        right_lower_arm: Pose::IDENTITY,
    };
    assert!(
        session
            .update_ik(&input)
            .await
            .unwrap_err()
            .is_invalid_session()
    );
}

#[tokio::test]
async fn second_shutdown_is_invalid_session() {
    let session = Session::emulated().await.unwrap();
    session.shutdown().await.unwrap();
    assert!(session.shutdown().await.unwrap_err().is_invalid_session());
}

#[tokio::test]
async fn dropping_the_session_invalidates_outstanding_handles() {
    let session = Session::emulated().await.unwrap();
    let glove = session.glove(DeviceType::Right);

    // Confirm the handle works while the session is alive.
    glove.battery_voltage().await.unwrap();

    drop(session);

    assert!(
        glove
            .battery_voltage()
            .await
            .unwrap_err()
            .is_invalid_session()
    );
    // The boolean query collapses the failure instead of reporting it.
    assert!(!glove.is_connected().await);
}

#[tokio::test]
async fn launch_without_an_engine_is_a_distinguishable_failure() {
    // Force discovery to fail regardless of the host machine.
    unsafe {
        std::env::set_var("MG_ENGINE_EXE", "/nonexistent/mg-engine");
        std::env::set_var("PATH", "/nonexistent");
    }

    let err = Session::launch().await.unwrap_err();
    assert!(
        matches!(err, mg::Error::EngineNotFound),
        "expected EngineNotFound, got: {err:?}"
    );
}
