//! Integration tests for the IK update contract and coordinate-system
//! configuration.

use mg::{CoordUp, Handedness, IkInput, Pose, Quat, Session, Vec3};

fn standing_input() -> IkInput {
    IkInput {
        head: Pose::new(Vec3::new(0.0, 1.72, 0.0), Quat::IDENTITY),
        left_lower_arm: Pose::new(Vec3::new(-0.35, 1.05, 0.25), Quat::IDENTITY),
        right_lower_arm: Pose::new(Vec3::new(0.35, 1.05, 0.25), Quat::IDENTITY),
    }
}

#[tokio::test]
async fn repeated_updates_with_fixed_inputs_are_deterministic() {
    let session = Session::emulated().await.unwrap();
    let input = standing_input();

    let first = session.update_ik(&input).await.unwrap();
    let second = session.update_ik(&input).await.unwrap();
    let third = session.update_ik(&input).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second, third);

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn solve_produces_the_engine_owned_fields() {
    let session = Session::emulated().await.unwrap();
    let input = standing_input();

    let solve = session.update_ik(&input).await.unwrap();

    // Shoulders sit apart laterally and below the head.
    assert_ne!(
        solve.left.shoulder.translation,
        solve.right.shoulder.translation
    );
    assert!(solve.left.shoulder.translation.y < input.head.translation.y);

    // Upper-arm orientations are usable rotations.
    assert!(solve.left.upper_arm.is_valid_rotation());
    assert!(solve.right.upper_arm.is_valid_rotation());

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn solve_depends_on_the_selected_profile() {
    let session = Session::emulated().await.unwrap();
    let input = standing_input();

    let narrow = session.update_ik(&input).await.unwrap();

    let mut profile = session.profile().await.unwrap();
    profile.shoulder_length *= 3.0;
    session.set_profile(&profile).await.unwrap();

    let wide = session.update_ik(&input).await.unwrap();
    assert_ne!(narrow, wide, "profile change must move the solve");

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn degenerate_input_rotation_is_rejected() {
    let session = Session::emulated().await.unwrap();

    let mut input = standing_input();
    input.head.rotation = Quat::new(0.0, 0.0, 0.0, 0.0);

    let err = session.update_ik(&input).await.unwrap_err();
    assert!(matches!(err, mg::Error::InvalidArgument(_)), "got: {err:?}");

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn all_six_coordinate_system_combinations_are_accepted() {
    let session = Session::emulated().await.unwrap();

    for up in [CoordUp::X, CoordUp::Y, CoordUp::Z] {
        for handedness in [Handedness::Left, Handedness::Right] {
            session.set_coordinate_system(up, handedness).await.unwrap();
        }
    }

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn coordinate_system_changes_the_frame_of_subsequent_solves() {
    let session = Session::emulated().await.unwrap();
    let input = standing_input();

    session
        .set_coordinate_system(CoordUp::Y, Handedness::Right)
        .await
        .unwrap();
    let y_up = session.update_ik(&input).await.unwrap();

    session
        .set_coordinate_system(CoordUp::Z, Handedness::Right)
        .await
        .unwrap();
    let z_up = session.update_ik(&input).await.unwrap();

    assert_ne!(y_up, z_up, "frame change must re-express the solve");

    session.shutdown().await.unwrap();
}

#[test]
fn out_of_enum_coordinate_codes_are_rejected_at_the_boundary() {
    assert!(CoordUp::from_code(3).is_none());
    assert!(Handedness::from_code(2).is_none());
    // All in-range codes decode.
    for code in 0..3 {
        assert!(CoordUp::from_code(code).is_some());
    }
    for code in 0..2 {
        assert!(Handedness::from_code(code).is_some());
    }
}
