//! Enrollment workflow against scripted devices.

mod common;

use common::{Peripherals, Rig, embedding, peripherals};
use facegate_engine::code_entry::CodeEntryCollector;
use facegate_engine::session::{CameraLease, Session};
use facegate_engine::{
    ControllerConfig, DuplicatePolicy, EngineError, EngineResult, EnrollmentWorkflow, Feedback,
    SessionOutcome,
};
use facegate_hardware::{FaceRegion, LedColor};

fn workflow(config: &ControllerConfig) -> EnrollmentWorkflow {
    EnrollmentWorkflow::new(
        CodeEntryCollector::from_config(config),
        Feedback::new(config.feedback),
        config.duplicate_policy,
    )
}

async fn enroll(
    p: &mut Peripherals,
    rig: &Rig,
    config: &ControllerConfig,
    name: &str,
) -> EngineResult<SessionOutcome> {
    let lease = CameraLease::acquire(&mut p.camera).await?;
    let mut session = Session::new(
        lease,
        &mut p.analyzer,
        &mut p.keypad,
        &mut p.outputs,
        &mut p.console,
    );
    workflow(config)
        .run(&mut session, &rig.credentials, name)
        .await
}

#[tokio::test(start_paused = true)]
async fn test_single_face_and_code_writes_one_credential() {
    let (mut p, rig) = peripherals();
    rig.single_face_frame(&[0.1, 0.2, 0.3]);
    rig.keypad.send_keys("123456").unwrap();

    let outcome = enroll(&mut p, &rig, &ControllerConfig::default(), "alice")
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        SessionOutcome::Enrolled { ref identity, replaced: false } if identity.as_str() == "alice"
    ));
    let stored = rig.credentials.credentials();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].identity.as_str(), "alice");
    assert_eq!(stored[0].embedding, embedding(&[0.1, 0.2, 0.3]));
    assert_eq!(stored[0].code.expose(), "123456");
    assert_eq!(
        rig.outputs.indicator_history(),
        vec![LedColor::Green, LedColor::Off]
    );
    assert!(!rig.camera.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_ambiguous_frames_are_retried_without_writing() {
    let (mut p, rig) = peripherals();
    rig.camera.push_frame();
    let crowded = rig.camera.push_frame();
    rig.analyzer.set_faces(
        crowded,
        vec![
            (FaceRegion::new(0, 50, 50, 0), embedding(&[0.1])),
            (FaceRegion::new(0, 150, 50, 100), embedding(&[0.2])),
        ],
    );
    rig.single_face_frame(&[0.3]);
    rig.keypad.send_keys("654321").unwrap();

    let outcome = enroll(&mut p, &rig, &ControllerConfig::default(), "bob")
        .await
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::Enrolled { .. }));
    assert!(rig.console.showed("No face detected"));
    assert!(rig.console.showed("Multiple faces detected"));
    assert_eq!(rig.credentials.writes(), 1);
    assert_eq!(rig.credentials.get("bob").unwrap().embedding, embedding(&[0.3]));
    assert_eq!(
        rig.outputs.indicator_history(),
        vec![
            LedColor::Red,
            LedColor::Off,
            LedColor::Red,
            LedColor::Off,
            LedColor::Green,
            LedColor::Off,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_only_ambiguous_frames_never_write() {
    let (mut p, rig) = peripherals();
    rig.camera.push_frame();
    let crowded = rig.camera.push_frame();
    rig.analyzer.set_faces(
        crowded,
        vec![
            (FaceRegion::new(0, 50, 50, 0), embedding(&[0.1])),
            (FaceRegion::new(0, 150, 50, 100), embedding(&[0.2])),
        ],
    );

    // camera runs dry after the scripted frames
    let result = enroll(&mut p, &rig, &ControllerConfig::default(), "bob").await;

    assert!(matches!(result, Err(EngineError::Hardware(_))));
    assert_eq!(rig.credentials.writes(), 0);
    assert_eq!(rig.keypad.reads(), 0);
    assert!(!rig.camera.is_open());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_code_discards_embedding_and_retries() {
    let (mut p, rig) = peripherals();
    rig.single_face_frame(&[0.1]);
    rig.single_face_frame(&[0.9]);
    rig.keypad.send_keys("12#").unwrap();
    rig.keypad.send_keys("246810").unwrap();

    let outcome = enroll(&mut p, &rig, &ControllerConfig::default(), "carol")
        .await
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::Enrolled { .. }));
    assert!(rig.console.showed("PIN entry failed"));
    let stored = rig.credentials.get("carol").unwrap();
    assert_eq!(stored.embedding, embedding(&[0.9]));
    assert_eq!(stored.code.expose(), "246810");
    assert_eq!(rig.credentials.writes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_frames_before_trigger_are_previews() {
    let (mut p, rig) = peripherals();
    rig.camera.push_frame();
    rig.camera.push_frame();
    rig.single_face_frame(&[0.4]);
    rig.console.push_triggers(&[false, false, true]);
    rig.keypad.send_keys("000000").unwrap();

    let outcome = enroll(&mut p, &rig, &ControllerConfig::default(), "dave")
        .await
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::Enrolled { .. }));
    assert_eq!(rig.console.trigger_checks(), 3);
    assert_eq!(rig.analyzer.detections(), 1);
    assert!(!rig.console.showed("No face detected"));
}

#[tokio::test(start_paused = true)]
async fn test_transient_capture_failure_is_retried() {
    let (mut p, rig) = peripherals();
    rig.camera.push_failure();
    rig.single_face_frame(&[0.4]);
    rig.keypad.send_keys("123456").unwrap();

    let outcome = enroll(&mut p, &rig, &ControllerConfig::default(), "erin")
        .await
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::Enrolled { .. }));
    assert!(rig.console.showed("Failed to capture image"));
}

#[tokio::test(start_paused = true)]
async fn test_empty_name_is_rejected_before_capture() {
    let (mut p, rig) = peripherals();
    rig.single_face_frame(&[0.4]);

    let outcome = enroll(&mut p, &rig, &ControllerConfig::default(), "   ")
        .await
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::InvalidIdentity { .. }));
    assert_eq!(rig.camera.captures(), 0);
    assert!(rig.outputs.showed(LedColor::Red));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_rejected_by_default() {
    let (mut p, rig) = peripherals();
    rig.credentials.seed("alice", &[0.1], "111111");
    rig.single_face_frame(&[0.9]);

    let outcome = enroll(&mut p, &rig, &ControllerConfig::default(), "alice")
        .await
        .unwrap();

    assert!(matches!(outcome, SessionOutcome::DuplicateIdentity { .. }));
    assert_eq!(rig.camera.captures(), 0);
    let stored = rig.credentials.get("alice").unwrap();
    assert_eq!(stored.embedding, embedding(&[0.1]));
    assert_eq!(stored.code.expose(), "111111");
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_overwritten_when_configured() {
    let (mut p, rig) = peripherals();
    rig.credentials.seed("alice", &[0.1], "111111");
    rig.single_face_frame(&[0.9]);
    rig.keypad.send_keys("222222").unwrap();
    let config = ControllerConfig::default().with_duplicate_policy(DuplicatePolicy::Overwrite);

    let outcome = enroll(&mut p, &rig, &config, "alice").await.unwrap();

    assert!(matches!(outcome, SessionOutcome::Enrolled { replaced: true, .. }));
    assert_eq!(rig.credentials.credentials().len(), 1);
    let stored = rig.credentials.get("alice").unwrap();
    assert_eq!(stored.embedding, embedding(&[0.9]));
    assert_eq!(stored.code.expose(), "222222");
}
