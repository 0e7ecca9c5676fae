//! Property tests for the decision rules.

mod common;

use common::peripherals;
use facegate_engine::code_entry::{CodeEntry, CodeEntryCollector};
use facegate_engine::console::ScriptedConsole;
use facegate_engine::session::{CameraLease, Session};
use facegate_engine::{ControllerConfig, Feedback, SessionOutcome, VerificationWorkflow};
use facegate_hardware::KeypadInput;
use facegate_hardware::mock::MockKeypad;
use proptest::prelude::*;
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

/// Verify a probe at `offset` from alice's enrolled embedding, entering the
/// right code.
fn verify_at(offset: f64, threshold: f64) -> (SessionOutcome, usize) {
    runtime().block_on(async {
        let (mut p, rig) = peripherals();
        rig.credentials.seed("alice", &[0.0, 0.0], "123456");
        rig.single_face_frame(&[offset, 0.0]);
        rig.keypad.send_keys("123456").unwrap();

        let config = ControllerConfig::default().with_match_threshold(threshold);
        let workflow = VerificationWorkflow::new(
            CodeEntryCollector::from_config(&config),
            Feedback::new(config.feedback),
            config.match_threshold,
            config.face_policy,
        );

        let lease = CameraLease::acquire(&mut p.camera).await.unwrap();
        let mut session = Session::new(
            lease,
            &mut p.analyzer,
            &mut p.keypad,
            &mut p.outputs,
            &mut p.console,
        );
        let outcome = workflow
            .run(&mut session, &rig.credentials)
            .await
            .unwrap();
        (outcome, rig.keypad.reads())
    })
}

fn collect(keys: Vec<KeypadInput>, length: usize) -> CodeEntry {
    runtime().block_on(async {
        let (mut keypad, handle) = MockKeypad::new();
        let (mut console, _out) = ScriptedConsole::new();
        for key in keys {
            handle.send_input(key).unwrap();
        }
        CodeEntryCollector::new(length, Duration::from_millis(300))
            .with_timeout(Some(Duration::from_secs(60)))
            .collect(&mut keypad, &mut console)
            .await
            .unwrap()
    })
}

fn ignored_key() -> impl Strategy<Value = KeypadInput> {
    prop_oneof![
        Just(KeypadInput::Star),
        prop::sample::select(vec!['A', 'B', 'C', 'D']).prop_map(KeypadInput::Letter),
    ]
}

#[test]
fn test_distance_of_exactly_point_four_denies() {
    let (outcome, reads) = verify_at(0.4, 0.4);
    assert!(matches!(outcome, SessionOutcome::NoMatch { .. }));
    assert_eq!(reads, 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_accepts_iff_below_threshold(offset in 0.0f64..1.0, threshold in 0.05f64..0.95) {
        let (outcome, reads) = verify_at(offset, threshold);

        if offset < threshold {
            prop_assert!(outcome.is_granted(), "offset {} threshold {}: {:?}", offset, threshold, outcome);
            prop_assert_eq!(reads, 6);
        } else {
            let no_match = matches!(outcome, SessionOutcome::NoMatch { .. });
            prop_assert!(no_match);
            prop_assert_eq!(reads, 0);
        }
    }

    #[test]
    fn prop_cancel_never_yields_code(
        digits in prop::collection::vec(0u8..10, 0..6),
        noise in prop::collection::vec(ignored_key(), 0..4),
    ) {
        let mut keys: Vec<_> = digits.into_iter().map(KeypadInput::Digit).collect();
        keys.extend(noise);
        keys.push(KeypadInput::Hash);

        let entry = collect(keys, 6);

        prop_assert!(!entry.is_complete());
    }

    #[test]
    fn prop_complete_entry_is_exact_sequence(
        digits in prop::collection::vec(0u8..10, 1..=8),
        noise in prop::collection::vec(ignored_key(), 0..8),
    ) {
        let length = digits.len();
        let mut keys = Vec::new();
        let mut noise = noise.into_iter();
        for d in &digits {
            if let Some(key) = noise.next() {
                keys.push(key);
            }
            keys.push(KeypadInput::Digit(*d));
        }
        // keys after completion are never read
        keys.push(KeypadInput::Hash);

        let entry = collect(keys, length);

        let expected: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
        match entry {
            CodeEntry::Complete(code) => prop_assert_eq!(code.expose(), expected.as_str()),
            CodeEntry::Cancelled(reason) => prop_assert!(false, "cancelled: {:?}", reason),
        }
    }
}
