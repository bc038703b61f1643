//! Resolve-and-dispatch integration tests
//!
//! Drives the command router end to end against recording capabilities.

use std::sync::Arc;
use std::time::Duration;

use ziggy::capabilities::DeviceCommand;
use ziggy::intent::ResolutionSource;
use ziggy::{Intent, Language, LifecycleAction, LifecycleGate, Origin, Params, ResolvedIntent};

mod common;
use common::{CountingClassifier, Harness, MockKnowledge, scripted_classifier};

fn classified(intent: Intent, params: Params) -> ResolvedIntent {
    ResolvedIntent::new(intent, params, ResolutionSource::Classifier)
}

#[tokio::test]
async fn test_pattern_match_skips_classifier() {
    let harness = Harness::new();
    let classifier = CountingClassifier::returning(ResolvedIntent::unknown());
    let router = harness.router(classifier.clone());

    let reply = router.handle("מה השעה", Language::Hebrew, &Origin::Local).await;
    assert!(reply.starts_with("השעה עכשיו"));

    let reply = router.handle("tell me a joke", Language::English, &Origin::Local).await;
    assert!(reply.contains("skeletons"));

    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn test_classifier_consulted_once_on_miss() {
    let harness = Harness::new();
    let classifier = CountingClassifier::returning(classified(
        Intent::ControlDevice,
        Params::new().with("device", "lamp").with("action", "on"),
    ));
    let router = harness.router(classifier.clone());

    let reply = router.handle("turn on the lamp", Language::English, &Origin::Local).await;

    assert_eq!(reply, "lamp turned on");
    assert_eq!(classifier.calls(), 1);
    assert_eq!(harness.devices.calls(), vec![("lamp".to_string(), DeviceCommand::On)]);
}

#[tokio::test]
async fn test_empty_text_is_unknown_without_model_call() {
    let harness = Harness::new();
    let classifier = CountingClassifier::returning(classified(Intent::TellFact, Params::new()));
    let router = harness.router(classifier.clone());

    let reply = router.handle("   ", Language::English, &Origin::Local).await;
    assert_eq!(reply, "I didn't understand the request");
    assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn test_scripted_model_output_drives_dispatch() {
    let harness = Harness::new();
    let router = harness.router(scripted_classifier(
        "```json\n{\"intent\": \"add_to_list\", \"params\": {\"item\": \"milk\"}}\n```",
    ));

    let reply = router.handle("we need milk", Language::English, &Origin::Local).await;

    assert_eq!(reply, "milk added to list");
    assert_eq!(*harness.files.list.lock().unwrap(), vec!["milk".to_string()]);
}

#[tokio::test]
async fn test_invalid_model_output_degrades_to_unknown() {
    let harness = Harness::new();

    for raw in [
        "I think you want the lights on",
        "{\"intent\": \"open_portal\", \"params\": {}}",
        "[1, 2, 3]",
    ] {
        let router = harness.router(scripted_classifier(raw));
        let resolved = router.resolve("do the thing").await;
        assert_eq!(resolved.intent, Intent::Unknown, "raw output: {raw}");
    }

    assert!(harness.devices.calls().is_empty());
}

#[tokio::test]
async fn test_missing_parameter_asks_without_side_effect() {
    let harness = Harness::new();
    let router = harness.router(scripted_classifier(
        "{\"intent\": \"control_device\", \"params\": {\"action\": \"on\"}}",
    ));

    let reply = router.handle("turn it on", Language::English, &Origin::Local).await;

    assert_eq!(reply, "Please specify device and action");
    assert!(harness.devices.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_device_is_reported() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();

    let reply = dispatcher
        .dispatch(
            &classified(
                Intent::ControlDevice,
                Params::new().with("device", "toaster").with("action", "off"),
            ),
            Language::English,
        )
        .await;

    assert_eq!(reply, "I don't know a device called toaster");
}

#[tokio::test]
async fn test_brightness_and_temperature() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();

    dispatcher
        .dispatch(
            &classified(
                Intent::ControlDevice,
                Params::new()
                    .with("device", "lamp")
                    .with("action", "set_brightness")
                    .with("value", 128),
            ),
            Language::English,
        )
        .await;
    let reply = dispatcher
        .dispatch(
            &classified(
                Intent::ControlDevice,
                Params::new()
                    .with("device", "heater")
                    .with("action", "set_temperature")
                    .with("value", "22.5"),
            ),
            Language::Hebrew,
        )
        .await;

    assert_eq!(reply, "heater כוון ל־22.5 מעלות");
    assert_eq!(
        harness.devices.calls(),
        vec![
            ("lamp".to_string(), DeviceCommand::Brightness(128)),
            ("heater".to_string(), DeviceCommand::Temperature(22.5)),
        ]
    );
}

#[tokio::test]
async fn test_save_then_ask_memory() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();

    let reply = dispatcher
        .dispatch(
            &classified(
                Intent::SaveMemory,
                Params::new().with("topic", "Wifi").with("content", "password is 1234"),
            ),
            Language::English,
        )
        .await;
    assert_eq!(reply, "Saved to memory");

    let reply = dispatcher
        .dispatch(
            &classified(Intent::AskMemory, Params::new().with("topic", "wifi")),
            Language::Hebrew,
        )
        .await;
    assert_eq!(reply, "password is 1234");
}

#[tokio::test]
async fn test_ask_memory_miss_uses_knowledge() {
    let harness = Harness::new();
    let knowledge = Arc::new(MockKnowledge("A famous scientist".to_string()));
    let dispatcher =
        ziggy::Dispatcher::new(harness.capabilities(Some(knowledge)), harness.memory.clone());

    let reply = dispatcher
        .dispatch(
            &classified(Intent::AskMemory, Params::new().with("topic", "Einstein")),
            Language::English,
        )
        .await;
    assert_eq!(reply, "A famous scientist");

    let without = harness.dispatcher();
    let reply = without
        .dispatch(
            &classified(Intent::AskMemory, Params::new().with("topic", "Einstein")),
            Language::English,
        )
        .await;
    assert_eq!(reply, "I have nothing saved about Einstein");
}

#[tokio::test]
async fn test_tasks_and_reminders() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();

    dispatcher
        .dispatch(
            &classified(
                Intent::CreateTask,
                Params::new().with("description", "call mom").with("when", "tomorrow"),
            ),
            Language::English,
        )
        .await;
    let reply = dispatcher
        .dispatch(
            &classified(
                Intent::SetReminder,
                Params::new().with("message", "water plants").with("when", "8pm"),
            ),
            Language::English,
        )
        .await;
    assert_eq!(reply, "Reminder set for 8pm: water plants");
    assert_eq!(harness.tasks.created.lock().unwrap().len(), 2);

    let reply = dispatcher
        .dispatch(
            &classified(Intent::CancelTask, Params::new().with("description", "call mom")),
            Language::English,
        )
        .await;
    assert_eq!(reply, "Deleted task: call mom");

    let reply = dispatcher
        .dispatch(
            &classified(Intent::CancelTask, Params::new().with("description", "call mom")),
            Language::English,
        )
        .await;
    assert_eq!(reply, "I couldn't find a task called call mom");
}

#[tokio::test]
async fn test_files_read_write_and_reject_bad_names() {
    let harness = Harness::new();
    let dispatcher = harness.dispatcher();

    let reply = dispatcher
        .dispatch(
            &classified(
                Intent::WriteFile,
                Params::new().with("filename", "notes").with("content", "buy bread"),
            ),
            Language::English,
        )
        .await;
    assert_eq!(reply, "File updated");

    let reply = dispatcher
        .dispatch(
            &classified(Intent::ReadFile, Params::new().with("filename", "notes")),
            Language::English,
        )
        .await;
    assert_eq!(reply, "The content is: buy bread");

    let reply = dispatcher
        .dispatch(
            &classified(Intent::ReadFile, Params::new().with("filename", "../etc/passwd")),
            Language::English,
        )
        .await;
    assert_eq!(reply, "'../etc/passwd' is not a valid file name");
}

#[tokio::test]
async fn test_ifttt_failure_becomes_apology() {
    let mut harness = Harness::new();
    harness.events = Arc::new(common::MockEvents {
        fail: true,
        ..Default::default()
    });
    let dispatcher = harness.dispatcher();

    let reply = dispatcher
        .dispatch(
            &classified(Intent::RunIfttt, Params::new().with("event", "open_garage")),
            Language::Hebrew,
        )
        .await;
    assert_eq!(reply, "סליחה, משהו השתבש");
}

#[tokio::test]
async fn test_lifecycle_requires_confirmation_from_same_origin() {
    let harness = Harness::new();
    let router = harness.router(CountingClassifier::returning(ResolvedIntent::unknown()));
    let mut released = harness.gate.subscribe();
    let alice = Origin::Telegram(1);
    let bob = Origin::Telegram(2);

    let reply = router.handle("restart", Language::English, &alice).await;
    assert!(reply.starts_with("Are you sure you want to restart?"));
    assert_eq!(harness.gate.released(), None);

    let reply = router.handle("confirm", Language::English, &bob).await;
    assert_eq!(reply, "There is nothing to confirm");
    assert_eq!(harness.gate.released(), None);

    let reply = router.handle("confirm", Language::English, &alice).await;
    assert_eq!(reply, "Restarting...");
    assert!(released.has_changed().unwrap());
    assert_eq!(*released.borrow_and_update(), Some(LifecycleAction::Restart));
}

#[tokio::test]
async fn test_host_power_refused_unless_allowed() {
    let harness = Harness::new();
    let router = harness.router(CountingClassifier::returning(ResolvedIntent::unknown()));

    let reply = router
        .handle("כבה את המערכת", Language::Hebrew, &Origin::Voice)
        .await;
    assert_eq!(reply, "כיבוי והפעלה מחדש של המחשב אינם מורשים");

    let reply = router.handle("אשר", Language::Hebrew, &Origin::Voice).await;
    assert_eq!(reply, "אין פעולה שממתינה לאישור");
    assert_eq!(harness.gate.released(), None);
}

#[tokio::test]
async fn test_expired_confirmation() {
    let harness = Harness::with_gate(LifecycleGate::with_window(Duration::from_millis(20), true));
    let router = harness.router(CountingClassifier::returning(ResolvedIntent::unknown()));

    router.handle("shutdown", Language::English, &Origin::Local).await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    let reply = router.handle("confirm", Language::English, &Origin::Local).await;
    assert_eq!(reply, "The confirmation window expired, please ask again");
    assert_eq!(harness.gate.released(), None);
}
