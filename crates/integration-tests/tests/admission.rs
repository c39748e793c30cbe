mod harness;

use std::time::Duration;

use harness::config::ConfigBuilder;
use harness::engine::MockEngine;
use orator_dispatch::{DispatchError, SpeakStatus, SpeechRequest};
use orator_engine::{EngineChoice, EngineKind};

#[tokio::test(start_paused = true)]
async fn busy_when_limit_reached() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(60));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().with_max_concurrent(2).build(), &[&say]);

    dispatcher.speak(SpeechRequest::new("one")).await.unwrap();
    dispatcher.speak(SpeechRequest::new("two")).await.unwrap();

    let err = dispatcher.speak(SpeechRequest::new("three")).await.unwrap_err();
    assert!(matches!(err, DispatchError::Busy { active: 2, limit: 2 }));

    harness::let_jobs_run().await;
    assert_eq!(say.starts(), 2);

    // Both jobs finish and free their slots
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(dispatcher.active_count(), 0);

    let outcome = dispatcher.speak(SpeechRequest::new("three")).await.unwrap();
    assert_eq!(outcome.status, SpeakStatus::Started);
}

#[tokio::test(start_paused = true)]
async fn limit_is_shared_across_engines() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(60));
    let espeak = MockEngine::new(EngineKind::Espeak, Duration::from_secs(60));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().with_max_concurrent(1).build(), &[&say, &espeak]);

    dispatcher
        .speak(SpeechRequest::new("hello").engine(EngineChoice::Say))
        .await
        .unwrap();

    let err = dispatcher
        .speak(SpeechRequest::new("hello").engine(EngineChoice::Espeak))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::Busy { .. }));

    harness::let_jobs_run().await;
    assert_eq!(espeak.starts(), 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_request_is_not_remembered_for_dedupe() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(5));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().with_max_concurrent(1).build(), &[&say]);

    dispatcher.speak(SpeechRequest::new("first")).await.unwrap();
    assert!(matches!(
        dispatcher.speak(SpeechRequest::new("second")).await,
        Err(DispatchError::Busy { .. })
    ));

    tokio::time::sleep(Duration::from_secs(6)).await;

    // Still within the dedupe window of the rejected attempt
    let outcome = dispatcher.speak(SpeechRequest::new("second")).await.unwrap();
    assert_eq!(outcome.status, SpeakStatus::Started);

    harness::let_jobs_run().await;
    assert_eq!(say.spoken(), vec!["first".to_owned(), "second".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn duplicate_text_is_suppressed_within_window() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(1));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().with_dedupe_seconds(30.0).build(), &[&say]);

    dispatcher.speak(SpeechRequest::new("hello")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    match dispatcher.speak(SpeechRequest::new("  hello  ")).await {
        Err(DispatchError::DuplicateSuppressed { retry_after }) => {
            assert_eq!(retry_after, Duration::from_secs(20));
        }
        other => panic!("expected duplicate suppression, got {other:?}"),
    }
    assert_eq!(say.starts(), 1);

    tokio::time::sleep(Duration::from_secs(21)).await;
    assert!(dispatcher.speak(SpeechRequest::new("hello")).await.is_ok());
    harness::let_jobs_run().await;
    assert_eq!(say.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn dedupe_is_per_engine_and_text() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(1));
    let espeak = MockEngine::new(EngineKind::Espeak, Duration::from_secs(1));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().with_max_concurrent(4).build(), &[&say, &espeak]);

    dispatcher
        .speak(SpeechRequest::new("hello").engine(EngineChoice::Say))
        .await
        .unwrap();
    dispatcher
        .speak(SpeechRequest::new("hello").engine(EngineChoice::Espeak))
        .await
        .unwrap();
    dispatcher
        .speak(SpeechRequest::new("hello again").engine(EngineChoice::Say))
        .await
        .unwrap();

    harness::let_jobs_run().await;
    assert_eq!(say.starts(), 2);
    assert_eq!(espeak.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_window_disables_dedupe() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(1));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().build(), &[&say]);

    for _ in 0..2 {
        dispatcher
            .speak(SpeechRequest::new("again").dedupe_seconds(0.0).wait_for_completion(true))
            .await
            .unwrap();
    }

    assert_eq!(say.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn auto_follows_engine_priority() {
    let espeak = MockEngine::new(EngineKind::Espeak, Duration::from_secs(1));
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(1));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().with_dedupe_seconds(0.0).build(), &[&espeak, &say]);

    let outcome = dispatcher.speak(SpeechRequest::new("hi")).await.unwrap();
    assert_eq!(outcome.engine, EngineKind::Say);

    say.set_available(false);
    tokio::time::sleep(Duration::from_secs(2)).await;

    let outcome = dispatcher.speak(SpeechRequest::new("hi")).await.unwrap();
    assert_eq!(outcome.engine, EngineKind::Espeak);
}

#[tokio::test(start_paused = true)]
async fn unavailable_engine_is_rejected() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(1));
    say.set_available(false);
    let dispatcher = harness::dispatcher(ConfigBuilder::new().build(), &[&say]);

    let err = dispatcher
        .speak(SpeechRequest::new("hi").engine(EngineChoice::Say))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::NoEngineAvailable {
            requested: EngineChoice::Say
        }
    ));

    // Swift was never registered
    let err = dispatcher
        .speak(SpeechRequest::new("hi").engine(EngineChoice::Swift))
        .await
        .unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(say.starts(), 0);
}

#[tokio::test(start_paused = true)]
async fn invalid_requests_start_nothing() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(1));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().build(), &[&say]);

    for request in [
        SpeechRequest::new("   "),
        SpeechRequest::new("hi").speed(0.0),
        SpeechRequest::new("hi").speed(9.0),
        SpeechRequest::new("hi").hard_timeout_seconds(0.0),
    ] {
        assert!(matches!(
            dispatcher.speak(request).await,
            Err(DispatchError::InvalidRequest(_))
        ));
    }

    assert_eq!(say.starts(), 0);
    assert_eq!(dispatcher.active_count(), 0);
}
