mod harness;

use std::time::Duration;

use harness::config::ConfigBuilder;
use harness::engine::MockEngine;
use orator_dispatch::{SpeakStatus, SpeechRequest};
use orator_engine::EngineKind;

#[tokio::test(start_paused = true)]
async fn stop_without_active_speech() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(5));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().build(), &[&say]);

    let outcome = dispatcher.stop_speech(true).await;
    assert_eq!(outcome.stopped_count, 0);
    assert_eq!(outcome.summary(), "No active speech.");

    assert_eq!(dispatcher.stop_speech(false).await.stopped_count, 0);
}

#[tokio::test(start_paused = true)]
async fn stop_most_recent_leaves_older_jobs() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(60));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().with_max_concurrent(3).build(), &[&say]);

    let first = dispatcher.speak(SpeechRequest::new("first")).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    dispatcher.speak(SpeechRequest::new("second")).await.unwrap();
    harness::let_jobs_run().await;

    let outcome = dispatcher.stop_speech(false).await;
    assert_eq!(outcome.stopped_count, 1);
    assert_eq!(outcome.summary(), "Stopped speech (1).");

    let active = dispatcher.list_active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, first.job_id);

    assert_eq!(dispatcher.stop_speech(true).await.stopped_count, 1);
    assert_eq!(dispatcher.active_count(), 0);
    assert_eq!(say.kills(), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_all_frees_every_slot() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(60));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().with_max_concurrent(2).build(), &[&say]);

    dispatcher.speak(SpeechRequest::new("one")).await.unwrap();
    dispatcher.speak(SpeechRequest::new("two")).await.unwrap();
    assert!(dispatcher.speak(SpeechRequest::new("three")).await.is_err());

    assert_eq!(dispatcher.stop_speech(true).await.stopped_count, 2);

    // Slots are free as soon as the stop returns
    assert!(dispatcher.speak(SpeechRequest::new("three")).await.is_ok());
    assert!(dispatcher.engine_stats(EngineKind::Say).is_none());
}

#[tokio::test(start_paused = true)]
async fn stopped_sync_caller_sees_stopped() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(60));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().build(), &[&say]);

    let speaking = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move {
            dispatcher
                .speak(SpeechRequest::new("interrupt me").wait_for_completion(true))
                .await
        }
    });

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(dispatcher.stop_speech(true).await.stopped_count, 1);

    let outcome = speaking.await.unwrap().unwrap();
    assert_eq!(outcome.status, SpeakStatus::Stopped);
    assert!(outcome.summary().starts_with("Speech stopped ("));
}

#[tokio::test(start_paused = true)]
async fn stop_during_warmup_skips_speech() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(5));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().build(), &[&say]);

    let speaking = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move {
            dispatcher
                .speak(SpeechRequest::new("after warmup").warmup(true).wait_for_completion(true))
                .await
        }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(dispatcher.stop_speech(true).await.stopped_count, 1);

    let outcome = speaking.await.unwrap().unwrap();
    assert_eq!(outcome.status, SpeakStatus::Stopped);

    // Only the warmup utterance was started
    assert_eq!(say.spoken(), vec!["warming up".to_owned()]);
    assert_eq!(say.kills(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_everything() {
    let say = MockEngine::new(EngineKind::Say, Duration::from_secs(60));
    let espeak = MockEngine::new(EngineKind::Espeak, Duration::from_secs(60));
    let dispatcher = harness::dispatcher(ConfigBuilder::new().build(), &[&say, &espeak]);

    dispatcher
        .speak(SpeechRequest::new("one").engine(orator_engine::EngineChoice::Say))
        .await
        .unwrap();
    dispatcher
        .speak(SpeechRequest::new("two").engine(orator_engine::EngineChoice::Espeak))
        .await
        .unwrap();
    harness::let_jobs_run().await;

    assert_eq!(dispatcher.shutdown().await, 2);
    assert_eq!(dispatcher.active_count(), 0);
    assert_eq!(say.kills() + espeak.kills(), 2);
}
