//! # Loading Orchestrator Integration Tests
//!
//! Drives the orchestrator against an in-memory page on tokio's paused clock,
//! so every timer fires at an exact virtual instant.

use std::sync::Arc;
use std::time::Duration;

use lib_splash::core::orchestrator::DEFAULT_STATUS_LIST;
use lib_splash::core::{
    AppEvent, AppEvents, DismissReason, LoadingOrchestrator, OrchestratorPhase,
    OrchestratorSettings,
};
use lib_splash::dom::{Document, MemoryDocument};
use project_tests::LoadingPage;
use tokio::time::{advance, sleep, Instant};

fn attach(page: &LoadingPage, events: &AppEvents) -> LoadingOrchestrator {
    LoadingOrchestrator::attach(
        Arc::clone(&page.document) as Arc<dyn Document>,
        events,
        OrchestratorSettings::default(),
    )
    .expect("all elements present")
}

fn count(texts: &[String], needle: &str) -> usize {
    texts.iter().filter(|text| text.as_str() == needle).count()
}

#[tokio::test(start_paused = true)]
async fn data_then_shell_completes_once() {
    let page = LoadingPage::new(DEFAULT_STATUS_LIST[0]);
    let events = AppEvents::new();
    let orchestrator = attach(&page, &events);

    sleep(Duration::from_millis(150)).await;
    assert_eq!(events.emit(AppEvent::AppDataLoaded), 1);
    sleep(Duration::from_millis(500)).await;
    // shell renders at 650ms, next poll is at 700ms
    page.mount.append_child();
    sleep(Duration::from_millis(60)).await;

    let state = orchestrator.state();
    assert!(state.data_ready && state.react_ready);
    assert_eq!(orchestrator.dismiss_reason(), Some(DismissReason::Completed));
    assert!(!orchestrator.dismiss(DismissReason::Timeout));

    orchestrator.removed().await;
    let texts = page.status_text.texts();
    assert_eq!(count(&texts, "Ready!"), 1);
    assert_eq!(texts.last().map(String::as_str), Some("Ready!"));
    assert_eq!(page.screen.snapshot().remove_calls, 1);
}

#[tokio::test(start_paused = true)]
async fn shell_then_data_completes_once() {
    let page = LoadingPage::new(DEFAULT_STATUS_LIST[0]);
    page.mount.append_child();
    let events = AppEvents::new();
    let orchestrator = attach(&page, &events);

    sleep(Duration::from_millis(550)).await;
    assert!(orchestrator.state().react_ready);
    assert_eq!(orchestrator.phase(), OrchestratorPhase::Loading);

    sleep(Duration::from_millis(2450)).await;
    orchestrator.mark_data_ready();
    assert_eq!(orchestrator.phase(), OrchestratorPhase::Dismissed(DismissReason::Completed));

    orchestrator.removed().await;
    let record = page.screen.snapshot();
    assert_eq!(record.remove_calls, 1);
    assert_eq!(count(&page.status_text.texts(), "Ready!"), 1);
}

#[tokio::test(start_paused = true)]
async fn immediate_readiness_still_honours_minimum_display() {
    let page = LoadingPage::new(DEFAULT_STATUS_LIST[0]);
    let events = AppEvents::new();
    let start = Instant::now();
    let orchestrator = attach(&page, &events);

    orchestrator.mark_shell_ready();
    orchestrator.mark_data_ready();
    assert_eq!(orchestrator.dismiss_reason(), Some(DismissReason::Completed));

    sleep(Duration::from_millis(1199)).await;
    assert!(!page.screen.snapshot().hidden);

    sleep(Duration::from_millis(2)).await;
    let record = page.screen.snapshot();
    assert!(record.hidden);
    assert_eq!(record.hidden_at.map(|at| at - start), Some(Duration::from_millis(1200)));
    assert!(!page.screen.is_removed());

    orchestrator.removed().await;
    let record = page.screen.snapshot();
    assert_eq!(record.removed_at.map(|at| at - start), Some(Duration::from_millis(1500)));
    assert!(page.document.element_by_id("initial-loading-screen").is_none());
}

#[tokio::test(start_paused = true)]
async fn late_readiness_hides_after_grace_only() {
    let page = LoadingPage::new(DEFAULT_STATUS_LIST[0]);
    let events = AppEvents::new();
    let start = Instant::now();
    let orchestrator = attach(&page, &events);

    sleep(Duration::from_millis(2500)).await;
    orchestrator.mark_shell_ready();
    orchestrator.mark_data_ready();

    orchestrator.removed().await;
    let record = page.screen.snapshot();
    assert_eq!(record.hidden_at.map(|at| at - start), Some(Duration::from_millis(2700)));
    assert_eq!(record.removed_at.map(|at| at - start), Some(Duration::from_millis(3000)));
}

#[tokio::test(start_paused = true)]
async fn ticker_walks_the_list_then_times_out() {
    let page = LoadingPage::new(DEFAULT_STATUS_LIST[0]);
    let events = AppEvents::new();
    let start = Instant::now();
    let orchestrator = attach(&page, &events);

    assert_eq!(orchestrator.dismissed().await, DismissReason::Timeout);
    assert_eq!(Instant::now() - start, Duration::from_millis(10_000));

    let mut expected: Vec<String> = DEFAULT_STATUS_LIST[1..].iter().map(|s| s.to_string()).collect();
    expected.push(OrchestratorSettings::default().timeout_text);
    assert_eq!(page.status_text.texts(), expected);
    assert_eq!(orchestrator.state().current_status_index, DEFAULT_STATUS_LIST.len() - 1);

    orchestrator.removed().await;
    let record = page.screen.snapshot();
    assert_eq!(record.hidden_at.map(|at| at - start), Some(Duration::from_millis(10_200)));
    assert_eq!(record.removed_at.map(|at| at - start), Some(Duration::from_millis(10_500)));
}

#[tokio::test(start_paused = true)]
async fn nothing_happens_after_timeout() {
    let page = LoadingPage::new(DEFAULT_STATUS_LIST[0]);
    let events = AppEvents::new();
    let orchestrator = attach(&page, &events);

    orchestrator.dismissed().await;
    sleep(Duration::from_millis(50)).await;
    let queries = page.mount.snapshot().child_queries;
    let texts = page.status_text.texts();

    page.mount.append_child();
    events.emit(AppEvent::AppDataLoaded);
    orchestrator.mark_shell_ready();
    sleep(Duration::from_millis(2_000)).await;

    let state = orchestrator.state();
    assert!(!state.react_ready && !state.data_ready);
    assert_eq!(page.mount.snapshot().child_queries, queries);
    assert_eq!(page.status_text.texts(), texts);
    assert_eq!(page.screen.snapshot().remove_calls, 1);
    assert_eq!(orchestrator.time_until_timeout(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn readiness_text_is_not_overwritten_by_ticker() {
    let page = LoadingPage::new(DEFAULT_STATUS_LIST[0]);
    let events = AppEvents::new();
    let orchestrator = attach(&page, &events);

    sleep(Duration::from_millis(1_000)).await;
    orchestrator.mark_shell_ready();
    sleep(Duration::from_millis(1_500)).await;

    assert_eq!(page.status_text.snapshot().text, "Loading data…");
    assert_eq!(orchestrator.state().current_status_index, 5);

    orchestrator.mark_data_ready();
    assert_eq!(
        page.status_text.texts(),
        vec![
            DEFAULT_STATUS_LIST[1],
            DEFAULT_STATUS_LIST[2],
            "Loading data…",
            "Data loaded",
            "Ready!",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn dismiss_is_idempotent_across_paths() {
    let page = LoadingPage::new(DEFAULT_STATUS_LIST[0]);
    let events = AppEvents::new();
    let orchestrator = attach(&page, &events);

    assert!(orchestrator.dismiss(DismissReason::Timeout));
    assert!(!orchestrator.dismiss(DismissReason::Timeout));
    assert!(!orchestrator.dismiss(DismissReason::Completed));
    orchestrator.mark_shell_ready();
    orchestrator.mark_data_ready();

    sleep(Duration::from_millis(12_000)).await;
    assert_eq!(orchestrator.dismiss_reason(), Some(DismissReason::Timeout));
    assert_eq!(page.screen.snapshot().remove_calls, 1);
    assert_eq!(count(&page.status_text.texts(), "Loading finished"), 1);
}

#[tokio::test(start_paused = true)]
async fn phases_are_observed_in_order() {
    let page = LoadingPage::new(DEFAULT_STATUS_LIST[0]);
    let events = AppEvents::new();
    let orchestrator = attach(&page, &events);
    let mut phases = orchestrator.subscribe_phase();

    orchestrator.mark_shell_ready();
    orchestrator.mark_data_ready();

    let mut seen = vec![*phases.borrow_and_update()];
    while phases.changed().await.is_ok() {
        let phase = *phases.borrow_and_update();
        seen.push(phase);
        if phase == OrchestratorPhase::Removed {
            break;
        }
    }
    assert_eq!(
        seen,
        vec![
            OrchestratorPhase::Dismissed(DismissReason::Completed),
            OrchestratorPhase::Hidden,
            OrchestratorPhase::Removed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn missing_elements_disable_the_orchestrator() {
    let events = AppEvents::new();

    let document = Arc::new(MemoryDocument::new());
    document.insert("initial-loading-text", "Starting up…");
    assert!(LoadingOrchestrator::attach(document, &events, OrchestratorSettings::default()).is_none());

    let document = Arc::new(MemoryDocument::new());
    document.insert("initial-loading-screen", "");
    assert!(LoadingOrchestrator::attach(document, &events, OrchestratorSettings::default()).is_none());

    let page = LoadingPage::new("");
    let settings = OrchestratorSettings {
        status_list: Vec::new(),
        ..OrchestratorSettings::default()
    };
    assert!(LoadingOrchestrator::attach(
        Arc::clone(&page.document) as Arc<dyn Document>,
        &events,
        settings
    )
    .is_none());

    sleep(Duration::from_millis(11_000)).await;
    assert!(page.status_text.texts().is_empty());
    assert_eq!(page.mount.snapshot().child_queries, 0);
    assert!(!page.screen.is_removed());
}

#[tokio::test(start_paused = true)]
async fn time_until_timeout_counts_down() {
    let page = LoadingPage::new(DEFAULT_STATUS_LIST[0]);
    let orchestrator = attach(&page, &AppEvents::new());

    assert_eq!(orchestrator.time_until_timeout(), Duration::from_millis(10_000));
    advance(Duration::from_millis(4_000)).await;
    assert_eq!(orchestrator.time_until_timeout(), Duration::from_millis(6_000));
}
