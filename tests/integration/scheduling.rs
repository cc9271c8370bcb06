use clientdeploy::core::{NotReadyReason, Readiness};
use clientdeploy::orchestrator::Orchestrator;
use clientdeploy::test_utils::{TEST_PRODUCT, TestInstallation, WarningRecorder, init_test_logging};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(50);

fn orchestrator(install: &TestInstallation, recorder: &WarningRecorder) -> Orchestrator {
    init_test_logging(None);
    Orchestrator::new(install.root(), install.settings(), recorder.callback())
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&count);
    (count, move || {
        hits.fetch_add(1, Ordering::SeqCst);
    })
}

async fn wait_for(condition: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}

#[tokio::test]
async fn test_periodic_check_reports_update() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "1.0.0").unwrap();
    install.respond_check(TEST_PRODUCT, "#UPDATE").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);
    let (found, on_update) = counter();

    orchestrator.schedule_periodic_checks(TICK, on_update);

    assert!(wait_for(|| found.load(Ordering::SeqCst) >= 2).await);
    assert_eq!(orchestrator.readiness().await, Readiness::Ready);
    orchestrator.shutdown().await;
    assert!(recorder.is_empty(), "unexpected warnings: {:?}", recorder.all());
}

#[tokio::test]
async fn test_ticks_never_overlap() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "1.0.0").unwrap();
    install.respond_check(TEST_PRODUCT, "#LATEST").unwrap();
    install.delay_checks(Duration::from_millis(300)).unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    orchestrator.schedule_periodic_checks(TICK, || {});
    tokio::time::sleep(Duration::from_millis(1500)).await;
    orchestrator.shutdown().await;

    let activity = install.check_activity();
    assert!(activity.len() >= 4, "activity: {activity:?}");
    for pair in activity.chunks(2) {
        assert_eq!(pair, ["begin", "end"], "overlapping checks: {activity:?}");
    }
}

#[tokio::test]
async fn test_first_tick_waits_one_interval() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "1.0.0").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    orchestrator.schedule_periodic_checks(Duration::from_secs(30), || {});
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(install.calls().is_empty());
    assert_eq!(orchestrator.readiness().await, Readiness::Disconnected);
    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_tick_reconnects_once_installation_appears() {
    let install = TestInstallation::new().unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);
    let (found, on_update) = counter();

    orchestrator.schedule_periodic_checks(TICK, on_update);
    assert!(wait_for(|| !recorder.is_empty()).await);
    assert_eq!(
        orchestrator.readiness().await,
        Readiness::NotReady(NotReadyReason::ConfigurationMissing)
    );

    install.install_current("1.0.0", "1.0.0").unwrap();
    install.respond_check(TEST_PRODUCT, "#UPDATE").unwrap();

    assert!(wait_for(|| found.load(Ordering::SeqCst) >= 1).await);
    assert_eq!(orchestrator.readiness().await, Readiness::Ready);
    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_rescheduling_replaces_previous_loop() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "1.0.0").unwrap();
    install.respond_check(TEST_PRODUCT, "#UPDATE").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);
    let (first, on_first) = counter();
    let (second, on_second) = counter();

    orchestrator.schedule_periodic_checks(TICK, on_first);
    orchestrator.schedule_periodic_checks(TICK, on_second);

    assert!(wait_for(|| second.load(Ordering::SeqCst) >= 2).await);
    orchestrator.shutdown().await;
    assert_eq!(first.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shutdown_stops_checks() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "1.0.0").unwrap();
    install.respond_check(TEST_PRODUCT, "#LATEST").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    orchestrator.schedule_periodic_checks(TICK, || {});
    assert!(wait_for(|| install.calls().len() >= 2).await);
    orchestrator.shutdown().await;

    let calls = install.calls().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(install.calls().len(), calls);
    assert_eq!(
        orchestrator.readiness().await,
        Readiness::NotReady(NotReadyReason::ShutDown)
    );
}

#[tokio::test]
async fn test_dropping_orchestrator_stops_checks() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "1.0.0").unwrap();
    install.respond_check(TEST_PRODUCT, "#LATEST").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    orchestrator.schedule_periodic_checks(TICK, || {});
    assert!(wait_for(|| install.calls().len() >= 2).await);
    drop(orchestrator);

    // Let an in-flight tick finish.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let calls = install.calls().len();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(install.calls().len(), calls);
}

#[tokio::test]
async fn test_panicking_callback_resets_to_disconnected() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "1.0.0").unwrap();
    install.respond_check(TEST_PRODUCT, "#UPDATE").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);
    let (found, on_update) = counter();

    orchestrator.schedule_periodic_checks(TICK, move || {
        on_update();
        panic!("host callback failed");
    });

    assert!(wait_for(|| found.load(Ordering::SeqCst) >= 2).await);
    orchestrator.shutdown().await;

    let warnings = recorder.all();
    assert!(!warnings.is_empty());
    assert!(
        warnings
            .iter()
            .all(|w| w.to_string().contains("host callback failed")),
        "warnings: {warnings:?}"
    );
}
