use clientdeploy::constants::UPDATER_PRODUCT_NAME;
use clientdeploy::core::{DeployError, NotReadyReason, Readiness};
use clientdeploy::orchestrator::Orchestrator;
use clientdeploy::test_utils::{TestInstallation, WarningRecorder, init_test_logging};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

fn orchestrator(install: &TestInstallation, recorder: &WarningRecorder) -> Orchestrator {
    init_test_logging(None);
    Orchestrator::new(install.root(), install.settings(), recorder.callback())
}

#[tokio::test]
async fn test_current_updater_is_kept() {
    let install = TestInstallation::new().unwrap();
    let executable = install.install_current("1.0.0", "2.0.0").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    assert_eq!(orchestrator.connect().await, Readiness::Ready);

    let handle = orchestrator.updater_handle().await.unwrap();
    assert_eq!(handle.installed_version, "2.0.0");
    assert_eq!(handle.executable_path, executable);
    assert!(install.calls_with("--install").is_empty());
    assert!(recorder.is_empty());
}

#[tokio::test]
async fn test_newer_updater_replaces_current_build() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "2.0.0").unwrap();
    install.publish_updater("2.1.0").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    assert_eq!(orchestrator.connect().await, Readiness::Ready);
    assert!(recorder.is_empty(), "unexpected warnings: {:?}", recorder.all());

    let handle = orchestrator.updater_handle().await.unwrap();
    assert_eq!(handle.installed_version, "2.1.0");
    assert!(handle.executable_path.starts_with(install.versions_dir().join("2.1.0")));
    assert!(handle.executable_path.exists());
    assert!(!install.versions_dir().join("2.0.0").exists());

    let installs = install.calls_with("--install");
    assert_eq!(installs.len(), 1);
    assert!(installs[0].ends_with(&format!("--product {UPDATER_PRODUCT_NAME}")));

    // The new build answers the next check itself and reports #LATEST.
    orchestrator.check_and_apply_self_update().await;
    assert_eq!(orchestrator.updater_handle().await.unwrap().installed_version, "2.1.0");
    assert_eq!(install.calls_with("--install").len(), 1);
}

#[tokio::test]
async fn test_install_without_executable_keeps_old_handle() {
    let install = TestInstallation::new().unwrap();
    let executable = install.install_current("1.0.0", "2.0.0").unwrap();
    install.respond_check(UPDATER_PRODUCT_NAME, "#UPDATE").unwrap();
    install.respond_read("version", UPDATER_PRODUCT_NAME, "2.1.0").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    let readiness = orchestrator.connect().await;

    assert_eq!(readiness, Readiness::NotReady(NotReadyReason::SelfUpdateFailed));
    let handle = orchestrator.updater_handle().await.unwrap();
    assert_eq!(handle.installed_version, "2.0.0");
    assert_eq!(handle.executable_path, executable);
    assert!(executable.exists());
    assert!(matches!(
        &recorder.all()[..],
        [DeployError::SelfUpdateInstallFailure { version, .. }] if version == "2.1.0"
    ));
}

#[tokio::test]
async fn test_suspicious_version_is_not_installed() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "2.0.0").unwrap();
    install.respond_check(UPDATER_PRODUCT_NAME, "#UPDATE").unwrap();
    install.respond_read("version", UPDATER_PRODUCT_NAME, "../../outside").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    assert_eq!(
        orchestrator.connect().await,
        Readiness::NotReady(NotReadyReason::SelfUpdateFailed)
    );
    assert!(install.calls_with("--install").is_empty());
    assert_eq!(recorder.len(), 1);
}

#[tokio::test]
async fn test_updater_check_error_is_reported_and_connect_stays_ready() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "2.0.0").unwrap();
    install
        .respond_check(UPDATER_PRODUCT_NAME, "#ERROR TransientError: repository busy")
        .unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    assert_eq!(orchestrator.connect().await, Readiness::Ready);
    let warnings = recorder.all();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].is_transient());
}

#[tokio::test]
async fn test_slow_install_is_bounded() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "2.0.0").unwrap();
    install.respond_check(UPDATER_PRODUCT_NAME, "#UPDATE").unwrap();
    install.respond_read("version", UPDATER_PRODUCT_NAME, "2.1.0").unwrap();
    install.on_install(UPDATER_PRODUCT_NAME, "sleep 5\n").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    let started = std::time::Instant::now();
    let readiness = orchestrator.connect().await;

    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    assert_eq!(readiness, Readiness::NotReady(NotReadyReason::SelfUpdateFailed));
    assert_eq!(orchestrator.updater_handle().await.unwrap().installed_version, "2.0.0");
}

#[tokio::test]
async fn test_newest_of_several_builds_is_used() {
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "1.9.0").unwrap();
    install.install_updater("1.10.0").unwrap();
    install.install_updater("1.2.0").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    assert_eq!(orchestrator.connect().await, Readiness::Ready);
    assert_eq!(orchestrator.updater_handle().await.unwrap().installed_version, "1.10.0");
}

#[tokio::test]
async fn test_failed_install_leaves_no_partial_build() {
    let install = TestInstallation::new().unwrap();
    let executable = install.install_current("1.0.0", "2.0.0").unwrap();
    install.respond_check(UPDATER_PRODUCT_NAME, "#UPDATE").unwrap();
    install.respond_read("version", UPDATER_PRODUCT_NAME, "2.1.0").unwrap();
    install.on_install(UPDATER_PRODUCT_NAME, "mkdir -p \"$target\"\n").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    assert_eq!(
        orchestrator.connect().await,
        Readiness::NotReady(NotReadyReason::SelfUpdateFailed)
    );
    assert!(!install.versions_dir().join("2.1.0").exists());

    // The next connect retries instead of selecting the empty folder.
    assert_eq!(
        orchestrator.connect().await,
        Readiness::NotReady(NotReadyReason::SelfUpdateFailed)
    );
    assert_eq!(install.calls_with("--install").len(), 2);

    install.respond_check(UPDATER_PRODUCT_NAME, "#LATEST").unwrap();
    assert_eq!(orchestrator.connect().await, Readiness::Ready);
    let handle = orchestrator.updater_handle().await.unwrap();
    assert_eq!(handle.installed_version, "2.0.0");
    assert_eq!(handle.executable_path, executable);
    assert!(
        recorder
            .all()
            .iter()
            .all(|w| matches!(w, DeployError::SelfUpdateInstallFailure { .. })),
        "warnings: {:?}",
        recorder.all()
    );
}

#[tokio::test]
async fn test_shutdown_during_install_discards_result() {
    let install = TestInstallation::new().unwrap();
    let executable = install.install_current("1.0.0", "2.0.0").unwrap();
    install.publish_updater_with("2.1.0", "sleep 1", "").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    let (readiness, ()) = tokio::join!(orchestrator.connect(), async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        orchestrator.shutdown().await;
    });

    assert_eq!(readiness, Readiness::NotReady(NotReadyReason::ShutDown));
    assert_eq!(install.calls_with("--install").len(), 1);
    assert!(executable.exists(), "previous build was removed");
    assert!(orchestrator.updater_handle().await.is_none());
    assert_eq!(
        orchestrator.readiness().await,
        Readiness::NotReady(NotReadyReason::ShutDown)
    );
    assert!(recorder.is_empty(), "unexpected warnings: {:?}", recorder.all());
}

/// Whether a read-only directory actually refuses writes for this user.
fn permissions_enforced(dir: &Path) -> bool {
    let check = dir.join("permission-check");
    std::fs::create_dir_all(&check).unwrap();
    std::fs::set_permissions(&check, std::fs::Permissions::from_mode(0o555)).unwrap();
    let refused = std::fs::write(check.join("file"), b"").is_err();
    std::fs::set_permissions(&check, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::remove_dir_all(&check).unwrap();
    refused
}

#[tokio::test]
async fn test_stale_build_cleanup_failure_only_warns() {
    let install = TestInstallation::new().unwrap();
    let executable = install.install_current("1.0.0", "2.0.0").unwrap();
    if !permissions_enforced(install.root()) {
        eprintln!("skipping: directory permissions are not enforced for this user");
        return;
    }
    install
        .publish_updater_with("2.1.0", "", "chmod 555 \"$(dirname \"$target\")\"")
        .unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = orchestrator(&install, &recorder);

    let readiness = orchestrator.connect().await;
    std::fs::set_permissions(install.versions_dir(), std::fs::Permissions::from_mode(0o755))
        .unwrap();

    assert_eq!(readiness, Readiness::Ready);
    assert_eq!(orchestrator.updater_handle().await.unwrap().installed_version, "2.1.0");
    assert!(executable.parent().unwrap().exists());
    assert!(matches!(
        &recorder.all()[..],
        [DeployError::StaleUpdaterCleanup { path, .. }] if path.ends_with("2.0.0")
    ));
}
