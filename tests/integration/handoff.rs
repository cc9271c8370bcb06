use clientdeploy::constants::HANDOFF_NOTICE;
use clientdeploy::orchestrator::{Orchestrator, ProcessInvocation};
use clientdeploy::test_utils::{
    TEST_PRODUCT, TEST_REPOSITORY, TestInstallation, WarningRecorder, init_test_logging,
};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

fn invocation() -> ProcessInvocation {
    ProcessInvocation {
        pid: 4_194_000,
        executable: PathBuf::from("/opt/example/example"),
        args: vec![OsString::from("--profile"), OsString::from("night")],
    }
}

#[tokio::test]
async fn test_update_now_launches_updater() {
    init_test_logging(None);
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "1.0.0").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = Orchestrator::new(install.root(), install.settings(), recorder.callback());
    orchestrator.connect().await;

    let mut notices = Vec::new();
    let launched = orchestrator
        .update_now(&invocation(), |message| notices.push(message.to_string()))
        .await;

    assert!(launched);
    assert_eq!(notices, [HANDOFF_NOTICE]);

    let mut installs = Vec::new();
    for _ in 0..100 {
        installs = install.calls_with("--install");
        if !installs.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(
        installs,
        [format!(
            "--install {} --repository {TEST_REPOSITORY} --product {TEST_PRODUCT} --kill 4194000 --start /opt/example/example --args --profile night",
            install.root().display()
        )]
    );
    assert!(recorder.is_empty());
}

#[tokio::test]
async fn test_update_now_reports_launch_failure() {
    init_test_logging(None);
    let install = TestInstallation::new().unwrap();
    install.install_current("1.0.0", "1.0.0").unwrap();
    let recorder = WarningRecorder::new();
    let orchestrator = Orchestrator::new(install.root(), install.settings(), recorder.callback());
    orchestrator.connect().await;
    std::fs::remove_dir_all(install.versions_dir()).unwrap();

    let launched = orchestrator.update_now(&invocation(), |_| {}).await;

    assert!(!launched);
    assert_eq!(recorder.len(), 1);
}
