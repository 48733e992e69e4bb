// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn config_paths_live_under_state_dir() {
    let config = Config::at("/state", "/srv/wg");

    assert_eq!(config.socket_path, PathBuf::from("/state/daemon.sock"));
    assert_eq!(config.lock_path, PathBuf::from("/state/daemon.pid"));
    assert_eq!(config.version_path, PathBuf::from("/state/daemon.version"));
    assert_eq!(config.log_path, PathBuf::from("/state/daemon.log"));
    assert_eq!(config.generation_config, PathBuf::from("/srv/wg/wg.toml"));
}

#[tokio::test]
async fn shutdown_removes_daemon_files() {
    let dir = tempdir().unwrap();
    let config = Config::at(dir.path().join("state"), dir.path().join("home"));

    let StartupResult { mut daemon, listener } = startup(&config).await.unwrap();
    drop(listener);
    daemon.shutdown().await.unwrap();

    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
    assert!(!config.version_path.exists());
}

#[tokio::test]
async fn shutdown_cancels_running_job() {
    let dir = tempdir().unwrap();
    let home = dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::write(
        home.join("wg.toml"),
        "[generator]\nprogram = \"sh\"\nargs = [\"-c\", \"sleep 30\"]\nworking_dir = \".\"\n\n[job]\nkill_grace_ms = 200\n",
    )
    .unwrap();
    let config = Config::at(dir.path().join("state"), &home);

    let StartupResult { mut daemon, listener: _listener } = startup(&config).await.unwrap();
    daemon.orchestrator.start().unwrap();
    assert_eq!(daemon.orchestrator.phase(), wg_core::JobPhase::Running);

    daemon.shutdown().await.unwrap();

    assert_eq!(daemon.orchestrator.phase(), wg_core::JobPhase::Idle);
}
