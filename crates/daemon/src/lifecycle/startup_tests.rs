// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn test_config(dir: &std::path::Path) -> Config {
    Config::at(dir.join("state"), dir.join("home"))
}

#[tokio::test]
async fn startup_writes_pid_version_and_socket() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());

    let result = startup(&config).await.unwrap();

    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert_eq!(std::fs::read_to_string(&config.version_path).unwrap(), PROTOCOL_VERSION);
    assert!(config.socket_path.exists());
    assert_eq!(
        result.daemon.orchestrator.layout().live(),
        dir.path().join("home/share/tg/rap")
    );
}

#[tokio::test]
async fn startup_reads_generation_config_from_home() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.wg_home).unwrap();
    std::fs::write(&config.generation_config, "[staging]\nroot = \"/data/tg\"\ndataset = \"hrrr\"\n")
        .unwrap();

    let result = startup(&config).await.unwrap();

    assert_eq!(
        result.daemon.orchestrator.layout().live(),
        std::path::Path::new("/data/tg/hrrr")
    );
}

#[tokio::test]
async fn startup_removes_stale_socket() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.state_dir).unwrap();
    std::fs::write(&config.socket_path, b"stale").unwrap();

    let _result = startup(&config).await.unwrap();

    let meta = std::fs::symlink_metadata(&config.socket_path).unwrap();
    assert!(!meta.is_file(), "stale regular file should be replaced by a socket");
}

#[tokio::test]
async fn startup_invalid_config_cleans_up() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.wg_home).unwrap();
    std::fs::write(&config.generation_config, "[job]\ntimeout_secs = 0\n").unwrap();

    match startup(&config).await {
        Err(LifecycleError::Config(_)) => {}
        Err(e) => panic!("expected Config error, got: {e}"),
        Ok(_) => panic!("expected Config error, but startup succeeded"),
    }

    assert!(!config.socket_path.exists());
    assert!(!config.version_path.exists());
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn startup_lock_failed_does_not_remove_existing_files() {
    // Simulate a running daemon by holding the lock and creating its files.
    // A second startup attempt must fail without deleting anything.
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(&config.state_dir).unwrap();

    // Create the files a running daemon would have
    std::fs::write(&config.socket_path, b"").unwrap();
    std::fs::write(&config.version_path, b"0.1.0").unwrap();

    // Hold an exclusive lock (simulating the running daemon)
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)
        .unwrap();
    lock_file.lock_exclusive().unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    match startup(&config).await {
        Err(LifecycleError::LockFailed(_)) => {}
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but startup succeeded"),
    }

    // All files must still exist
    assert!(config.socket_path.exists(), "socket file must not be deleted on LockFailed");
    assert!(config.version_path.exists(), "version file must not be deleted on LockFailed");
    assert_eq!(std::fs::read_to_string(&config.lock_path).unwrap(), "12345");

    drop(lock_file);
}
