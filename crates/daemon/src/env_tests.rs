// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear() {
    for key in ["WG_HOME", "WG_STATE_DIR", "XDG_STATE_HOME", "WG_CONFIG", "WG_IPC_TIMEOUT_MS", "WG_LOG"] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn wg_home_is_required() {
    clear();
    assert!(matches!(wg_home(), Err(LifecycleError::NoHome)));

    std::env::set_var("WG_HOME", "");
    assert!(matches!(wg_home(), Err(LifecycleError::NoHome)));

    std::env::set_var("WG_HOME", "/srv/wg");
    assert_eq!(wg_home().unwrap(), PathBuf::from("/srv/wg"));
    clear();
}

#[test]
#[serial]
fn state_dir_precedence() {
    clear();
    let saved_home = std::env::var_os("HOME");
    std::env::set_var("HOME", "/home/forecaster");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/home/forecaster/.local/state/wg"));

    std::env::set_var("XDG_STATE_HOME", "/xdg");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/xdg/wg"));

    std::env::set_var("WG_STATE_DIR", "/explicit");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/explicit"));
    clear();
    match saved_home {
        Some(home) => std::env::set_var("HOME", home),
        None => std::env::remove_var("HOME"),
    }
}

#[test]
#[serial]
fn config_path_defaults_to_home() {
    clear();
    assert_eq!(config_path(Path::new("/srv/wg")), PathBuf::from("/srv/wg/wg.toml"));

    std::env::set_var("WG_CONFIG", "/etc/wg.toml");
    assert_eq!(config_path(Path::new("/srv/wg")), PathBuf::from("/etc/wg.toml"));
    clear();
}

#[test]
#[serial]
fn ipc_timeout_parses_millis() {
    clear();
    assert_eq!(ipc_timeout(), Duration::from_secs(5));

    std::env::set_var("WG_IPC_TIMEOUT_MS", "250");
    assert_eq!(ipc_timeout(), Duration::from_millis(250));

    std::env::set_var("WG_IPC_TIMEOUT_MS", "soon");
    assert_eq!(ipc_timeout(), Duration::from_secs(5));
    clear();
}

#[test]
#[serial]
fn log_filter_defaults_to_info() {
    clear();
    assert_eq!(log_filter(), "info");
    std::env::set_var("WG_LOG", "wg_engine=debug");
    assert_eq!(log_filter(), "wg_engine=debug");
    clear();
}
