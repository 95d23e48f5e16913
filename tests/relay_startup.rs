use std::path::Path;
use std::process::{Command, Output};

fn relay(cwd: &Path, vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_scratch-relay"));
    cmd.current_dir(cwd);
    for key in ["API_KEY", "API_BASE", "MODEL", "SYSTEM_PROMPT", "RELAY_ADDR", "RUST_LOG"] {
        cmd.env_remove(key);
    }
    for (key, value) in vars {
        cmd.env(key, value);
    }
    cmd.output().unwrap()
}

#[test]
fn relay_without_system_prompt_exits_one() {
    let tmp = tempfile::tempdir().unwrap();
    let output = relay(
        tmp.path(),
        &[
            ("API_KEY", "sk-test"),
            ("API_BASE", "http://127.0.0.1:9/v1"),
            ("MODEL", "test-model"),
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SYSTEM_PROMPT"), "stderr: {stderr}");
}

#[test]
fn relay_with_unparseable_address_exits_one() {
    let tmp = tempfile::tempdir().unwrap();
    let output = relay(
        tmp.path(),
        &[
            ("API_KEY", "sk-test"),
            ("API_BASE", "http://127.0.0.1:9/v1"),
            ("MODEL", "test-model"),
            ("SYSTEM_PROMPT", "be helpful"),
            ("RELAY_ADDR", "127.0.0.1:80800"),
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("RELAY_ADDR"), "stderr: {stderr}");
}
