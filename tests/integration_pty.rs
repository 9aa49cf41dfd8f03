// Drives the compiled binary through a pseudo terminal against a backend
// address nothing listens on, so the load fails fast.
//
// Requires a TTY; run manually via:
// `cargo test --test integration_pty -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn unreachable_backend_shows_error_and_quits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("mocktest");
    let cmd = format!("{} --backend-url http://127.0.0.1:9 take t1", bin.display());

    let mut p = spawn(cmd)?;
    p.set_expect_timeout(Some(Duration::from_secs(15)));
    p.expect("Could not load the test")?;

    p.send("q")?;
    p.expect(Eof)?;
    Ok(())
}
