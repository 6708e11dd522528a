#![allow(dead_code)]

pub mod stack;
pub mod upstream;

use std::time::Duration;

/// Poll `condition` until it holds, panicking after a few seconds.
pub async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..300 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}
