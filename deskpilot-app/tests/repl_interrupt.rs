//! Sends SIGINT to the test process, so it lives in its own binary.

use deskpilot_app::{Repl, Router, Timeouts};
use deskpilot_classifier::InputClassifier;
use deskpilot_core::Metrics;
use deskpilot_intent::IntentTranslator;
use std::time::Duration;
use tokio::io::BufReader;

#[tokio::test]
async fn test_interrupt_at_idle_prompt_ends_loop() {
    let router = Router::new(
        InputClassifier::new(),
        IntentTranslator::new(),
        None,
        Metrics::new(),
        Timeouts::default(),
    );
    // Open but silent stdin: the loop sits at the prompt.
    let (_stdin_writer, stdin) = tokio::io::duplex(64);
    let mut out = Vec::new();

    let repl = Repl::new(&router, false);
    let (result, _) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(repl.run(BufReader::new(stdin), &mut out), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            tokio::process::Command::new("kill")
                .args(["-INT", &std::process::id().to_string()])
                .status()
                .await
                .unwrap();
        })
    })
    .await
    .expect("loop should end on interrupt");

    result.unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("deskpilot> "));
    assert!(text.ends_with('\n'));
}
