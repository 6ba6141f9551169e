use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::bar::Bar;

/// Refresh every non-interactive slot and redraw the bar, once per `interval`, until cancelled.
/// Cancellation is checked between iterations, so stopping takes at most one interval.
pub async fn run(bar: Bar, interval: Duration, token: CancellationToken) {
    log::debug!("Starting heartbeat, interval {:?}", interval);
    crate::loop_select_cancellable!(token,
        result = bar.refresh_passive() => {
            if let Err(err) = result {
                if err.is_fatal() {
                    log::error!("Stopping heartbeat: {}", err);
                    break;
                }
                log::warn!("Heartbeat refresh failed: {}", err);
            }
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    );
    log::debug!("Heartbeat stopped");
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{bar::test_util::recording_bar, providers, registry::test_util::counting_slot};
    use std::sync::atomic::Ordering;

    #[tokio::test(start_paused = true)]
    async fn test_push_count_matches_interval() {
        let (clock, clock_calls) = counting_slot(providers::CLOCK, "c");
        let (bar, sink, _) = recording_bar(vec![clock]);
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(bar, Duration::from_secs(2), token.clone()));

        tokio::time::sleep(Duration::from_secs(21)).await;
        token.cancel();
        handle.await.unwrap();

        let pushes = sink.lines().len();
        assert!((9..=11).contains(&pushes), "unexpected push count {}", pushes);
        assert_eq!(clock_calls.load(Ordering::SeqCst), pushes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_interactive_slots() {
        let (clock, _) = counting_slot(providers::CLOCK, "c");
        let (launcher, launcher_calls) = counting_slot(crate::launcher::LAUNCHER, "l");
        let (bar, _sink, _) = recording_bar(vec![clock, launcher.interactive()]);
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(bar, Duration::from_secs(2), token.clone()));
        tokio::time::sleep(Duration::from_secs(5)).await;
        token.cancel();
        handle.await.unwrap();
        // rendering the bar initializes the launcher slot once, the heartbeat never updates it
        assert_eq!(launcher_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stops_when_sink_closes() {
        let (clock, _) = counting_slot(providers::CLOCK, "c");
        let (bar, sink, exit) = recording_bar(vec![clock]);
        sink.close();
        tokio::time::timeout(Duration::from_secs(5), run(bar, Duration::from_millis(10), CancellationToken::new()))
            .await
            .expect("heartbeat did not stop");
        assert!(exit.is_cancelled());
    }
}
