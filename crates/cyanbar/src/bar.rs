use std::sync::Arc;

use cyanbar_shared_util::SlotName;
use tokio_util::sync::CancellationToken;

use crate::{error::BarError, registry::Registry, render::Layout, sink::BarSink};

/// Everything a task needs to change the bar: the slot registry, the sink and the layout.
/// Cloning is cheap, every task holds its own clone.
#[derive(Clone)]
pub struct Bar {
    registry: Arc<Registry>,
    sink: Arc<dyn BarSink>,
    layout: Arc<Layout>,
    exit: CancellationToken,
}

impl std::fmt::Debug for Bar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bar").field("registry", &self.registry).field("layout", &self.layout).finish()
    }
}

impl Bar {
    /// `exit` is cancelled once the sink is gone, as there is nothing left to draw to.
    pub fn new(registry: Arc<Registry>, sink: Arc<dyn BarSink>, layout: Layout, exit: CancellationToken) -> Self {
        Bar { registry, sink, layout: Arc::new(layout), exit }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the bar from the current cache and push it to the sink.
    pub fn redraw_blocking(&self) -> Result<(), BarError> {
        let line = self.layout.render_all(&self.registry);
        if let Err(err) = self.sink.push(&line) {
            log::error!("Failed to write to the bar, shutting down: {}", err);
            self.exit.cancel();
            return Err(BarError::Sink(err));
        }
        Ok(())
    }

    /// Update a single slot and redraw.
    pub async fn refresh(&self, name: SlotName) -> Result<(), BarError> {
        let bar = self.clone();
        tokio::task::spawn_blocking(move || {
            bar.registry.update(name.as_str())?;
            bar.redraw_blocking()
        })
        .await?
    }

    /// Update every non-interactive slot and redraw.
    pub async fn refresh_passive(&self) -> Result<(), BarError> {
        let bar = self.clone();
        tokio::task::spawn_blocking(move || {
            bar.registry.update_passive();
            bar.redraw_blocking()
        })
        .await?
    }
}


#[cfg(test)]
mod test {
    use super::{test_util::recording_bar, *};
    use std::time::Duration;

    use crate::{providers, registry::test_util::counting_slot, sink::LemonbarProcess};

    #[tokio::test]
    async fn test_refresh_updates_and_pushes() {
        let (battery, calls) = counting_slot(providers::BATTERY, "b");
        let (bar, sink, _) = recording_bar(vec![battery]);
        bar.refresh(providers::BATTERY.into()).await.unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(sink.lines(), vec!["%{l}|%{c}%{r}|||b1|".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_slot_is_not_fatal() {
        let (bar, sink, exit) = recording_bar(vec![]);
        let err = bar.refresh("bogus".into()).await.unwrap_err();
        assert!(!err.is_fatal());
        assert!(sink.lines().is_empty());
        assert!(!exit.is_cancelled());
    }

    #[test]
    fn test_closed_sink_requests_exit() {
        let (bar, sink, exit) = recording_bar(vec![]);
        sink.close();
        let err = bar.redraw_blocking().unwrap_err();
        assert!(err.is_fatal());
        assert!(exit.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stalled_bar_process_requests_exit() {
        let (lemonbar, _actions) =
            LemonbarProcess::spawn(&["sleep".to_string(), "30".to_string()], Duration::from_millis(200)).unwrap();
        let lemonbar = Arc::new(lemonbar);
        let exit = CancellationToken::new();
        let bar = Bar::new(Arc::new(Registry::new()), lemonbar.clone(), Layout::new(" ".repeat(100)), exit.clone());

        let redraws = tokio::task::spawn_blocking(move || -> Result<(), BarError> {
            for _ in 0..100_000 {
                bar.redraw_blocking()?;
            }
            Ok(())
        });
        let result: Result<(), BarError> =
            tokio::time::timeout(Duration::from_secs(10), redraws).await.expect("redraw blocked on a stalled bar").unwrap();
        assert!(result.unwrap_err().is_fatal());
        assert!(exit.is_cancelled());
        lemonbar.terminate().await;
    }
}
