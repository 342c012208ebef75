use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One character appears per tick.
pub const CHAR_INTERVAL: Duration = Duration::from_millis(20);

/// Character-by-character reveal of a string. Each successive prefix is
/// published on a watch channel, ending with the exact full string; observers
/// only ever see prefixes in order. The spawned task aborts when the handle
/// drops, so replacing a `Reveal` cancels the previous animation and at most
/// one is ever ticking.
pub struct Reveal {
    full: String,
    rx: watch::Receiver<String>,
    task: JoinHandle<()>,
}

impl Reveal {
    pub fn start(copy: &str) -> Self {
        Self::with_interval(copy, CHAR_INTERVAL)
    }

    pub fn with_interval(copy: &str, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(String::new());
        let chars: Vec<char> = copy.chars().collect();
        let task = tokio::spawn(async move {
            let mut shown = String::new();
            let mut ticker = tokio::time::interval(interval);
            // interval yields immediately on the first tick
            ticker.tick().await;
            for c in chars {
                ticker.tick().await;
                shown.push(c);
                if tx.send(shown.clone()).is_err() {
                    return;
                }
            }
        });
        Self {
            full: copy.to_string(),
            rx,
            task,
        }
    }

    /// The prefix currently on display.
    pub fn displayed(&self) -> String {
        self.rx.borrow().clone()
    }

    pub fn is_complete(&self) -> bool {
        *self.rx.borrow() == self.full
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.rx.clone()
    }
}

impl Drop for Reveal {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn reveals_strict_prefixes_in_order() {
        let reveal = Reveal::with_interval("Buy now", CHAR_INTERVAL);
        let mut rx = reveal.subscribe();

        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            seen.push(rx.borrow_and_update().clone());
        }

        assert_eq!(seen.last().map(String::as_str), Some("Buy now"));
        for pair in seen.windows(2) {
            assert!(pair[1].starts_with(&pair[0]));
            assert!(pair[1].len() > pair[0].len());
        }
        for prefix in &seen[..seen.len() - 1] {
            assert!("Buy now".starts_with(prefix.as_str()));
        }
        assert!(reveal.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn multibyte_copy_reveals_whole_characters() {
        let reveal = Reveal::with_interval("£9 déjà", CHAR_INTERVAL);
        let mut rx = reveal.subscribe();
        while rx.changed().await.is_ok() {}
        assert_eq!(reveal.displayed(), "£9 déjà");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_animation() {
        let copy = "x".repeat(1000);
        let reveal = Reveal::with_interval(&copy, CHAR_INTERVAL);
        let mut rx = reveal.subscribe();
        drop(reveal);

        // drain whatever made it out before the abort landed
        while rx.changed().await.is_ok() {}
        assert!(rx.borrow().len() < copy.len());
    }
}
