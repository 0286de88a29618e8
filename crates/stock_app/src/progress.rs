use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use stock_engine::{EngineEvent, ProgressSink};

const BAR_TEMPLATE: &str = "{msg} {pos}/{len} [{bar:40.green/dim}]";

/// Progress bar over the listing detail fetches.
///
/// The bar stays hidden until the listing count is known, so nothing is drawn
/// while the login prompt may still be on screen.
pub struct TerminalProgress {
    bar: ProgressBar,
    visible: bool,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::hidden(), true)
    }

    /// Never draws; the count is still tracked.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden(), false)
    }

    fn with_bar(bar: ProgressBar, visible: bool) -> Self {
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        bar.set_style(style);
        bar.set_message("データを取得しています...");
        Self { bar, visible }
    }

    pub fn finish(&self) {
        if self.bar.length().unwrap_or(0) > 0 {
            self.bar.finish();
        }
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for TerminalProgress {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::FetchStarted { total } => {
                println!("出品中の商品: {total}件");
                self.bar.set_length(total as u64);
                if self.visible {
                    self.bar.set_draw_target(ProgressDrawTarget::stderr());
                }
            }
            EngineEvent::ListingFetched(_) => self.bar.inc(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use stock_core::ListingId;
    use stock_engine::FetchProgress;

    use super::*;

    fn fetched(completed: usize, total: usize) -> EngineEvent {
        EngineEvent::ListingFetched(FetchProgress {
            listing_id: ListingId::new(format!("x{completed}")),
            completed,
            total,
            succeeded: true,
        })
    }

    #[test]
    fn bar_counts_every_completed_fetch() {
        let progress = TerminalProgress::hidden();
        progress.emit(EngineEvent::FetchStarted { total: 3 });
        assert_eq!(progress.bar.length(), Some(3));

        // Workers report out of order; each event still counts once.
        progress.emit(fetched(2, 3));
        progress.emit(fetched(1, 3));
        assert_eq!(progress.bar.position(), 2);
        progress.emit(fetched(3, 3));
        progress.finish();
        assert_eq!(progress.bar.position(), 3);
        assert!(progress.bar.is_finished());
    }
}
