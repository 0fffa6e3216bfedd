use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while an evaluation pass runs the stage tools.
///
/// Hidden entirely in JSON mode so stdout stays machine-readable.
pub struct PassSpinner {
    bar: Option<ProgressBar>,
}

impl PassSpinner {
    pub fn start(message: &str, enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg} {elapsed:.dim}")
                .expect("progress bar template is a valid static string"),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn fail(self, reason: &str) {
        if let Some(bar) = self.bar {
            bar.abandon_with_message(format!("{}", style(reason).red()));
        }
    }
}
