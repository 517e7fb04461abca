use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use watchmove_core::ProgressCallback;

/// Progress bar for the lookup phase; absent when not on a terminal, where
/// the core's periodic progress logs take over
pub struct ConvertUi {
    bar: Option<ProgressBar>,
}

impl ConvertUi {
    pub fn new(enabled: bool) -> Self {
        if !(enabled && is_interactive()) {
            tracing::debug!(
                operation = "ui_init",
                mode = "non_interactive",
                "Progress bar disabled, using structured logging"
            );
            return Self { bar: None };
        }

        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.set_message("Looking up IMDb ids...");
        Self { bar: Some(bar) }
    }

    /// Callback for the converter that advances the bar
    pub fn callback(&self) -> Option<ProgressCallback> {
        let bar = self.bar.clone()?;
        Some(Box::new(move |current: usize, total: usize, title: &str| {
            bar.set_length(total as u64);
            bar.set_position(current as u64);
            bar.set_message(title.to_string());
        }))
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
