use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use fleetr_core::DeviceResult;

const TICKS: &[&str] = &[
    "▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁",
];

/// Progress bar over the devices of one run, drawn by the indicatif layer.
pub struct RunProgress {
    span: Span,
}

impl RunProgress {
    pub fn start(total: usize, task: &str, visible: bool) -> Self {
        let span = if visible {
            info_span!("run", indicatif.pb_show = true)
        } else {
            Span::none()
        };

        let style = ProgressStyle::with_template("{spinner:.blue} {msg} {bar:30.green/black} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_strings(TICKS);
        span.pb_set_style(&style);
        span.pb_set_length(total as u64);
        span.pb_set_message(&format!("running {task}"));

        Self { span }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn advance(&self, finished: &DeviceResult) {
        self.span.pb_inc(1);
        self.span.pb_set_message(&format!("{} done", finished.device));
    }
}
