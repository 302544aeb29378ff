//! Prometheus text exposition format

use crate::models::{Counter, Gauge, MetricsSnapshot};
use std::fmt::Write;

/// Content type of the text exposition format
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render every metric with its `# HELP` and `# TYPE` lines
pub fn render_metrics(snapshot: &MetricsSnapshot) -> String {
    let mut output = String::with_capacity(4096);

    for counter in Counter::ALL {
        let name = counter.name();
        let _ = writeln!(output, "# HELP {} {}", name, counter.help());
        let _ = writeln!(output, "# TYPE {} counter", name);
        let _ = writeln!(output, "{} {}", name, snapshot.counter(counter));
    }

    for gauge in Gauge::ALL {
        let name = gauge.name();
        let _ = writeln!(output, "# HELP {} {}", name, gauge.help());
        let _ = writeln!(output, "# TYPE {} gauge", name);
        let _ = writeln!(output, "{} {}", name, format_value(snapshot.gauge(gauge)));
    }

    output
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        value.to_string()
    }
}
