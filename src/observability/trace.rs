//! Per-request debug trace.
//!
//! Collects timestamped messages and named timers while a request is being
//! handled. The host may inject it into the page as `console.log` lines or
//! drop it. Nothing survives the request.

use std::collections::HashMap;
use std::time::{Duration, Instant};

const CONSOLE_PREFIX: &str = "LANGUAGE DOMAINS: ";

#[derive(Debug, Clone)]
pub struct TraceLine {
    /// Time since the trace was created.
    pub elapsed: Duration,
    pub message: String,
}

#[derive(Debug)]
pub struct DebugTrace {
    enabled: bool,
    started: Instant,
    lines: Vec<TraceLine>,
    timers: HashMap<&'static str, Instant>,
}

impl DebugTrace {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started: Instant::now(),
            lines: Vec::new(),
            timers: HashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a message. No-op when disabled.
    pub fn message(&mut self, message: impl Into<String>) {
        if !self.enabled {
            return;
        }
        let message = message.into();
        tracing::debug!(target: "lang_domain_proxy::trace", "{}", message);
        self.lines.push(TraceLine {
            elapsed: self.started.elapsed(),
            message,
        });
    }

    pub fn start_timer(&mut self, label: &'static str) {
        self.timers.insert(label, Instant::now());
    }

    /// Stop a timer and record `<label> = <secs>s`.
    ///
    /// Returns the elapsed time even when the trace is disabled.
    pub fn end_timer(&mut self, label: &'static str) -> Option<Duration> {
        let elapsed = self.timers.remove(label)?.elapsed();
        self.message(format!("{label} = {:.6}s", elapsed.as_secs_f64()));
        Some(elapsed)
    }

    pub fn lines(&self) -> &[TraceLine] {
        &self.lines
    }

    /// `<script>` block logging every line to the browser console.
    pub fn to_script(&self) -> String {
        let mut script = String::from("<script>");
        for line in &self.lines {
            script.push_str("console.log(\"");
            script.push_str(&escape_js(&format!("{CONSOLE_PREFIX}{}", line.message)));
            script.push_str("\");");
        }
        script.push_str("</script>");
        script
    }

    /// Insert the script before the last `</body>`. Bodies without one are left alone.
    pub fn inject_into(&self, body: &str) -> String {
        if self.lines.is_empty() {
            return body.to_string();
        }
        match body.rfind("</body>") {
            Some(at) => {
                let mut out = String::with_capacity(body.len() + 256);
                out.push_str(&body[..at]);
                out.push_str(&self.to_script());
                out.push_str(&body[at..]);
                out
            }
            None => body.to_string(),
        }
    }
}

fn escape_js(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '<' => out.push_str("\\x3C"),
            _ => out.push(c),
        }
    }
    out
}
