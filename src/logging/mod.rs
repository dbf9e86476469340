use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::api::EnvConfig;

/// Parse the configured level, falling back to `info` on a bad directive.
pub(crate) fn filter_for(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(EnvConfig::DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber. Later calls are ignored.
pub(crate) fn init(config: &EnvConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(&config.log_level))
        .with_writer(ConsoleMakeWriter)
        .without_time()
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

/// Collects one formatted event and hands it to the browser console on drop.
pub(crate) struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn line(&self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.buf);
        let text = text.trim_end();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn emit(&mut self) {
        if let Some(line) = self.line() {
            to_console(self.level, &line);
        }
        self.buf.clear();
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit();
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        self.emit();
    }
}

#[cfg(target_arch = "wasm32")]
fn to_console(level: Level, line: &str) {
    let msg = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::ERROR => web_sys::console::error_1(&msg),
        Level::WARN => web_sys::console::warn_1(&msg),
        Level::INFO => web_sys::console::info_1(&msg),
        _ => web_sys::console::debug_1(&msg),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn to_console(_level: Level, line: &str) {
    eprintln!("{line}");
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: Level::INFO,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buf: Vec::new(),
        }
    }
}
