use std::cell::RefCell;
use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};
use wasm_bindgen::JsValue;
use web_sys::console;

pub const DEFAULT_LOG_FILTER: &str = "info";

thread_local! {
    static FILTER: RefCell<Option<reload::Handle<EnvFilter, Registry>>> = const { RefCell::new(None) };
}

/// Buffers one formatted event and hands it to the matching console method.
pub struct ConsoleWriter {
    level: Level,
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }
        let line = JsValue::from_str(line);
        match self.level {
            Level::ERROR => console::error_1(&line),
            Level::WARN => console::warn_1(&line),
            Level::INFO => console::info_1(&line),
            Level::DEBUG => console::debug_1(&line),
            Level::TRACE => console::log_1(&line),
        }
    }
}

pub struct MakeConsoleWriter;

impl<'a> MakeWriter<'a> for MakeConsoleWriter {
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

fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|e| {
        console::warn_1(&JsValue::from_str(&format!(
            "invalid log filter `{directives}`: {e}"
        )));
        EnvFilter::new(DEFAULT_LOG_FILTER)
    })
}

/// Route `tracing` output to the browser console. The subscriber is
/// installed on the first call; `Some(filter)` replaces the active filter,
/// `None` keeps whatever is already in place.
pub fn init(filter: Option<&str>) {
    FILTER.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(handle) = slot.as_ref() {
            if let Some(filter) = filter
                && let Err(e) = handle.reload(env_filter(filter))
            {
                tracing::warn!(error = %e, "failed to change log filter");
            }
            return;
        }

        let directives = filter.unwrap_or(DEFAULT_LOG_FILTER);
        let (layer, handle) = reload::Layer::new(env_filter(directives));
        let installed = tracing_subscriber::registry()
            .with(layer)
            .with(
                fmt::layer()
                    .with_writer(MakeConsoleWriter)
                    .with_ansi(false)
                    .with_level(false)
                    .without_time(),
            )
            .try_init();
        // An Err means another global subscriber is already installed.
        if installed.is_ok() {
            *slot = Some(handle);
        }
    });
}
