// module export
#[macro_use]
pub mod macros;

pub mod codec;
pub mod config;

// std
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

// ext
use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

pub static VERSION: &str = env!("CARGO_PKG_VERSION");

//
pub static DBG_PRINTLN_FLAG: AtomicUsize = AtomicUsize::new(0);

pub fn enable_dbg_println() {
    DBG_PRINTLN_FLAG.store(1, Ordering::Relaxed);
}

pub fn disable_dbg_println() {
    DBG_PRINTLN_FLAG.store(0, Ordering::Relaxed);
}

pub fn dbg_println_enabled() -> bool {
    DBG_PRINTLN_FLAG.load(Ordering::Relaxed) != 0
}

/// set once by the command line, read by the first log record
pub static LOG_FILENAME: OnceCell<String> = OnceCell::new();

pub type LogSink = Box<dyn Write + Send>;

lazy_static! {
    pub static ref BOOT_TIME: SystemTime = SystemTime::now();
    static ref LOG_FILE: Mutex<LogSink> = Mutex::new(open_log_sink());
}

fn open_log_sink() -> LogSink {
    if let Some(name) = LOG_FILENAME.get() {
        match OpenOptions::new().create(true).append(true).open(name) {
            Ok(f) => return Box::new(f),
            Err(e) => {
                eprintln!("cannot open log file '{}': {}, using stderr", name, e);
            }
        }
    }
    Box::new(std::io::stderr())
}

pub fn get_log_file() -> &'static Mutex<LogSink> {
    &LOG_FILE
}

/// milliseconds since the first log record (or the first call)
pub fn elapsed_ms() -> u128 {
    BOOT_TIME.elapsed().map(|d| d.as_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dbg_println_flag() {
        enable_dbg_println();
        assert!(dbg_println_enabled());
        dbg_println!("logging test record {}", 1);
        disable_dbg_println();
        assert!(!dbg_println_enabled());
    }
}
