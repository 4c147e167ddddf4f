//! Diagnostic trace channel
//!
//! Every line goes to stderr. With `SUMMON_DEBUG=1` the same lines are also
//! appended, timestamped, to `summon-debug.log` in the temp directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

pub const DEBUG_ENV: &str = "SUMMON_DEBUG";

fn file_logging_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var(DEBUG_ENV)
            .map(|v| v == "1")
            .unwrap_or(false)
    })
}

pub fn debug_log_path() -> PathBuf {
    std::env::temp_dir().join("summon-debug.log")
}

pub fn format_line(prefix: &str, msg: &str) -> String {
    format!("[{}] {}", prefix, msg)
}

pub fn debug_log(prefix: &str, msg: &str) {
    if file_logging_enabled() {
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(debug_log_path())
        {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] {}", timestamp, format_line(prefix, msg));
        }
    }
    eprintln!("{}", format_line(prefix, msg));
}
