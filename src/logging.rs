//! Structured logging for the acquisition and aggregation pipeline.
//!
//! Every record is a single JSON line on stdout:
//! `ts`, `run_id`, `seq`, `lvl`, `component`, `event`, `msg`, hoisted
//! correlation keys (`family`, `ticket`, `period`) and the rest under `data`.
//! When `LOG_DIR` is set the same lines are appended to
//! `<LOG_DIR>/<run_id>/events.jsonl` (trace/debug go to `trace.jsonl`).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Acquisition, // Fetches, timeouts, fallback engagement
    Trend,       // Comparison assembly
    Aggregate,   // Roll-ups and rankings
    Taxonomy,    // Rejected or unknown labels in wire data
    System,      // Startup, shutdown
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Acquisition => "acquisition",
            Domain::Trend => "trend",
            Domain::Aggregate => "aggregate",
            Domain::Taxonomy => "taxonomy",
            Domain::System => "system",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunSinks {
    events: Mutex<BufWriter<File>>,
    trace: Mutex<BufWriter<File>>,
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    sinks: Option<RunSinks>,
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let sinks = std::env::var("LOG_DIR")
            .ok()
            .and_then(|base| match open_sinks(Path::new(&base), &run_id) {
                Ok(sinks) => Some(sinks),
                Err(err) => {
                    eprintln!("[log] file sinks disabled: {}", err);
                    None
                }
            });
        RunContext { run_id, sinks }
    })
}

fn open_sinks(base: &Path, run_id: &str) -> std::io::Result<RunSinks> {
    let run_dir = run_dir(base, run_id);
    create_dir_all(&run_dir)?;
    std::fs::write(
        run_dir.join("manifest.json"),
        json!({
            "run_id": run_id,
            "ts": ts_now(),
            "pid": process::id(),
            "log_dir": run_dir.to_string_lossy(),
        })
        .to_string(),
    )?;
    Ok(RunSinks {
        events: Mutex::new(BufWriter::new(File::create(run_dir.join("events.jsonl"))?)),
        trace: Mutex::new(BufWriter::new(File::create(run_dir.join("trace.jsonl"))?)),
    })
}

fn run_dir(base: &Path, run_id: &str) -> PathBuf {
    let mut dir = base.to_path_buf();
    dir.push(run_id);
    dir
}

fn sanitize_fields(mut fields: Map<String, Value>) -> Map<String, Value> {
    let redacted = Value::String("[REDACTED]".to_string());
    for key in ["authorization", "Authorization", "api_key", "cookie"] {
        if fields.contains_key(key) {
            fields.insert(key.to_string(), redacted.clone());
        }
    }
    fields
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["family", "ticket", "period", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Mutex<BufWriter<File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

/// Info-level record keyed by module name, for one-off call sites.
pub fn json_log(module: &str, fields: Map<String, Value>) {
    emit_record(Level::Info, module, module, fields);
}

fn build_record(
    run_id: &str,
    level: Level,
    component: &str,
    event: &str,
    fields: Map<String, Value>,
) -> Value {
    let fields = sanitize_fields(fields);
    let (mut top, data) = split_fields(fields);

    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry)
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let line = build_record(&ctx.run_id, level, component, event, fields).to_string();
    if let Some(sinks) = &ctx.sinks {
        match level {
            Level::Trace | Level::Debug => write_line(&sinks.trace, &line),
            _ => write_line(&sinks.events, &line),
        }
    }
    println!("{}", line);
}

// =============================================================================
// Acquisition logs
// =============================================================================

pub fn log_fetch(level: Level, event: &str, family: &str, ticket: u64, extra: &[(&str, Value)]) {
    let mut fields = obj(extra);
    fields.insert("family".to_string(), v_str(family));
    fields.insert("ticket".to_string(), json!(ticket));
    log(level, Domain::Acquisition, event, fields);
}

pub fn log_fallback(family: &str, ticket: u64, error: &str, sample_version: &str) {
    log_fetch(
        Level::Warn,
        "fallback_engaged",
        family,
        ticket,
        &[("error", v_str(error)), ("sample_version", v_str(sample_version))],
    );
}

/// A label in wire data outside the closed taxonomy; skipped, never fatal.
pub fn log_unknown_label(kind: &str, raw: &str) {
    log(
        Level::Debug,
        Domain::Taxonomy,
        "unknown_label_skipped",
        obj(&[("kind", v_str(kind)), ("raw", v_str(raw))]),
    );
}

// =============================================================================
// Helpers
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
    }

    #[test]
    fn test_obj_helper() {
        let m = obj(&[("key", v_str("value")), ("num", v_num(42.0))]);
        assert_eq!(m["key"], "value");
        assert_eq!(m["num"], 42.0);
    }

    #[test]
    fn test_seq_increments() {
        let s1 = next_seq();
        let s2 = next_seq();
        assert!(s2 > s1);
    }

    #[test]
    fn test_record_hoists_correlation_keys() {
        let record = build_record(
            "r-test",
            Level::Warn,
            "acquisition",
            "fetch_failed",
            obj(&[
                ("family", v_str("industries")),
                ("ticket", json!(7)),
                ("error", v_str("timeout")),
                ("api_key", v_str("secret")),
            ]),
        );
        assert_eq!(record["lvl"], "WARN");
        assert_eq!(record["family"], "industries");
        assert_eq!(record["ticket"], 7);
        assert_eq!(record["data"]["error"], "timeout");
        assert_eq!(record["data"]["api_key"], "[REDACTED]");
        assert!(record["data"].get("family").is_none());
    }

    #[test]
    fn test_open_sinks_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let sinks = open_sinks(dir.path(), "r-sinks").unwrap();
        write_line(&sinks.events, "{\"event\":\"x\"}");
        let run = run_dir(dir.path(), "r-sinks");
        assert!(run.join("manifest.json").exists());
        let events = std::fs::read_to_string(run.join("events.jsonl")).unwrap();
        assert!(events.contains("\"event\":\"x\""));
    }
}
