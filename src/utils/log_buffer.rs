//! 시작 초기의 로그 버퍼
//!
//! `.env` 로딩처럼 로거 설정보다 먼저 실행되는 코드도 `log` 매크로를 쓸 수 있도록,
//! `main`의 첫 줄에서 `BufferedLogger`를 전역 로거로 설치합니다. 실제 로거가
//! `init`으로 연결되기 전까지의 레코드는 메모리에 쌓이고, 연결되는 순간 순서대로 전달됩니다.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use crate::config::LogConfig;
use crate::core::errors::{AppError, AppResult, ErrorContext};

static GLOBAL: Lazy<BufferedLogger> = Lazy::new(BufferedLogger::new);

struct BufferedRecord {
    level: Level,
    target: String,
    message: String,
    logged_at: DateTime<Local>,
}

/// 실제 로거가 준비될 때까지 레코드를 보관하는 `log::Log` 구현
pub struct BufferedLogger {
    pending: Mutex<Vec<BufferedRecord>>,
    target: OnceCell<Box<dyn Log>>,
}

impl BufferedLogger {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            target: OnceCell::new(),
        }
    }

    /// 전역 `log` 로거로 설치합니다. 두 번째 호출은 같은 인스턴스를 돌려줍니다.
    pub fn install() -> AppResult<&'static BufferedLogger> {
        let logger: &'static BufferedLogger = &GLOBAL;
        if log::set_logger(logger).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
        Ok(logger)
    }

    /// 실제 로거를 연결하고 쌓인 레코드를 순서대로 전달합니다.
    pub fn init(&self, target: Box<dyn Log>, max_level: LevelFilter) -> AppResult<usize> {
        let mut pending = self.pending.lock();
        if self.target.set(target).is_err() {
            return Err(AppError::InternalError("Logger is already initialized".to_string()));
        }
        log::set_max_level(max_level);

        let flushed = std::mem::take(&mut *pending);
        let count = flushed.len();
        if let Some(target) = self.target.get() {
            for record in flushed {
                target.log(
                    &Record::builder()
                        .level(record.level)
                        .target(&record.target)
                        .args(format_args!(
                            "{} (buffered at {})",
                            record.message,
                            record.logged_at.format("%H:%M:%S%.3f")
                        ))
                        .build(),
                );
            }
            target.flush();
        }
        Ok(count)
    }

    pub fn is_initialized(&self) -> bool {
        self.target.get().is_some()
    }

    /// 아직 전달되지 않은 레코드 수
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Default for BufferedLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Log for BufferedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.target.get() {
            Some(target) => target.enabled(metadata),
            None => true,
        }
    }

    fn log(&self, record: &Record) {
        if let Some(target) = self.target.get() {
            target.log(record);
            return;
        }

        let mut pending = self.pending.lock();
        // 잠금을 기다리는 동안 init이 끝났을 수 있음
        if let Some(target) = self.target.get() {
            target.log(record);
            return;
        }
        pending.push(BufferedRecord {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            logged_at: Local::now(),
        });
    }

    fn flush(&self) {
        if let Some(target) = self.target.get() {
            target.flush();
        }
    }
}

/// 같은 바이트를 두 출력에 씁니다.
pub struct TeeWriter<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> TeeWriter<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: Write, B: Write> Write for TeeWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

/// `LogConfig`에 따라 `env_logger`를 구성합니다.
///
/// 형식은 `[HH:MM:SS LEVEL target] message`입니다. `SHELL_LOG_FILE`이 있으면 stderr 출력은
/// 그대로 두고 같은 내용을 파일에도 기록합니다.
pub fn build_env_logger() -> AppResult<env_logger::Logger> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&LogConfig::filter());
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {:<5} {}] {}",
            Local::now().format("%H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(path) = LogConfig::log_file() {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(TeeWriter::new(io::stderr(), file))));
    }

    Ok(builder.build())
}
