//! 감사 편지 셸 메인 애플리케이션
//!
//! 서비스를 등록하고 메인 창을 띄운 뒤, 표준 입력의 명령을 UI 스레드로 넘기며
//! 종료 요청이 올 때까지 디스패처 루프를 돌립니다.

use std::io::{self, BufRead};
use dotenv::dotenv;
use log::{error, info};
use thank_you_letter::app::App;
use thank_you_letter::core::errors::{AppError, AppResult};
use thank_you_letter::utils::log_buffer::{build_env_logger, BufferedLogger};

fn main() {
    // 로거 설정 전의 로그도 잃지 않도록 가장 먼저 설치
    let logger = match BufferedLogger::install() {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to install logger: {}", e);
            std::process::exit(1);
        }
    };

    load_env_file();
    if let Err(e) = init_logging(logger) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("🚀 Thank You Letter starting...");

    if let Err(e) = run() {
        if e.is_fatal_at_startup() {
            error!("💥 Startup failed: {}", e);
        } else {
            error!("💥 Application failed: {}", e);
        }
        log::logger().flush();
        std::process::exit(1);
    }

    info!("👋 Bye");
    log::logger().flush();
}

/// 셸을 조합하고 종료 요청까지 실행합니다
fn run() -> AppResult<()> {
    let app = App::build()?;

    app.dispatcher().bind_current_thread()?;
    app.install_panic_hook();
    app.show_root()?;

    spawn_console_reader(&app)?;
    println!("Type 'help' for commands.");

    let result = app.run();
    app.shutdown();
    result
}

/// 표준 입력을 읽어 명령을 UI 스레드로 넘깁니다
///
/// 입력이 끝나면(EOF) 종료를 요청합니다.
fn spawn_console_reader(app: &App) -> AppResult<()> {
    let reader = app.clone();
    app.faults().spawn_background("console-reader", move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.map_err(|e| AppError::InternalError(format!("Failed to read stdin: {}", e)))?;
            if reader.dispatcher().is_closed() {
                break;
            }
            let app = reader.clone();
            reader.dispatcher().post_fallible(move || app.execute(&line));
        }

        let lifetime = reader.lifetime().clone();
        reader.dispatcher().post(move || lifetime.request_shutdown());
        Ok(())
    })?;
    Ok(())
}

/// 환경별 설정 파일을 로드합니다
///
/// PROFILE 환경변수에 따라 적절한 .env 파일을 로드합니다.
///
/// # Environment Variables
///
/// * `PROFILE=dev` - .env.dev 파일 로드 (기본값)
/// * `PROFILE=prod` - .env.prod 파일 로드
/// * 기타 - 기본 .env 파일 로드
fn load_env_file() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    info!("Current profile: {}", profile);

    match profile.as_str() {
        "prod" => match dotenv::from_filename(".env.prod") {
            Ok(_) => info!(".env.prod 파일 로드 됨"),
            Err(e) => error!(".env.prod 파일 로드 실패: {}", e),
        },
        "dev" => match dotenv::from_filename(".env.dev") {
            Ok(_) => info!(".env.dev 파일 로드 됨"),
            Err(e) => error!(".env.dev 파일 로드 실패: {}", e),
        },
        _ => {
            dotenv().ok();
            info!("기본 .env 파일 로드");
        }
    }
}

/// 로깅 시스템을 초기화합니다
///
/// `RUST_LOG`(없으면 `ENVIRONMENT`별 기본값)로 필터를 정하고, 버퍼에 쌓인 로그를 전달합니다.
///
/// ```bash
/// RUST_LOG=thank_you_letter::core=debug cargo run
/// SHELL_LOG_FILE=log.txt cargo run   # logs/log.txt
/// ```
fn init_logging(logger: &BufferedLogger) -> AppResult<()> {
    let target = build_env_logger()?;
    let max_level = target.filter();
    let flushed = logger.init(Box::new(target), max_level)?;
    if flushed > 0 {
        info!("Flushed {} buffered log record(s)", flushed);
    }
    Ok(())
}
