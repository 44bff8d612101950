//! `tracing` の初期化。ライブラリ本体は `tracing` マクロを直接使うだけで
//! 動くので、ここはバイナリや結合テストが呼ぶ購読者のセットアップ置き場。

use std::panic;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` 未設定時の既定フィルタ。
const DEFAULT_FILTER: &str = "teammatch=info";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// グローバル購読者を初期化する。`TM_LOG_DIR` が設定されていれば
/// `<TM_LOG_DIR>/teammatch.log` へ日次ローテーションで書き出し、
/// なければ stdout へ。フィルタは `RUST_LOG`、無ければ `teammatch=info`。
///
/// この呼び出しで購読者が据わったときだけ `true` を返す。すでに別の
/// 購読者が居る場合は何もしない（何度呼んでも安全）。
pub fn init_tracing() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match rotating_file_writer() {
        Some(writer) => builder.with_writer(writer).try_init().is_ok(),
        None => builder.try_init().is_ok(),
    }
}

fn rotating_file_writer() -> Option<BoxMakeWriter> {
    let dir = std::path::PathBuf::from(std::env::var_os("TM_LOG_DIR")?);
    if let Err(err) = std::fs::create_dir_all(&dir) {
        tracing::warn!(error = %err, "failed to create TM_LOG_DIR; falling back to stdout");
        return None;
    }

    let appender = tracing_appender::rolling::daily(dir, "teammatch.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Some(BoxMakeWriter::new(writer))
}

/// panic を `tracing::error!` に流すフックを入れる。プロセスにつき一度だけ
/// 設置され、`TM_LOG_INCLUDE_BACKTRACE=1` のときは元のフックにも委譲する。
pub fn install_panic_hook() {
    static INSTALLED: OnceLock<()> = OnceLock::new();

    INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        let forward_backtrace = std::env::var("TM_LOG_INCLUDE_BACKTRACE")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        panic::set_hook(Box::new(move |info| {
            let message = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| info.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".into());
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()));

            tracing::error!(
                target: "teammatch::panic",
                location = location.as_deref().unwrap_or("unknown"),
                %message,
                "panic captured"
            );

            if forward_backtrace {
                previous(info);
            }
        }));
    });
}
