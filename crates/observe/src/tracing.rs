use {
    std::{io::IsTerminal, panic::PanicHookInfo, sync::Once},
    time::macros::format_description,
    tracing::level_filters::LevelFilter,
    tracing_subscriber::{
        EnvFilter,
        Layer,
        fmt::{time::UtcTime, writer::MakeWriterExt as _},
        prelude::*,
        util::SubscriberInitExt,
    },
};

/// Initializes the global tracing subscriber and routes panics through it.
/// `env_filter` has similar syntax to env_logger. It is documented at
/// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
///
/// Events at `stderr_threshold` or more severe go to stderr, the rest to
/// stdout.
pub fn initialize(env_filter: &str, stderr_threshold: LevelFilter) {
    set_tracing_subscriber(env_filter, stderr_threshold);
    std::panic::set_hook(Box::new(tracing_panic_hook));
}

/// Like [`initialize`], but can be called multiple times in a row. Later calls
/// are ignored.
///
/// Useful for tests.
pub fn initialize_reentrant(env_filter: &str) {
    // The subscriber is process global, so a second initialization from
    // another test thread would fail.
    static ONCE: Once = Once::new();
    ONCE.call_once(|| initialize(env_filter, LevelFilter::ERROR));
}

fn set_tracing_subscriber(env_filter: &str, stderr_threshold: LevelFilter) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(
            std::io::stdout
                .with_min_level(stderr_threshold.into_level().unwrap_or(tracing::Level::ERROR))
                .or_else(std::io::stderr),
        )
        .with_timer(UtcTime::new(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        )))
        .with_ansi(std::io::stdout().is_terminal())
        .with_filter(EnvFilter::new(env_filter));

    tracing_subscriber::registry().with(fmt_layer).init();
}

/// Panic hook that prints roughly the same message as the default panic hook
/// but uses tracing:error instead of stderr.
fn tracing_panic_hook(panic: &PanicHookInfo) {
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("<unnamed>");
    let backtrace = std::backtrace::Backtrace::force_capture();
    tracing::error!("thread '{name}' {panic}\nstack backtrace:\n{backtrace}");
}
