use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

lazy_static! {
    static ref LOG_INITIALIZED: Mutex<bool> = Mutex::new(false);
}

/// Initialize logging.  Nothing is logged unless the environment variable
/// `RUST_LOG` is set to a non-empty value, in which case it is interpreted as
/// an `EnvFilter` directive.  Calling this more than once is harmless.
pub fn init_logging() {
    let mut initialized = match LOG_INITIALIZED.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if *initialized {
        return;
    }
    *initialized = true;

    // An empty RUST_LOG is treated the same as an unset one so that scripts
    // can set it unconditionally.
    let rustlog = std::env::var("RUST_LOG").unwrap_or_default();
    if rustlog.is_empty() {
        return;
    }
    let env_filter = match EnvFilter::try_new(&rustlog) {
        Ok(filter) => filter,
        Err(err) => {
            eprintln!("Ignoring RUST_LOG={:?}: {}", rustlog, err);
            return;
        }
    };

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        // Output ends up in logs and terminals alike, neither of which wants
        // escape codes or wall time.
        .with_ansi(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    // Someone else (a test harness, an embedding tool) may already own the
    // global subscriber.
    if tracing_subscriber::registry().with(layer).try_init().is_err() {
        debug!("a global tracing subscriber was already installed");
    }
}
