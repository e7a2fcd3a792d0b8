//! Logging helpers: a single log target, an `event=` structured macro, and the
//! one-shot `env_logger` initialisation shared by the C and Python surfaces.

use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Once;

use log::LevelFilter;

/// Single logging target for the crate.
pub(crate) const LOG_TARGET: &str = "arrow_bulkcopy";

macro_rules! bulkcopy_log {
    ($level:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: crate::observability::LOG_TARGET, $level) {
            log::log!(
                target: crate::observability::LOG_TARGET,
                $level,
                "event={} {}",
                $event,
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

static INIT_LOGGER: Once = Once::new();

/// Installs `env_logger` at `Info` (or the `RUST_LOG` filter, when set).
///
/// Only the first call has any effect. When `log_file` is given, records are
/// appended to it instead of stderr; a file that cannot be opened falls back to
/// stderr and the failure is reported through the returned error.
pub fn enable_verbose_logging(log_file: Option<&str>) -> std::io::Result<()> {
    let mut outcome = Ok(());
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.is_test(false);
        builder.filter_level(LevelFilter::Info);
        builder.parse_default_env();

        builder.format(|buf, record| {
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(filename) = log_file {
            match OpenOptions::new().append(true).create(true).open(filename) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => outcome = Err(e),
            }
        }

        let _ = builder.try_init();
    });
    outcome
}
