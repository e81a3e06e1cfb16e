use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise debug builds log this crate at debug
/// level and everything else at info. Calling this more than once is fine;
/// later calls leave the first subscriber in place.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            EnvFilter::new("chat_list=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn fmt_ms(d: Duration) -> String {
    let ms = d.as_millis();
    if ms == 0 { "<1ms".into() } else { format!("{}ms", ms) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_ms() {
        assert_eq!(fmt_ms(Duration::from_micros(300)), "<1ms");
        assert_eq!(fmt_ms(Duration::from_millis(42)), "42ms");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        tracing::debug!("logging initialised twice");
    }
}
