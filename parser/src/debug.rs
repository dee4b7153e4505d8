//! Debugging helpers.
//!
//! With the `debug_prints` feature, the scanner and the parser trace their progress to stderr
//! when the `STRATA_DEBUG` environment variable is set. Without the feature, [`debug_print!`]
//! still type-checks its arguments but prints nothing.

#[cfg(feature = "debug_prints")]
macro_rules! debug_print {
    ($($arg:tt)*) => {{
        if $crate::debug::enabled() {
            eprintln!($($arg)*);
        }
    }};
}

#[cfg(not(feature = "debug_prints"))]
macro_rules! debug_print {
    ($($arg:tt)*) => {{
        if false {
            eprintln!($($arg)*);
        }
    }};
}

/// Whether debug traces were requested through the environment.
#[cfg(feature = "debug_prints")]
pub(crate) fn enabled() -> bool {
    static ENABLED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var_os("STRATA_DEBUG").is_some())
}
