//! Wall-clock source in whole seconds since the Unix epoch.

/// Current time provider, injectable so expiry decisions are testable.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> i64;
}

/// Reads the platform clock (`Date.now()` in the browser).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
    #[allow(clippy::cast_possible_truncation)]
    fn now_secs(&self) -> i64 {
        (js_sys::Date::now() / 1000.0).floor() as i64
    }

    #[cfg(not(all(feature = "hydrate", target_arch = "wasm32")))]
    fn now_secs(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
    }
}
