//! Runtime platform detection.

/// The host the app runs inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Native host with a filesystem and a preference store.
    Native,
    /// Browser context with `localStorage`.
    Web,
}

impl Platform {
    /// The platform of the running process. Fixed for the process lifetime.
    pub fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            Platform::Web
        } else {
            Platform::Native
        }
    }

    pub fn is_native(self) -> bool {
        self == Platform::Native
    }

    pub fn name(self) -> &'static str {
        match self {
            Platform::Native => "native",
            Platform::Web => "web",
        }
    }
}

/// Whether the process runs in a native host rather than a browser.
pub fn is_native_host() -> bool {
    Platform::current().is_native()
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_native_build_reports_native_host() {
        assert!(is_native_host());
        assert_eq!(Platform::current(), Platform::Native);
        assert_eq!(Platform::current().name(), "native");
    }
}
