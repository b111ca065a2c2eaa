//! Environment-based runtime configuration.
//!
//! ## Environment Variables
//!
//! ### `EDGEKIT_STACK_SIZE`
//!
//! Stack size for server coroutines, decimal (`16384`) or hex (`0x4000`).
//! Default: `0x4000` (16 KB). Tune up for handlers with deep call chains,
//! down to pack more concurrent coroutines into memory.

use std::env;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 16 KB / 0x4000).
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = match env::var("EDGEKIT_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x4000)
                } else {
                    val.parse().unwrap_or(0x4000)
                }
            }
            Err(_) => 0x4000,
        };
        RuntimeConfig { stack_size }
    }

    /// Apply this configuration to the may runtime. Call once at startup,
    /// before the server spawns coroutines.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stack_size_without_env() {
        // Tests run in parallel; only assert the default when the variable
        // is genuinely unset in this process.
        if env::var("EDGEKIT_STACK_SIZE").is_err() {
            assert_eq!(RuntimeConfig::from_env().stack_size, 0x4000);
        }
    }
}
