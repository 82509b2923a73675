//! Structured logging for token operations
//!
//! Provides env_logger-based logging with secure handling of key identifiers
//! and proper integration with the standard log crate.

use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Logging facade used by the token signing crates
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging system (should be called once at application startup)
    ///
    /// Configure logging levels via `RUST_LOG` environment variable:
    /// - `RUST_LOG=debug` - Enable all debug logs
    /// - `RUST_LOG=info` - Enable info and above
    /// - `RUST_LOG=ecsign_jwt=debug` - Module-specific levels
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for test environments
    ///
    /// Safe to call from every test; repeated initialization is ignored.
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// Log a completed signing operation
    ///
    /// The key id is hashed so log output cannot be used to enumerate keys.
    pub fn log_signing(alg: &str, key_id: Option<&str>, token_len: usize) {
        let key_hash = key_id.map_or_else(|| "none".to_string(), Self::secure_hash_key);
        debug!("Token signed: alg={alg} (key_hash: {key_hash}, token_len: {token_len})");
    }

    /// Log the outcome of a token verification
    pub fn log_verification(alg: &str, success: bool) {
        if success {
            debug!("Token verified: alg={alg}");
        } else {
            warn!("Token verification failed: alg={alg}");
        }
    }

    /// Log a failed token operation
    ///
    /// Only the operation, algorithm and error message are recorded; callers
    /// must not put key material into error messages.
    pub fn log_token_error<E: std::error::Error + ?Sized>(operation: &str, alg: &str, error: &E) {
        error!(
            "Token operation failed: {} (alg: {}, error_type: {}, error: {})",
            operation,
            alg,
            Self::error_type(error),
            error
        );
    }

    /// Concrete type name of an error, without its module path
    fn error_type<E: ?Sized>(_error: &E) -> &'static str {
        let name = std::any::type_name::<E>();
        name.rsplit("::").next().unwrap_or(name)
    }

    /// SHA-256 fingerprint of a sensitive identifier, shortened for readability
    fn secure_hash_key(key: &str) -> String {
        let hash = Sha256::digest(key.as_bytes());
        format!("#{}", &hex::encode(hash)[..12])
    }
}
