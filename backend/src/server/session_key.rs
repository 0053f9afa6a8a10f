//! Session signing key loading.
//!
//! The key file must hold at least [`SESSION_KEY_MIN_LEN`] bytes in release
//! builds. Debug builds replace a short key with a temporary one. When the
//! file cannot be read, a temporary key is generated only in debug builds or
//! when ephemeral keys are explicitly allowed; every session is lost on
//! restart in that case.

use std::path::{Path, PathBuf};

use actix_web::cookie::Key;
use tracing::warn;
use zeroize::Zeroize;

pub const SESSION_KEY_MIN_LEN: usize = 64;

/// Build mode for session key validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate short or missing keys.
    Debug,
    /// Release builds require a readable key of sufficient length.
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Errors raised while loading the session key.
#[derive(thiserror::Error, Debug)]
pub enum SessionKeyError {
    #[error("failed to read session key at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    TooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
}

/// Load the cookie key from `path`.
///
/// # Errors
///
/// Returns [`SessionKeyError`] when the file is unreadable and no fallback is
/// permitted, or when a release build finds a key that is too short.
pub fn load_session_key(
    path: &Path,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionKeyError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                if mode == BuildMode::Release {
                    return Err(SessionKeyError::TooShort {
                        path: path.to_path_buf(),
                        length,
                        min_len: SESSION_KEY_MIN_LEN,
                    });
                }
                warn!(
                    path = %path.display(),
                    length,
                    "session key too short; using a temporary key"
                );
                return Ok(Key::generate());
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode == BuildMode::Debug || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key; sessions will not survive a restart"
            );
            Ok(Key::generate())
        }
        Err(error) => Err(SessionKeyError::Read {
            path: path.to_path_buf(),
            source: error,
        }),
    }
}
