//! Constants used throughout the clinic core crate.

/// Default bind address for the HTTP server.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:2022";

/// Default PBKDF2 iteration count for password hashes.
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 100_000;

/// Length in bytes of the random salt mixed into each password hash.
pub const PASSWORD_SALT_LEN: usize = 16;

/// Length in bytes of a derived password hash.
pub const PASSWORD_HASH_LEN: usize = 32;

/// Identifier written at the front of every stored password hash.
pub const PASSWORD_HASH_SCHEME: &str = "pbkdf2-sha256";

/// Default lifetime of a session token, in hours.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 168;

/// Live sessions kept per user; issuing one more drops the oldest.
pub const MAX_SESSIONS_PER_USER: usize = 10;

/// Length in bytes of the random material behind a session token.
pub const SESSION_TOKEN_LEN: usize = 32;

/// Suffix of the temporary file used while rewriting the store snapshot.
pub const SNAPSHOT_TMP_SUFFIX: &str = "tmp";
