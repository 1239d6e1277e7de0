use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Caretide";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the admin API server.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8700";

/// Default log filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Session lifetime: 12 hours.
pub const SESSION_TTL_HOURS: i64 = 12;

/// Default bookable slot length when a window does not specify one.
pub const DEFAULT_SLOT_MINUTES: i64 = 30;

/// How far ahead recurring availability windows are materialized into slots.
pub const SLOT_HORIZON_DAYS: i64 = 28;

/// Get the application data directory (~/Caretide on all platforms)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Caretide")
}

/// Path of the main SQLite database
pub fn database_path() -> PathBuf {
    app_data_dir().join("caretide.db")
}

/// Path of the console token vault (persisted access token + role marker)
pub fn vault_path() -> PathBuf {
    app_data_dir().join("session.json")
}
