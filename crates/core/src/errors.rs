use thiserror::Error;

/// Unified error type for the entire trip-logbook-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage / Persisted State ───────────────────────────────────
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Malformed persisted state in '{key}': {message}")]
    MalformedState { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ── Trips ───────────────────────────────────────────────────────
    #[error("Invalid trip input: {0}")]
    InvalidTripInput(String),

    #[error("A trip is already in progress")]
    ActiveTripInProgress,

    #[error("No trip is in progress")]
    NoActiveTrip,

    #[error("Trip not found: {0}")]
    TripNotFound(String),

    // ── Cars & Settings ─────────────────────────────────────────────
    #[error("Car not found: {0}")]
    CarNotFound(String),

    #[error("Reminder {reminder_id} not found on car {car_id}")]
    ReminderNotFound { car_id: String, reminder_id: String },

    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ── Collaborators ───────────────────────────────────────────────
    #[error("No trips to export")]
    NothingToExport,

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Location permission denied")]
    LocationDenied,

    #[error("Location request timed out after {0}s")]
    LocationTimeout(u64),

    #[error("Notification failed: {0}")]
    Notification(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}
