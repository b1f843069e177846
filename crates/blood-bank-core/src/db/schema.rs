//! SQLite schema definition.

/// Complete database schema for the blood bank engine.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Blood Requests
-- ============================================================================

CREATE TABLE IF NOT EXISTS blood_requests (
    id TEXT PRIMARY KEY,
    blood_type TEXT NOT NULL
        CHECK (blood_type IN ('A+', 'A-', 'B+', 'B-', 'AB+', 'AB-', 'O+', 'O-')),
    units INTEGER NOT NULL CHECK (units BETWEEN 1 AND 10),
    urgency TEXT NOT NULL DEFAULT 'normal'
        CHECK (urgency IN ('low', 'normal', 'high', 'critical')),
    city TEXT NOT NULL,
    hospital TEXT NOT NULL,
    contact_phone TEXT NOT NULL,
    notes TEXT CHECK (notes IS NULL OR length(notes) <= 500),
    status TEXT NOT NULL DEFAULT 'open'
        CHECK (status IN ('open', 'fulfilled', 'cancelled', 'expired')),
    requester_id TEXT,                           -- external identity, weak reference
    latitude REAL,
    longitude REAL,
    created_at TEXT NOT NULL,                    -- RFC 3339 UTC, fixed precision
    expires_at TEXT CHECK (expires_at IS NULL OR expires_at > created_at),
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_requests_status ON blood_requests(status);
CREATE INDEX IF NOT EXISTS idx_requests_status_expiry ON blood_requests(status, expires_at);
CREATE INDEX IF NOT EXISTS idx_requests_blood_type ON blood_requests(blood_type);
CREATE INDEX IF NOT EXISTS idx_requests_requester ON blood_requests(requester_id);

-- ============================================================================
-- Donors
-- ============================================================================

CREATE TABLE IF NOT EXISTS donors (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL UNIQUE,                -- 1:1 with external identity
    blood_type TEXT NOT NULL
        CHECK (blood_type IN ('A+', 'A-', 'B+', 'B-', 'AB+', 'AB-', 'O+', 'O-')),
    city TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    is_available INTEGER NOT NULL DEFAULT 1,
    receive_alerts INTEGER NOT NULL DEFAULT 1,
    max_distance_km INTEGER NOT NULL DEFAULT 50 CHECK (max_distance_km BETWEEN 10 AND 200),
    last_donation TEXT,                          -- YYYY-MM-DD
    can_donate_after TEXT,                       -- last_donation + cooldown
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_donors_blood_type ON donors(blood_type, is_available);
CREATE INDEX IF NOT EXISTS idx_donors_city ON donors(city);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_units_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let insert = |id: &str, units: i64| {
            conn.execute(
                "INSERT INTO blood_requests
                     (id, blood_type, units, city, hospital, contact_phone, created_at, updated_at)
                 VALUES (?1, 'O-', ?2, 'Taiz', 'H', '1234567',
                         '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
                rusqlite::params![id, units],
            )
        };

        assert!(insert("r0", 0).is_err());
        assert!(insert("r11", 11).is_err());
        assert!(insert("r1", 1).is_ok());
    }

    #[test]
    fn test_expiry_after_creation_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO blood_requests
                 (id, blood_type, units, city, hospital, contact_phone,
                  created_at, expires_at, updated_at)
             VALUES ('r1', 'A+', 1, 'Taiz', 'H', '1234567',
                     '2025-01-02T00:00:00Z', '2025-01-01T00:00:00Z', '2025-01-02T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO blood_requests
                 (id, blood_type, units, city, hospital, contact_phone,
                  status, created_at, updated_at)
             VALUES ('r1', 'A+', 1, 'Taiz', 'H', '1234567',
                     'closed', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_donor_user_unique() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let insert = |id: &str| {
            conn.execute(
                "INSERT INTO donors (id, user_id, blood_type, city, created_at, updated_at)
                 VALUES (?1, 'user-1', 'O+', 'Aden',
                         '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
                [id],
            )
        };

        assert!(insert("d1").is_ok());
        assert!(insert("d2").is_err());
    }
}
