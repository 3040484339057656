//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!(version = 1, "applied migration");
    }

    if current_version < 2 {
        migrate_v2(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (2)", [])?;
        tracing::info!(version = 2, "applied migration");
    }

    Ok(())
}

/// Migration v1: reference entities and the daily log
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- REFERENCE DATA
        -- Maintained by the editors; read-only to the stats engine
        -- ============================================
        CREATE TABLE foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            serving_name TEXT NOT NULL DEFAULT '1 serving',

            -- Nutrition per serving
            calories REAL NOT NULL DEFAULT 0,
            protein_grams REAL NOT NULL DEFAULT 0,
            protein_complete INTEGER NOT NULL DEFAULT 0,  -- boolean: complete amino acid profile
            carbs_grams REAL NOT NULL DEFAULT 0,
            fiber_grams REAL NOT NULL DEFAULT 0,
            sugar_grams REAL NOT NULL DEFAULT 0,
            fat_grams REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE movement_patterns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            movement_pattern_id INTEGER REFERENCES movement_patterns(id) ON DELETE SET NULL
        );

        CREATE TABLE workouts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE mesocycles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            start_date TEXT NOT NULL,            -- ISO date: "2025-01-06"
            end_date TEXT NOT NULL,
            CHECK (start_date <= end_date)
        );

        CREATE TABLE cups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            unit TEXT NOT NULL CHECK(unit IN ('ml', 'oz', 'l'))
        );

        CREATE TABLE compounds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            unit TEXT NOT NULL CHECK(unit IN ('mg', 'mcg', 'g', 'iu', 'ml'))
        );

        CREATE TABLE supplements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            brand TEXT NOT NULL DEFAULT '',
            name TEXT NOT NULL,
            serving_name TEXT NOT NULL DEFAULT '1 serving'
        );

        CREATE TABLE supplement_compounds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            supplement_id INTEGER NOT NULL REFERENCES supplements(id) ON DELETE CASCADE,
            compound_id INTEGER NOT NULL REFERENCES compounds(id) ON DELETE RESTRICT,
            amount REAL NOT NULL,                -- per serving, in the compound's unit
            UNIQUE(supplement_id, compound_id)
        );

        CREATE TABLE carb_cycles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT
        );

        CREATE TABLE carb_cycle_days (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            carb_cycle_id INTEGER NOT NULL REFERENCES carb_cycles(id) ON DELETE CASCADE,
            day_type TEXT NOT NULL CHECK(day_type IN ('lowest', 'low', 'medium', 'high', 'highest')),
            carbs REAL NOT NULL,
            position INTEGER NOT NULL
        );

        -- ============================================
        -- LOG ENTRIES
        -- One row per calendar date
        -- ============================================
        CREATE TABLE log_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL UNIQUE,           -- ISO date: "2025-01-09"
            morning_weight REAL,                 -- lbs
            standard_drinks INTEGER,
            carb_cycle_day_id INTEGER REFERENCES carb_cycle_days(id) ON DELETE SET NULL,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE log_entry_foods (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            log_entry_id INTEGER NOT NULL REFERENCES log_entries(id) ON DELETE CASCADE,
            food_id INTEGER NOT NULL REFERENCES foods(id) ON DELETE RESTRICT,
            servings REAL NOT NULL DEFAULT 1.0
        );

        CREATE INDEX idx_log_entry_foods_entry ON log_entry_foods(log_entry_id);

        -- Strength training: activity -> exercises -> sets
        CREATE TABLE activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            log_entry_id INTEGER NOT NULL REFERENCES log_entries(id) ON DELETE CASCADE,
            workout_id INTEGER REFERENCES workouts(id) ON DELETE SET NULL,
            notes TEXT
        );

        CREATE INDEX idx_activities_entry ON activities(log_entry_id);

        CREATE TABLE activity_exercises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            activity_id INTEGER NOT NULL REFERENCES activities(id) ON DELETE CASCADE,
            exercise_id INTEGER NOT NULL REFERENCES exercises(id) ON DELETE RESTRICT,
            position INTEGER NOT NULL
        );

        CREATE INDEX idx_activity_exercises_activity ON activity_exercises(activity_id);

        CREATE TABLE activity_sets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            activity_exercise_id INTEGER NOT NULL REFERENCES activity_exercises(id) ON DELETE CASCADE,
            reps INTEGER NOT NULL DEFAULT 0,
            weight REAL NOT NULL DEFAULT 0       -- lbs
        );

        CREATE INDEX idx_activity_sets_exercise ON activity_sets(activity_exercise_id);

        CREATE TABLE cardio_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            log_entry_id INTEGER NOT NULL REFERENCES log_entries(id) ON DELETE CASCADE,
            cardio_type TEXT NOT NULL CHECK(cardio_type IN
                ('incline_walking', 'sprints', 'walking', 'running', 'cycling', 'swimming', 'other')),
            duration_minutes REAL,
            distance REAL,                       -- miles
            speed REAL,                          -- mph
            incline REAL                         -- percent grade
        );

        CREATE INDEX idx_cardio_sessions_entry ON cardio_sessions(log_entry_id);

        CREATE TABLE sleep_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            log_entry_id INTEGER NOT NULL UNIQUE REFERENCES log_entries(id) ON DELETE CASCADE,
            duration_minutes INTEGER NOT NULL,
            quality INTEGER NOT NULL CHECK(quality BETWEEN 1 AND 10)
        );

        CREATE TABLE stress_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            log_entry_id INTEGER NOT NULL UNIQUE REFERENCES log_entries(id) ON DELETE CASCADE,
            level TEXT NOT NULL CHECK(level IN ('very_low', 'low', 'medium', 'high', 'very_high'))
        );

        CREATE TABLE hydration_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            log_entry_id INTEGER NOT NULL REFERENCES log_entries(id) ON DELETE CASCADE,
            cup_id INTEGER NOT NULL REFERENCES cups(id) ON DELETE RESTRICT,
            servings REAL NOT NULL DEFAULT 1.0   -- times the cup was filled
        );

        CREATE INDEX idx_hydration_logs_entry ON hydration_logs(log_entry_id);

        CREATE TABLE log_entry_supplements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            log_entry_id INTEGER NOT NULL REFERENCES log_entries(id) ON DELETE CASCADE,
            supplement_id INTEGER NOT NULL REFERENCES supplements(id) ON DELETE RESTRICT,
            servings REAL NOT NULL DEFAULT 1.0
        );

        CREATE INDEX idx_log_entry_supplements_entry ON log_entry_supplements(log_entry_id);
        "#,
    )?;

    Ok(())
}

/// Migration v2: saved stats configurations and dashboard settings
fn migrate_v2(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE stats_configurations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            config TEXT NOT NULL,                -- JSON
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_stats_configurations_name ON stats_configurations(name);

        -- Opaque UI state; never read by the stats engine
        CREATE TABLE dashboard_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,                 -- JSON
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_reach_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!needs_migration(&conn).unwrap());
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_one_log_entry_per_date() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute("INSERT INTO log_entries (date) VALUES ('2024-01-01')", [])
            .unwrap();
        let dup = conn.execute("INSERT INTO log_entries (date) VALUES ('2024-01-01')", []);
        assert!(dup.is_err());
    }
}
