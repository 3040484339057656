//! Log entry sub-records
//!
//! Everything that hangs off a day's log entry: foods eaten, strength
//! sessions, cardio, sleep, stress, hydration and supplements. Each record
//! type carries the reference data the stats engine needs (food nutrition,
//! exercise movement pattern, cup size, compound amounts) so a loaded
//! `LogEntry` is self-contained.

use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::units::VolumeUnit;

// ============================================================================
// Enumerations
// ============================================================================

/// Kind of cardio session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardioType {
    InclineWalking,
    Sprints,
    Walking,
    Running,
    Cycling,
    Swimming,
    Other,
}

impl CardioType {
    pub const ALL: [CardioType; 7] = [
        CardioType::InclineWalking,
        CardioType::Sprints,
        CardioType::Walking,
        CardioType::Running,
        CardioType::Cycling,
        CardioType::Swimming,
        CardioType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardioType::InclineWalking => "incline_walking",
            CardioType::Sprints => "sprints",
            CardioType::Walking => "walking",
            CardioType::Running => "running",
            CardioType::Cycling => "cycling",
            CardioType::Swimming => "swimming",
            CardioType::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.to_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|t| t.as_str() == normalized)
    }
}

/// Self-reported stress, ordinal 1 (very low) to 5 (very high)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl StressLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::VeryLow => "very_low",
            StressLevel::Low => "low",
            StressLevel::Medium => "medium",
            StressLevel::High => "high",
            StressLevel::VeryHigh => "very_high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "very_low" => Some(StressLevel::VeryLow),
            "low" => Some(StressLevel::Low),
            "medium" | "moderate" => Some(StressLevel::Medium),
            "high" => Some(StressLevel::High),
            "very_high" => Some(StressLevel::VeryHigh),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StressLevel::VeryLow => "Very Low",
            StressLevel::Low => "Low",
            StressLevel::Medium => "Medium",
            StressLevel::High => "High",
            StressLevel::VeryHigh => "Very High",
        }
    }

    pub fn ordinal(&self) -> f64 {
        match self {
            StressLevel::VeryLow => 1.0,
            StressLevel::Low => 2.0,
            StressLevel::Medium => 3.0,
            StressLevel::High => 4.0,
            StressLevel::VeryHigh => 5.0,
        }
    }
}

// ============================================================================
// Record Types
// ============================================================================

/// A food eaten, with its nutrition per serving
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodServing {
    pub food_id: i64,
    pub food_name: String,
    pub servings: f64,
    pub calories: f64,
    pub protein_grams: f64,
    pub protein_complete: bool,
    pub carbs_grams: f64,
    pub fiber_grams: f64,
    pub sugar_grams: f64,
    pub fat_grams: f64,
}

/// One performed set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivitySet {
    pub reps: i64,
    /// lbs
    pub weight: f64,
}

/// An exercise performed within a strength session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityExercise {
    pub exercise_id: i64,
    pub movement_pattern_id: Option<i64>,
    pub sets: Vec<ActivitySet>,
}

/// A strength training session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub workout_id: Option<i64>,
    pub exercises: Vec<ActivityExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardioSession {
    pub cardio_type: CardioType,
    pub duration_minutes: Option<f64>,
    /// miles
    pub distance: Option<f64>,
    /// mph
    pub speed: Option<f64>,
    /// percent grade
    pub incline: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    pub duration_minutes: i64,
    /// 1-10
    pub quality: i64,
}

/// Cup fills logged for the day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationServing {
    pub cup_id: i64,
    pub amount: f64,
    pub unit: VolumeUnit,
    pub servings: f64,
}

/// Per-serving amount of one compound
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompoundDose {
    pub compound_id: i64,
    pub amount: f64,
}

/// Servings of a supplement taken
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplementServing {
    pub supplement_id: i64,
    pub servings: f64,
    pub compounds: Vec<CompoundDose>,
}

// ============================================================================
// Inserts
// ============================================================================

/// Sets for one exercise, used when logging an activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityExerciseCreate {
    pub exercise_id: i64,
    pub sets: Vec<ActivitySet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardioSessionCreate {
    pub cardio_type: CardioType,
    pub duration_minutes: Option<f64>,
    pub distance: Option<f64>,
    pub speed: Option<f64>,
    pub incline: Option<f64>,
}

pub fn log_food(conn: &Connection, log_entry_id: i64, food_id: i64, servings: f64) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO log_entry_foods (log_entry_id, food_id, servings) VALUES (?1, ?2, ?3)",
        params![log_entry_id, food_id, servings],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Log a strength session with its exercises and sets
pub fn log_activity(
    conn: &Connection,
    log_entry_id: i64,
    workout_id: Option<i64>,
    exercises: &[ActivityExerciseCreate],
) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO activities (log_entry_id, workout_id) VALUES (?1, ?2)",
        params![log_entry_id, workout_id],
    )?;
    let activity_id = conn.last_insert_rowid();

    for (position, exercise) in exercises.iter().enumerate() {
        conn.execute(
            "INSERT INTO activity_exercises (activity_id, exercise_id, position) VALUES (?1, ?2, ?3)",
            params![activity_id, exercise.exercise_id, position as i64],
        )?;
        let activity_exercise_id = conn.last_insert_rowid();

        for set in &exercise.sets {
            conn.execute(
                "INSERT INTO activity_sets (activity_exercise_id, reps, weight) VALUES (?1, ?2, ?3)",
                params![activity_exercise_id, set.reps, set.weight],
            )?;
        }
    }

    Ok(activity_id)
}

pub fn log_cardio(conn: &Connection, log_entry_id: i64, data: &CardioSessionCreate) -> DbResult<i64> {
    conn.execute(
        r#"
        INSERT INTO cardio_sessions
        (log_entry_id, cardio_type, duration_minutes, distance, speed, incline)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            log_entry_id,
            data.cardio_type.as_str(),
            data.duration_minutes,
            data.distance,
            data.speed,
            data.incline,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Set (or replace) the day's sleep record
pub fn set_sleep(conn: &Connection, log_entry_id: i64, sleep: SleepRecord) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO sleep_records (log_entry_id, duration_minutes, quality)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(log_entry_id) DO UPDATE SET
            duration_minutes = excluded.duration_minutes,
            quality = excluded.quality
        "#,
        params![log_entry_id, sleep.duration_minutes, sleep.quality],
    )?;
    Ok(())
}

/// Set (or replace) the day's stress level
pub fn set_stress(conn: &Connection, log_entry_id: i64, level: StressLevel) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO stress_records (log_entry_id, level) VALUES (?1, ?2)
        ON CONFLICT(log_entry_id) DO UPDATE SET level = excluded.level
        "#,
        params![log_entry_id, level.as_str()],
    )?;
    Ok(())
}

pub fn log_hydration(conn: &Connection, log_entry_id: i64, cup_id: i64, servings: f64) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO hydration_logs (log_entry_id, cup_id, servings) VALUES (?1, ?2, ?3)",
        params![log_entry_id, cup_id, servings],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn log_supplement(
    conn: &Connection,
    log_entry_id: i64,
    supplement_id: i64,
    servings: f64,
) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO log_entry_supplements (log_entry_id, supplement_id, servings) VALUES (?1, ?2, ?3)",
        params![log_entry_id, supplement_id, servings],
    )?;
    Ok(conn.last_insert_rowid())
}

// ============================================================================
// Range Loaders
// Each returns records keyed by log_entry_id, in insertion order.
// ============================================================================

fn load_keyed<T, F>(
    conn: &Connection,
    sql: &str,
    start: NaiveDate,
    end: NaiveDate,
    map: F,
) -> DbResult<HashMap<i64, Vec<T>>>
where
    F: Fn(&Row) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![start, end], |row| {
        let log_entry_id: i64 = row.get("log_entry_id")?;
        Ok((log_entry_id, map(row)?))
    })?;

    let mut by_entry: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        let (log_entry_id, record) = row?;
        by_entry.entry(log_entry_id).or_default().push(record);
    }
    Ok(by_entry)
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, message.into())
}

pub fn load_foods(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<HashMap<i64, Vec<FoodServing>>> {
    load_keyed(
        conn,
        r#"
        SELECT lef.log_entry_id, lef.food_id, lef.servings, f.name, f.calories, f.protein_grams,
               f.protein_complete, f.carbs_grams, f.fiber_grams, f.sugar_grams, f.fat_grams
        FROM log_entry_foods lef
        JOIN log_entries le ON le.id = lef.log_entry_id
        JOIN foods f ON f.id = lef.food_id
        WHERE le.date >= ?1 AND le.date <= ?2
        ORDER BY lef.id
        "#,
        start,
        end,
        |row| {
            Ok(FoodServing {
                food_id: row.get("food_id")?,
                food_name: row.get("name")?,
                servings: row.get("servings")?,
                calories: row.get("calories")?,
                protein_grams: row.get("protein_grams")?,
                protein_complete: row.get::<_, i32>("protein_complete")? != 0,
                carbs_grams: row.get("carbs_grams")?,
                fiber_grams: row.get("fiber_grams")?,
                sugar_grams: row.get("sugar_grams")?,
                fat_grams: row.get("fat_grams")?,
            })
        },
    )
}

/// Load strength sessions, nesting exercises and sets under each activity
pub fn load_activities(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<HashMap<i64, Vec<Activity>>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT a.log_entry_id, a.id AS activity_id, a.workout_id,
               ae.id AS activity_exercise_id, ae.exercise_id, e.movement_pattern_id,
               s.reps, s.weight
        FROM activities a
        JOIN log_entries le ON le.id = a.log_entry_id
        LEFT JOIN activity_exercises ae ON ae.activity_id = a.id
        LEFT JOIN exercises e ON e.id = ae.exercise_id
        LEFT JOIN activity_sets s ON s.activity_exercise_id = ae.id
        WHERE le.date >= ?1 AND le.date <= ?2
        ORDER BY a.id, ae.position, ae.id, s.id
        "#,
    )?;

    let mut rows = stmt.query(params![start, end])?;
    let mut by_entry: HashMap<i64, Vec<Activity>> = HashMap::new();
    let mut last_exercise_row: Option<i64> = None;

    while let Some(row) = rows.next()? {
        let log_entry_id: i64 = row.get("log_entry_id")?;
        let activity_id: i64 = row.get("activity_id")?;
        let activities = by_entry.entry(log_entry_id).or_default();

        if activities.last().map(|a| a.id) != Some(activity_id) {
            activities.push(Activity {
                id: activity_id,
                workout_id: row.get("workout_id")?,
                exercises: Vec::new(),
            });
            last_exercise_row = None;
        }
        let Some(activity) = activities.last_mut() else {
            continue;
        };

        let Some(activity_exercise_id) = row.get::<_, Option<i64>>("activity_exercise_id")? else {
            continue;
        };
        if last_exercise_row != Some(activity_exercise_id) {
            activity.exercises.push(ActivityExercise {
                exercise_id: row.get("exercise_id")?,
                movement_pattern_id: row.get("movement_pattern_id")?,
                sets: Vec::new(),
            });
            last_exercise_row = Some(activity_exercise_id);
        }

        let reps: Option<i64> = row.get("reps")?;
        let weight: Option<f64> = row.get("weight")?;
        if let (Some(reps), Some(weight), Some(exercise)) = (reps, weight, activity.exercises.last_mut()) {
            exercise.sets.push(ActivitySet { reps, weight });
        }
    }

    Ok(by_entry)
}

pub fn load_cardio(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<HashMap<i64, Vec<CardioSession>>> {
    load_keyed(
        conn,
        r#"
        SELECT c.log_entry_id, c.cardio_type, c.duration_minutes, c.distance, c.speed, c.incline
        FROM cardio_sessions c
        JOIN log_entries le ON le.id = c.log_entry_id
        WHERE le.date >= ?1 AND le.date <= ?2
        ORDER BY c.id
        "#,
        start,
        end,
        |row| {
            let type_str: String = row.get("cardio_type")?;
            let cardio_type = CardioType::from_str(&type_str)
                .ok_or_else(|| conversion_error(1, format!("unknown cardio type: {}", type_str)))?;
            Ok(CardioSession {
                cardio_type,
                duration_minutes: row.get("duration_minutes")?,
                distance: row.get("distance")?,
                speed: row.get("speed")?,
                incline: row.get("incline")?,
            })
        },
    )
}

pub fn load_sleep(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<HashMap<i64, Vec<SleepRecord>>> {
    load_keyed(
        conn,
        r#"
        SELECT s.log_entry_id, s.duration_minutes, s.quality
        FROM sleep_records s
        JOIN log_entries le ON le.id = s.log_entry_id
        WHERE le.date >= ?1 AND le.date <= ?2
        "#,
        start,
        end,
        |row| {
            Ok(SleepRecord {
                duration_minutes: row.get("duration_minutes")?,
                quality: row.get("quality")?,
            })
        },
    )
}

pub fn load_stress(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<HashMap<i64, Vec<StressLevel>>> {
    load_keyed(
        conn,
        r#"
        SELECT s.log_entry_id, s.level
        FROM stress_records s
        JOIN log_entries le ON le.id = s.log_entry_id
        WHERE le.date >= ?1 AND le.date <= ?2
        "#,
        start,
        end,
        |row| {
            let level_str: String = row.get("level")?;
            StressLevel::from_str(&level_str)
                .ok_or_else(|| conversion_error(1, format!("unknown stress level: {}", level_str)))
        },
    )
}

pub fn load_hydration(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<HashMap<i64, Vec<HydrationServing>>> {
    load_keyed(
        conn,
        r#"
        SELECT h.log_entry_id, h.cup_id, h.servings, c.amount, c.unit
        FROM hydration_logs h
        JOIN log_entries le ON le.id = h.log_entry_id
        JOIN cups c ON c.id = h.cup_id
        WHERE le.date >= ?1 AND le.date <= ?2
        ORDER BY h.id
        "#,
        start,
        end,
        |row| {
            let unit_str: String = row.get("unit")?;
            let unit = VolumeUnit::from_str(&unit_str)
                .ok_or_else(|| conversion_error(4, format!("unknown cup unit: {}", unit_str)))?;
            Ok(HydrationServing {
                cup_id: row.get("cup_id")?,
                amount: row.get("amount")?,
                unit,
                servings: row.get("servings")?,
            })
        },
    )
}

pub fn load_supplements(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
) -> DbResult<HashMap<i64, Vec<SupplementServing>>> {
    let mut by_entry = load_keyed(
        conn,
        r#"
        SELECT les.log_entry_id, les.supplement_id, les.servings
        FROM log_entry_supplements les
        JOIN log_entries le ON le.id = les.log_entry_id
        WHERE le.date >= ?1 AND le.date <= ?2
        ORDER BY les.id
        "#,
        start,
        end,
        |row| {
            Ok(SupplementServing {
                supplement_id: row.get("supplement_id")?,
                servings: row.get("servings")?,
                compounds: Vec::new(),
            })
        },
    )?;

    if by_entry.is_empty() {
        return Ok(by_entry);
    }

    // Compound amounts for every supplement taken in the range
    let mut stmt = conn.prepare(
        r#"
        SELECT DISTINCT sc.id, sc.supplement_id, sc.compound_id, sc.amount
        FROM supplement_compounds sc
        JOIN log_entry_supplements les ON les.supplement_id = sc.supplement_id
        JOIN log_entries le ON le.id = les.log_entry_id
        WHERE le.date >= ?1 AND le.date <= ?2
        ORDER BY sc.id
        "#,
    )?;
    let mut compounds: HashMap<i64, Vec<CompoundDose>> = HashMap::new();
    let rows = stmt.query_map(params![start, end], |row| {
        Ok((
            row.get::<_, i64>("supplement_id")?,
            CompoundDose {
                compound_id: row.get("compound_id")?,
                amount: row.get("amount")?,
            },
        ))
    })?;
    for row in rows {
        let (supplement_id, dose) = row?;
        compounds.entry(supplement_id).or_default().push(dose);
    }

    for servings in by_entry.values_mut() {
        for serving in servings.iter_mut() {
            if let Some(doses) = compounds.get(&serving.supplement_id) {
                serving.compounds = doses.clone();
            }
        }
    }

    Ok(by_entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardio_type_parsing() {
        assert_eq!(CardioType::from_str("incline_walking"), Some(CardioType::InclineWalking));
        assert_eq!(CardioType::from_str("Incline Walking"), Some(CardioType::InclineWalking));
        assert_eq!(CardioType::from_str("running"), Some(CardioType::Running));
        assert_eq!(CardioType::from_str("rowing"), None);
    }

    #[test]
    fn test_stress_level_ordinals() {
        assert_eq!(StressLevel::VeryLow.ordinal(), 1.0);
        assert_eq!(StressLevel::VeryHigh.ordinal(), 5.0);
        assert_eq!(StressLevel::from_str("moderate"), Some(StressLevel::Medium));
        assert_eq!(StressLevel::from_str("very-high"), Some(StressLevel::VeryHigh));
        assert_eq!(StressLevel::from_str("calm"), None);
    }
}
