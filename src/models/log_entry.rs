//! Log entry model
//!
//! One log entry per calendar date. The aggregate carries every record
//! logged for that day.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::carb_cycle::CarbCycleDay;
use super::log_records::{
    self, Activity, CardioSession, FoodServing, HydrationServing, SleepRecord, StressLevel,
    SupplementServing,
};
use crate::db::{DbError, DbResult};

/// A day's log entry with all of its records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub date: NaiveDate,
    /// lbs
    pub morning_weight: Option<f64>,
    pub standard_drinks: Option<i64>,
    pub notes: Option<String>,
    pub carb_cycle_day: Option<CarbCycleDay>,
    pub foods: Vec<FoodServing>,
    pub activities: Vec<Activity>,
    pub cardio: Vec<CardioSession>,
    pub sleep: Option<SleepRecord>,
    pub stress: Option<StressLevel>,
    pub hydration: Vec<HydrationServing>,
    pub supplements: Vec<SupplementServing>,
}

/// Data for creating a log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntryCreate {
    pub date: NaiveDate,
    pub morning_weight: Option<f64>,
    pub standard_drinks: Option<i64>,
    pub notes: Option<String>,
    pub carb_cycle_day_id: Option<i64>,
}

impl LogEntryCreate {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            morning_weight: None,
            standard_drinks: None,
            notes: None,
            carb_cycle_day_id: None,
        }
    }
}

impl LogEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            morning_weight: row.get("morning_weight")?,
            standard_drinks: row.get("standard_drinks")?,
            notes: row.get("notes")?,
            carb_cycle_day: None,
            foods: Vec::new(),
            activities: Vec::new(),
            cardio: Vec::new(),
            sleep: None,
            stress: None,
            hydration: Vec::new(),
            supplements: Vec::new(),
        })
    }

    /// Create a log entry. Fails if the date already has one.
    pub fn create(conn: &Connection, data: &LogEntryCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO log_entries (date, morning_weight, standard_drinks, notes, carb_cycle_day_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.date,
                data.morning_weight,
                data.standard_drinks,
                data.notes,
                data.carb_cycle_day_id,
            ],
        )?;

        Self::get_by_date(conn, data.date)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get the fully loaded entry for a date
    pub fn get_by_date(conn: &Connection, date: NaiveDate) -> DbResult<Option<Self>> {
        Ok(Self::list_in_range(conn, date, date)?.into_iter().next())
    }

    /// Load every entry with `start <= date <= end`, ascending by date.
    ///
    /// Sub-records are fetched with one query per table for the whole range
    /// and attached by log entry id.
    pub fn list_in_range(conn: &Connection, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Self>> {
        if start > end {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT le.id, le.date, le.morning_weight, le.standard_drinks, le.notes,
                   ccd.id AS ccd_id, ccd.carb_cycle_id, ccd.day_type, ccd.carbs, ccd.position
            FROM log_entries le
            LEFT JOIN carb_cycle_days ccd ON ccd.id = le.carb_cycle_day_id
            WHERE le.date >= ?1 AND le.date <= ?2
            ORDER BY le.date
            "#,
        )?;
        let mut entries = stmt
            .query_map(params![start, end], |row| {
                let mut entry = Self::from_row(row)?;
                if row.get::<_, Option<i64>>("ccd_id")?.is_some() {
                    entry.carb_cycle_day = Some(CarbCycleDay::from_joined_row(row)?);
                }
                Ok(entry)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if entries.is_empty() {
            return Ok(entries);
        }

        let mut foods = log_records::load_foods(conn, start, end)?;
        let mut activities = log_records::load_activities(conn, start, end)?;
        let mut cardio = log_records::load_cardio(conn, start, end)?;
        let mut sleep = log_records::load_sleep(conn, start, end)?;
        let mut stress = log_records::load_stress(conn, start, end)?;
        let mut hydration = log_records::load_hydration(conn, start, end)?;
        let mut supplements = log_records::load_supplements(conn, start, end)?;

        for entry in &mut entries {
            entry.foods = foods.remove(&entry.id).unwrap_or_default();
            entry.activities = activities.remove(&entry.id).unwrap_or_default();
            entry.cardio = cardio.remove(&entry.id).unwrap_or_default();
            entry.sleep = sleep.remove(&entry.id).and_then(|s| s.into_iter().next());
            entry.stress = stress.remove(&entry.id).and_then(|s| s.into_iter().next());
            entry.hydration = hydration.remove(&entry.id).unwrap_or_default();
            entry.supplements = supplements.remove(&entry.id).unwrap_or_default();
        }

        Ok(entries)
    }

    /// Date of the earliest log entry, if any
    pub fn earliest_date(conn: &Connection) -> DbResult<Option<NaiveDate>> {
        let date: Option<NaiveDate> =
            conn.query_row("SELECT MIN(date) FROM log_entries", [], |row| row.get(0))?;
        Ok(date)
    }

    /// Delete the entry for a date along with its records
    pub fn delete(conn: &Connection, date: NaiveDate) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM log_entries WHERE date = ?1", [date])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::carb_cycle::{create_carb_cycle, CarbDayType};
    use crate::models::cup::Cup;
    use crate::models::food::{Food, FoodCreate};
    use crate::models::log_records::{
        log_activity, log_cardio, log_food, log_hydration, log_supplement, set_sleep, set_stress,
        ActivityExerciseCreate, ActivitySet, CardioSessionCreate, CardioType,
    };
    use crate::models::supplement::{Compound, CompoundUnit, Supplement, SupplementCompound};
    use crate::models::training::{Exercise, MovementPattern};
    use crate::units::VolumeUnit;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_create_and_reload_full_day() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.get_conn().unwrap();

        let oats = Food::create(
            &conn,
            &FoodCreate {
                name: "Oats".to_string(),
                calories: 150.0,
                protein_grams: 5.0,
                carbs_grams: 27.0,
                fat_grams: 3.0,
                ..Default::default()
            },
        )
        .unwrap();
        let hinge = MovementPattern::create(&conn, "hinge").unwrap();
        let deadlift = Exercise::create(&conn, "Deadlift", Some(hinge.id)).unwrap();
        let bottle = Cup::create(&conn, "Bottle", 500.0, VolumeUnit::Ml).unwrap();
        let epa = Compound::create(&conn, "EPA", CompoundUnit::Mg).unwrap();
        let fish_oil = Supplement::create(
            &conn,
            "Acme",
            "Fish Oil",
            &[SupplementCompound { compound_id: epa.id, amount: 600.0 }],
        )
        .unwrap();
        let days = create_carb_cycle(&conn, "Standard", &[(CarbDayType::Low, 100.0)]).unwrap();

        let entry = LogEntry::create(
            &conn,
            &LogEntryCreate {
                date: date("2024-03-01"),
                morning_weight: Some(181.5),
                standard_drinks: Some(1),
                notes: Some("felt good".to_string()),
                carb_cycle_day_id: Some(days[0].id),
            },
        )
        .unwrap();

        log_food(&conn, entry.id, oats.id, 2.0).unwrap();
        log_activity(
            &conn,
            entry.id,
            None,
            &[ActivityExerciseCreate {
                exercise_id: deadlift.id,
                sets: vec![
                    ActivitySet { reps: 5, weight: 315.0 },
                    ActivitySet { reps: 5, weight: 335.0 },
                ],
            }],
        )
        .unwrap();
        log_cardio(
            &conn,
            entry.id,
            &CardioSessionCreate {
                cardio_type: CardioType::Walking,
                duration_minutes: Some(30.0),
                distance: Some(1.5),
                speed: Some(3.0),
                incline: None,
            },
        )
        .unwrap();
        set_sleep(&conn, entry.id, SleepRecord { duration_minutes: 420, quality: 7 }).unwrap();
        set_stress(&conn, entry.id, StressLevel::Low).unwrap();
        log_hydration(&conn, entry.id, bottle.id, 3.0).unwrap();
        log_supplement(&conn, entry.id, fish_oil.id, 2.0).unwrap();

        let loaded = LogEntry::get_by_date(&conn, date("2024-03-01")).unwrap().unwrap();
        assert_eq!(loaded.morning_weight, Some(181.5));
        assert_eq!(loaded.notes.as_deref(), Some("felt good"));
        assert_eq!(loaded.carb_cycle_day.as_ref().unwrap().day_type, CarbDayType::Low);
        assert_eq!(loaded.foods.len(), 1);
        assert_eq!(loaded.foods[0].calories, 150.0);
        assert_eq!(loaded.activities.len(), 1);
        assert_eq!(loaded.activities[0].exercises[0].movement_pattern_id, Some(hinge.id));
        assert_eq!(loaded.activities[0].exercises[0].sets.len(), 2);
        assert_eq!(loaded.cardio[0].cardio_type, CardioType::Walking);
        assert_eq!(loaded.sleep.unwrap().quality, 7);
        assert_eq!(loaded.stress, Some(StressLevel::Low));
        assert_eq!(loaded.hydration[0].servings, 3.0);
        assert_eq!(loaded.supplements[0].compounds[0].amount, 600.0);
    }

    #[test]
    fn test_list_in_range_is_ordered_and_bounded() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.get_conn().unwrap();

        for d in ["2024-01-03", "2024-01-01", "2024-01-05", "2024-01-02"] {
            LogEntry::create(&conn, &LogEntryCreate::for_date(date(d))).unwrap();
        }

        let entries = LogEntry::list_in_range(&conn, date("2024-01-01"), date("2024-01-03")).unwrap();
        let dates: Vec<_> = entries.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")]);

        assert_eq!(LogEntry::earliest_date(&conn).unwrap(), Some(date("2024-01-01")));
        assert!(LogEntry::list_in_range(&conn, date("2024-01-05"), date("2024-01-01"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_activity_without_exercises_loads() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.get_conn().unwrap();

        let entry = LogEntry::create(&conn, &LogEntryCreate::for_date(date("2024-02-10"))).unwrap();
        log_activity(&conn, entry.id, None, &[]).unwrap();

        let loaded = LogEntry::get_by_date(&conn, date("2024-02-10")).unwrap().unwrap();
        assert_eq!(loaded.activities.len(), 1);
        assert!(loaded.activities[0].exercises.is_empty());
    }

    #[test]
    fn test_delete_and_empty_database() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.get_conn().unwrap();

        assert_eq!(LogEntry::earliest_date(&conn).unwrap(), None);
        LogEntry::create(&conn, &LogEntryCreate::for_date(date("2024-02-10"))).unwrap();
        assert!(LogEntry::delete(&conn, date("2024-02-10")).unwrap());
        assert!(!LogEntry::delete(&conn, date("2024-02-10")).unwrap());
        assert!(LogEntry::get_by_date(&conn, date("2024-02-10")).unwrap().is_none());
    }
}
