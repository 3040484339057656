//! Day aggregator
//!
//! Reduces one day's log entry to a single value for a metric, following the
//! metric's catalog derivation. Pure: depends only on the entry passed in.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::catalog::{
    CardioMeasure, CategoricalField, Derivation, FilterKind, MetricDefinition, Nutrient,
    Reduction, ScalarField, SetMeasure, Source, SupplementMeasure,
};
use super::error::{StatsError, StatsResult};
use super::range::DateRange;
use super::rollup::TimeSeriesPoint;
use crate::models::{
    Activity, ActivityExercise, ActivitySet, CardioSession, CardioType, FoodServing, LogEntry,
};
use crate::units;

/// A metric's value for one day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DayValue {
    Number(f64),
    /// Enumerated value with its position on the scale
    Category { ordinal: f64, label: String },
    Text(String),
}

impl DayValue {
    /// The value as plotted; text has no numeric value
    pub fn numeric(&self) -> Option<f64> {
        match self {
            DayValue::Number(v) => Some(*v),
            DayValue::Category { ordinal, .. } => Some(*ordinal),
            DayValue::Text(_) => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            DayValue::Number(_) => None,
            DayValue::Category { label, .. } => Some(label),
            DayValue::Text(text) => Some(text),
        }
    }
}

/// Which strength work a training metric counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingFilter {
    Exercise(i64),
    MovementPattern(i64),
    Workout(i64),
    /// Sessions logged on a day inside the mesocycle's dates
    Mesocycle(DateRange),
}

/// Filters supplied with a query; each metric reads only its own kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricFilters {
    pub training: Option<TrainingFilter>,
    pub cardio_type: Option<CardioType>,
    pub supplement_ids: Vec<i64>,
    pub compound_ids: Vec<i64>,
}

impl MetricFilters {
    pub fn has(&self, kind: FilterKind) -> bool {
        match kind {
            FilterKind::Training => self.training.is_some(),
            FilterKind::CardioType => self.cardio_type.is_some(),
            FilterKind::Supplements => !self.supplement_ids.is_empty(),
            FilterKind::Compounds => !self.compound_ids.is_empty(),
        }
    }
}

/// Compute a metric for one day. `entry` is `None` when nothing was logged.
pub fn compute_day(
    entry: Option<&LogEntry>,
    metric: &MetricDefinition,
    filters: &MetricFilters,
) -> StatsResult<Option<DayValue>> {
    match metric.derivation {
        Derivation::SimpleSum { source, reduction } => {
            let values = entry.map(|e| source_values(e, source, None)).unwrap_or_default();
            Ok(reduce(&values, reduction).map(DayValue::Number))
        }
        Derivation::FilteredSum {
            source,
            reduction,
            filter,
            required,
        } => {
            if required && !filters.has(filter) {
                return Err(StatsError::MissingRequiredFilter {
                    metric: metric.id.to_string(),
                    filter: filter.as_str(),
                });
            }
            let values = entry
                .map(|e| source_values(e, source, Some(filters)))
                .unwrap_or_default();
            Ok(reduce(&values, reduction).map(DayValue::Number))
        }
        Derivation::ScalarLookup { field } => Ok(entry.and_then(|e| scalar(e, field))),
        Derivation::CategoricalLookup { field } => Ok(entry.and_then(|e| categorical(e, field))),
    }
}

/// One point per day of `range`, labelled for categorical and text metrics
pub fn daily_series(
    entries: &BTreeMap<NaiveDate, LogEntry>,
    range: DateRange,
    metric: &MetricDefinition,
    filters: &MetricFilters,
) -> StatsResult<Vec<TimeSeriesPoint>> {
    range
        .days()
        .map(|date| {
            let value = compute_day(entries.get(&date), metric, filters)?;
            Ok(TimeSeriesPoint {
                date,
                value: value.as_ref().and_then(DayValue::numeric),
                label: value.as_ref().and_then(|v| v.label().map(str::to_string)),
            })
        })
        .collect()
}

fn reduce(values: &[f64], reduction: Reduction) -> Option<f64> {
    if values.is_empty() {
        return reduction.zero_when_empty().then_some(0.0);
    }
    Some(match reduction {
        Reduction::Sum => values.iter().sum(),
        Reduction::Count => values.len() as f64,
        Reduction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Reduction::Mean => values.iter().sum::<f64>() / values.len() as f64,
    })
}

fn scalar(entry: &LogEntry, field: ScalarField) -> Option<DayValue> {
    match field {
        ScalarField::MorningWeight => entry.morning_weight.map(DayValue::Number),
        ScalarField::StandardDrinks => entry.standard_drinks.map(|d| DayValue::Number(d as f64)),
        ScalarField::Notes => entry
            .notes
            .as_ref()
            .filter(|n| !n.trim().is_empty())
            .map(|n| DayValue::Text(n.clone())),
        ScalarField::SleepDuration => entry.sleep.map(|s| DayValue::Number(s.duration_minutes as f64)),
        ScalarField::SleepQuality => entry.sleep.map(|s| DayValue::Number(s.quality as f64)),
    }
}

fn categorical(entry: &LogEntry, field: CategoricalField) -> Option<DayValue> {
    match field {
        CategoricalField::StressLevel => entry.stress.map(|level| DayValue::Category {
            ordinal: level.ordinal(),
            label: level.display_name().to_string(),
        }),
        CategoricalField::CarbCycleDay => entry.carb_cycle_day.as_ref().map(|day| DayValue::Category {
            ordinal: day.day_type.ordinal(),
            label: day.day_type.display_name().to_string(),
        }),
    }
}

// ============================================================================
// Sub-record Values
// `filters` is None for unfiltered metrics
// ============================================================================

fn source_values(entry: &LogEntry, source: Source, filters: Option<&MetricFilters>) -> Vec<f64> {
    let training = filters.and_then(|f| f.training);
    let cardio_type = filters.and_then(|f| f.cardio_type);

    match source {
        Source::Foods(nutrient) => entry.foods.iter().filter_map(|f| nutrient_value(f, nutrient)).collect(),
        Source::Activities => entry
            .activities
            .iter()
            .filter(|a| activity_matches(entry, a, training))
            .map(|_| 1.0)
            .collect(),
        Source::Sets(measure) => entry
            .activities
            .iter()
            .filter(|a| activity_matches(entry, a, training))
            .flat_map(|a| a.exercises.iter())
            .filter(|e| exercise_matches(e, training))
            .flat_map(|e| e.sets.iter())
            .filter_map(|s| set_value(s, measure))
            .collect(),
        Source::Cardio(measure) => entry
            .cardio
            .iter()
            .filter(|c| cardio_type.map_or(true, |t| c.cardio_type == t))
            .filter_map(|c| cardio_value(c, measure))
            .collect(),
        Source::Hydration(unit) => entry
            .hydration
            .iter()
            .map(|h| units::convert(h.amount * h.servings, h.unit, unit))
            .collect(),
        Source::Supplements(SupplementMeasure::CompoundAmount) => {
            let compound_ids = filters.map(|f| f.compound_ids.as_slice()).unwrap_or_default();
            entry
                .supplements
                .iter()
                .flat_map(|s| {
                    s.compounds
                        .iter()
                        .filter(move |d| compound_ids.is_empty() || compound_ids.contains(&d.compound_id))
                        .map(move |d| d.amount * s.servings)
                })
                .collect()
        }
        Source::Supplements(measure) => {
            let supplement_ids = filters.map(|f| f.supplement_ids.as_slice()).unwrap_or_default();
            entry
                .supplements
                .iter()
                .filter(|s| supplement_ids.is_empty() || supplement_ids.contains(&s.supplement_id))
                .map(|s| match measure {
                    SupplementMeasure::Servings => s.servings,
                    _ => 1.0,
                })
                .collect()
        }
    }
}

fn nutrient_value(food: &FoodServing, nutrient: Nutrient) -> Option<f64> {
    let per_serving = match nutrient {
        Nutrient::Calories => food.calories,
        Nutrient::Protein => food.protein_grams,
        Nutrient::CompleteProtein if food.protein_complete => food.protein_grams,
        Nutrient::CompleteProtein => return None,
        Nutrient::Carbs => food.carbs_grams,
        Nutrient::Fat => food.fat_grams,
        Nutrient::Fiber => food.fiber_grams,
        Nutrient::Sugar => food.sugar_grams,
    };
    Some(per_serving * food.servings)
}

fn activity_matches(entry: &LogEntry, activity: &Activity, filter: Option<TrainingFilter>) -> bool {
    match filter {
        Some(TrainingFilter::Workout(id)) => activity.workout_id == Some(id),
        Some(TrainingFilter::Mesocycle(range)) => range.contains(entry.date),
        _ => true,
    }
}

fn exercise_matches(exercise: &ActivityExercise, filter: Option<TrainingFilter>) -> bool {
    match filter {
        Some(TrainingFilter::Exercise(id)) => exercise.exercise_id == id,
        Some(TrainingFilter::MovementPattern(id)) => exercise.movement_pattern_id == Some(id),
        _ => true,
    }
}

fn set_value(set: &ActivitySet, measure: SetMeasure) -> Option<f64> {
    match measure {
        SetMeasure::Count => Some(1.0),
        SetMeasure::Reps => Some(set.reps as f64),
        SetMeasure::Weight => (set.weight > 0.0).then_some(set.weight),
        SetMeasure::Volume => Some(set.reps as f64 * set.weight),
    }
}

/// Unset and zero readings are skipped so they do not drag means down
fn cardio_value(session: &CardioSession, measure: CardioMeasure) -> Option<f64> {
    let reading = match measure {
        CardioMeasure::Count => return Some(1.0),
        CardioMeasure::Duration => session.duration_minutes,
        CardioMeasure::Distance => session.distance,
        CardioMeasure::Speed => session.speed,
        CardioMeasure::Incline => session.incline,
    };
    reading.filter(|v| *v > 0.0)
}
