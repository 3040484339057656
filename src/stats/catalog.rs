//! Metric catalog
//!
//! Every metric the engine can compute, with how it is derived from a day's
//! log entry. Adding a metric means adding a row to [`METRICS`]; the day
//! aggregator interprets the [`Derivation`] generically.

use serde::Serialize;

use super::error::{StatsError, StatsResult};
use crate::units::VolumeUnit;

// ============================================================================
// Derivation Vocabulary
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Body,
    Journal,
    Nutrition,
    Training,
    Cardio,
    Sleep,
    Hydration,
    Stress,
    Supplements,
}

impl MetricCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Body => "body",
            MetricCategory::Journal => "journal",
            MetricCategory::Nutrition => "nutrition",
            MetricCategory::Training => "training",
            MetricCategory::Cardio => "cardio",
            MetricCategory::Sleep => "sleep",
            MetricCategory::Hydration => "hydration",
            MetricCategory::Stress => "stress",
            MetricCategory::Supplements => "supplements",
        }
    }
}

/// How the values of one day's matching sub-records collapse into one number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    Sum,
    /// Number of contributing values
    Count,
    Max,
    Mean,
}

impl Reduction {
    /// Sum and count of nothing is zero; max and mean of nothing are undefined
    pub fn zero_when_empty(&self) -> bool {
        matches!(self, Reduction::Sum | Reduction::Count)
    }
}

/// Filter a filtered metric reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Exercise, movement pattern, workout or mesocycle
    Training,
    CardioType,
    Supplements,
    Compounds,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Training => "training",
            FilterKind::CardioType => "cardio type",
            FilterKind::Supplements => "supplement_ids",
            FilterKind::Compounds => "compound_ids",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Calories,
    Protein,
    /// Protein from foods with a complete amino acid profile only
    CompleteProtein,
    Carbs,
    Fat,
    Fiber,
    Sugar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetMeasure {
    Count,
    Reps,
    /// Load of a weighted set; unweighted sets contribute nothing
    Weight,
    /// reps × weight
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardioMeasure {
    Count,
    Duration,
    Distance,
    Speed,
    Incline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplementMeasure {
    Count,
    Servings,
    /// Per-serving compound amount × servings, one value per compound dose
    CompoundAmount,
}

/// A collection of a log entry's sub-records and the number each yields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "collection", content = "measure")]
pub enum Source {
    /// food field × servings
    Foods(Nutrient),
    /// One per strength session
    Activities,
    Sets(SetMeasure),
    Cardio(CardioMeasure),
    /// Cup amount × servings in the given unit
    Hydration(VolumeUnit),
    Supplements(SupplementMeasure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarField {
    MorningWeight,
    StandardDrinks,
    Notes,
    SleepDuration,
    SleepQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    StressLevel,
    CarbCycleDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Derivation {
    /// Reduce over every sub-record of a collection
    SimpleSum { source: Source, reduction: Reduction },
    /// A single field of the entry, null when unset
    ScalarLookup { field: ScalarField },
    /// Reduce over the sub-records matching a filter
    FilteredSum {
        source: Source,
        reduction: Reduction,
        filter: FilterKind,
        required: bool,
    },
    /// An enumerated field reported as ordinal plus label
    CategoricalLookup { field: CategoricalField },
}

// ============================================================================
// Definitions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub category: MetricCategory,
    pub derivation: Derivation,
}

impl MetricDefinition {
    /// The filter that must be present for this metric to be computed
    pub fn required_filter(&self) -> Option<FilterKind> {
        match self.derivation {
            Derivation::FilteredSum { filter, required: true, .. } => Some(filter),
            _ => None,
        }
    }
}

const fn simple(source: Source, reduction: Reduction) -> Derivation {
    Derivation::SimpleSum { source, reduction }
}

const fn filtered(source: Source, reduction: Reduction, filter: FilterKind, required: bool) -> Derivation {
    Derivation::FilteredSum { source, reduction, filter, required }
}

const fn metric(
    id: &'static str,
    label: &'static str,
    unit: &'static str,
    category: MetricCategory,
    derivation: Derivation,
) -> MetricDefinition {
    MetricDefinition { id, label, unit, category, derivation }
}

use CategoricalField as Cat;
use MetricCategory as C;
use Reduction as R;
use ScalarField as F;

/// All metrics, in the order they are listed to clients
pub static METRICS: &[MetricDefinition] = &[
    // Body
    metric("weight", "Weight", "lbs", C::Body, Derivation::ScalarLookup { field: F::MorningWeight }),
    metric("alcohol_drinks", "Alcohol", "drinks", C::Body, Derivation::ScalarLookup { field: F::StandardDrinks }),
    metric("notes", "Notes", "", C::Journal, Derivation::ScalarLookup { field: F::Notes }),
    // Nutrition
    metric("calories", "Calories", "kcal", C::Nutrition, simple(Source::Foods(Nutrient::Calories), R::Sum)),
    metric("protein", "Protein", "g", C::Nutrition, simple(Source::Foods(Nutrient::Protein), R::Sum)),
    metric("complete_protein", "Complete Protein", "g", C::Nutrition, simple(Source::Foods(Nutrient::CompleteProtein), R::Sum)),
    metric("carbs", "Carbs", "g", C::Nutrition, simple(Source::Foods(Nutrient::Carbs), R::Sum)),
    metric("fat", "Fat", "g", C::Nutrition, simple(Source::Foods(Nutrient::Fat), R::Sum)),
    metric("fiber", "Fiber", "g", C::Nutrition, simple(Source::Foods(Nutrient::Fiber), R::Sum)),
    metric("sugar", "Sugar", "g", C::Nutrition, simple(Source::Foods(Nutrient::Sugar), R::Sum)),
    metric("carb_cycle_day", "Carb Cycle Day", "/5", C::Nutrition, Derivation::CategoricalLookup { field: Cat::CarbCycleDay }),
    // Training
    metric("workout_count", "Workouts", "sessions", C::Training, simple(Source::Activities, R::Count)),
    metric("total_sets", "Total Sets", "sets", C::Training, simple(Source::Sets(SetMeasure::Count), R::Count)),
    metric("total_reps", "Total Reps", "reps", C::Training, simple(Source::Sets(SetMeasure::Reps), R::Sum)),
    metric("total_volume", "Total Volume", "lbs", C::Training, simple(Source::Sets(SetMeasure::Volume), R::Sum)),
    metric("exercise_weight", "Weight", "lbs", C::Training, filtered(Source::Sets(SetMeasure::Weight), R::Max, FilterKind::Training, true)),
    metric("exercise_reps", "Reps", "reps", C::Training, filtered(Source::Sets(SetMeasure::Reps), R::Sum, FilterKind::Training, true)),
    metric("exercise_sets", "Sets", "sets", C::Training, filtered(Source::Sets(SetMeasure::Count), R::Count, FilterKind::Training, true)),
    metric("exercise_volume", "Volume", "lbs", C::Training, filtered(Source::Sets(SetMeasure::Volume), R::Sum, FilterKind::Training, true)),
    // Cardio
    metric("cardio_minutes", "Cardio", "min", C::Cardio, simple(Source::Cardio(CardioMeasure::Duration), R::Sum)),
    metric("cardio_sessions", "Cardio Sessions", "sessions", C::Cardio, simple(Source::Cardio(CardioMeasure::Count), R::Count)),
    metric("cardio_duration", "Duration", "min", C::Cardio, filtered(Source::Cardio(CardioMeasure::Duration), R::Sum, FilterKind::CardioType, false)),
    metric("cardio_distance", "Distance", "mi", C::Cardio, filtered(Source::Cardio(CardioMeasure::Distance), R::Sum, FilterKind::CardioType, false)),
    metric("cardio_speed", "Speed", "mph", C::Cardio, filtered(Source::Cardio(CardioMeasure::Speed), R::Mean, FilterKind::CardioType, false)),
    metric("cardio_incline", "Incline", "%", C::Cardio, filtered(Source::Cardio(CardioMeasure::Incline), R::Mean, FilterKind::CardioType, false)),
    // Sleep
    metric("sleep_duration", "Sleep", "min", C::Sleep, Derivation::ScalarLookup { field: F::SleepDuration }),
    metric("sleep_quality", "Sleep Quality", "/10", C::Sleep, Derivation::ScalarLookup { field: F::SleepQuality }),
    // Hydration
    metric("hydration_oz", "Hydration", "oz", C::Hydration, simple(Source::Hydration(VolumeUnit::Oz), R::Sum)),
    metric("hydration_ml", "Hydration", "ml", C::Hydration, simple(Source::Hydration(VolumeUnit::Ml), R::Sum)),
    // Stress
    metric("stress_level", "Stress Level", "/5", C::Stress, Derivation::CategoricalLookup { field: Cat::StressLevel }),
    // Supplements
    metric("supplement_count", "Supplements", "count", C::Supplements, simple(Source::Supplements(SupplementMeasure::Count), R::Count)),
    metric("supplement_servings", "Servings", "servings", C::Supplements, filtered(Source::Supplements(SupplementMeasure::Servings), R::Sum, FilterKind::Supplements, true)),
    metric("compound_amount", "Amount", "", C::Supplements, filtered(Source::Supplements(SupplementMeasure::CompoundAmount), R::Sum, FilterKind::Compounds, true)),
];

/// Look up a metric by id
pub fn lookup(metric_id: &str) -> StatsResult<&'static MetricDefinition> {
    METRICS
        .iter()
        .find(|m| m.id == metric_id)
        .ok_or_else(|| StatsError::UnknownMetric(metric_id.to_string()))
}

/// All metrics in catalog order
pub fn list() -> &'static [MetricDefinition] {
    METRICS
}
