//! Data models
//!
//! Rust structs representing database entities.

mod carb_cycle;
mod cup;
mod dashboard_setting;
mod food;
mod log_entry;
mod log_records;
mod mesocycle;
mod stats_configuration;
mod supplement;
mod training;

pub use carb_cycle::{create_carb_cycle, CarbCycleDay, CarbDayType};
pub use cup::Cup;
pub use dashboard_setting::DashboardSetting;
pub use food::{Food, FoodCreate};
pub use log_entry::{LogEntry, LogEntryCreate};
pub use log_records::{
    log_activity, log_cardio, log_food, log_hydration, log_supplement, set_sleep, set_stress,
    Activity, ActivityExercise, ActivityExerciseCreate, ActivitySet, CardioSession,
    CardioSessionCreate, CardioType, CompoundDose, FoodServing, HydrationServing, SleepRecord,
    StressLevel, SupplementServing,
};
pub use mesocycle::{Mesocycle, MesocycleCreate};
pub use stats_configuration::{
    ChartType, StatsConfig, StatsConfiguration, StatsConfigurationCreate, StatsConfigurationUpdate,
};
pub use supplement::{Compound, CompoundUnit, Supplement, SupplementCompound};
pub use training::{Exercise, MovementPattern, Workout};
