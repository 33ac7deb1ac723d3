mod chart;
mod engine;
mod error;
mod types;

pub use chart::{tick_positions, tick_step};
pub use engine::{monthly_rate, project, project_from};
pub use error::ProjectionError;
pub use types::{Inputs, MonthlyRecord, YearMonth};
