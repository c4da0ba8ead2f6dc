pub mod bigquery;
pub mod weather;

pub use weather::PeriodRecord;
