use serde::{Deserialize, Serialize};

/// One normalized sol of InSight weather, in the shape loaded into the warehouse.
///
/// Field names are the warehouse column names; each record serializes to one
/// flat NDJSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period: i64,
    pub start_time: String,
    pub end_time: String,
    pub temp_avg: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure_avg: f64,
    pub pressure_min: f64,
    pub pressure_max: f64,
    pub wind_speed_avg: f64,
    pub wind_speed_min: f64,
    pub wind_speed_max: f64,
}

/// Average, minimum and maximum reading of one sensor group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl PeriodRecord {
    pub fn new(
        period: i64,
        start_time: String,
        end_time: String,
        temperature: Reading,
        pressure: Reading,
        wind_speed: Reading,
    ) -> Self {
        Self {
            period,
            start_time,
            end_time,
            temp_avg: temperature.avg,
            temp_min: temperature.min,
            temp_max: temperature.max,
            pressure_avg: pressure.avg,
            pressure_min: pressure.min,
            pressure_max: pressure.max,
            wind_speed_avg: wind_speed.avg,
            wind_speed_min: wind_speed.min,
            wind_speed_max: wind_speed.max,
        }
    }
}
