//! Diesel row structs for the railway schema.
//!
//! Tables with serial primary keys get a `New*` insertable twin that
//! omits the `id` column.

use diesel::prelude::*;

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::stations)]
pub struct NewStation {
    pub code: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub zone: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::trains)]
pub struct Train {
    pub id: i32,
    pub number: String,
    pub name: String,
    pub train_type: Option<String>,
    pub zone: Option<String>,
    pub from_station_code: Option<String>,
    pub to_station_code: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub distance_km: Option<i32>,
    pub duration_h: Option<i32>,
    pub duration_m: Option<i32>,
    pub classes: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::trains)]
pub struct NewTrain {
    pub number: String,
    pub name: String,
    pub train_type: Option<String>,
    pub zone: Option<String>,
    pub from_station_code: Option<String>,
    pub to_station_code: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub distance_km: Option<i32>,
    pub duration_h: Option<i32>,
    pub duration_m: Option<i32>,
    pub classes: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::train_routes)]
pub struct NewTrainRoute {
    pub train_id: i32,
    pub coordinates: serde_json::Value,
}

/// Insertable for both the draft skeleton (`on_conflict do_nothing`)
/// and schedule reconciliation (`on_conflict do_update`).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::train_stops)]
pub struct NewTrainStop {
    pub train_id: i32,
    pub station_code: String,
    pub stop_sequence: i32,
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
    pub day_offset: i32,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::train_runs)]
pub struct TrainRun {
    pub id: i32,
    pub train_id: i32,
    pub run_date: chrono::NaiveDate,
    pub status: String,
    pub total_seats: i32,
    pub available_seats: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::train_runs)]
pub struct NewTrainRun {
    pub train_id: i32,
    pub run_date: chrono::NaiveDate,
    pub status: String,
    pub total_seats: i32,
    pub available_seats: i32,
}

#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::seats)]
pub struct NewSeat {
    pub train_run_id: i32,
    pub seat_number: String,
    pub coach: String,
    pub seat_class: String,
    pub berth_type: Option<String>,
    pub price_cents: i32,
    pub status: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::mapping_warnings)]
pub struct NewMappingWarning {
    pub train_number: String,
    pub coordinate_index: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub nearest_station_code: Option<String>,
    pub distance_km: Option<f64>,
    pub warning_type: String,
    pub message: String,
}
