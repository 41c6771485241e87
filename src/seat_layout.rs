//! Seat inventory expansion with Indian Railways coach layouts.
//!
//! A train's class configuration ("classes" JSON document) expands
//! deterministically into one seat row per berth:
//! - SL (Sleeper): 72 seats per coach, 8-berth bays
//! - 3A (AC 3-Tier): 64 seats per coach, 8-berth bays
//! - 2A (AC 2-Tier): 48 seats per coach, 6-berth bays (no middle)
//! - 1A (AC First Class): 24 seats per coach, 4-berth cabins
//! - CC (Chair Car): 78, 2S (Second Sitting): 108, GEN: 90 - no berths
//!
//! Everything here is a pure function of the config; the database-side
//! idempotence guard lives with the pipeline.

use crate::models::NewSeat;

/// Substitute journey length when a train's distance is unknown.
pub const DEFAULT_DISTANCE_KM: f64 = 500.0;

/// Per-km rate applied to classes missing from the rate table.
pub const DEFAULT_RATE_CENTS_PER_KM: i64 = 100;

/// Bulk-insert chunk size for generated seat rows.
pub const DEFAULT_SEAT_BATCH_SIZE: usize = 500;

pub fn default_seats_per_coach(class_code: &str) -> i32 {
    match class_code {
        "SL" => 72,
        "3A" => 64,
        "2A" => 48,
        "1A" => 24,
        "CC" => 78,
        "2S" => 108,
        "GEN" => 90,
        _ => 72,
    }
}

/// Coach labels are "<prefix><n>", e.g. S1, S2 for Sleeper.
pub fn coach_prefix(class_code: &str) -> &'static str {
    match class_code {
        "SL" => "S",
        "3A" => "A",
        "2A" => "B",
        "1A" => "H",
        "CC" => "C",
        "2S" => "D",
        "GEN" => "G",
        _ => "X",
    }
}

/// Base fare per km, in cents (paise).
pub fn rate_cents_per_km(class_code: &str) -> Option<i64> {
    match class_code {
        "1A" => Some(500),
        "2A" => Some(350),
        "3A" => Some(250),
        "SL" => Some(100),
        "CC" => Some(120),
        "2S" => Some(50),
        "GEN" => Some(30),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BerthType {
    Lower,
    Middle,
    Upper,
    SideLower,
    SideUpper,
}

impl BerthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BerthType::Lower => "LB",
            BerthType::Middle => "MB",
            BerthType::Upper => "UB",
            BerthType::SideLower => "SL",
            BerthType::SideUpper => "SU",
        }
    }
}

/// Berth classification by position in the repeating bay pattern.
/// Sitting and unreserved classes carry no berth type.
pub fn berth_for(class_code: &str, seat_index: i32) -> Option<BerthType> {
    match class_code {
        // 8 bays of 8 berths plus side berths.
        "SL" | "3A" => Some(match seat_index % 8 {
            1 | 4 => BerthType::Lower,
            2 | 5 => BerthType::Middle,
            3 | 6 => BerthType::Upper,
            7 => BerthType::SideLower,
            _ => BerthType::SideUpper,
        }),
        // 2A has no middle berth.
        "2A" => Some(match seat_index % 6 {
            1 | 3 | 5 => BerthType::Lower,
            _ => BerthType::Upper,
        }),
        // 1A cabins with 4 berths each.
        "1A" => Some(match seat_index % 4 {
            1 | 3 => BerthType::Lower,
            _ => BerthType::Upper,
        }),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoachConfig {
    pub coaches: i32,
    pub seats_per_coach: i32,
}

fn default_config() -> Vec<(String, CoachConfig)> {
    vec![(
        "SL".to_string(),
        CoachConfig {
            coaches: 1,
            seats_per_coach: default_seats_per_coach("SL"),
        },
    )]
}

/// Parses the "classes" JSON document into a normalized class list.
///
/// Two shapes are accepted per class: a bare integer (coach count,
/// seats per coach from the default table) or an object
/// `{"coaches": n, "seats_per_coach": m}`. Absent or unparseable
/// configuration falls back to a single Sleeper coach. Iteration order
/// is the JSON map's key order, so expansion is deterministic.
pub fn parse_classes_config(raw: Option<&str>) -> Vec<(String, CoachConfig)> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return default_config();
    };

    let parsed: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(_) => {
            log::warn!("Invalid classes config, using default: {raw}");
            return default_config();
        }
    };

    let Some(map) = parsed.as_object() else {
        log::warn!("Classes config is not an object, using default: {raw}");
        return default_config();
    };

    let mut normalized = Vec::new();
    for (class_code, value) in map {
        if let Some(coaches) = value.as_i64() {
            normalized.push((
                class_code.clone(),
                CoachConfig {
                    coaches: coaches as i32,
                    seats_per_coach: default_seats_per_coach(class_code),
                },
            ));
        } else if let Some(detail) = value.as_object() {
            let coaches = detail.get("coaches").and_then(|v| v.as_i64()).unwrap_or(1);
            let seats_per_coach = detail
                .get("seats_per_coach")
                .and_then(|v| v.as_i64())
                .unwrap_or_else(|| default_seats_per_coach(class_code) as i64);
            normalized.push((
                class_code.clone(),
                CoachConfig {
                    coaches: coaches as i32,
                    seats_per_coach: seats_per_coach as i32,
                },
            ));
        }
    }

    if normalized.is_empty() {
        default_config()
    } else {
        normalized
    }
}

/// Fare in cents for one seat of `class_code` on a journey of
/// `distance_km`. Unknown distance (or a class missing from the rate
/// table) substitutes a 500 km journey at the class rate, or the
/// default rate when the class is unknown too.
pub fn price_cents(class_code: &str, distance_km: Option<f64>) -> i32 {
    match (distance_km, rate_cents_per_km(class_code)) {
        (Some(distance), Some(rate)) if distance > 0.0 => (distance * rate as f64) as i32,
        (_, rate) => (DEFAULT_DISTANCE_KM * rate.unwrap_or(DEFAULT_RATE_CENTS_PER_KM) as f64) as i32,
    }
}

/// Expands one class into concrete seat rows. Coaches and seats are
/// both numbered from 1; the composite seat number "<coach>-<seat>" is
/// unique across every coach and class of the same run.
pub fn seat_rows_for_class(
    train_run_id: i32,
    class_code: &str,
    config: CoachConfig,
    distance_km: Option<f64>,
) -> Vec<NewSeat> {
    let prefix = coach_prefix(class_code);
    let price = price_cents(class_code, distance_km);

    let mut rows = Vec::with_capacity((config.coaches.max(0) * config.seats_per_coach.max(0)) as usize);

    for coach_num in 1..=config.coaches {
        let coach_label = format!("{prefix}{coach_num}");
        for seat_num in 1..=config.seats_per_coach {
            rows.push(NewSeat {
                train_run_id,
                seat_number: format!("{coach_label}-{seat_num}"),
                coach: coach_label.clone(),
                seat_class: class_code.to_string(),
                berth_type: berth_for(class_code, seat_num).map(|b| b.as_str().to_string()),
                price_cents: price,
                status: "AVAILABLE".to_string(),
            });
        }
    }

    rows
}

/// Expands a full class configuration for one run.
pub fn seat_rows_for_run(
    train_run_id: i32,
    classes: &[(String, CoachConfig)],
    distance_km: Option<f64>,
) -> Vec<NewSeat> {
    let mut rows = Vec::new();
    for (class_code, config) in classes {
        rows.extend(seat_rows_for_class(
            train_run_id,
            class_code,
            *config,
            distance_km,
        ));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_integer_config_uses_default_seats_per_coach() {
        let classes = parse_classes_config(Some(r#"{"SL": 2, "3A": 1}"#));
        assert_eq!(
            classes,
            vec![
                (
                    "3A".to_string(),
                    CoachConfig {
                        coaches: 1,
                        seats_per_coach: 64
                    }
                ),
                (
                    "SL".to_string(),
                    CoachConfig {
                        coaches: 2,
                        seats_per_coach: 72
                    }
                ),
            ]
        );
    }

    #[test]
    fn detailed_config_overrides_seats_per_coach() {
        let classes =
            parse_classes_config(Some(r#"{"SL": {"coaches": 3, "seats_per_coach": 10}}"#));
        assert_eq!(
            classes,
            vec![(
                "SL".to_string(),
                CoachConfig {
                    coaches: 3,
                    seats_per_coach: 10
                }
            )]
        );
    }

    #[test]
    fn detailed_config_fills_missing_fields_from_defaults() {
        let classes = parse_classes_config(Some(r#"{"2A": {"coaches": 2}}"#));
        assert_eq!(
            classes,
            vec![(
                "2A".to_string(),
                CoachConfig {
                    coaches: 2,
                    seats_per_coach: 48
                }
            )]
        );
    }

    #[test]
    fn absent_or_garbage_config_defaults_to_one_sleeper_coach() {
        let default = vec![(
            "SL".to_string(),
            CoachConfig {
                coaches: 1,
                seats_per_coach: 72,
            },
        )];
        assert_eq!(parse_classes_config(None), default);
        assert_eq!(parse_classes_config(Some("")), default);
        assert_eq!(parse_classes_config(Some("SL 3A 2A")), default);
        assert_eq!(parse_classes_config(Some("{}")), default);
        assert_eq!(parse_classes_config(Some("[1, 2]")), default);
    }

    #[test]
    fn sleeper_bay_pattern_repeats_every_eight_seats() {
        let expected = ["LB", "MB", "UB", "LB", "MB", "UB", "SL", "SU"];
        for (i, want) in expected.iter().enumerate() {
            let got = berth_for("SL", i as i32 + 1).unwrap();
            assert_eq!(got.as_str(), *want, "seat {}", i + 1);
            // Same position one bay over classifies identically.
            let next_bay = berth_for("SL", i as i32 + 9).unwrap();
            assert_eq!(next_bay, got);
        }
    }

    #[test]
    fn two_tier_has_no_middle_berth_and_first_class_alternates() {
        for seat in 1..=48 {
            let berth = berth_for("2A", seat).unwrap();
            assert_ne!(berth, BerthType::Middle);
        }
        assert_eq!(berth_for("1A", 1), Some(BerthType::Lower));
        assert_eq!(berth_for("1A", 2), Some(BerthType::Upper));
        assert_eq!(berth_for("1A", 3), Some(BerthType::Lower));
        assert_eq!(berth_for("1A", 4), Some(BerthType::Upper));
    }

    #[test]
    fn sitting_classes_carry_no_berth_type() {
        assert_eq!(berth_for("CC", 1), None);
        assert_eq!(berth_for("2S", 5), None);
        assert_eq!(berth_for("GEN", 17), None);
    }

    #[test]
    fn price_uses_distance_and_class_rate_when_both_known() {
        assert_eq!(price_cents("SL", Some(1447.0)), 144_700);
        assert_eq!(price_cents("1A", Some(100.0)), 50_000);
    }

    #[test]
    fn price_falls_back_to_default_distance_and_rate() {
        // Unknown distance: 500 km at the class rate.
        assert_eq!(price_cents("3A", None), 125_000);
        // Zero distance is treated as unknown.
        assert_eq!(price_cents("3A", Some(0.0)), 125_000);
        // Class missing from the rate table: 500 km at the default rate,
        // even when the distance is known.
        assert_eq!(price_cents("EC", Some(800.0)), 50_000);
    }

    #[test]
    fn fifteen_seats_across_two_classes() {
        let classes = vec![
            (
                "SL".to_string(),
                CoachConfig {
                    coaches: 1,
                    seats_per_coach: 10,
                },
            ),
            (
                "3A".to_string(),
                CoachConfig {
                    coaches: 1,
                    seats_per_coach: 5,
                },
            ),
        ];
        let rows = seat_rows_for_run(7, &classes, Some(500.0));
        assert_eq!(rows.len(), 15);

        let sleeper: Vec<&NewSeat> = rows.iter().filter(|s| s.seat_class == "SL").collect();
        assert_eq!(sleeper.len(), 10);
        assert!(sleeper.iter().all(|s| s.coach == "S1"));
        assert!(sleeper.iter().all(|s| {
            matches!(s.berth_type.as_deref(), Some("LB" | "MB" | "UB" | "SL" | "SU"))
        }));
        assert!(sleeper.iter().all(|s| s.price_cents == 50_000));

        let ac3: Vec<&NewSeat> = rows.iter().filter(|s| s.seat_class == "3A").collect();
        assert_eq!(ac3.len(), 5);
        assert!(ac3.iter().all(|s| s.coach == "A1"));
        assert!(ac3.iter().all(|s| s.price_cents == 125_000));

        // Seat numbers unique across the whole run.
        let mut numbers: Vec<&str> = rows.iter().map(|s| s.seat_number.as_str()).collect();
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), 15);
    }

    #[test]
    fn expansion_is_deterministic() {
        let classes = parse_classes_config(Some(r#"{"SL": 2, "2A": {"coaches": 1}}"#));
        let first = seat_rows_for_run(42, &classes, Some(1210.0));
        let second = seat_rows_for_run(42, &classes, Some(1210.0));
        assert_eq!(first, second);
    }

    #[test]
    fn coach_numbering_spans_multiple_coaches() {
        let rows = seat_rows_for_class(
            1,
            "SL",
            CoachConfig {
                coaches: 2,
                seats_per_coach: 72,
            },
            None,
        );
        assert_eq!(rows.len(), 144);
        assert_eq!(rows[0].seat_number, "S1-1");
        assert_eq!(rows[71].seat_number, "S1-72");
        assert_eq!(rows[72].seat_number, "S2-1");
        assert_eq!(rows[143].seat_number, "S2-72");
    }
}
