//! Converts decoded reading lists into gauge publish instructions.
//!
//! The provider lists readings most-recent-first, so only the entry at index
//! 0 is used; older readings are not back-filled. An empty list yields no
//! instructions at all, leaving previously-published gauges at their last
//! value.

use crate::error::OvoError;
use crate::metrics::MetricIdentity;
use crate::ovo::model::{Readings, SupplyPoint};
use chrono::NaiveDateTime;

/// Provider timestamps carry no timezone offset.
const READING_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One gauge write: which identity, what value.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub identity: MetricIdentity,
    pub value: f64,
}

/// Normalized output for one supply point: zero or more value-gauge writes
/// plus the raw reading timestamp (if any) for age computation.
#[derive(Debug, Clone, Default)]
pub struct NormalizedPoint {
    pub instructions: Vec<Instruction>,
    pub read_at: Option<String>,
}

pub fn normalize(point: &SupplyPoint, readings: &Readings) -> NormalizedPoint {
    match readings {
        Readings::Gas(list) => {
            let Some(reading) = list.first() else {
                return NormalizedPoint::default();
            };
            NormalizedPoint {
                instructions: vec![Instruction {
                    identity: MetricIdentity::value(&point.mpxn, None),
                    value: reading.volume,
                }],
                read_at: non_empty(&reading.time),
            }
        }
        Readings::Electricity(list) => {
            let Some(reading) = list.first() else {
                return NormalizedPoint::default();
            };
            NormalizedPoint {
                instructions: reading
                    .tiers
                    .iter()
                    .map(|tier| Instruction {
                        identity: MetricIdentity::value(&point.mpxn, Some(tier.label.clone())),
                        value: tier.reading,
                    })
                    .collect(),
                read_at: non_empty(&reading.time),
            }
        }
    }
}

/// Parses a reading timestamp. Failure is a hard error for the point's age
/// metric only; value gauges published before the parse are unaffected.
pub fn parse_reading_time(text: &str) -> Result<NaiveDateTime, OvoError> {
    NaiveDateTime::parse_from_str(text, READING_TIME_FORMAT).map_err(|e| OvoError::TimeParse {
        text: text.to_string(),
        source: e,
    })
}

fn non_empty(time: &str) -> Option<String> {
    if time.is_empty() {
        None
    } else {
        Some(time.to_string())
    }
}
