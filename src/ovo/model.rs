//! Wire shapes for the OVO smart-pay API.

use serde::de::{Deserialize, Deserializer};
use serde_derive::Deserialize as DeriveDeserialize;
use std::fmt;

/// Fuel type of a supply point. The provider is inconsistent about casing
/// ("Gas", "GAS", ...), so anything that lower-cases to "gas" is gas and
/// everything else is treated as electricity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelType {
    Gas,
    Electricity,
}

impl<'de> Deserialize<'de> for FuelType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.eq_ignore_ascii_case("gas") {
            Ok(FuelType::Gas)
        } else {
            Ok(FuelType::Electricity)
        }
    }
}

impl fmt::Display for FuelType {
    /// Lowercase form, used both in request paths and label values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuelType::Gas => write!(f, "gas"),
            FuelType::Electricity => write!(f, "electricity"),
        }
    }
}

/// One meter connection on the account. Retrieved fresh on every scan.
#[derive(DeriveDeserialize, Debug, Clone)]
pub struct SupplyPoint {
    pub mpxn: String,
    pub fuel: FuelType,
    #[serde(default)]
    pub start: String,
    pub msn: String,
}

#[derive(DeriveDeserialize, Debug, Clone)]
pub struct GasReading {
    #[serde(rename = "gasVolume")]
    pub volume: f64,
    #[serde(rename = "readingDateTime", default)]
    pub time: String,
}

#[derive(DeriveDeserialize, Debug, Clone)]
pub struct ElectricityTierReading {
    #[serde(rename = "meterRegisterReading")]
    pub reading: f64,
    #[serde(rename = "timeOfUseLabel")]
    pub label: String,
}

#[derive(DeriveDeserialize, Debug, Clone)]
pub struct ElectricityReading {
    pub tiers: Vec<ElectricityTierReading>,
    #[serde(rename = "readingDateTime", default)]
    pub time: String,
}

/// Decoded reading list for one supply point. The caller picks the variant
/// from the point's fuel type before decoding; the two shapes share no
/// discriminator on the wire.
#[derive(Debug, Clone)]
pub enum Readings {
    Gas(Vec<GasReading>),
    Electricity(Vec<ElectricityReading>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuel_type_case_insensitive() {
        let gas: FuelType = serde_json::from_str(r#""GAS""#).unwrap();
        assert_eq!(gas, FuelType::Gas);
        let gas: FuelType = serde_json::from_str(r#""Gas""#).unwrap();
        assert_eq!(gas, FuelType::Gas);
        let elec: FuelType = serde_json::from_str(r#""ELECTRICITY""#).unwrap();
        assert_eq!(elec, FuelType::Electricity);
    }

    #[test]
    fn test_fuel_type_unknown_defaults_to_electricity() {
        let other: FuelType = serde_json::from_str(r#""hydrogen""#).unwrap();
        assert_eq!(other, FuelType::Electricity);
    }

    #[test]
    fn test_fuel_type_display_is_lowercase() {
        assert_eq!(FuelType::Gas.to_string(), "gas");
        assert_eq!(FuelType::Electricity.to_string(), "electricity");
    }

    #[test]
    fn test_supply_point_decode() {
        let json = r#"{"mpxn": "1234567890", "fuel": "Gas", "start": "2020-01-01", "msn": "G4P00123"}"#;
        let point: SupplyPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.mpxn, "1234567890");
        assert_eq!(point.fuel, FuelType::Gas);
        assert_eq!(point.start, "2020-01-01");
        assert_eq!(point.msn, "G4P00123");
    }

    #[test]
    fn test_gas_reading_decode() {
        let json = r#"{"gasVolume": 1234.5, "readingDateTime": "2024-06-01T08:30:00"}"#;
        let reading: GasReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.volume, 1234.5);
        assert_eq!(reading.time, "2024-06-01T08:30:00");
    }

    #[test]
    fn test_gas_reading_missing_time_defaults_empty() {
        let json = r#"{"gasVolume": 10.0}"#;
        let reading: GasReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.time, "");
    }

    #[test]
    fn test_electricity_reading_decode() {
        let json = r#"{
            "tiers": [
                {"meterRegisterReading": 100.0, "timeOfUseLabel": "peak"},
                {"meterRegisterReading": 50.5, "timeOfUseLabel": "offpeak"}
            ],
            "readingDateTime": "2024-06-01T08:30:00"
        }"#;
        let reading: ElectricityReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.tiers.len(), 2);
        assert_eq!(reading.tiers[0].label, "peak");
        assert_eq!(reading.tiers[1].reading, 50.5);
    }
}
