//! Supply point and reading fetches against the smart-pay API.
//!
//! Bodies are read as text and decoded with serde_json so a malformed body
//! surfaces as a `Decode` error, distinct from transport failures.

use crate::error::OvoError;
use crate::ovo::client::OvoClient;
use crate::ovo::model::{FuelType, Readings, SupplyPoint};
use chrono::{DateTime, Duration, Local};

/// Readings are fetched from this many days back to present.
const LOOKBACK_DAYS: i64 = 64;

/// Start of the readings window, as the `from` query parameter value.
pub fn lookback_from_date(now: DateTime<Local>) -> String {
    (now - Duration::days(LOOKBACK_DAYS))
        .format("%Y-%m-%d")
        .to_string()
}

impl OvoClient {
    /// Lists the supply points on the account. An empty account is a valid
    /// empty list, not an error.
    pub async fn load_points(&mut self) -> Result<Vec<SupplyPoint>, OvoError> {
        let url = format!(
            "{}/orex/api/supply-points/account/{}",
            self.api_base(),
            self.account_number()
        );
        let body = self.get(&url).await?;
        let points: Vec<SupplyPoint> =
            serde_json::from_str(&body).map_err(|e| OvoError::decode("supply points", e))?;
        for point in &points {
            tracing::debug!(
                mpxn = %point.mpxn,
                fuel = %point.fuel,
                start = %point.start,
                msn = %point.msn,
                "scanned point"
            );
        }
        Ok(points)
    }

    /// Fetches the recent readings for one supply point. The fuel type picks
    /// the decode shape; the two reading formats share no wire discriminator.
    pub async fn load_readings(&mut self, point: &SupplyPoint) -> Result<Readings, OvoError> {
        let url = format!(
            "{}/rlc/rac-public-api/api/v5/supplypoints/{}/{}/meters/{}/readings?from={}",
            self.api_base(),
            point.fuel,
            point.mpxn,
            point.msn,
            lookback_from_date(Local::now()),
        );
        let body = self.get(&url).await?;
        let readings = match point.fuel {
            FuelType::Gas => Readings::Gas(
                serde_json::from_str(&body)
                    .map_err(|e| OvoError::decode("gas readings", e))?,
            ),
            FuelType::Electricity => Readings::Electricity(
                serde_json::from_str(&body)
                    .map_err(|e| OvoError::decode("electricity readings", e))?,
            ),
        };
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountConfig;
    use crate::ovo::client::Endpoints;
    use chrono::TimeZone;

    fn test_client(url: String) -> OvoClient {
        OvoClient::new(
            AccountConfig {
                account_number: "A-123".to_string(),
                username: "test_user".to_string(),
                password: "test_password".to_string(),
            },
            Endpoints {
                auth_base: url.clone(),
                api_base: url,
            },
        )
        .unwrap()
    }

    fn gas_point() -> SupplyPoint {
        serde_json::from_str(
            r#"{"mpxn": "7001", "fuel": "Gas", "start": "2020-01-01", "msn": "G4P1"}"#,
        )
        .unwrap()
    }

    fn electricity_point() -> SupplyPoint {
        serde_json::from_str(
            r#"{"mpxn": "1600012345678", "fuel": "Electricity", "start": "2020-01-01", "msn": "E1X9"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_lookback_from_date() {
        let now = Local.with_ymd_and_hms(2024, 6, 6, 10, 30, 0).unwrap();
        assert_eq!(lookback_from_date(now), "2024-04-03");
    }

    mod succeeds {
        use super::*;

        #[tokio::test]
        async fn test_load_points() {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("GET", "/orex/api/supply-points/account/A-123")
                .with_status(200)
                .with_body(
                    r#"[
                        {"mpxn": "7001", "fuel": "Gas", "start": "2020-01-01", "msn": "G4P1"},
                        {"mpxn": "1600012345678", "fuel": "Electricity", "start": "2020-01-01", "msn": "E1X9"}
                    ]"#,
                )
                .create_async()
                .await;

            let mut client = test_client(server.url());
            let points = client.load_points().await.unwrap();
            assert_eq!(points.len(), 2);
            assert_eq!(points[0].fuel, FuelType::Gas);
            assert_eq!(points[1].mpxn, "1600012345678");
        }

        #[tokio::test]
        async fn test_load_points_empty_account() {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("GET", "/orex/api/supply-points/account/A-123")
                .with_status(200)
                .with_body("[]")
                .create_async()
                .await;

            let mut client = test_client(server.url());
            let points = client.load_points().await.unwrap();
            assert!(points.is_empty());
        }

        #[tokio::test]
        async fn test_load_readings_gas() {
            let mut server = mockito::Server::new_async().await;
            let from = lookback_from_date(Local::now());
            let _mock = server
                .mock(
                    "GET",
                    "/rlc/rac-public-api/api/v5/supplypoints/gas/7001/meters/G4P1/readings",
                )
                .match_query(mockito::Matcher::UrlEncoded("from".into(), from))
                .with_status(200)
                .with_body(
                    r#"[{"gasVolume": 1234.5, "readingDateTime": "2024-06-01T08:30:00"}]"#,
                )
                .create_async()
                .await;

            let mut client = test_client(server.url());
            let readings = client.load_readings(&gas_point()).await.unwrap();
            match readings {
                Readings::Gas(list) => {
                    assert_eq!(list.len(), 1);
                    assert_eq!(list[0].volume, 1234.5);
                }
                Readings::Electricity(_) => panic!("expected gas readings"),
            }
        }

        #[tokio::test]
        async fn test_load_readings_electricity() {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock(
                    "GET",
                    "/rlc/rac-public-api/api/v5/supplypoints/electricity/1600012345678/meters/E1X9/readings",
                )
                .match_query(mockito::Matcher::Any)
                .with_status(200)
                .with_body(
                    r#"[{
                        "tiers": [
                            {"meterRegisterReading": 100.0, "timeOfUseLabel": "peak"},
                            {"meterRegisterReading": 50.5, "timeOfUseLabel": "offpeak"}
                        ],
                        "readingDateTime": "2024-06-01T08:30:00"
                    }]"#,
                )
                .create_async()
                .await;

            let mut client = test_client(server.url());
            let readings = client.load_readings(&electricity_point()).await.unwrap();
            match readings {
                Readings::Electricity(list) => {
                    assert_eq!(list.len(), 1);
                    assert_eq!(list[0].tiers.len(), 2);
                }
                Readings::Gas(_) => panic!("expected electricity readings"),
            }
        }
    }

    mod fails {
        use super::*;

        #[tokio::test]
        async fn test_load_points_401_signals_session_expired() {
            let mut server = mockito::Server::new_async().await;
            let _login = server
                .mock("POST", "/api/v2/auth/login")
                .with_status(200)
                .create_async()
                .await;
            let _mock = server
                .mock("GET", "/orex/api/supply-points/account/A-123")
                .with_status(401)
                .with_body("token expired")
                .create_async()
                .await;

            let mut client = test_client(server.url());
            client.login().await.unwrap();

            let err = client.load_points().await.unwrap_err();
            assert!(err.is_session_expired());
            assert!(!client.logged_in());
        }

        #[tokio::test]
        async fn test_load_points_500_is_fetch_error() {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("GET", "/orex/api/supply-points/account/A-123")
                .with_status(500)
                .with_body("Internal Server Error")
                .create_async()
                .await;

            let mut client = test_client(server.url());
            let err = client.load_points().await.unwrap_err();
            assert!(matches!(err, OvoError::Fetch { status: 500, .. }));
            assert!(err.to_string().contains("Internal Server Error"));
        }

        #[tokio::test]
        async fn test_load_points_malformed_body_is_decode_error() {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock("GET", "/orex/api/supply-points/account/A-123")
                .with_status(200)
                .with_body("<html>maintenance page</html>")
                .create_async()
                .await;

            let mut client = test_client(server.url());
            let err = client.load_points().await.unwrap_err();
            assert!(matches!(err, OvoError::Decode { what: "supply points", .. }));
        }

        #[tokio::test]
        async fn test_load_readings_403_signals_session_expired() {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock(
                    "GET",
                    "/rlc/rac-public-api/api/v5/supplypoints/gas/7001/meters/G4P1/readings",
                )
                .match_query(mockito::Matcher::Any)
                .with_status(403)
                .create_async()
                .await;

            let mut client = test_client(server.url());
            let err = client.load_readings(&gas_point()).await.unwrap_err();
            assert!(err.is_session_expired());
        }

        #[tokio::test]
        async fn test_load_readings_wrong_shape_is_decode_error() {
            let mut server = mockito::Server::new_async().await;
            let _mock = server
                .mock(
                    "GET",
                    "/rlc/rac-public-api/api/v5/supplypoints/gas/7001/meters/G4P1/readings",
                )
                .match_query(mockito::Matcher::Any)
                .with_status(200)
                .with_body(r#"{"unexpected": "object"}"#)
                .create_async()
                .await;

            let mut client = test_client(server.url());
            let err = client.load_readings(&gas_point()).await.unwrap_err();
            assert!(matches!(err, OvoError::Decode { what: "gas readings", .. }));
        }
    }
}
