//! Runs a Railyard world on a WebSocket port.
//!
//! Settings come from the environment:
//!
//! | variable               | default        |
//! |------------------------|----------------|
//! | `RAILYARD_BIND`        | `0.0.0.0`      |
//! | `PORT`                 | `3000`         |
//! | `RAILYARD_TICK_HZ`     | `60` (0 = manual) |
//! | `RAILYARD_GRID_SIZE`   | `20`           |
//! | `RAILYARD_VARIANT`     | `multiplayer` or `single` |
//! | `RAILYARD_REJECT_ACKS` | off; `1` / `true` enables |
//!
//! Log level follows `RUST_LOG` (default `info`).

use std::str::FromStr;

use railyard::prelude::*;

#[derive(Debug, thiserror::Error)]
enum SettingsError {
    #[error("{var}={value:?} is not valid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Settings {
    bind: String,
    port: u16,
    tick_hz: u32,
    grid_size: usize,
    variant: Variant,
    reject_acks: bool,
}

impl Settings {
    /// Reads settings through `lookup`, which returns a variable's value
    /// if it is set.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let variant = match lookup("RAILYARD_VARIANT").as_deref() {
            None | Some("multiplayer") => Variant::Multiplayer,
            Some("single") | Some("single-train") => Variant::SingleTrain,
            Some(other) => {
                return Err(SettingsError::Invalid {
                    var: "RAILYARD_VARIANT",
                    value: other.to_owned(),
                    reason: "expected `multiplayer` or `single`".into(),
                });
            }
        };

        Ok(Self {
            bind: lookup("RAILYARD_BIND").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse(&lookup, "PORT", 3000)?,
            tick_hz: parse(&lookup, "RAILYARD_TICK_HZ", 60)?,
            grid_size: parse(&lookup, "RAILYARD_GRID_SIZE", 20)?,
            variant,
            reject_acks: lookup("RAILYARD_REJECT_ACKS")
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        })
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    fn world_config(&self) -> WorldConfig {
        let base = match self.variant {
            Variant::Multiplayer => WorldConfig::default(),
            Variant::SingleTrain => WorldConfig::single_train(),
        };
        WorldConfig {
            sim: SimConfig {
                grid_size: self.grid_size,
                ..base.sim
            },
            tick: TickConfig::with_rate(self.tick_hz),
            reject_acks: self.reject_acks,
            ..base
        }
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| SettingsError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_lookup(|var| std::env::var(var).ok())?;
    tracing::info!(?settings, "starting track server");

    let server = RailyardServer::builder()
        .bind(&settings.addr())
        .world_config(settings.world_config())
        .build()
        .await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "could not listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_from_lookup_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.addr(), "0.0.0.0:3000");
        assert_eq!(s.tick_hz, 60);
        assert_eq!(s.grid_size, 20);
        assert_eq!(s.variant, Variant::Multiplayer);
        assert!(!s.reject_acks);
    }

    #[test]
    fn test_from_lookup_reads_every_variable() {
        let s = settings(&[
            ("RAILYARD_BIND", "127.0.0.1"),
            ("PORT", "8081"),
            ("RAILYARD_TICK_HZ", "0"),
            ("RAILYARD_GRID_SIZE", "32"),
            ("RAILYARD_VARIANT", "single"),
            ("RAILYARD_REJECT_ACKS", "TRUE"),
        ])
        .unwrap();
        assert_eq!(s.addr(), "127.0.0.1:8081");
        assert_eq!(s.tick_hz, 0);
        assert_eq!(s.grid_size, 32);
        assert_eq!(s.variant, Variant::SingleTrain);
        assert!(s.reject_acks);
    }

    #[test]
    fn test_from_lookup_bad_number_is_error() {
        let err = settings(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_from_lookup_unknown_variant_is_error() {
        assert!(settings(&[("RAILYARD_VARIANT", "solo")]).is_err());
    }

    #[test]
    fn test_world_config_applies_variant_and_grid() {
        let s = settings(&[("RAILYARD_VARIANT", "single"), ("RAILYARD_GRID_SIZE", "8")]).unwrap();
        let config = s.world_config();
        assert_eq!(config.variant, Variant::SingleTrain);
        assert_eq!(config.sim.max_trains, Some(1));
        assert_eq!(config.sim.grid_size, 8);
        assert_eq!(config.tick.tick_rate_hz, 60);
    }
}
