use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub routing: RoutingConfig,
}

/// Parameters of the retry loop and the health windows.
#[derive(Debug, Clone, Copy)]
pub struct RoutingConfig {
    /// Maximum processor invocations per payment request.
    pub max_attempts: u32,
    /// Number of recent outcomes kept per processor.
    pub health_window_size: usize,
    /// Age bound on outcomes entering the health score.
    pub health_window: Duration,
    /// Below this score a processor is degraded (strict less-than).
    pub degraded_threshold: f64,
    /// Below this score a processor is skipped entirely (strict less-than).
    pub circuit_open_threshold: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            health_window_size: 50,
            health_window: Duration::from_secs(10 * 60),
            degraded_threshold: 0.5,
            circuit_open_threshold: 0.2,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            routing: RoutingConfig::default(),
        })
    }
}
