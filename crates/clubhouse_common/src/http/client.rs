use clubhouse_config::ApiConfig;
use reqwest::{Client, Error as ReqwestError};
use std::time::Duration;

/// User agent sent with every request to the club API.
pub const USER_AGENT: &str = concat!("clubhouse/", env!("CARGO_PKG_VERSION"));

/// Creates the HTTP client used for the club API.
///
/// No timeout is applied unless `api.timeout_secs` is configured; requests
/// then run until the server answers or the connection fails.
///
/// # Arguments
///
/// * `config` - The API section of the application config
///
/// # Returns
///
/// A new reqwest::Client instance with the specified configuration
pub fn create_client(config: &ApiConfig) -> Result<Client, ReqwestError> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_and_without_timeout() {
        let mut config = ApiConfig::default();
        assert!(create_client(&config).is_ok());
        config.timeout_secs = Some(5);
        assert!(create_client(&config).is_ok());
    }
}
