use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_parsed, is_production};
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub common: core_config::Config,
    pub kairnial: KairnialSettings,
    pub pagination: PaginationSettings,
    pub upstream: UpstreamSettings,
    pub observability: ObservabilitySettings,
    pub defaults: TestDefaults,
}

/// Upstream hosts and token verification material, read from `KAIRNIAL_*`.
#[derive(Debug, Clone, Deserialize)]
pub struct KairnialSettings {
    /// Auth server base URL (token exchange, project listing).
    pub auth_server: String,
    /// Expected `iss` claim on inbound tokens when set.
    #[serde(default)]
    pub auth_domain: Option<String>,
    /// RS256 public key (PEM) used to verify inbound bearer tokens.
    pub auth_public_key: String,
    /// WebServices base URL.
    pub ws_server: String,
    #[serde(default)]
    pub front_server: Option<String>,
    #[serde(default)]
    pub cross_server: Option<String>,
}

impl KairnialSettings {
    /// PEM with escaped newlines expanded, so single-line env values work.
    pub fn public_key_pem(&self) -> String {
        self.auth_public_key.replace("\\n", "\n")
    }

    pub fn issuer(&self) -> Option<&str> {
        self.auth_domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationSettings {
    /// Applied when the client sends no (or a non-positive) `page_limit`.
    pub default_page_size: i64,
    /// Hard cap on `page_limit`.
    pub max_page_size: i64,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            max_page_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UpstreamSettings {
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObservabilitySettings {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            otlp_endpoint: None,
        }
    }
}

/// Credentials used by smoke tests against a real tenant.
#[derive(Debug, Clone, Default)]
pub struct TestDefaults {
    pub client_id: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<Secret<String>>,
    pub project_id: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        // Loads .env and APP__ overrides for host/port.
        let common = core_config::Config::load()?;
        let is_prod = is_production();

        let kairnial: KairnialSettings = config::Config::builder()
            .add_source(config::Environment::with_prefix("KAIRNIAL").prefix_separator("_"))
            .build()?
            .try_deserialize()?;

        if kairnial.auth_public_key.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "KAIRNIAL_AUTH_PUBLIC_KEY is empty"
            )));
        }

        let pagination = PaginationSettings {
            default_page_size: get_env_parsed("PAGE_SIZE", 100)?,
            max_page_size: get_env_parsed("MAX_PAGE_SIZE", 1000)?,
        };
        if pagination.default_page_size <= 0 || pagination.max_page_size < pagination.default_page_size
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PAGE_SIZE must be positive and not exceed MAX_PAGE_SIZE"
            )));
        }

        let upstream = UpstreamSettings {
            timeout: Duration::from_secs(get_env_parsed("UPSTREAM_TIMEOUT_SECS", 30)?),
            cache_ttl: Duration::from_secs(get_env_parsed("WS_CACHE_TTL_SECS", 300)?),
        };

        let observability = ObservabilitySettings {
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        };

        let defaults = TestDefaults {
            client_id: env::var("DEFAULT_KAIRNIAL_CLIENT_ID").ok(),
            api_key: env::var("DEFAULT_KAIRNIAL_API_KEY").ok(),
            api_secret: env::var("DEFAULT_KAIRNIAL_API_SECRET").ok().map(Secret::new),
            project_id: env::var("DEFAULT_KAIRNIAL_PROJECT_ID").ok(),
        };

        if is_prod && kairnial.issuer().is_none() {
            tracing::warn!("KAIRNIAL_AUTH_DOMAIN not set; token issuer will not be checked");
        }

        Ok(Self {
            common,
            kairnial,
            pagination,
            upstream,
            observability,
            defaults,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(domain: Option<&str>) -> KairnialSettings {
        KairnialSettings {
            auth_server: "https://auth.example".to_string(),
            auth_domain: domain.map(str::to_string),
            auth_public_key: "-----BEGIN PUBLIC KEY-----\\nABC\\n-----END PUBLIC KEY-----".to_string(),
            ws_server: "https://ws.example".to_string(),
            front_server: None,
            cross_server: None,
        }
    }

    #[test]
    fn expands_escaped_newlines_in_public_key() {
        let pem = settings(None).public_key_pem();
        assert_eq!(pem.lines().count(), 3);
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
    }

    #[test]
    fn blank_auth_domain_means_no_issuer_check() {
        assert_eq!(settings(Some("  ")).issuer(), None);
        assert_eq!(
            settings(Some("https://auth.example")).issuer(),
            Some("https://auth.example")
        );
    }
}
