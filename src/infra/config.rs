use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use env_helpers::get_env_default;
use secrecy::SecretString;
use strum::{AsRefStr, Display, EnumString};
use url::Url;

use super::InfraError;
use crate::adapters::store::airtable::{DEFAULT_API_BASE, DEFAULT_TABLE_NAME};

const AIRTABLE_KEY_PLACEHOLDER: &str = "YOUR_AIRTABLE_API_KEY";
const AIRTABLE_BASE_PLACEHOLDER: &str = "YOUR_AIRTABLE_BASE_ID";

/// Record store the waitlist is persisted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum WaitlistBackend {
    Airtable,
    Supabase,
    Postgres,
    Simulated,
}

pub struct AirtableConfig {
    pub api_key: SecretString,
    pub base_id: String,
    pub table_name: String,
    pub api_base: Url,
}

impl AirtableConfig {
    /// `None` when the key or base id is missing, empty, or still the
    /// placeholder from the example env file.
    pub fn from_parts(
        api_key: Option<String>,
        base_id: Option<String>,
        table_name: Option<String>,
        api_base: Url,
    ) -> Option<Self> {
        let api_key = non_empty(api_key).filter(|k| k != AIRTABLE_KEY_PLACEHOLDER)?;
        let base_id = non_empty(base_id).filter(|b| b != AIRTABLE_BASE_PLACEHOLDER)?;
        Some(Self {
            api_key: SecretString::new(api_key.into()),
            base_id,
            table_name: non_empty(table_name).unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            api_base,
        })
    }
}

pub struct SupabaseConfig {
    pub url: Url,
    pub anon_key: SecretString,
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy.
    /// SECURITY: Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,
    pub backend: WaitlistBackend,
    pub airtable: Option<AirtableConfig>,
    pub supabase: Option<SupabaseConfig>,
    pub database_url: Option<String>,
    /// Added to the stored record count before it is reported.
    pub base_count: u64,
    pub count_cache_ttl: Duration,
    pub webhook_urls: Vec<Url>,
    pub webhook_secret: Option<SecretString>,
    /// In-process rate limiting is used when unset.
    pub redis_url: Option<String>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    pub rate_limit_per_email: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid {
                    var: "CORS_ORIGIN",
                    reason: "not a valid header value".into(),
                })?;

        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3001)),
        );
        // Default to false for security - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let airtable_api_base = parse_url(
            "AIRTABLE_API_BASE",
            &get_env_default("AIRTABLE_API_BASE", DEFAULT_API_BASE.to_string()),
        )?;
        let airtable = AirtableConfig::from_parts(
            optional_env("AIRTABLE_API_KEY"),
            optional_env("AIRTABLE_BASE_ID"),
            optional_env("AIRTABLE_TABLE_NAME"),
            airtable_api_base,
        );

        let supabase = match (optional_env("SUPABASE_URL"), optional_env("SUPABASE_ANON_KEY")) {
            (Some(url), Some(key)) => Some(SupabaseConfig {
                url: parse_url("SUPABASE_URL", &url)?,
                anon_key: SecretString::new(key.into()),
            }),
            _ => None,
        };

        let database_url = optional_env("DATABASE_URL");

        let requested = optional_env("WAITLIST_BACKEND")
            .map(|raw| {
                raw.to_lowercase()
                    .parse::<WaitlistBackend>()
                    .map_err(|_| InfraError::ConfigInvalid {
                        var: "WAITLIST_BACKEND",
                        reason: format!("unknown backend '{raw}'"),
                    })
            })
            .transpose()?;

        let backend = resolve_backend(
            requested,
            airtable.is_some(),
            supabase.is_some(),
            database_url.is_some(),
        )?;

        let webhook_urls = parse_webhook_urls(&optional_env("WEBHOOK_URLS").unwrap_or_default())?;
        let webhook_secret = optional_env("WEBHOOK_SECRET").map(|s| SecretString::new(s.into()));

        let base_count: u64 = get_env_default("WAITLIST_BASE_COUNT", 18);
        let count_cache_ttl_secs: u64 = get_env_default("COUNT_CACHE_TTL_SECS", 10);

        let redis_url = optional_env("REDIS_URL");
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 10);
        let rate_limit_per_email: u64 = get_env_default("RATE_LIMIT_PER_EMAIL", 5);

        Ok(Self {
            bind_addr,
            cors_origin,
            trust_proxy,
            backend,
            airtable,
            supabase,
            database_url,
            base_count,
            count_cache_ttl: Duration::from_secs(count_cache_ttl_secs),
            webhook_urls,
            webhook_secret,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            rate_limit_per_email,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn optional_env(var: &str) -> Option<String> {
    non_empty(std::env::var(var).ok())
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, InfraError> {
    Url::parse(raw).map_err(|e| InfraError::ConfigInvalid {
        var,
        reason: e.to_string(),
    })
}

/// Explicit choice wins; otherwise the first configured store in
/// Airtable, Supabase, Postgres order, falling back to the simulated store.
pub fn resolve_backend(
    requested: Option<WaitlistBackend>,
    airtable: bool,
    supabase: bool,
    postgres: bool,
) -> Result<WaitlistBackend, InfraError> {
    match requested {
        Some(WaitlistBackend::Airtable) if !airtable => Err(InfraError::ConfigMissing {
            var: "AIRTABLE_API_KEY",
        }),
        Some(WaitlistBackend::Supabase) if !supabase => Err(InfraError::ConfigMissing {
            var: "SUPABASE_URL",
        }),
        Some(WaitlistBackend::Postgres) if !postgres => Err(InfraError::ConfigMissing {
            var: "DATABASE_URL",
        }),
        Some(backend) => Ok(backend),
        None if airtable => Ok(WaitlistBackend::Airtable),
        None if supabase => Ok(WaitlistBackend::Supabase),
        None if postgres => Ok(WaitlistBackend::Postgres),
        None => Ok(WaitlistBackend::Simulated),
    }
}

pub fn parse_webhook_urls(raw: &str) -> Result<Vec<Url>, InfraError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_url("WEBHOOK_URLS", s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn api_base() -> Url {
        Url::parse(DEFAULT_API_BASE).unwrap()
    }

    #[test]
    fn airtable_placeholders_count_as_unconfigured() {
        assert!(
            AirtableConfig::from_parts(
                Some(AIRTABLE_KEY_PLACEHOLDER.into()),
                Some("appXYZ".into()),
                None,
                api_base(),
            )
            .is_none()
        );
        assert!(
            AirtableConfig::from_parts(
                Some("key123".into()),
                Some(AIRTABLE_BASE_PLACEHOLDER.into()),
                None,
                api_base(),
            )
            .is_none()
        );
        assert!(
            AirtableConfig::from_parts(Some("  ".into()), Some("appXYZ".into()), None, api_base())
                .is_none()
        );
    }

    #[test]
    fn airtable_table_name_defaults() {
        let cfg = AirtableConfig::from_parts(
            Some("key123".into()),
            Some("appXYZ".into()),
            None,
            api_base(),
        )
        .unwrap();
        assert_eq!(cfg.table_name, "Waitlist Signups");
        assert_eq!(cfg.api_key.expose_secret(), "key123");
    }

    #[test]
    fn backend_defaults_to_first_configured() {
        assert_eq!(
            resolve_backend(None, true, true, true).unwrap(),
            WaitlistBackend::Airtable
        );
        assert_eq!(
            resolve_backend(None, false, true, true).unwrap(),
            WaitlistBackend::Supabase
        );
        assert_eq!(
            resolve_backend(None, false, false, true).unwrap(),
            WaitlistBackend::Postgres
        );
        assert_eq!(
            resolve_backend(None, false, false, false).unwrap(),
            WaitlistBackend::Simulated
        );
    }

    #[test]
    fn explicit_backend_must_be_configured() {
        assert!(resolve_backend(Some(WaitlistBackend::Supabase), true, false, false).is_err());
        assert_eq!(
            resolve_backend(Some(WaitlistBackend::Postgres), true, false, true).unwrap(),
            WaitlistBackend::Postgres
        );
        assert_eq!(
            resolve_backend(Some(WaitlistBackend::Simulated), true, true, true).unwrap(),
            WaitlistBackend::Simulated
        );
    }

    #[test]
    fn backend_names_parse_lowercase() {
        assert_eq!(
            "supabase".parse::<WaitlistBackend>().unwrap(),
            WaitlistBackend::Supabase
        );
        assert_eq!(WaitlistBackend::Airtable.to_string(), "airtable");
        assert!("mysql".parse::<WaitlistBackend>().is_err());
    }

    #[test]
    fn webhook_urls_split_on_commas() {
        let urls =
            parse_webhook_urls(" https://hooks.example.com/a, ,https://hooks.example.com/b ")
                .unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[1].as_str(), "https://hooks.example.com/b");
        assert!(parse_webhook_urls("").unwrap().is_empty());
        assert!(parse_webhook_urls("not a url").is_err());
    }
}
