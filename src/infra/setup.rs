use std::fs::File;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{
        http::app_state::AppState,
        store::{airtable::AirtableStore, simulated::SimulatedStore, supabase::SupabaseStore},
    },
    infra::{
        InfraError, RateLimiterTrait,
        config::{AppConfig, WaitlistBackend},
        http_client::try_build_client,
        postgres_persistence,
        rate_limit::{InMemoryRateLimiter, RedisRateLimiter},
        webhook_dispatcher::{NoopNotifier, WebhookDispatcher},
    },
    use_cases::waitlist::{SignupNotifier, WaitlistStore, WaitlistUseCases},
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;

    let store = init_store(&config).await?;

    let notifier: Arc<dyn SignupNotifier> = if config.webhook_urls.is_empty() {
        Arc::new(NoopNotifier)
    } else {
        let dispatcher =
            WebhookDispatcher::new(config.webhook_urls.clone(), config.webhook_secret.clone())?;
        info!(
            endpoints = dispatcher.endpoint_count(),
            signed = config.webhook_secret.is_some(),
            "Webhook fan-out enabled"
        );
        Arc::new(dispatcher)
    };

    let rate_limiter: Arc<dyn RateLimiterTrait> = match &config.redis_url {
        Some(redis_url) => Arc::new(
            RedisRateLimiter::new(
                redis_url,
                config.rate_limit_window_secs,
                config.rate_limit_per_ip,
                config.rate_limit_per_email,
            )
            .await?,
        ),
        None => {
            warn!("REDIS_URL not set, rate limits are per process");
            Arc::new(InMemoryRateLimiter::new(
                config.rate_limit_window_secs,
                config.rate_limit_per_ip,
                config.rate_limit_per_email,
            ))
        }
    };

    let waitlist_use_cases = WaitlistUseCases::new(
        store,
        notifier,
        config.count_cache_ttl,
        config.base_count,
    );

    info!(
        backend = waitlist_use_cases.backend(),
        base_count = config.base_count,
        "Waitlist initialized"
    );

    Ok(AppState {
        config: Arc::new(config),
        waitlist_use_cases: Arc::new(waitlist_use_cases),
        rate_limiter,
    })
}

async fn init_store(config: &AppConfig) -> Result<Arc<dyn WaitlistStore>, InfraError> {
    let store: Arc<dyn WaitlistStore> = match config.backend {
        WaitlistBackend::Airtable => {
            let cfg = config.airtable.as_ref().ok_or(InfraError::ConfigMissing {
                var: "AIRTABLE_API_KEY",
            })?;
            let client = try_build_client().map_err(InfraError::HttpClient)?;
            let store = AirtableStore::new(
                client,
                &cfg.api_base,
                &cfg.base_id,
                &cfg.table_name,
                cfg.api_key.clone(),
            )
            .ok_or(InfraError::ConfigInvalid {
                var: "AIRTABLE_API_BASE",
                reason: "cannot be used as a base URL".into(),
            })?;
            Arc::new(store)
        }
        WaitlistBackend::Supabase => {
            let cfg = config.supabase.as_ref().ok_or(InfraError::ConfigMissing {
                var: "SUPABASE_URL",
            })?;
            let client = try_build_client().map_err(InfraError::HttpClient)?;
            let store = SupabaseStore::new(client, &cfg.url, cfg.anon_key.clone()).ok_or(
                InfraError::ConfigInvalid {
                    var: "SUPABASE_URL",
                    reason: "cannot be used as a base URL".into(),
                },
            )?;
            Arc::new(store)
        }
        WaitlistBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or(InfraError::ConfigMissing {
                    var: "DATABASE_URL",
                })?;
            Arc::new(postgres_persistence(database_url).await?)
        }
        WaitlistBackend::Simulated => {
            warn!("No waitlist backend configured, signups will be simulated and not saved");
            Arc::new(SimulatedStore)
        }
    };
    Ok(store)
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pitchnode=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), skipped when the file can't be created
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
