//! Adapter selection and HTTP state assembly.
//!
//! A configured `database_url` selects the Diesel stores; otherwise balances
//! and history live in memory for the life of the process.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr, bail};
use mockable::DefaultClock;
use tracing::{info, warn};

use headshot_backend::config::GatewaySettings;
use headshot_backend::domain::ports::{CreditLedger, GenerationMetrics, HistoryRepository};
use headshot_backend::domain::{
    AccountService, Credits, GenerationService, UploadStaging, UserId,
};
use headshot_backend::inbound::http::state::{HttpState, HttpStatePorts};
use headshot_backend::outbound::identity::SignedTokenIdentityProvider;
use headshot_backend::outbound::memory::{InMemoryAccountStore, InMemoryHistoryRepository};
use headshot_backend::outbound::persistence::{
    DbPool, DieselCreditLedger, DieselHistoryRepository, PoolConfig, run_pending_migrations,
};
use headshot_backend::outbound::upstream::HttpGenerationBackend;

const DEMO_CREDITS: u32 = 100;

/// Ledger and history adapters sharing one backing store.
pub(crate) struct Stores {
    pub(crate) ledger: Arc<dyn CreditLedger>,
    pub(crate) history: Arc<dyn HistoryRepository>,
    pub(crate) in_memory_accounts: Option<Arc<InMemoryAccountStore>>,
}

pub(crate) async fn build_stores(settings: &GatewaySettings) -> Result<Stores> {
    let Some(database_url) = settings.database_url() else {
        warn!("no database_url configured; balances and history are kept in memory");
        let accounts = Arc::new(InMemoryAccountStore::new());
        return Ok(Stores {
            ledger: accounts.clone(),
            history: Arc::new(InMemoryHistoryRepository::new()),
            in_memory_accounts: Some(accounts),
        });
    };

    run_pending_migrations(database_url)
        .await
        .wrap_err("failed to apply database migrations")?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("failed to build database pool")?;
    info!("using PostgreSQL stores");
    Ok(Stores {
        ledger: Arc::new(DieselCreditLedger::new(pool.clone())),
        history: Arc::new(DieselHistoryRepository::new(pool)),
        in_memory_accounts: None,
    })
}

pub(crate) fn build_identity(settings: &GatewaySettings) -> Result<SignedTokenIdentityProvider> {
    match settings.token_secret_file() {
        Some(path) => SignedTokenIdentityProvider::from_file(path)
            .wrap_err("failed to load token secret"),
        None if cfg!(debug_assertions) => {
            warn!("no token_secret_file configured; using an ephemeral secret (dev only)");
            SignedTokenIdentityProvider::ephemeral().wrap_err("failed to create ephemeral secret")
        }
        None => bail!("token_secret_file must be configured in release builds"),
    }
}

/// Seed one account so a development server can be exercised end to end.
pub(crate) fn seed_demo_account(
    accounts: &InMemoryAccountStore,
    identity: &SignedTokenIdentityProvider,
) -> Result<()> {
    let user_id = UserId::random();
    accounts
        .set_balance(user_id.clone(), Credits::new(DEMO_CREDITS))
        .wrap_err("failed to seed demo account")?;
    info!(
        %user_id,
        credits = DEMO_CREDITS,
        token = %identity.issue(&user_id),
        "demo account seeded"
    );
    Ok(())
}

pub(crate) fn build_http_state(
    settings: &GatewaySettings,
    stores: Stores,
    identity: SignedTokenIdentityProvider,
    metrics: Arc<dyn GenerationMetrics>,
) -> Result<HttpState> {
    let backend = HttpGenerationBackend::new(settings.upstream_url()?, settings.upstream_timeout()?)
        .wrap_err("failed to build upstream client")?;
    info!(
        endpoint = %backend.endpoint(),
        timeout_secs = settings.upstream_timeout()?.as_secs(),
        "upstream configured"
    );

    let Stores {
        ledger, history, ..
    } = stores;
    let generation = GenerationService::new(
        Arc::clone(&ledger),
        Arc::clone(&history),
        Arc::new(backend),
        Arc::new(DefaultClock),
        settings.generation()?,
    )
    .with_metrics(metrics);
    let accounts = AccountService::new(ledger, history);

    Ok(HttpState::new(
        HttpStatePorts {
            generation: Arc::new(generation),
            accounts: Arc::new(accounts),
            identity: Arc::new(identity),
        },
        UploadStaging::new(settings.upload_dir()),
    ))
}
