//! Start-up wiring: runtime, storage, services and the HTTP state

use std::sync::Arc;

use bhada_adapter_email::{EmailClient, EmailSender, EmailTemplate, LoggingEmailSender};
use bhada_adapter_postgres::{PostgresConfig, create_pool};
use bhada_auth_core::TokenService;
use bhada_config::{AppConfig, StorageBackend};
use bhada_errors::{AppError, AppResult};
use bhada_telemetry::{init_tracing, init_tracing_json};
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::api::http::AppState;
use crate::application::handlers::{AccountQueryHandler, AuthCommandHandler, WalletQueryHandler};
use crate::application::services::AuthService;
use crate::domain::repositories::{AccountRepository, OtpRepository, WalletRepository};
use crate::domain::services::{OtpNotifier, OtpPolicy, OtpService, WalletService};
use crate::infrastructure::notification::{ChannelOtpNotifier, LoggingSmsSender};
use crate::infrastructure::persistence::memory::{
    InMemoryAccountRepository, InMemoryOtpRepository, InMemoryWalletRepository, MemoryProbe,
};
use crate::infrastructure::persistence::{
    PostgresAccountRepository, PostgresOtpRepository, PostgresProbe, PostgresWalletRepository,
    StorageProbe,
};

/// Tracing set-up; JSON lines in production
pub fn init_runtime(config: &AppConfig) {
    if config.is_production() || config.telemetry.json {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Repository set for one storage backend
#[derive(Clone)]
pub struct Storage {
    pub otp: Arc<dyn OtpRepository>,
    pub accounts: Arc<dyn AccountRepository>,
    pub wallet: Arc<dyn WalletRepository>,
    pub probe: Arc<dyn StorageProbe>,
}

impl Storage {
    pub fn in_memory() -> Self {
        Self {
            otp: Arc::new(InMemoryOtpRepository::new()),
            accounts: Arc::new(InMemoryAccountRepository::new()),
            wallet: Arc::new(InMemoryWalletRepository::new()),
            probe: Arc::new(MemoryProbe),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            otp: Arc::new(PostgresOtpRepository::new(pool.clone())),
            accounts: Arc::new(PostgresAccountRepository::new(pool.clone())),
            wallet: Arc::new(PostgresWalletRepository::new(pool.clone())),
            probe: Arc::new(PostgresProbe::new(pool)),
        }
    }

    /// Connect the configured backend, running migrations when asked to
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        match config.storage.backend {
            StorageBackend::Memory => {
                warn!("Using in-memory storage; data is lost on restart");
                Ok(Self::in_memory())
            }
            StorageBackend::Postgres => {
                let database = config.database.as_ref().ok_or_else(|| {
                    AppError::internal("storage.backend = \"postgres\" without [database]")
                })?;

                let pool = create_pool(&PostgresConfig::from(database)).await?;

                if database.run_migrations {
                    sqlx::migrate!("./migrations")
                        .run(&pool)
                        .await
                        .map_err(|e| AppError::database(format!("Migration failed: {}", e)))?;
                    info!("Database migrations applied");
                }

                Ok(Self::postgres(pool))
            }
        }
    }
}

/// Email when SMTP is configured, the log otherwise
pub fn build_notifier(config: &AppConfig) -> AppResult<Arc<dyn OtpNotifier>> {
    let log_body = config.is_development();
    let sms = Arc::new(LoggingSmsSender::new(log_body));

    let notifier = match &config.email {
        Some(email) => {
            let sender: Arc<dyn EmailSender> = Arc::new(EmailClient::new(email.clone()));
            let notifier = ChannelOtpNotifier::new(sender, sms, config.app_name.clone());
            match &email.template_dir {
                Some(dir) => notifier.with_templates(Arc::new(EmailTemplate::new(dir)?)),
                None => notifier,
            }
        }
        None => {
            warn!("No [email] section configured; verification codes are only logged");
            ChannelOtpNotifier::new(
                Arc::new(LoggingEmailSender::new(log_body)),
                sms,
                config.app_name.clone(),
            )
        }
    };

    Ok(Arc::new(notifier))
}

/// Domain and application services over one storage backend
#[derive(Clone)]
pub struct Services {
    pub otp: Arc<OtpService>,
    pub wallet: Arc<WalletService>,
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenService>,
}

impl Services {
    pub fn new(
        storage: &Storage,
        notifier: Arc<dyn OtpNotifier>,
        tokens: TokenService,
        otp_policy: OtpPolicy,
        welcome_bonus: i64,
    ) -> Self {
        let tokens = Arc::new(tokens);
        let otp = Arc::new(OtpService::new(storage.otp.clone(), notifier, otp_policy));
        let wallet = Arc::new(WalletService::new(storage.wallet.clone()));
        let auth = Arc::new(AuthService::new(
            storage.accounts.clone(),
            otp.clone(),
            wallet.clone(),
            tokens.clone(),
            welcome_bonus,
        ));

        Self {
            otp,
            wallet,
            auth,
            tokens,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        storage: &Storage,
        notifier: Arc<dyn OtpNotifier>,
    ) -> Self {
        let tokens = TokenService::new(
            config.jwt.secret.expose_secret(),
            config.jwt.expires_in as i64,
            config.jwt.refresh_expires_in as i64,
            config.jwt.issuer.clone(),
            config.jwt.audience.clone(),
        );

        Self::new(
            storage,
            notifier,
            tokens,
            OtpPolicy::from(&config.otp),
            config.wallet.welcome_bonus,
        )
    }

    pub fn state(&self, storage: &Storage, metrics: Option<PrometheusHandle>) -> AppState {
        AppState {
            commands: Arc::new(AuthCommandHandler::new(self.auth.clone())),
            accounts: Arc::new(AccountQueryHandler::new(self.auth.clone())),
            wallet: Arc::new(WalletQueryHandler::new(self.wallet.clone())),
            tokens: self.tokens.clone(),
            storage: storage.probe.clone(),
            metrics,
        }
    }
}
