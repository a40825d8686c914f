use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db;
use crate::domain::seasons::SeasonTable;
use crate::services::mailer::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db_pool: Option<PgPool>,
    pub seasons: Arc<SeasonTable>,
    pub mailer: Mailer,
}

impl AppState {
    pub fn build(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.email_send_timeout_seconds))
            .build()?;

        let db_pool = db::build_pool(&config);
        if db_pool.is_none() {
            tracing::warn!("DATABASE_URL is not set — booking and reminder routes will fail");
        }

        let mailer = Mailer::new(
            http_client,
            config.resend_api_key.clone(),
            config.email_from_address.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            seasons: Arc::new(SeasonTable::default()),
            mailer,
        })
    }
}
