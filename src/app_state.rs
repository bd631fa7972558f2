use std::sync::Arc;

use crate::{
    ai::{AssistantBackend, GroqClient},
    auth::TokenKeys,
    config::Config,
    media::MediaUploader,
    store::{PostgresStore, Store},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenKeys,
    pub assistant: Arc<dyn AssistantBackend>,
    pub media: Option<Arc<MediaUploader>>,
}

impl AppState {
    /// Production wiring: Postgres (migrated), Groq and optional Cloudinary.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = PostgresStore::connect(&config.database).await?;
        let assistant = GroqClient::new(&config.ai);

        if config.ai.api_key.is_none() {
            tracing::warn!("GROQ_API_KEY is not set; AI endpoints will return 500");
        }
        if config.cloudinary.is_none() {
            tracing::info!("Cloudinary is not configured; image uploads are disabled");
        }

        Ok(Self::from_parts(&config, Arc::new(store), Arc::new(assistant)))
    }

    /// Builds state around any store and assistant backend. Only the token
    /// and Cloudinary settings are kept; the rest of `config` is consumed at
    /// startup.
    pub fn from_parts(
        config: &Config,
        store: Arc<dyn Store>,
        assistant: Arc<dyn AssistantBackend>,
    ) -> Self {
        let tokens = TokenKeys::new(&config.auth.jwt_secret, config.auth.token_ttl_days);
        let media = config
            .cloudinary
            .clone()
            .map(|c| Arc::new(MediaUploader::new(c)));

        Self {
            store,
            tokens,
            assistant,
            media,
        }
    }
}
