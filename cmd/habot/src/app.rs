//! Wires configuration into a running bot.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use habot_bot::{
    Bot, CognitiveSentiment, CognitiveTranscriber, HttpFetcher, IdentityResolver, Services,
    StaticIdentityTable,
};
use habot_cognitive::{
    Client, ClientBuilder, DEFAULT_SPEAKER_URL, DEFAULT_SPEECH_URL, DEFAULT_TEXT_ANALYTICS_URL,
};
use habot_store::{ConversationStore, MemoryStore, RedbStore};
use tracing::info;

use crate::config::{
    Config, ServiceConfig, StoreConfig, ENV_SENTIMENT_KEY, ENV_SPEAKER_KEY, ENV_SPEECH_KEY,
};

fn client(
    service: &ServiceConfig,
    default_url: &str,
    env: &str,
    name: &str,
) -> Result<ClientBuilder> {
    if service.key.is_empty() {
        bail!("{name} key is not configured; set it in the config file or {env}");
    }
    let endpoint = if service.endpoint.is_empty() {
        default_url
    } else {
        service.endpoint.as_str()
    };
    let mut builder = Client::builder(service.key.clone()).base_url(endpoint);
    if let Some(retries) = service.max_retries {
        builder = builder.max_retries(retries);
    }
    Ok(builder)
}

fn store(cfg: &StoreConfig) -> Result<Arc<dyn ConversationStore>> {
    let store: Arc<dyn ConversationStore> = match cfg {
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
        StoreConfig::Redb { path } => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let db = RedbStore::open(path)
                .with_context(|| format!("open store {}", path.display()))?;
            info!("conversation records in {}", path.display());
            Arc::new(db)
        }
    };
    Ok(store)
}

/// Builds the bot described by `cfg`.
pub async fn build_bot(cfg: &Config) -> Result<Bot> {
    let speaker = client(&cfg.speaker, DEFAULT_SPEAKER_URL, ENV_SPEAKER_KEY, "speaker")?.build()?;
    let sentiment = client(
        &cfg.sentiment,
        DEFAULT_TEXT_ANALYTICS_URL,
        ENV_SENTIMENT_KEY,
        "sentiment",
    )?
    .build()?;

    let mut speech = client(&cfg.speech.service, DEFAULT_SPEECH_URL, ENV_SPEECH_KEY, "speech")?;
    if !cfg.speech.ws_endpoint.is_empty() {
        speech = speech.ws_url(cfg.speech.ws_endpoint.clone());
    }
    let speech = speech.build()?;

    let fetcher = Arc::new(HttpFetcher::default());
    let transcriber = CognitiveTranscriber::new(
        speech.speech(),
        fetcher.clone(),
        cfg.workflow.stt_transport,
        cfg.workflow.stt_language.clone(),
    )
    .await;
    info!("speech to text over {:?}", transcriber.transport());

    let identities: Arc<dyn IdentityResolver> = match &cfg.identities {
        Some(table) => Arc::new(StaticIdentityTable::from_entries(
            table.iter().map(|(name, id)| (name.as_str(), *id)),
        )),
        None => Arc::new(StaticIdentityTable::builtin()),
    };

    let services = Services {
        speaker: Arc::new(speaker.identification()),
        transcriber: Arc::new(transcriber),
        sentiment: Arc::new(CognitiveSentiment::new(
            sentiment.sentiment(),
            cfg.workflow.sentiment_language.clone(),
        )),
        fetcher,
        identities,
        workflow: cfg.workflow.clone(),
    };

    Ok(Bot::new(services, store(&cfg.store)?)?)
}
