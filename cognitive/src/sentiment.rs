//! Text Analytics sentiment service.

use std::sync::Arc;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    http::HttpClient,
};

const SENTIMENT_PATH: &str = "/text/analytics/v2.0/sentiment";

/// Default document language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Sentiment scoring of short texts.
#[derive(Clone)]
pub struct SentimentService {
    http: Arc<HttpClient>,
}

impl SentimentService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Scores one text. The result is in `0.0..=1.0`, higher is more positive.
    pub async fn score(&self, text: &str, language: &str) -> Result<f64> {
        let request = SentimentRequest {
            documents: vec![SentimentDocument {
                language: language.to_string(),
                id: "0".to_string(),
                text: text.to_string(),
            }],
        };

        let response: SentimentResponse = self
            .http
            .request(Method::POST, SENTIMENT_PATH, Some(&request))
            .await?;

        if let Some(doc) = response.documents.into_iter().next() {
            return Ok(doc.score);
        }
        match response.errors.into_iter().next() {
            Some(err) => Err(Error::api("DocumentError", err.message, 200)),
            None => Err(Error::Other("sentiment response carries no document".into())),
        }
    }
}

/// Renders a sentiment score the way the bot reports it, e.g. `07.50% positive`.
pub fn format_score(score: f64) -> String {
    format!("{:05.2}% positive", score * 100.0)
}

#[derive(Debug, Serialize)]
struct SentimentRequest {
    documents: Vec<SentimentDocument>,
}

#[derive(Debug, Serialize)]
struct SentimentDocument {
    language: String,
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    #[serde(default)]
    documents: Vec<ScoredDocument>,
    #[serde(default)]
    errors: Vec<DocumentError>,
}

#[derive(Debug, Deserialize)]
struct ScoredDocument {
    score: f64,
}

#[derive(Debug, Deserialize)]
struct DocumentError {
    #[serde(default)]
    message: String,
}
