//! Qdrant-backed `VectorStoreClient`: embeds query text against a
//! multimodal embedding endpoint and performs page-level similarity
//! search over the indexed PDF corpus.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::{
    qdrant::{value::Kind, SearchPointsBuilder},
    Qdrant,
};
use research_config::VectorStoreSettings;
use research_core::{Error, PageRecord, Result, VectorStoreClient};
use serde::{Deserialize, Serialize};

use crate::RagError;

/// Vector store client: owns the Qdrant connection and the HTTP
/// client used to call the external embedding endpoint.
pub struct QdrantVectorStore {
    client: Qdrant,
    http: reqwest::Client,
    settings: VectorStoreSettings,
}

impl QdrantVectorStore {
    pub fn new(settings: VectorStoreSettings) -> Result<Self> {
        let mut builder = Qdrant::from_url(&settings.endpoint);
        if let Some(api_key) = &settings.api_key {
            builder = builder.api_key(api_key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            http,
            settings,
        })
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    inputs: Vec<EmbeddingInput<'a>>,
    model: &'a str,
    input_type: &'a str,
}

#[derive(Debug, Serialize)]
struct EmbeddingInput<'a> {
    content: Vec<EmbeddingContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EmbeddingContentBlock<'a> {
    Text { text: &'a str },
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl VectorStoreClient for QdrantVectorStore {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            inputs: vec![EmbeddingInput {
                content: vec![EmbeddingContentBlock::Text { text }],
            }],
            model: &self.settings.embedding_model,
            input_type: "query",
        };

        let mut req = self.http.post(&self.settings.embedding_endpoint).json(&request);
        if let Some(key) = &self.settings.embedding_api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::classify_upstream(format!("embedding request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::classify_upstream(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::UpstreamPermanent(format!("invalid embedding response: {e}")))?;

        parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::UpstreamPermanent("embedding response had no vectors".to_string()))
    }

    async fn search_top_k(&self, embedding: &[f32], limit: usize) -> Result<Vec<PageRecord>> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.settings.collection, embedding.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| Error::classify_upstream(format!("vector search failed: {e}")))?;

        let mut pages: Vec<PageRecord> = results
            .result
            .into_iter()
            .map(|point| {
                let mut fields: HashMap<String, String> = HashMap::new();
                for (k, v) in point.payload {
                    if let Some(Kind::StringValue(s)) = v.kind {
                        fields.insert(k, s);
                    }
                }
                PageRecord {
                    doc_source: fields.remove("doc_source").unwrap_or_default(),
                    page_num: fields
                        .get("page_num")
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0),
                    file_path: fields.remove("file_path").unwrap_or_default(),
                    markdown_text: fields.remove("markdown_text").unwrap_or_default(),
                    similarity_score: point.score,
                    image_bytes: None,
                }
            })
            .collect();

        pages.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_settings() {
        let settings = VectorStoreSettings::default();
        assert!(QdrantVectorStore::new(settings).is_ok());
    }
}
