use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    str::FromStr,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use fastembed::{EmbeddingModel, ModelTrait, TextEmbedding, TextInitOptions};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    error::RagError,
    utils::config::{AppConfig, EmbeddingBackendKind},
};

const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: EmbeddingInner,
}

impl std::fmt::Debug for EmbeddingProvider {
    /// Manual impl: backend handles (HTTP clients, model sessions) have no
    /// `Debug`, so only the embedding space identity is shown.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("backend", &self.backend_label())
            .field("model", &self.model_code())
            .field("dimension", &self.dimension())
            .finish()
    }
}

#[derive(Clone)]
enum EmbeddingInner {
    OpenAI {
        client: Arc<Client<OpenAIConfig>>,
        model: String,
        dimensions: u32,
    },
    Hashed {
        dimension: usize,
    },
    FastEmbed {
        model: Arc<Mutex<TextEmbedding>>,
        model_name: EmbeddingModel,
        dimension: usize,
    },
}

impl EmbeddingProvider {
    /// Builds the provider selected by `embedding_backend`, failing before any
    /// corpus work when the backend's credentials are missing.
    pub async fn from_config(config: &AppConfig) -> Result<Self, RagError> {
        debug!(
            backend = config.embedding_backend.label(),
            "initialising embedding backend"
        );

        match config.embedding_backend {
            EmbeddingBackendKind::Hashed => Self::new_hashed(config.embedding_dimensions),
            EmbeddingBackendKind::FastEmbed => {
                Self::new_fastembed(config.embedding_model.clone()).await
            }
            EmbeddingBackendKind::OpenAI => {
                let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
                    RagError::Configuration(
                        "openai_api_key is required when embedding_backend is 'openai'".to_string(),
                    )
                })?;
                let dimensions = u32::try_from(config.embedding_dimensions).map_err(|_| {
                    RagError::Configuration(format!(
                        "embedding_dimensions {} is out of range",
                        config.embedding_dimensions
                    ))
                })?;
                let client = Arc::new(Client::with_config(
                    OpenAIConfig::new()
                        .with_api_key(api_key)
                        .with_api_base(&config.openai_base_url),
                ));
                let model = config
                    .embedding_model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OPENAI_EMBEDDING_MODEL.to_string());

                Ok(Self::new_openai(client, model, dimensions))
            }
        }
    }

    pub fn backend_label(&self) -> &'static str {
        match self.inner {
            EmbeddingInner::Hashed { .. } => "hashed",
            EmbeddingInner::FastEmbed { .. } => "fastembed",
            EmbeddingInner::OpenAI { .. } => "openai",
        }
    }

    pub fn dimension(&self) -> usize {
        match &self.inner {
            EmbeddingInner::Hashed { dimension } => *dimension,
            EmbeddingInner::FastEmbed { dimension, .. } => *dimension,
            EmbeddingInner::OpenAI { dimensions, .. } => *dimensions as usize,
        }
    }

    pub fn model_code(&self) -> Option<String> {
        match &self.inner {
            EmbeddingInner::FastEmbed { model_name, .. } => Some(model_name.to_string()),
            EmbeddingInner::OpenAI { model, .. } => Some(model.clone()),
            EmbeddingInner::Hashed { .. } => None,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match &self.inner {
            EmbeddingInner::Hashed { dimension } => Ok(hashed_embedding(text, *dimension)),
            EmbeddingInner::FastEmbed { model, .. } => {
                let mut guard = model.lock().await;
                let embeddings = guard
                    .embed(vec![text.to_owned()], None)
                    .context("generating fastembed vector")?;
                embeddings
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow!("fastembed returned no embedding for input"))
            }
            EmbeddingInner::OpenAI {
                client,
                model,
                dimensions,
            } => {
                let request = CreateEmbeddingRequestArgs::default()
                    .model(model.clone())
                    .input([text])
                    .dimensions(*dimensions)
                    .build()?;

                let response = client.embeddings().create(request).await?;

                let embedding = response
                    .data
                    .first()
                    .ok_or_else(|| anyhow!("No embedding data received from OpenAI API"))?
                    .embedding
                    .clone();

                Ok(embedding)
            }
        }
    }

    pub async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        match &self.inner {
            EmbeddingInner::Hashed { dimension } => Ok(texts
                .into_iter()
                .map(|text| hashed_embedding(&text, *dimension))
                .collect()),
            EmbeddingInner::FastEmbed { model, .. } => {
                if texts.is_empty() {
                    return Ok(Vec::new());
                }
                let mut guard = model.lock().await;
                guard
                    .embed(texts, None)
                    .context("generating fastembed batch embeddings")
            }
            EmbeddingInner::OpenAI {
                client,
                model,
                dimensions,
            } => {
                if texts.is_empty() {
                    return Ok(Vec::new());
                }

                let request = CreateEmbeddingRequestArgs::default()
                    .model(model.clone())
                    .input(texts)
                    .dimensions(*dimensions)
                    .build()?;

                let response = client.embeddings().create(request).await?;

                let embeddings: Vec<Vec<f32>> = response
                    .data
                    .into_iter()
                    .map(|item| item.embedding)
                    .collect();

                Ok(embeddings)
            }
        }
    }

    pub fn new_openai(client: Arc<Client<OpenAIConfig>>, model: String, dimensions: u32) -> Self {
        EmbeddingProvider {
            inner: EmbeddingInner::OpenAI {
                client,
                model,
                dimensions,
            },
        }
    }

    pub async fn new_fastembed(model_override: Option<String>) -> Result<Self, RagError> {
        let model_name = if let Some(code) = model_override {
            EmbeddingModel::from_str(&code).map_err(|err| {
                RagError::Configuration(format!("unknown fastembed model '{code}': {err}"))
            })?
        } else {
            EmbeddingModel::default()
        };

        let options = TextInitOptions::new(model_name.clone()).with_show_download_progress(true);
        let model_name_for_task = model_name.clone();
        let model_name_code = model_name.to_string();

        let (model, dimension) = tokio::task::spawn_blocking(move || -> Result<_> {
            let model =
                TextEmbedding::try_new(options).context("initialising FastEmbed text model")?;
            let info = EmbeddingModel::get_model_info(&model_name_for_task)
                .ok_or_else(|| anyhow!("FastEmbed model metadata missing for {model_name_code}"))?;
            Ok((model, info.dim))
        })
        .await??;

        Ok(EmbeddingProvider {
            inner: EmbeddingInner::FastEmbed {
                model: Arc::new(Mutex::new(model)),
                model_name,
                dimension,
            },
        })
    }

    pub fn new_hashed(dimension: usize) -> Result<Self, RagError> {
        Ok(EmbeddingProvider {
            inner: EmbeddingInner::Hashed {
                dimension: dimension.max(1),
            },
        })
    }
}

// Helper functions for hashed embeddings
fn hashed_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let dim = dimension.max(1);
    let mut vector = vec![0.0f32; dim];
    if text.is_empty() {
        return vector;
    }

    let mut token_count = 0f32;
    for token in tokens(text) {
        token_count += 1.0;
        let idx = bucket(&token, dim);
        vector[idx] += 1.0;
    }

    if token_count == 0.0 {
        return vector;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }

    vector
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
}

fn bucket(token: &str, dimension: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    (hasher.finish() as usize) % dimension
}
