//! Embedding client for the local HTTP embedding service.
//!
//! Talks to an Ollama-compatible endpoint (`/api/embeddings`, `/api/tags`,
//! `/api/pull`) rather than calling into an in-process model. Each indexed
//! symbol gets four vectors, derived from the symbol record by a distinct
//! text-shaping strategy:
//!
//! | Vector | Shaped from |
//! |--------|-------------|
//! | documentation | the doc comment alone |
//! | signature | the proc/type signature alone |
//! | name | the bare identifier |
//! | combined | name + signature + documentation, concatenated |
//!
//! A dimension mismatch between what the service returns and the project's
//! recorded `embedding_metadata.dims` is treated as a provider error, not
//! silently truncated or padded.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::config::EmbeddingConfig;
use crate::models::SymbolRecord;

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

pub struct EmbeddingClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

/// The four text-shaped vectors produced for one symbol. Any entry may be
/// `None` if that strategy produced no usable text (e.g. no documentation).
#[derive(Debug, Default, Clone)]
pub struct SymbolVectors {
    pub documentation: Option<Vec<f32>>,
    pub signature: Option<Vec<f32>>,
    pub name: Option<Vec<f32>>,
    pub combined: Option<Vec<f32>>,
}

impl EmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        if !config.is_enabled() {
            bail!("embedding service is disabled in config");
        }
        let model = config
            .model
            .clone()
            .context("embedding.model must be set when embedding is enabled")?;

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Probes `/api/tags` and confirms the configured model is present.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<TagsResponse>().await {
                Ok(tags) => tags.models.iter().any(|m| m.name == self.model),
                Err(_) => false,
            },
            Ok(resp) => {
                warn!(status = %resp.status(), "embedding service /api/tags returned non-success");
                false
            }
            Err(err) => {
                warn!(error = %err, "embedding service unreachable");
                false
            }
        }
    }

    /// Requests the configured model be pulled (`/api/pull`).
    pub async fn ensure_model(&self) -> Result<()> {
        let url = format!("{}/api/pull", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&json!({ "name": self.model, "stream": false }))
            .send()
            .await
            .context("failed to reach embedding service /api/pull")?;
        if !resp.status().is_success() {
            bail!("embedding service pull failed: {}", resp.status());
        }
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&EmbeddingsRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .context("failed to reach embedding service /api/embeddings")?;

        if !resp.status().is_success() {
            bail!("embedding service returned {}", resp.status());
        }

        let parsed: EmbeddingsResponse = resp
            .json()
            .await
            .context("malformed embedding service response")?;
        Ok(parsed.embedding)
    }

    /// Embeds one text, returning `None` (with a warning logged) rather than
    /// an `Err` on failure — partial embedding coverage is expected, not
    /// fatal, per the store's never-throw-sentinel-return contract.
    async fn embed_or_none(&self, text: &str, expected_dims: Option<usize>) -> Option<Vec<f32>> {
        match self.embed(text).await {
            Ok(vec) => {
                if let Some(expected) = expected_dims {
                    if vec.len() != expected {
                        warn!(got = vec.len(), expected, "embedding dimension mismatch");
                        return None;
                    }
                }
                Some(vec)
            }
            Err(err) => {
                warn!(error = %err, "embedding request failed");
                None
            }
        }
    }

    /// Produces all four vectors for a symbol, per the shaping table above.
    /// Each strategy that yields no usable text (e.g. no documentation, or
    /// a `combined` input that is blank in all three parts) contributes
    /// `None` rather than embedding an empty string.
    pub async fn embed_symbol(&self, symbol: &SymbolRecord, expected_dims: Option<usize>) -> SymbolVectors {
        let documentation = match shape_documentation(symbol.documentation.as_deref().unwrap_or("")) {
            Some(text) => self.embed_or_none(&text, expected_dims).await,
            None => None,
        };
        let signature = match shape_signature(symbol.signature.as_deref().unwrap_or("")) {
            Some(text) => self.embed_or_none(&text, expected_dims).await,
            None => None,
        };
        let name = self
            .embed_or_none(&shape_name(&symbol.name, &symbol.module), expected_dims)
            .await;
        let combined = match shape_combined(
            &symbol.name,
            symbol.signature.as_deref().unwrap_or(""),
            symbol.documentation.as_deref().unwrap_or(""),
        ) {
            Some(text) => self.embed_or_none(&text, expected_dims).await,
            None => None,
        };

        SymbolVectors {
            documentation,
            signature,
            name,
            combined,
        }
    }
}

/// Strips Nim comment markers (`##`, `##*`, `*##`) from a doc string,
/// collapses runs of whitespace around newlines to a single space, and
/// trims. Returns `None` ("empty documentation") if nothing is left.
fn shape_documentation(doc: &str) -> Option<String> {
    let stripped: String = doc
        .lines()
        .map(|line| {
            let trimmed = line.trim();
            trimmed
                .trim_start_matches("##*")
                .trim_start_matches("*##")
                .trim_start_matches("##")
                .trim()
        })
        .collect::<Vec<_>>()
        .join(" ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Collapses whitespace in a signature string and prepends a label so the
/// embedding model sees it as a signature rather than free prose.
fn shape_signature(signature: &str) -> Option<String> {
    let collapsed = signature.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(format!("Function signature: {collapsed}"))
    }
}

/// Converts `camelCase`/`PascalCase` identifiers to space-separated,
/// lowercased words (a space is inserted at every lower→upper transition)
/// and wraps the result with module context, e.g. `"parseJsonValue"` in
/// module `"json"` becomes `"Function: parse json value in module json"`.
fn shape_name(name: &str, module: &str) -> String {
    let mut words = String::new();
    let mut prev_lower = false;
    for ch in name.chars() {
        if prev_lower && ch.is_uppercase() {
            words.push(' ');
        }
        words.push(ch);
        prev_lower = ch.is_lowercase();
    }
    format!("Function: {} in module {}", words.to_lowercase(), module)
}

/// Concatenates name, signature, and cleaned documentation into one
/// descriptive sentence. Fails ("all three parts blank") only if every
/// part is empty.
fn shape_combined(name: &str, signature: &str, documentation: &str) -> Option<String> {
    let mut parts = Vec::new();
    if !name.trim().is_empty() {
        parts.push(format!("Name: {}.", name.trim()));
    }
    let sig = signature.split_whitespace().collect::<Vec<_>>().join(" ");
    if !sig.is_empty() {
        parts.push(format!("Signature: {}.", sig));
    }
    if let Some(doc) = shape_documentation(documentation) {
        parts.push(format!("Description: {}", doc));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Serializes a vector to a MySQL `VECTOR` literal payload (JSON array of
/// floats, which `sqlx` binds as the column's native vector wire type).
pub fn vec_to_json(v: &[f32]) -> serde_json::Value {
    serde_json::Value::Array(
        v.iter()
            .map(|f| {
                serde_json::Number::from_f64(*f as f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            })
            .collect(),
    )
}

/// Cosine similarity between two vectors, used by the in-process fallback
/// path (`findSimilarSymbols` against an ad-hoc query vector not yet
/// persisted). Returns 0.0 for empty or mismatched-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_opposite() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_empty() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_different_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn shape_documentation_strips_markers_and_collapses_whitespace() {
        let doc = "## Parses a JSON string\n  ##   and returns the node.\n*##";
        assert_eq!(
            shape_documentation(doc).as_deref(),
            Some("Parses a JSON string and returns the node.")
        );
    }

    #[test]
    fn shape_documentation_empty_is_none() {
        assert_eq!(shape_documentation(""), None);
        assert_eq!(shape_documentation("##\n##"), None);
    }

    #[test]
    fn shape_signature_prepends_label_and_collapses_whitespace() {
        assert_eq!(
            shape_signature("proc foo(x:   int):\nint"),
            Some("Function signature: proc foo(x: int): int".to_string())
        );
        assert_eq!(shape_signature(""), None);
    }

    #[test]
    fn shape_name_splits_camel_case_and_adds_module() {
        assert_eq!(
            shape_name("parseJsonValue", "json"),
            "Function: parse json value in module json"
        );
        assert_eq!(shape_name("foo", "bar"), "Function: foo in module bar");
    }

    #[test]
    fn shape_combined_omits_blank_sections() {
        let text = shape_combined("parseJson", "proc parseJson(s: string): JsonNode", "## Parse a JSON string").unwrap();
        assert_eq!(
            text,
            "Name: parseJson. Signature: proc parseJson(s: string): JsonNode. Description: Parse a JSON string"
        );
        assert_eq!(shape_combined("foo", "", ""), Some("Name: foo.".to_string()));
    }

    #[test]
    fn shape_combined_all_blank_is_none() {
        assert_eq!(shape_combined("", "", ""), None);
        assert_eq!(shape_combined("", "", "##"), None);
    }
}
