//! OpenAI embeddings API request and response types.

use serde::{Deserialize, Serialize};

/// Request body for the embeddings endpoint.
#[derive(Debug, Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<String>,
}

/// Response from the embeddings endpoint.
#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Single embedding data point.
#[derive(Debug, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
    pub index: usize,
}

/// Error envelope returned by OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
pub struct OpenAIErrorResponse {
    pub error: OpenAIError,
}

/// Error details.
#[derive(Debug, Deserialize)]
pub struct OpenAIError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_float_encoding() {
        let req = EmbeddingRequest {
            model: "m".to_string(),
            input: vec!["hello".to_string()],
            encoding_format: Some("float".to_string()),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["input"][0], "hello");
        assert_eq!(json["encoding_format"], "float");
    }

    #[test]
    fn test_response_without_model_or_usage() {
        let resp: EmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"embedding":[0.1,0.2],"index":0}]}"#).unwrap();
        assert_eq!(resp.data.len(), 1);
        assert!(resp.model.is_none());
    }

    #[test]
    fn test_error_response_parses_type_field() {
        let resp: OpenAIErrorResponse = serde_json::from_str(
            r#"{"error":{"message":"bad key","type":"invalid_request_error","code":"invalid_api_key"}}"#,
        )
        .unwrap();
        assert_eq!(resp.error.error_type, "invalid_request_error");
        assert_eq!(resp.error.code.as_deref(), Some("invalid_api_key"));
    }
}
