//! Client for the external fruit grading service.
//!
//! The service takes an image as multipart field `image` and answers with a
//! grade letter and a set of 0-100 scores, or with an `error` when the
//! picture does not show a fruit.

use crate::config::GradingConfig;
use crate::models::{Grade, QualityScores};
use crate::utils::ImageUpload;
use async_trait::async_trait;
use serde_json::Value;
use service_core::observability::TracedClientExt;
use std::time::Duration;
use thiserror::Error;

/// Score used when the service omits one or sends something unreadable.
pub const DEFAULT_SCORE: f64 = 60.0;

#[derive(Error, Debug)]
pub enum GradingError {
    #[error("{0}")]
    NotAFruit(String),

    #[error("AI service error: {0}")]
    Unavailable(String),

    #[error("AI service returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeReport {
    pub grade: Grade,
    pub scores: QualityScores,
}

#[async_trait]
pub trait FruitGrader: Send + Sync {
    async fn grade(
        &self,
        image: &ImageUpload,
        request_id: Option<&str>,
    ) -> Result<GradeReport, GradingError>;
}

pub struct HttpGrader {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpGrader {
    pub fn new(config: &GradingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl FruitGrader for HttpGrader {
    async fn grade(
        &self,
        image: &ImageUpload,
        request_id: Option<&str>,
    ) -> Result<GradeReport, GradingError> {
        let part = reqwest::multipart::Part::bytes(image.data.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| GradingError::Unavailable(format!("invalid image type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let request = self
            .client
            .traced_post(&self.url)
            .multipart(form)
            .timeout(self.timeout);
        let sent = match request_id {
            Some(id) => request.send_with_request_id(id).await,
            None => request.send().await,
        };
        let response = sent.map_err(|e| GradingError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GradingError::Unavailable(format!("failed to read response body: {}", e))
        })?;

        tracing::debug!(status = %status, "Grading service responded");

        interpret_response(status.as_u16(), &body)
    }
}

/// Turn a raw grading-service answer into a report or a typed failure.
pub fn interpret_response(status: u16, body: &str) -> Result<GradeReport, GradingError> {
    let success = (200..300).contains(&status);
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    if !success {
        return match parsed.as_ref().and_then(error_message) {
            Some(message) => Err(GradingError::NotAFruit(message)),
            None => Err(GradingError::Unavailable(format!(
                "request failed with status code {}",
                status
            ))),
        };
    }

    let payload = parsed
        .ok_or_else(|| GradingError::InvalidResponse("response is not JSON".to_string()))?;

    if let Some(message) = error_message(&payload) {
        let is_fruit = payload
            .get("is_fruit")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !is_fruit {
            return Err(GradingError::NotAFruit(message));
        }
    }

    let grade = match payload.get("grade") {
        None | Some(Value::Null) => Grade::default(),
        Some(Value::String(letter)) => letter
            .parse()
            .map_err(|_| GradingError::InvalidResponse(format!("unknown grade {:?}", letter)))?,
        Some(other) => {
            return Err(GradingError::InvalidResponse(format!(
                "grade is not a string: {}",
                other
            )))
        }
    };

    Ok(GradeReport {
        grade,
        scores: QualityScores {
            total: score(&payload, "score"),
            color: score(&payload, "color_score"),
            texture: score(&payload, "texture_score"),
            shape: score(&payload, "shape_score"),
            defect: score(&payload, "defect_score"),
        },
    })
}

fn error_message(payload: &Value) -> Option<String> {
    match payload.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

/// Numbers and numeric strings are accepted; anything else falls back to the default.
fn score(payload: &Value, key: &str) -> f64 {
    let value = match payload.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite()).unwrap_or(DEFAULT_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_report_is_read() {
        let body = r#"{"grade":"B","score":82.5,"color_score":"79","texture_score":85,
                       "shape_score":80,"defect_score":90,"is_fruit":true}"#;
        let report = interpret_response(200, body).unwrap();

        assert_eq!(report.grade, Grade::B);
        assert_eq!(report.scores.total, 82.5);
        assert_eq!(report.scores.color, 79.0);
        assert_eq!(report.scores.defect, 90.0);
    }

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let report = interpret_response(200, r#"{"score":"n/a","texture_score":0}"#).unwrap();

        assert_eq!(report.grade, Grade::C);
        assert_eq!(report.scores.total, DEFAULT_SCORE);
        assert_eq!(report.scores.color, DEFAULT_SCORE);
        assert_eq!(report.scores.texture, 0.0);
    }

    #[test]
    fn error_with_success_status_means_not_a_fruit() {
        let err = interpret_response(200, r#"{"error":"No fruit detected","is_fruit":false}"#)
            .unwrap_err();
        assert!(matches!(err, GradingError::NotAFruit(ref m) if m == "No fruit detected"));
    }

    #[test]
    fn error_body_on_failure_status_means_not_a_fruit() {
        let err = interpret_response(400, r#"{"error":"This looks like a cat"}"#).unwrap_err();
        assert!(matches!(err, GradingError::NotAFruit(ref m) if m == "This looks like a cat"));
    }

    #[test]
    fn bare_failure_status_is_unavailable() {
        let err = interpret_response(503, "upstream down").unwrap_err();
        assert!(matches!(err, GradingError::Unavailable(_)));
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn unknown_grade_is_invalid() {
        let err = interpret_response(200, r#"{"grade":"Z"}"#).unwrap_err();
        assert!(matches!(err, GradingError::InvalidResponse(_)));
    }

    #[test]
    fn non_json_success_is_invalid() {
        let err = interpret_response(200, "<html>").unwrap_err();
        assert!(matches!(err, GradingError::InvalidResponse(_)));
    }
}
