use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::types::Sample;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("build client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
    #[error("{error_type}: {message}")]
    Api { error_type: String, message: String },
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unexpected result type '{0}', expected vector")]
    UnexpectedResultType(String),
    #[error("value '{raw}' of {series} is not a number")]
    InvalidSampleValue { series: String, raw: String },
}

/// Samples returned by one instant query, plus any warnings the server
/// attached to the response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    pub samples: Vec<Sample>,
    pub warnings: Vec<String>,
}

/// Anything that can answer an instant query with an ordered list of samples.
pub trait MetricsSource {
    fn query(&self, query: &str) -> impl Future<Output = Result<QueryOutcome, QueryError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    data: Option<QueryData>,
    #[serde(rename = "errorType")]
    error_type: Option<String>,
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct VectorEntry {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: (f64, String),
}

/// Instant query client for the Prometheus HTTP API.
pub struct PrometheusClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl PrometheusClient {
    pub fn new(host: &str, timeout: Duration) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(QueryError::Client)?;
        Ok(Self {
            base_url: normalize_host(host),
            timeout,
            client,
        })
    }
}

impl MetricsSource for PrometheusClient {
    async fn query(&self, query: &str) -> Result<QueryOutcome, QueryError> {
        let url = format!("{}/api/v1/query", self.base_url);
        let time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let timeout = format!("{}s", self.timeout.as_secs().max(1));
        debug!("GET {} query={:?} time={}", url, query, time);

        let res = self
            .client
            .get(&url)
            .query(&[("query", query), ("time", time.as_str()), ("timeout", timeout.as_str())])
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;

        let parsed: ApiResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => return Err(QueryError::Status(status)),
            Err(e) => return Err(QueryError::Malformed(e)),
        };
        parse_response(parsed, status)
    }
}

fn parse_response(resp: ApiResponse, status: reqwest::StatusCode) -> Result<QueryOutcome, QueryError> {
    if resp.status == "error" {
        return Err(QueryError::Api {
            error_type: resp.error_type.unwrap_or_else(|| "error".to_string()),
            message: resp.error.unwrap_or_default(),
        });
    }
    if !status.is_success() {
        return Err(QueryError::Status(status));
    }

    let data = resp
        .data
        .ok_or_else(|| QueryError::UnexpectedResultType("none".to_string()))?;
    if data.result_type != "vector" {
        return Err(QueryError::UnexpectedResultType(data.result_type));
    }

    let entries: Vec<VectorEntry> = serde_json::from_value(data.result)?;
    let mut samples = Vec::with_capacity(entries.len());
    for entry in entries {
        let (_, raw) = entry.value;
        let sample = match raw.trim().parse::<f64>() {
            Ok(value) => Sample::new(entry.metric, value),
            Err(_) => {
                return Err(QueryError::InvalidSampleValue {
                    series: Sample::new(entry.metric, f64::NAN).series(),
                    raw,
                })
            }
        };
        samples.push(sample);
    }

    Ok(QueryOutcome {
        samples,
        warnings: resp.warnings,
    })
}

/// Prefixes `http://` when the host has no scheme and drops trailing slashes.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn parse(body: &str) -> Result<QueryOutcome, QueryError> {
        parse_response(serde_json::from_str(body).unwrap(), StatusCode::OK)
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("prom:9090"), "http://prom:9090");
        assert_eq!(normalize_host("http://prom:9090/"), "http://prom:9090");
        assert_eq!(normalize_host("https://prom.example.com"), "https://prom.example.com");
        assert_eq!(normalize_host("  prom  "), "http://prom");
    }

    #[test]
    fn test_parse_vector() {
        let outcome = parse(
            r#"{"status":"success","data":{"resultType":"vector","result":[
                {"metric":{"__name__":"up","job":"node"},"value":[1700000000.5,"1"]},
                {"metric":{"job":"api"},"value":[1700000000.5,"0.25"]}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(outcome.samples.len(), 2);
        assert_eq!(outcome.samples[0].value, 1.0);
        assert_eq!(outcome.samples[0].series(), "up{job=\"node\"}");
        assert_eq!(outcome.samples[1].value, 0.25);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_parse_special_values() {
        let outcome = parse(
            r#"{"status":"success","data":{"resultType":"vector","result":[
                {"metric":{},"value":[1,"NaN"]},
                {"metric":{},"value":[1,"+Inf"]},
                {"metric":{},"value":[1,"-Inf"]}
            ]}}"#,
        )
        .unwrap();
        assert!(outcome.samples[0].value.is_nan());
        assert_eq!(outcome.samples[1].value, f64::INFINITY);
        assert_eq!(outcome.samples[2].value, f64::NEG_INFINITY);
    }

    #[test]
    fn test_parse_empty_vector_and_warnings() {
        let outcome = parse(
            r#"{"status":"success","warnings":["too many samples"],
                "data":{"resultType":"vector","result":[]}}"#,
        )
        .unwrap();
        assert!(outcome.samples.is_empty());
        assert_eq!(outcome.warnings, vec!["too many samples"]);
    }

    #[test]
    fn test_parse_rejects_other_result_types() {
        let err = parse(r#"{"status":"success","data":{"resultType":"scalar","result":[1,"2"]}}"#).unwrap_err();
        assert!(matches!(err, QueryError::UnexpectedResultType(ref t) if t == "scalar"));

        let err = parse(r#"{"status":"success","data":{"resultType":"matrix","result":[]}}"#).unwrap_err();
        assert!(matches!(err, QueryError::UnexpectedResultType(_)));

        let err = parse(r#"{"status":"success"}"#).unwrap_err();
        assert!(matches!(err, QueryError::UnexpectedResultType(_)));
    }

    #[test]
    fn test_parse_invalid_value_is_an_error() {
        let err = parse(
            r#"{"status":"success","data":{"resultType":"vector","result":[
                {"metric":{"__name__":"up"},"value":[1,"abc"]}
            ]}}"#,
        )
        .unwrap_err();
        match err {
            QueryError::InvalidSampleValue { series, raw } => {
                assert_eq!(series, "up");
                assert_eq!(raw, "abc");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parse_api_error() {
        let resp = serde_json::from_str(
            r#"{"status":"error","errorType":"bad_data","error":"parse error at char 3"}"#,
        )
        .unwrap();
        let err = parse_response(resp, StatusCode::BAD_REQUEST).unwrap_err();
        assert_eq!(err.to_string(), "bad_data: parse error at char 3");
    }
}
