//! Typed views over the JSON that `gcloud --format=json` prints for
//! services, revisions, and request logs.

use serde::Deserialize;

// ── Wire shapes ──

#[derive(Debug, Deserialize)]
struct RawRevision {
    metadata: RawMetadata,
    #[serde(default)]
    status: RawStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    name: String,
    #[serde(default)]
    creation_timestamp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    conditions: Vec<RawCondition>,
    #[serde(default)]
    traffic: Vec<RawTraffic>,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTraffic {
    #[serde(default)]
    revision_name: Option<String>,
    #[serde(default)]
    percent: Option<u32>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    latest_revision: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    #[serde(default)]
    status: RawStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLogEntry {
    #[serde(default)]
    http_request: Option<RawHttpRequest>,
}

#[derive(Debug, Deserialize)]
struct RawHttpRequest {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    latency: Option<String>,
}

impl RawStatus {
    fn ready(&self) -> Option<bool> {
        self.conditions
            .iter()
            .find(|c| c.kind == "Ready")
            .map(|c| c.status == "True")
    }
}

// ── Public views ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub name: String,
    pub created: Option<String>,
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficTarget {
    /// `None` when the target tracks the latest revision.
    pub revision: Option<String>,
    pub percent: u32,
    pub tag: Option<String>,
    pub latest: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceStatus {
    pub url: Option<String>,
    /// `None` while the platform has not reported a Ready condition yet.
    pub ready: Option<bool>,
    pub traffic: Vec<TrafficTarget>,
}

/// Request statistics computed from recent request log entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricsSummary {
    pub requests: usize,
    pub client_errors: usize,
    pub server_errors: usize,
    pub mean_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
}

impl MetricsSummary {
    /// Share of requests answered with a 5xx status, in percent.
    pub fn error_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.server_errors as f64 * 100.0 / self.requests as f64
        }
    }
}

// ── Parsing ──
//
// Empty output (dry-run, or nothing matched) parses to an empty value
// rather than an error.

pub fn parse_revisions(json: &str) -> Result<Vec<Revision>, serde_json::Error> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<RawRevision> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|r| Revision {
            ready: r.status.ready().unwrap_or(false),
            name: r.metadata.name,
            created: r.metadata.creation_timestamp,
        })
        .collect())
}

pub fn parse_service_status(json: &str) -> Result<ServiceStatus, serde_json::Error> {
    if json.trim().is_empty() {
        return Ok(ServiceStatus::default());
    }
    let raw: RawService = serde_json::from_str(json)?;
    let ready = raw.status.ready();
    Ok(ServiceStatus {
        url: raw.status.url,
        ready,
        traffic: raw
            .status
            .traffic
            .into_iter()
            .map(|t| TrafficTarget {
                revision: t.revision_name,
                percent: t.percent.unwrap_or(0),
                tag: t.tag,
                latest: t.latest_revision.unwrap_or(false),
            })
            .collect(),
    })
}

pub fn summarize_request_logs(json: &str) -> Result<MetricsSummary, serde_json::Error> {
    if json.trim().is_empty() {
        return Ok(MetricsSummary::default());
    }
    let entries: Vec<RawLogEntry> = serde_json::from_str(json)?;

    let mut summary = MetricsSummary::default();
    let mut latencies = Vec::new();
    for request in entries.into_iter().filter_map(|e| e.http_request) {
        summary.requests += 1;
        match request.status {
            Some(400..=499) => summary.client_errors += 1,
            Some(500..=599) => summary.server_errors += 1,
            _ => {}
        }
        if let Some(ms) = request.latency.as_deref().and_then(parse_latency_ms) {
            latencies.push(ms);
        }
    }

    if !latencies.is_empty() {
        let total: f64 = latencies.iter().sum();
        summary.mean_latency_ms = Some(total / latencies.len() as f64);
        summary.max_latency_ms = latencies.iter().copied().reduce(f64::max);
    }
    Ok(summary)
}

/// `"0.123456s"` → `123.456`.
fn parse_latency_ms(latency: &str) -> Option<f64> {
    latency
        .strip_suffix('s')
        .and_then(|secs| secs.parse::<f64>().ok())
        .map(|secs| secs * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revisions_from_json() {
        let json = r#"[
            {"metadata": {"name": "api-00002-xyz", "creationTimestamp": "2024-05-01T10:00:00Z"},
             "status": {"conditions": [{"type": "Ready", "status": "True"}]}},
            {"metadata": {"name": "api-00001-abc"},
             "status": {"conditions": [{"type": "Ready", "status": "False"}]}}
        ]"#;

        let revisions = parse_revisions(json).unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].name, "api-00002-xyz");
        assert_eq!(revisions[0].created.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert!(revisions[0].ready);
        assert!(!revisions[1].ready);
        assert!(revisions[1].created.is_none());
    }

    #[test]
    fn empty_output_is_empty() {
        assert!(parse_revisions("").unwrap().is_empty());
        assert_eq!(parse_service_status("\n").unwrap(), ServiceStatus::default());
        assert_eq!(summarize_request_logs("").unwrap().requests, 0);
    }

    #[test]
    fn service_status_with_traffic() {
        let json = r#"{"status": {
            "url": "https://api-abc-uc.a.run.app",
            "conditions": [{"type": "ConfigurationsReady", "status": "True"},
                           {"type": "Ready", "status": "Unknown"}],
            "traffic": [
                {"revisionName": "api-00002", "percent": 90, "latestRevision": true},
                {"revisionName": "api-00001", "percent": 10, "tag": "old"}
            ]}}"#;

        let status = parse_service_status(json).unwrap();
        assert_eq!(status.url.as_deref(), Some("https://api-abc-uc.a.run.app"));
        assert_eq!(status.ready, Some(false));
        assert_eq!(status.traffic.len(), 2);
        assert!(status.traffic[0].latest);
        assert_eq!(status.traffic[1].percent, 10);
        assert_eq!(status.traffic[1].tag.as_deref(), Some("old"));
    }

    #[test]
    fn metrics_count_errors_and_latency() {
        let json = r#"[
            {"httpRequest": {"status": 200, "latency": "0.100s"}},
            {"httpRequest": {"status": 404, "latency": "0.020s"}},
            {"httpRequest": {"status": 503, "latency": "0.300s"}},
            {"httpRequest": {"status": 200}},
            {"textPayload": "not a request"}
        ]"#;

        let summary = summarize_request_logs(json).unwrap();
        assert_eq!(summary.requests, 4);
        assert_eq!(summary.client_errors, 1);
        assert_eq!(summary.server_errors, 1);
        assert_eq!(summary.error_rate(), 25.0);

        let mean = summary.mean_latency_ms.unwrap();
        assert!((mean - 140.0).abs() < 1e-6, "mean = {mean}");
        let max = summary.max_latency_ms.unwrap();
        assert!((max - 300.0).abs() < 1e-6, "max = {max}");
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_revisions("not json").is_err());
    }
}
