//! Offline brief synthesis.
//!
//! Used when no LLM credential is configured, and as a stand-in in tests.
//! Content is fixed; only ids, timestamps and the cited URLs vary.

use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

use crate::types::{
    Brief, BriefSource, Citation, Claim, Conflict, Credibility, KeyPoint, VerifyItem,
};

/// Cited when fewer input URLs were given than the template needs.
pub const FALLBACK_URL: &str = "https://example.com";

const SUMMARY: &str = "This research brief provides a comprehensive analysis of the submitted URLs. \
The analysis identifies key themes, conflicting viewpoints, and areas requiring further verification. \
Based on the extracted content, several important claims and perspectives have been identified across the sources.";

/// Deterministic brief generator that never touches the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, urls: &[String]) -> Brief {
        self.generate_at(urls, Utc::now())
    }

    /// Same as [`generate`](Self::generate) with an explicit creation time.
    pub fn generate_at(&self, urls: &[String], now: DateTime<Utc>) -> Brief {
        let cite = |i: usize| -> String {
            urls.get(i)
                .cloned()
                .unwrap_or_else(|| FALLBACK_URL.to_string())
        };

        let key_points = vec![
            key_point(
                "The primary argument suggests a significant trend in recent market movements",
                cite(0),
                "Recent market analysis shows significant changes across multiple sectors...",
                Credibility::High,
            ),
            key_point(
                "Secondary sources indicate emerging regulatory frameworks are being developed",
                cite(1),
                "Regulatory bodies are working on new guidelines to address market concerns...",
                Credibility::Medium,
            ),
            key_point(
                "Additional context points to industry-specific challenges",
                cite(2),
                "The industry faces several challenges including infrastructure limitations...",
                Credibility::Medium,
            ),
        ];

        let conflicts = vec![Conflict {
            id: Uuid::new_v4(),
            claim_a: Claim {
                text: "Market growth is accelerating rapidly".to_string(),
                url: cite(0),
            },
            claim_b: Claim {
                text: "Market expansion has plateaued in recent quarters".to_string(),
                url: cite(1),
            },
        }];

        let what_to_verify = vec![
            verify_item("Confirm recent financial metrics from official sources", Some(cite(0))),
            verify_item("Verify regulatory body statements about new frameworks", Some(cite(1))),
            verify_item("Research industry-specific infrastructure requirements", None),
        ];

        let sources = urls
            .iter()
            .map(|url| BriefSource {
                url: url.clone(),
                title: Some(format!("Source: {}", host_of(url))),
                snippet: Some("Content summary from this source would appear here...".to_string()),
            })
            .collect();

        Brief {
            id: Uuid::new_v4(),
            title: "Research Brief: Topic Analysis".to_string(),
            summary: SUMMARY.to_string(),
            key_points,
            conflicts,
            what_to_verify,
            sources,
            created_at: now,
            saved_at: None,
        }
    }
}

fn key_point(text: &str, url: String, snippet: &str, credibility: Credibility) -> KeyPoint {
    KeyPoint {
        id: Uuid::new_v4(),
        text: text.to_string(),
        sources: vec![Citation {
            url,
            snippet: snippet.to_string(),
        }],
        credibility,
    }
}

fn verify_item(text: &str, source: Option<String>) -> VerifyItem {
    VerifyItem {
        id: Uuid::new_v4(),
        text: text.to_string(),
        source,
        checked: false,
    }
}

/// Host part of a URL, or the raw string when it does not parse.
fn host_of(raw: &str) -> String {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}
