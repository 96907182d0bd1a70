use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::{index_path, type_name, Violation, ViolationKind};
use crate::error::{BriefError, Result};

/// Body of a generate call: `{"urls": ["https://..."]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateRequest {
    pub urls: Vec<String>,
}

impl GenerateRequest {
    /// Shape-check an untrusted request body. Only the container shape is
    /// checked here; URL well-formedness is checked by [`check_source_urls`].
    pub fn from_json(value: &Value) -> Result<Self> {
        let Some(obj) = value.as_object() else {
            return Err(BriefError::InvalidRequest {
                message: "request body must be a JSON object".to_string(),
                violations: vec![Violation::new(
                    "",
                    ViolationKind::WrongType,
                    format!("expected object, got {}", type_name(value)),
                )],
            });
        };

        let Some(raw) = obj.get("urls") else {
            return Err(BriefError::InvalidRequest {
                message: "urls must be an array of valid URLs".to_string(),
                violations: vec![Violation::new(
                    "urls",
                    ViolationKind::Missing,
                    "required field is missing",
                )],
            });
        };

        let Some(items) = raw.as_array() else {
            return Err(BriefError::InvalidRequest {
                message: "urls must be an array of valid URLs".to_string(),
                violations: vec![Violation::new(
                    "urls",
                    ViolationKind::WrongType,
                    format!("expected array, got {}", type_name(raw)),
                )],
            });
        };

        let mut urls = Vec::with_capacity(items.len());
        let mut violations = Vec::new();
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) => urls.push(s.to_string()),
                None => violations.push(Violation::new(
                    index_path("urls", i),
                    ViolationKind::WrongType,
                    format!("expected string, got {}", type_name(item)),
                )),
            }
        }

        if !violations.is_empty() {
            return Err(BriefError::InvalidRequest {
                message: "urls must be an array of valid URLs".to_string(),
                violations,
            });
        }

        Ok(Self { urls })
    }
}

/// Check that a candidate URL list is non-empty, within `max_urls` when a cap
/// is configured, and that every entry is an absolute URL.
pub fn check_source_urls(urls: &[String], max_urls: Option<usize>) -> Result<Vec<Url>> {
    if urls.is_empty() {
        return Err(BriefError::InvalidRequest {
            message: "at least one URL is required".to_string(),
            violations: vec![Violation::new("urls", ViolationKind::Empty, "list is empty")],
        });
    }

    if let Some(max_urls) = max_urls.filter(|max| urls.len() > *max) {
        return Err(BriefError::InvalidRequest {
            message: format!("at most {} URLs are accepted per brief", max_urls),
            violations: vec![Violation::new(
                "urls",
                ViolationKind::TooMany,
                format!("{} URLs given, limit is {}", urls.len(), max_urls),
            )],
        });
    }

    let mut parsed = Vec::with_capacity(urls.len());
    let mut violations = Vec::new();
    for (i, raw) in urls.iter().enumerate() {
        match parse_source_url(raw) {
            Ok(url) => parsed.push(url),
            Err(reason) => violations.push(Violation::new(
                index_path("urls", i),
                ViolationKind::InvalidUrl,
                reason,
            )),
        }
    }

    if !violations.is_empty() {
        return Err(BriefError::InvalidRequest {
            message: "urls must be an array of valid URLs".to_string(),
            violations,
        });
    }

    Ok(parsed)
}

fn parse_source_url(raw: &str) -> std::result::Result<Url, String> {
    Url::parse(raw).map_err(|e| format!("invalid URL {:?}: {}", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let req = GenerateRequest::from_json(&json!({"urls": ["https://a.example/1"]})).unwrap();
        assert_eq!(req.urls, vec!["https://a.example/1".to_string()]);

        let err = GenerateRequest::from_json(&json!({"links": []})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(err.violations().unwrap()[0].path, "urls");

        let err = GenerateRequest::from_json(&json!({"urls": ["https://a.example", 7]})).unwrap_err();
        assert_eq!(err.violations().unwrap()[0].path, "urls[1]");

        let err = GenerateRequest::from_json(&json!("https://a.example")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_empty_list_rejected() {
        let err = check_source_urls(&[], None).unwrap_err();
        assert_eq!(err.violations().unwrap()[0].kind, ViolationKind::Empty);
    }

    #[test]
    fn test_too_many_rejected() {
        let urls: Vec<String> = (0..4).map(|i| format!("https://a.example/{}", i)).collect();
        let err = check_source_urls(&urls, Some(3)).unwrap_err();
        assert_eq!(err.violations().unwrap()[0].kind, ViolationKind::TooMany);
    }

    #[test]
    fn test_no_cap_by_default() {
        let urls: Vec<String> = (0..25).map(|i| format!("https://a{}.example/x", i)).collect();
        assert_eq!(check_source_urls(&urls, None).unwrap().len(), 25);
    }

    #[test]
    fn test_each_bad_entry_reported() {
        let urls = vec![
            "https://a.example/1".to_string(),
            "not a url".to_string(),
            "ftp://files.example/x".to_string(),
            "/relative/path".to_string(),
        ];
        let err = check_source_urls(&urls, None).unwrap_err();
        let paths: Vec<&str> = err
            .violations()
            .unwrap()
            .iter()
            .map(|v| v.path.as_str())
            .collect();
        assert_eq!(paths, vec!["urls[1]", "urls[3]"]);
    }

    #[test]
    fn test_valid_urls_parse() {
        let urls = vec![
            "https://a.example/1".to_string(),
            "http://b.example".to_string(),
            "ftp://files.example/report.pdf".to_string(),
        ];
        let parsed = check_source_urls(&urls, None).unwrap();
        assert_eq!(parsed[0].host_str(), Some("a.example"));
        assert_eq!(parsed[1].host_str(), Some("b.example"));
        assert_eq!(parsed[2].scheme(), "ftp");
    }
}
