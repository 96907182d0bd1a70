use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use url::Url;
use uuid::Uuid;

use super::{index_path, join_path, type_name, Violation, ViolationKind};
use crate::types::{
    Brief, BriefSource, Citation, Claim, Conflict, Credibility, KeyPoint, VerifyItem,
};

/// Outcome of validating a candidate brief.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(Brief),
    Invalid(Vec<Violation>),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    pub fn into_result(self) -> Result<Brief, Vec<Violation>> {
        match self {
            Validation::Valid(brief) => Ok(brief),
            Validation::Invalid(violations) => Err(violations),
        }
    }
}

/// Validate an arbitrary JSON value against the brief contract.
///
/// Unknown keys are ignored. `credibility` defaults to medium and `checked`
/// to false when absent; optional fields accept `null` as absent.
pub fn validate_brief(value: &Value) -> Validation {
    let Some(root) = value.as_object() else {
        return Validation::Invalid(vec![Violation::new(
            "",
            ViolationKind::WrongType,
            format!("expected object, got {}", type_name(value)),
        )]);
    };

    let mut checker = Checker::default();

    let id = checker.id(root, "", "id");
    let title = checker.string(root, "", "title");
    let summary = checker.string(root, "", "summary");
    let key_points = checker.each(root, "", "key_points", Checker::key_point);
    let conflicts = checker.each(root, "", "conflicts", Checker::conflict);
    let what_to_verify = checker.each(root, "", "what_to_verify", Checker::verify_item);
    let sources = checker.each(root, "", "sources", Checker::brief_source);
    let created_at = checker.datetime(root, "", "created_at");
    let saved_at = checker.optional_datetime(root, "", "saved_at");

    if !checker.violations.is_empty() {
        return Validation::Invalid(checker.violations);
    }

    match (id, title, summary, key_points, conflicts, what_to_verify, sources, created_at) {
        (
            Some(id),
            Some(title),
            Some(summary),
            Some(key_points),
            Some(conflicts),
            Some(what_to_verify),
            Some(sources),
            Some(created_at),
        ) => Validation::Valid(Brief {
            id,
            title,
            summary,
            key_points,
            conflicts,
            what_to_verify,
            sources,
            created_at,
            saved_at,
        }),
        _ => Validation::Invalid(vec![Violation::new(
            "",
            ViolationKind::Missing,
            "incomplete brief",
        )]),
    }
}

/// Accumulates violations while walking a candidate brief.
#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
    /// First path at which each id was seen.
    seen_ids: HashMap<Uuid, String>,
}

impl Checker {
    fn report(&mut self, path: String, kind: ViolationKind, message: impl Into<String>) {
        self.violations.push(Violation::new(path, kind, message));
    }

    /// Required field lookup. Records a `Missing` violation when absent.
    fn required<'a>(&mut self, obj: &'a Map<String, Value>, parent: &str, key: &str) -> Option<&'a Value> {
        match obj.get(key) {
            Some(value) => Some(value),
            None => {
                self.report(join_path(parent, key), ViolationKind::Missing, "required field is missing");
                None
            }
        }
    }

    /// Optional field lookup. `null` counts as absent.
    fn optional<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
        obj.get(key).filter(|v| !v.is_null())
    }

    fn expect_str<'a>(&mut self, value: &'a Value, path: String) -> Option<&'a str> {
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                self.report(
                    path,
                    ViolationKind::WrongType,
                    format!("expected string, got {}", type_name(value)),
                );
                None
            }
        }
    }

    fn expect_object<'a>(&mut self, value: &'a Value, path: String) -> Option<&'a Map<String, Value>> {
        match value.as_object() {
            Some(obj) => Some(obj),
            None => {
                self.report(
                    path,
                    ViolationKind::WrongType,
                    format!("expected object, got {}", type_name(value)),
                );
                None
            }
        }
    }

    fn string(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<String> {
        let value = self.required(obj, parent, key)?;
        self.expect_str(value, join_path(parent, key)).map(str::to_string)
    }

    fn optional_string(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<String> {
        let value = Self::optional(obj, key)?;
        self.expect_str(value, join_path(parent, key)).map(str::to_string)
    }

    fn check_url(&mut self, raw: &str, path: String) -> Option<String> {
        match Url::parse(raw) {
            Ok(_) => Some(raw.to_string()),
            Err(e) => {
                self.report(path, ViolationKind::InvalidUrl, format!("invalid URL {:?}: {}", raw, e));
                None
            }
        }
    }

    fn url(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<String> {
        let value = self.required(obj, parent, key)?;
        let path = join_path(parent, key);
        let raw = self.expect_str(value, path.clone())?;
        self.check_url(raw, path)
    }

    /// A hyphenated UUID that has not been used elsewhere in the brief.
    fn id(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<Uuid> {
        let value = self.required(obj, parent, key)?;
        let path = join_path(parent, key);
        let raw = self.expect_str(value, path.clone())?;

        let parsed = if raw.len() == 36 { Uuid::try_parse(raw).ok() } else { None };
        let Some(id) = parsed else {
            self.report(path, ViolationKind::InvalidUuid, format!("invalid UUID {:?}", raw));
            return None;
        };

        if let Some(first) = self.seen_ids.get(&id) {
            let message = format!("id {} already used at {}", id, display_path(first));
            self.report(path, ViolationKind::DuplicateId, message);
            return None;
        }
        self.seen_ids.insert(id, path);
        Some(id)
    }

    fn parse_datetime(&mut self, value: &Value, path: String) -> Option<DateTime<Utc>> {
        let raw = self.expect_str(value, path.clone())?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(e) => {
                self.report(
                    path,
                    ViolationKind::InvalidTimestamp,
                    format!("invalid ISO-8601 datetime {:?}: {}", raw, e),
                );
                None
            }
        }
    }

    fn datetime(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<DateTime<Utc>> {
        let value = self.required(obj, parent, key)?;
        self.parse_datetime(value, join_path(parent, key))
    }

    fn optional_datetime(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<DateTime<Utc>> {
        let value = Self::optional(obj, key)?;
        self.parse_datetime(value, join_path(parent, key))
    }

    /// Validate every element of a required array with `item`. Returns the
    /// typed elements only when all of them passed.
    fn each<T>(
        &mut self,
        obj: &Map<String, Value>,
        parent: &str,
        key: &str,
        item: fn(&mut Checker, &Value, &str) -> Option<T>,
    ) -> Option<Vec<T>> {
        let value = self.required(obj, parent, key)?;
        let path = join_path(parent, key);
        let Some(elements) = value.as_array() else {
            self.report(
                path,
                ViolationKind::WrongType,
                format!("expected array, got {}", type_name(value)),
            );
            return None;
        };

        let mut out = Vec::with_capacity(elements.len());
        let mut complete = true;
        for (i, element) in elements.iter().enumerate() {
            match item(self, element, &index_path(&path, i)) {
                Some(v) => out.push(v),
                None => complete = false,
            }
        }
        complete.then_some(out)
    }

    fn key_point(&mut self, value: &Value, path: &str) -> Option<KeyPoint> {
        let obj = self.expect_object(value, path.to_string())?;
        let id = self.id(obj, path, "id");
        let text = self.string(obj, path, "text");
        let sources = self.each(obj, path, "sources", Checker::citation);
        let credibility = self.credibility(obj, path);
        Some(KeyPoint {
            id: id?,
            text: text?,
            sources: sources?,
            credibility: credibility?,
        })
    }

    fn credibility(&mut self, obj: &Map<String, Value>, parent: &str) -> Option<Credibility> {
        let Some(value) = Self::optional(obj, "credibility") else {
            return Some(Credibility::default());
        };
        let path = join_path(parent, "credibility");
        let raw = self.expect_str(value, path.clone())?;
        match raw.parse::<Credibility>() {
            Ok(c) => Some(c),
            Err(message) => {
                self.report(path, ViolationKind::InvalidEnum, message);
                None
            }
        }
    }

    fn citation(&mut self, value: &Value, path: &str) -> Option<Citation> {
        let obj = self.expect_object(value, path.to_string())?;
        let url = self.url(obj, path, "url");
        let snippet = self.string(obj, path, "snippet");
        Some(Citation {
            url: url?,
            snippet: snippet?,
        })
    }

    fn conflict(&mut self, value: &Value, path: &str) -> Option<Conflict> {
        let obj = self.expect_object(value, path.to_string())?;
        let id = self.id(obj, path, "id");
        let claim_a = self.claim(obj, path, "claimA");
        let claim_b = self.claim(obj, path, "claimB");
        Some(Conflict {
            id: id?,
            claim_a: claim_a?,
            claim_b: claim_b?,
        })
    }

    fn claim(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> Option<Claim> {
        let value = self.required(obj, parent, key)?;
        let path = join_path(parent, key);
        let claim = self.expect_object(value, path.clone())?;
        let text = self.string(claim, &path, "text");
        let url = self.url(claim, &path, "url");
        Some(Claim {
            text: text?,
            url: url?,
        })
    }

    fn verify_item(&mut self, value: &Value, path: &str) -> Option<VerifyItem> {
        let obj = self.expect_object(value, path.to_string())?;
        let id = self.id(obj, path, "id");
        let text = self.string(obj, path, "text");
        // Free text or a URL; only the type is checked.
        let source = self.optional_string(obj, path, "source");
        let source_ok = Self::optional(obj, "source").map_or(true, |_| source.is_some());
        let checked = match Self::optional(obj, "checked") {
            None => Some(false),
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                self.report(
                    join_path(path, "checked"),
                    ViolationKind::WrongType,
                    format!("expected boolean, got {}", type_name(other)),
                );
                None
            }
        };
        if !source_ok {
            return None;
        }
        Some(VerifyItem {
            id: id?,
            text: text?,
            source,
            checked: checked?,
        })
    }

    fn brief_source(&mut self, value: &Value, path: &str) -> Option<BriefSource> {
        let obj = self.expect_object(value, path.to_string())?;
        let url = self.url(obj, path, "url");
        let title = self.optional_string(obj, path, "title");
        let title_ok = Self::optional(obj, "title").map_or(true, |_| title.is_some());
        let snippet = self.optional_string(obj, path, "snippet");
        let snippet_ok = Self::optional(obj, "snippet").map_or(true, |_| snippet.is_some());
        if !(title_ok && snippet_ok) {
            return None;
        }
        Some(BriefSource {
            url: url?,
            title,
            snippet,
        })
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "(root)"
    } else {
        path
    }
}
