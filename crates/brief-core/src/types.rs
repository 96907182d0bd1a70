use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Type alias for brief identifiers
pub type BriefId = Uuid;

/// A synthesised research brief built from a list of source URLs.
///
/// Briefs are immutable once created. The only permitted change is the
/// one-way transition from unsaved to saved (see [`Brief::mark_saved`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Brief {
    /// Unique identifier, assigned once at creation.
    pub id: BriefId,

    pub title: String,

    pub summary: String,

    /// Presentation order is meaningful.
    pub key_points: Vec<KeyPoint>,

    /// Pairs of opposing claims found across the sources.
    pub conflicts: Vec<Conflict>,

    /// Checklist of claims the reader should confirm independently.
    pub what_to_verify: Vec<VerifyItem>,

    /// One entry per input URL is expected but not enforced.
    pub sources: Vec<BriefSource>,

    /// When the brief was generated.
    pub created_at: DateTime<Utc>,

    /// Set the first time the user saves the brief, never cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Brief {
    pub fn is_saved(&self) -> bool {
        self.saved_at.is_some()
    }

    /// Record the save time. First write wins: returns `false` and leaves
    /// `saved_at` untouched when the brief was already saved.
    pub fn mark_saved(&mut self, at: DateTime<Utc>) -> bool {
        if self.saved_at.is_some() {
            return false;
        }
        self.saved_at = Some(at);
        true
    }

    /// Every id carried by the brief and its nested entities, brief id first.
    pub fn all_ids(&self) -> Vec<Uuid> {
        let mut ids = Vec::with_capacity(
            1 + self.key_points.len() + self.conflicts.len() + self.what_to_verify.len(),
        );
        ids.push(self.id);
        ids.extend(self.key_points.iter().map(|k| k.id));
        ids.extend(self.conflicts.iter().map(|c| c.id));
        ids.extend(self.what_to_verify.iter().map(|v| v.id));
        ids
    }

    /// Summary used when listing briefs.
    pub fn metadata(&self) -> BriefMetadata {
        BriefMetadata {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
            saved_at: self.saved_at,
            source_count: self.sources.len(),
        }
    }
}

/// A single finding with its supporting citations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyPoint {
    pub id: Uuid,
    pub text: String,
    pub sources: Vec<Citation>,
    #[serde(default)]
    pub credibility: Credibility,
}

/// A quoted snippet backing a key point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub url: String,
    pub snippet: String,
}

/// How much weight a key point deserves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Credibility {
    Low,
    #[default]
    Medium,
    High,
}

impl Credibility {
    pub const ALL: [Credibility; 3] = [Credibility::Low, Credibility::Medium, Credibility::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Credibility::Low => "low",
            Credibility::Medium => "medium",
            Credibility::High => "high",
        }
    }
}

impl fmt::Display for Credibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Credibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Credibility::Low),
            "medium" => Ok(Credibility::Medium),
            "high" => Ok(Credibility::High),
            other => Err(format!(
                "expected one of \"low\", \"medium\", \"high\", got {:?}",
                other
            )),
        }
    }
}

/// Two sources asserting opposite things.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conflict {
    pub id: Uuid,
    #[serde(rename = "claimA")]
    pub claim_a: Claim,
    #[serde(rename = "claimB")]
    pub claim_b: Claim,
}

/// One side of a [`Conflict`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claim {
    pub text: String,
    pub url: String,
}

/// An item on the verification checklist.
///
/// `checked` is client-side UI state. The server stores whatever value the
/// brief was created with and never flips it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyItem {
    pub id: Uuid,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub checked: bool,
}

/// A source URL the brief was built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BriefSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Listing summary of a stored brief.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BriefMetadata {
    pub id: BriefId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub source_count: usize,
}
