use chrono::{DateTime, SecondsFormat, Utc};

/// Minimum number of key points the model is asked for.
pub const MIN_KEY_POINTS: usize = 3;
pub const MAX_KEY_POINTS: usize = 5;
pub const MIN_VERIFY_ITEMS: usize = 2;
pub const MAX_VERIFY_ITEMS: usize = 4;

const SYSTEM_PROMPT: &str = "You are an objective research analyst who synthesizes information from multiple sources.

For the URLs you are given:
1. Analyze each source and its content
2. Extract the key information and recurring themes
3. Identify where sources agree and where they conflict
4. Highlight claims that need independent verification
5. Return a structured JSON brief

Requirements:
- Stay neutral and objective
- Cite specific sources with direct quotes (snippets)
- Present conflicting claims with both sides and their URLs
- Put fact-checking tasks in the verification list
- Rate the credibility of each key point as low, medium or high
- Use ISO 8601 for every timestamp
- Use a fresh UUID v4 for every id

CRITICAL: output raw JSON only. No markdown, no code fences, no commentary. Nothing but the JSON object.";

/// The system/user prompt pair sent to the completion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BriefPrompt {
    pub system: String,
    pub user: String,
}

impl BriefPrompt {
    /// Build the prompt pair for `urls`, stamping `now` as the expected
    /// `created_at` in the example document.
    pub fn new(urls: &[String], now: DateTime<Utc>) -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            user: user_prompt(urls, now),
        }
    }
}

fn user_prompt(urls: &[String], now: DateTime<Utc>) -> String {
    let created_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!(
        r#"Analyze these research URLs and produce a brief:

URLs:
{urls}

Respond with ONLY a JSON object with exactly this structure. No markdown, no code blocks, no text outside the JSON:

{{
  "id": "uuid-v4-string",
  "title": "Brief title describing the topic",
  "summary": "2-3 paragraph synthesis of all sources: main themes, consensus, and disagreements.",
  "key_points": [
    {{
      "id": "uuid-v4-string",
      "text": "A specific finding or insight",
      "sources": [
        {{
          "url": "https://example.com/source",
          "snippet": "Direct quote from the source supporting this point"
        }}
      ],
      "credibility": "high"
    }}
  ],
  "conflicts": [
    {{
      "id": "uuid-v4-string",
      "claimA": {{
        "text": "First claim or perspective",
        "url": "https://source-a.com"
      }},
      "claimB": {{
        "text": "Conflicting claim or perspective",
        "url": "https://source-b.com"
      }}
    }}
  ],
  "what_to_verify": [
    {{
      "id": "uuid-v4-string",
      "text": "Claim or statistic that needs verification",
      "source": "https://source.com",
      "checked": false
    }}
  ],
  "sources": [
    {{
      "url": "https://example.com",
      "title": "Source title",
      "snippet": "What this source covers"
    }}
  ],
  "created_at": "{created_at}"
}}

Rules:
- Include {min_kp}-{max_kp} key points minimum
- Include at least 1 conflict if the sources disagree
- Include {min_v}-{max_v} verification items
- Every key point must cite at least one source with a snippet
- credibility must be "low", "medium", or "high"
- All ids must be unique UUID v4 strings
- created_at must be ISO 8601"#,
        urls = urls.join("\n"),
        created_at = created_at,
        min_kp = MIN_KEY_POINTS,
        max_kp = MAX_KEY_POINTS,
        min_v = MIN_VERIFY_ITEMS,
        max_v = MAX_VERIFY_ITEMS,
    )
}
