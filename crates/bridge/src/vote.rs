use serde_json::{Map, Value};

/// Custom event emitted for a real upvote.
pub const VOTE_EVENT: &str = "vote";
/// Custom event emitted for a test vote from the bot-list dashboard.
pub const TEST_VOTE_EVENT: &str = "test_vote";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Upvote,
    Test,
}

impl VoteKind {
    /// Map the payload's `type` field. Unknown types are refused.
    pub fn from_payload(payload: &Map<String, Value>) -> Option<Self> {
        match payload.get("type").and_then(Value::as_str) {
            Some("upvote") => Some(Self::Upvote),
            Some("test") => Some(Self::Test),
            _ => None,
        }
    }

    pub fn event_name(self) -> &'static str {
        match self {
            Self::Upvote => VOTE_EVENT,
            Self::Test => TEST_VOTE_EVENT,
        }
    }
}

/// Vote fields from the first non-empty source: a JSON object body, a
/// form-encoded body, then the query string.
pub fn extract_payload(body: &[u8], query: Option<&str>) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => return map,
        // Valid JSON that carries nothing; not a form either.
        Ok(_) => {},
        Err(_) => {
            let form = form_fields(body);
            if !form.is_empty() {
                return form;
            }
        },
    }
    query.map(|q| form_fields(q.as_bytes())).unwrap_or_default()
}

fn form_fields(raw: &[u8]) -> Map<String, Value> {
    url::form_urlencoded::parse(raw)
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}
