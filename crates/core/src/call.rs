use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Kind of call as reported by the server.
///
/// Unknown values are kept verbatim so filtering by call type still works
/// for variants this client has never seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallType {
    Missed,
    Answered,
    VoiceMail,
    Other(String),
}

impl CallType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Missed => "missed",
            Self::Answered => "answered",
            Self::VoiceMail => "voice mail",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for CallType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "missed" => Self::Missed,
            "answered" => Self::Answered,
            "voice mail" => Self::VoiceMail,
            _ => Self::Other(raw),
        }
    }
}

impl From<CallType> for String {
    fn from(value: CallType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for CallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Inbound => "Inbound",
            Self::Outbound => "Outbound",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A note attached to a call. Both `id` and `created_at` may be missing on
/// records coming from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A single phone call. `id` is the identity used by every splice update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: String,
    pub call_type: CallType,
    pub direction: Direction,
    pub duration: u64,
    pub from: String,
    pub to: String,
    pub via: String,
    pub created_at: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub notes: Vec<Note>,
}

/// Note prepared for display: blank notes dropped, ids and timestamps filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNote {
    pub id: String,
    pub content: String,
    pub created_at: String,
}

impl Call {
    /// Calendar date portion of `created_at` (everything before the `T`).
    pub fn created_date(&self) -> &str {
        self.created_at
            .split_once('T')
            .map_or(self.created_at.as_str(), |(date, _)| date)
    }

    /// Notes in display order, newest first.
    ///
    /// Notes whose content is blank after trimming are skipped. A missing id
    /// gets a fresh UUID and a missing timestamp is stamped with `now`.
    /// Timestamps that do not parse as RFC 3339 sort after all others.
    pub fn display_notes(&self, now: DateTime<Utc>) -> Vec<DisplayNote> {
        let now = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut notes: Vec<DisplayNote> = self
            .notes
            .iter()
            .filter(|n| !n.content.trim().is_empty())
            .map(|n| DisplayNote {
                id: n
                    .id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                content: n.content.clone(),
                created_at: n.created_at.clone().unwrap_or_else(|| now.clone()),
            })
            .collect();

        notes.sort_by(|a, b| parse_timestamp(&b.created_at).cmp(&parse_timestamp(&a.created_at)));
        notes
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// Replace the record whose id matches `updated.id`, leaving all others
/// untouched. Returns `false` (and changes nothing) when no record matches.
pub fn splice_by_id(calls: &mut [Call], updated: &Call) -> bool {
    match calls.iter_mut().find(|c| c.id == updated.id) {
        Some(slot) => {
            *slot = updated.clone();
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use chrono::TimeZone;

    #[test]
    fn call_deserializes_with_defaults() {
        let call: Call = serde_json::from_str(
            r#"{
                "id": "c-1",
                "call_type": "voice mail",
                "direction": "inbound",
                "duration": 65,
                "from": "+33100000000",
                "to": "+33200000000",
                "via": "+33300000000",
                "created_at": "2024-03-01T10:00:00.000Z"
            }"#,
        )
        .expect("parse call");
        assert_eq!(call.call_type, CallType::VoiceMail);
        assert!(!call.is_archived);
        assert!(call.notes.is_empty());
        assert_eq!(call.created_date(), "2024-03-01");
    }

    #[test]
    fn unknown_call_type_is_preserved() {
        let ty: CallType = serde_json::from_str(r#""Forwarded""#).expect("parse");
        assert_eq!(ty, CallType::Other("Forwarded".to_string()));
        assert_eq!(serde_json::to_string(&ty).expect("serialize"), r#""Forwarded""#);
    }

    #[test]
    fn display_notes_drop_blank_and_sort_newest_first() {
        let mut call = testing::call("c-1");
        call.notes = vec![
            Note {
                id: Some("n-old".into()),
                content: "first".into(),
                created_at: Some("2024-01-01T08:00:00Z".into()),
            },
            Note {
                id: Some("n-blank".into()),
                content: "   ".into(),
                created_at: Some("2024-01-03T08:00:00Z".into()),
            },
            Note {
                id: Some("n-new".into()),
                content: "second".into(),
                created_at: Some("2024-01-02T08:00:00Z".into()),
            },
        ];

        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let notes = call.display_notes(now);
        let ids: Vec<_> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n-new", "n-old"]);
    }

    #[test]
    fn display_notes_fill_missing_id_and_timestamp() {
        let mut call = testing::call("c-1");
        call.notes = vec![Note {
            id: None,
            content: "hello".into(),
            created_at: None,
        }];

        let now = Utc.with_ymd_and_hms(2024, 2, 1, 12, 30, 0).unwrap();
        let notes = call.display_notes(now);
        assert_eq!(notes.len(), 1);
        assert!(!notes[0].id.is_empty());
        assert_eq!(notes[0].created_at, "2024-02-01T12:30:00.000Z");
    }

    #[test]
    fn splice_replaces_only_matching_record() {
        let mut calls = vec![testing::call("a"), testing::call("b")];
        let mut updated = testing::call("b");
        updated.is_archived = true;

        assert!(splice_by_id(&mut calls, &updated));
        assert_eq!(calls[0], testing::call("a"));
        assert_eq!(calls[1], updated);

        let missing = testing::call("zzz");
        assert!(!splice_by_id(&mut calls, &missing));
        assert_eq!(calls.len(), 2);
    }
}
