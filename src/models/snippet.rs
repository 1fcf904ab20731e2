use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ID_LEN: usize = 8;

/// A named block of code plus the metadata persisted alongside it.
///
/// Serialized with exactly four fields (`id`, `name`, `code`, `updatedAt`), which is
/// also the record shape of the export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub name: String,
    pub code: String,
    /// Milliseconds since the Unix epoch.
    pub updated_at: i64,
}

impl Snippet {
    pub fn new(name: String, code: String) -> Self {
        Self {
            id: new_id(),
            name,
            code,
            updated_at: now_millis(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    /// Local date/time of the last modification, for list metadata.
    pub fn formatted_time(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.updated_at)
            .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }

    pub fn line_count(&self) -> usize {
        self.code.lines().count()
    }
}

/// Short opaque identifier cut from a v4 UUID.
pub fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_snippet_has_short_id_and_timestamp() {
        let before = now_millis();
        let snippet = Snippet::new("Hello".to_string(), "1;".to_string());

        assert_eq!(snippet.id.len(), ID_LEN);
        assert!(snippet.id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(snippet.updated_at >= before);
    }

    #[test]
    fn test_serializes_four_camel_case_fields() {
        let snippet = Snippet {
            id: "abc12345".to_string(),
            name: "n".to_string(),
            code: "c".to_string(),
            updated_at: 42,
        };

        let value = serde_json::to_value(&snippet).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 4);
        assert_eq!(object["updatedAt"], 42);
        assert_eq!(object["id"], "abc12345");
    }

    #[test]
    fn test_formatted_time_handles_out_of_range() {
        let snippet = Snippet {
            id: "x".to_string(),
            name: String::new(),
            code: String::new(),
            updated_at: i64::MAX,
        };

        assert_eq!(snippet.formatted_time(), "");
    }
}
