//! Static tool table and per-tool request handling.

use std::sync::Arc;

use chrono::NaiveDate;
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content, JsonObject};
use serde_json::{Map, Value, json};

use crate::client::{ApiError, GraphClient};
use crate::dates::DailyNoteFormatter;

/// Request shape a tool maps onto.
#[derive(Clone, Copy)]
pub enum ToolKind {
    /// Append to the daily note for an explicit or defaulted date.
    DailyNote,
    /// Append to the daily note `days` from today.
    DailyOffset { days: i64 },
    CreateNote,
    SaveLink,
    ListLinks,
    ListBooks,
    ScheduleReminder,
}

pub struct ToolSpec {
    pub name: &'static str,
    pub resource: &'static str,
    pub kind: ToolKind,
    pub description: &'static str,
    pub schema: &'static str,
}

pub fn parse_schema(schema: &'static str) -> JsonObject {
    match serde_json::from_str::<Value>(schema) {
        Ok(Value::Object(map)) => map,
        _ => JsonObject::default(),
    }
}

const SCHEMA_EMPTY: &str = r#"{"type":"object","properties":{},"additionalProperties":false}"#;
const SCHEMA_DAILY_NOTE: &str = r#"{"type":"object","properties":{"text":{"type":"string","description":"Text to append to the daily note"},"date":{"type":"string","description":"Note date (YYYY-MM-DD). Defaults to today."},"list_name":{"type":"string","description":"List to append under. Use [[name]] for backlinks."}},"required":["text"],"additionalProperties":false}"#;
const SCHEMA_TEXT_LIST: &str = r#"{"type":"object","properties":{"text":{"type":"string","description":"Text to append"},"list_name":{"type":"string","description":"List to append under (optional)"}},"required":["text"],"additionalProperties":false}"#;
const SCHEMA_CREATE_NOTE: &str = r#"{"type":"object","properties":{"subject":{"type":"string","description":"Note title"},"content":{"type":"string","description":"Note body in Markdown"},"pinned":{"type":"boolean","description":"Pin the note"}},"required":["subject","content"],"additionalProperties":false}"#;
const SCHEMA_SAVE_LINK: &str = r#"{"type":"object","properties":{"url":{"type":"string","description":"Link URL"},"title":{"type":"string","description":"Link title"},"description":{"type":"string","description":"Link description"},"highlights":{"type":"array","items":{"type":"string"},"description":"Highlighted fragments"}},"required":["url"],"additionalProperties":false}"#;
const SCHEMA_REMINDER: &str = r#"{"type":"object","properties":{"date":{"type":"string","description":"Reminder date (YYYY-MM-DD)"},"reminder":{"type":"string","description":"Reminder text"},"list_name":{"type":"string","description":"List to append under (default: Reminders)"}},"required":["date","reminder"],"additionalProperties":false}"#;

pub const TOOL_SPECS: &[ToolSpec] = &[
    ToolSpec {
        name: "add_to_daily_note",
        resource: "daily-notes",
        kind: ToolKind::DailyNote,
        description: "Append text to a daily note. Defaults to today's note when no date is given.",
        schema: SCHEMA_DAILY_NOTE,
    },
    ToolSpec {
        name: "add_to_today",
        resource: "daily-notes",
        kind: ToolKind::DailyOffset { days: 0 },
        description: "Append text to today's daily note.",
        schema: SCHEMA_TEXT_LIST,
    },
    ToolSpec {
        name: "add_to_tomorrow",
        resource: "daily-notes",
        kind: ToolKind::DailyOffset { days: 1 },
        description: "Append text to tomorrow's daily note.",
        schema: SCHEMA_TEXT_LIST,
    },
    ToolSpec {
        name: "create_note",
        resource: "notes",
        kind: ToolKind::CreateNote,
        description: "Create a new note with a subject and Markdown content.",
        schema: SCHEMA_CREATE_NOTE,
    },
    ToolSpec {
        name: "save_link",
        resource: "links",
        kind: ToolKind::SaveLink,
        description: "Save a link, optionally with title, description and highlights.",
        schema: SCHEMA_SAVE_LINK,
    },
    ToolSpec {
        name: "get_links",
        resource: "links",
        kind: ToolKind::ListLinks,
        description: "List all saved links. No parameters.",
        schema: SCHEMA_EMPTY,
    },
    ToolSpec {
        name: "get_books",
        resource: "books",
        kind: ToolKind::ListBooks,
        description: "List all saved books. No parameters.",
        schema: SCHEMA_EMPTY,
    },
    ToolSpec {
        name: "schedule_reminder",
        resource: "daily-notes",
        kind: ToolKind::ScheduleReminder,
        description: "Add a reminder to the daily note of a future date.",
        schema: SCHEMA_REMINDER,
    },
];

/// Invalid arguments and date-computation failures abort the call at the
/// protocol level; service failures come back as tool error content so
/// the model can read them.
enum ToolError {
    Api(ApiError),
    Mcp(McpError),
}

impl From<ApiError> for ToolError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

impl From<McpError> for ToolError {
    fn from(err: McpError) -> Self {
        Self::Mcp(err)
    }
}

type ToolResult<T> = Result<T, ToolError>;

#[derive(Clone)]
pub struct ReflectTool {
    client: Arc<GraphClient>,
    dates: DailyNoteFormatter,
    resource: &'static str,
    kind: ToolKind,
}

impl ReflectTool {
    pub fn new(client: Arc<GraphClient>, dates: DailyNoteFormatter, spec: &ToolSpec) -> Self {
        Self {
            client,
            dates,
            resource: spec.resource,
            kind: spec.kind,
        }
    }

    fn args_as_object(args: Value) -> Result<Map<String, Value>, McpError> {
        match args {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            _ => Err(McpError::invalid_params(
                "arguments must be a JSON object",
                None,
            )),
        }
    }

    fn required_string(map: &Map<String, Value>, key: &str) -> Result<String, McpError> {
        map.get(key)
            .and_then(|value| value.as_str())
            .map(|value| value.to_string())
            .ok_or_else(|| McpError::invalid_params(format!("missing or invalid `{}`", key), None))
    }

    fn optional_string(map: &Map<String, Value>, key: &str) -> Option<String> {
        map.get(key)
            .and_then(|value| value.as_str())
            .map(|value| value.to_string())
    }

    fn optional_bool(map: &Map<String, Value>, key: &str) -> Option<bool> {
        map.get(key).and_then(|value| value.as_bool())
    }

    fn optional_string_array(
        map: &Map<String, Value>,
        key: &str,
    ) -> Result<Vec<String>, McpError> {
        let Some(value) = map.get(key) else {
            return Ok(Vec::new());
        };
        let values = value.as_array().ok_or_else(|| {
            McpError::invalid_params(format!("missing or invalid `{}`", key), None)
        })?;
        let mut out = Vec::with_capacity(values.len());
        for value in values {
            let item = value.as_str().ok_or_else(|| {
                McpError::invalid_params(format!("invalid `{}` entry", key), None)
            })?;
            out.push(item.to_string());
        }
        Ok(out)
    }

    fn parse_note_date(value: &str) -> Result<String, McpError> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|date| date.format("%Y-%m-%d").to_string())
            .map_err(|_| {
                McpError::invalid_params(
                    format!("invalid `date` `{}`, expected YYYY-MM-DD", value),
                    None,
                )
            })
    }

    fn note_date(&self, offset_days: i64) -> Result<String, McpError> {
        self.dates
            .relative(offset_days)
            .map_err(|err| McpError::internal_error(err.to_string(), None))
    }

    async fn append_daily(
        &self,
        date: &str,
        text: String,
        list_name: Option<String>,
    ) -> Result<(), ApiError> {
        let body = daily_note_body(date, text, list_name);
        self.client.put(self.resource, body).await?;
        Ok(())
    }

    async fn handle_daily_note(&self, args: Value) -> ToolResult<String> {
        let map = Self::args_as_object(args)?;
        let text = Self::required_string(&map, "text")?;
        let list_name = Self::optional_string(&map, "list_name");
        let date = match Self::optional_string(&map, "date") {
            Some(value) => Self::parse_note_date(&value)?,
            None => self.note_date(0)?,
        };
        self.append_daily(&date, text, list_name).await?;
        Ok(format!("Added to the daily note for {}", date))
    }

    async fn handle_daily_offset(&self, args: Value, days: i64) -> ToolResult<String> {
        let map = Self::args_as_object(args)?;
        let text = Self::required_string(&map, "text")?;
        let list_name = Self::optional_string(&map, "list_name");
        let date = self.note_date(days)?;
        self.append_daily(&date, text, list_name).await?;
        let summary = match days {
            0 => format!("Added to today's note ({})", date),
            1 => format!("Added to tomorrow's note ({})", date),
            _ => format!("Added to the daily note for {}", date),
        };
        Ok(summary)
    }

    async fn handle_create_note(&self, args: Value) -> ToolResult<String> {
        let map = Self::args_as_object(args)?;
        let subject = Self::required_string(&map, "subject")?;
        let content = Self::required_string(&map, "content")?;
        let pinned = Self::optional_bool(&map, "pinned").unwrap_or(false);
        let body = json!({
            "subject": subject,
            "content_markdown": content,
            "pinned": pinned,
        });
        self.client.post(self.resource, body).await?;
        Ok(format!("Created note \"{}\"", subject))
    }

    async fn handle_save_link(&self, args: Value) -> ToolResult<String> {
        let map = Self::args_as_object(args)?;
        let url = Self::required_string(&map, "url")?;
        let title = Self::optional_string(&map, "title");
        let description = Self::optional_string(&map, "description");
        let highlights = Self::optional_string_array(&map, "highlights")?;
        let mut body = Map::new();
        body.insert("url".to_string(), json!(url));
        if let Some(title) = &title {
            body.insert("title".to_string(), json!(title));
        }
        if let Some(description) = description {
            body.insert("description".to_string(), json!(description));
        }
        body.insert("highlights".to_string(), json!(highlights));
        self.client.post(self.resource, Value::Object(body)).await?;
        Ok(format!("Saved link: {}", title.unwrap_or(url)))
    }

    async fn handle_list_links(&self, args: Value) -> ToolResult<String> {
        Self::args_as_object(args)?;
        let value = self.client.get(self.resource).await?;
        let links = value.as_array().ok_or_else(|| {
            McpError::internal_error("unexpected response shape from Reflect", None)
        })?;
        if links.is_empty() {
            return Ok("No links saved yet".to_string());
        }
        Ok(format!(
            "Saved links ({}):\n\n{}",
            links.len(),
            render_links(links)
        ))
    }

    async fn handle_list_books(&self, args: Value) -> ToolResult<String> {
        Self::args_as_object(args)?;
        let value = self.client.get(self.resource).await?;
        let books = value.as_array().ok_or_else(|| {
            McpError::internal_error("unexpected response shape from Reflect", None)
        })?;
        if books.is_empty() {
            return Ok("No books saved yet".to_string());
        }
        Ok(format!(
            "Saved books ({}):\n\n{}",
            books.len(),
            render_books(books)
        ))
    }

    async fn handle_reminder(&self, args: Value) -> ToolResult<String> {
        let map = Self::args_as_object(args)?;
        let date = Self::parse_note_date(&Self::required_string(&map, "date")?)?;
        let reminder = Self::required_string(&map, "reminder")?;
        let list_name =
            Self::optional_string(&map, "list_name").unwrap_or_else(|| "Reminders".to_string());
        self.append_daily(&date, format!("\u{1f514} {}", reminder), Some(list_name))
            .await?;
        Ok(format!("Reminder scheduled for {}", date))
    }

    pub async fn handle(&self, args: Value) -> Result<CallToolResult, McpError> {
        let result = match self.kind {
            ToolKind::DailyNote => self.handle_daily_note(args).await,
            ToolKind::DailyOffset { days } => self.handle_daily_offset(args, days).await,
            ToolKind::CreateNote => self.handle_create_note(args).await,
            ToolKind::SaveLink => self.handle_save_link(args).await,
            ToolKind::ListLinks => self.handle_list_links(args).await,
            ToolKind::ListBooks => self.handle_list_books(args).await,
            ToolKind::ScheduleReminder => self.handle_reminder(args).await,
        };
        match result {
            Ok(summary) => Ok(CallToolResult::success(vec![Content::text(summary)])),
            Err(ToolError::Api(err)) => {
                Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
            }
            Err(ToolError::Mcp(err)) => Err(err),
        }
    }
}

fn daily_note_body(date: &str, text: String, list_name: Option<String>) -> Value {
    let mut body = Map::new();
    body.insert("date".to_string(), json!(date));
    body.insert("text".to_string(), json!(text));
    body.insert("transform_type".to_string(), json!("list-append"));
    if let Some(list_name) = list_name {
        body.insert("list_name".to_string(), json!(list_name));
    }
    Value::Object(body)
}

fn render_links(links: &[Value]) -> String {
    let lines: Vec<String> = links
        .iter()
        .map(|link| {
            let url = link.get("url").and_then(Value::as_str).unwrap_or("(no url)");
            let title = link
                .get("title")
                .and_then(Value::as_str)
                .filter(|title| !title.is_empty())
                .unwrap_or("Untitled");
            let mut line = format!("- [{}]({})", title, url);
            if let Some(description) = link
                .get("description")
                .and_then(Value::as_str)
                .filter(|description| !description.is_empty())
            {
                line.push_str("\n  ");
                line.push_str(description);
            }
            line
        })
        .collect();
    lines.join("\n\n")
}

fn render_books(books: &[Value]) -> String {
    let lines: Vec<String> = books
        .iter()
        .map(|book| {
            let title = book
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("Untitled");
            let authors = book
                .get("authors")
                .and_then(Value::as_array)
                .map(|authors| {
                    authors
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .filter(|authors| !authors.is_empty())
                .unwrap_or_else(|| "Unknown author".to_string());
            let notes = book
                .get("notes")
                .and_then(Value::as_array)
                .map(|notes| notes.len())
                .unwrap_or(0);
            if notes > 0 {
                format!("- {} - {} ({} notes)", title, authors, notes)
            } else {
                format!("- {} - {}", title, authors)
            }
        })
        .collect();
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_schema_parses_as_an_object() {
        for spec in TOOL_SPECS {
            let schema = parse_schema(spec.schema);
            assert!(!schema.is_empty(), "schema for {} did not parse", spec.name);
            assert_eq!(schema.get("type"), Some(&json!("object")));
        }
    }

    #[test]
    fn required_fields_are_declared_in_properties() {
        for spec in TOOL_SPECS {
            let schema = parse_schema(spec.schema);
            let properties = schema
                .get("properties")
                .and_then(Value::as_object)
                .expect("properties object");
            let required = schema
                .get("required")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for field in required {
                let field = field.as_str().expect("required entry is a string");
                assert!(
                    properties.contains_key(field),
                    "{}: required `{}` missing from properties",
                    spec.name,
                    field
                );
            }
        }
    }

    #[test]
    fn tool_names_are_unique() {
        let mut names: Vec<_> = TOOL_SPECS.iter().map(|spec| spec.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TOOL_SPECS.len());
    }

    #[test]
    fn note_date_validation_accepts_iso_dates_only() {
        assert_eq!(
            ReflectTool::parse_note_date("2024-02-29").unwrap(),
            "2024-02-29"
        );
        assert!(ReflectTool::parse_note_date("2023-02-29").is_err());
        assert!(ReflectTool::parse_note_date("02/01/2024").is_err());
        assert!(ReflectTool::parse_note_date("tomorrow").is_err());
    }

    #[test]
    fn required_string_rejects_missing_and_non_string() {
        let map = as_map(json!({ "text": 42 }));
        assert!(ReflectTool::required_string(&map, "text").is_err());
        assert!(ReflectTool::required_string(&map, "absent").is_err());
        let map = as_map(json!({ "text": "hello" }));
        assert_eq!(ReflectTool::required_string(&map, "text").unwrap(), "hello");
    }

    #[test]
    fn optional_string_array_defaults_to_empty() {
        let map = as_map(json!({}));
        assert!(ReflectTool::optional_string_array(&map, "highlights")
            .unwrap()
            .is_empty());
        let map = as_map(json!({ "highlights": ["a", "b"] }));
        assert_eq!(
            ReflectTool::optional_string_array(&map, "highlights").unwrap(),
            vec!["a", "b"]
        );
        let map = as_map(json!({ "highlights": "not-an-array" }));
        assert!(ReflectTool::optional_string_array(&map, "highlights").is_err());
    }

    #[test]
    fn daily_note_body_omits_absent_list_name() {
        let body = daily_note_body("2024-01-02", "hi".to_string(), None);
        assert_eq!(body.get("date"), Some(&json!("2024-01-02")));
        assert_eq!(body.get("transform_type"), Some(&json!("list-append")));
        assert!(body.get("list_name").is_none());

        let body = daily_note_body("2024-01-02", "hi".to_string(), Some("Inbox".to_string()));
        assert_eq!(body.get("list_name"), Some(&json!("Inbox")));
    }

    #[test]
    fn links_render_with_title_fallback_and_description() {
        let links = vec![
            json!({ "url": "https://a.example", "title": "A", "description": "about A" }),
            json!({ "url": "https://b.example" }),
        ];
        let rendered = render_links(&links);
        assert!(rendered.contains("- [A](https://a.example)\n  about A"));
        assert!(rendered.contains("- [Untitled](https://b.example)"));
    }

    #[test]
    fn books_render_authors_and_note_counts() {
        let books = vec![
            json!({ "title": "Dune", "authors": ["Frank Herbert"], "notes": [1, 2] }),
            json!({ "title": "Untracked" }),
        ];
        let rendered = render_books(&books);
        assert!(rendered.contains("- Dune - Frank Herbert (2 notes)"));
        assert!(rendered.contains("- Untracked - Unknown author"));
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }
}
