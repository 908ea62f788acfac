//! Calendar generation tool: writes a finalized itinerary as an .ics file.
//!
//! Constructed per user so generated files land under that user's own
//! directory. Event UIDs are derived from the user, title, date, and start
//! time, so regenerating the same itinerary yields stable UIDs.

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::{debug, warn};
use wayfarer_core::error::ToolError;
use wayfarer_core::message::UserId;
use wayfarer_core::tool::{Tool, ToolResult};

const MAX_TRIP_NAME_LEN: usize = 30;

pub struct CalendarTool {
    base_dir: PathBuf,
    user: UserId,
}

impl CalendarTool {
    pub fn new(base_dir: impl Into<PathBuf>, user: UserId) -> Self {
        Self {
            base_dir: base_dir.into(),
            user,
        }
    }

    fn render_event(&self, event: &serde_json::Value) -> Option<String> {
        let title = event["title"].as_str().map(str::trim).unwrap_or_default();
        let date_str = event["date"].as_str().map(str::trim).unwrap_or_default();
        if title.is_empty() || date_str.is_empty() {
            warn!("Skipping calendar event with missing title or date");
            return None;
        }

        let date = match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                warn!(date = date_str, error = %e, "Skipping calendar event with invalid date");
                return None;
            }
        };

        let start_time = event["start_time"].as_str().map(str::trim).filter(|s| !s.is_empty());
        let end_time = event["end_time"].as_str().map(str::trim).filter(|s| !s.is_empty());

        let uid_source = format!(
            "{}:{}:{}:{}",
            self.user.as_str(),
            title,
            date_str,
            start_time.unwrap_or("")
        );
        let uid_hash = hex_digest(&uid_source);
        let uid = format!("{}@wayfarer", &uid_hash[..12]);

        let mut lines = vec![
            "BEGIN:VEVENT".to_string(),
            format!("UID:{uid}"),
            format!("DTSTAMP:{}", Utc::now().format("%Y%m%dT%H%M%SZ")),
            format!("SUMMARY:{}", escape_text(title)),
        ];

        if let Some(start_str) = start_time {
            let start = match NaiveTime::parse_from_str(start_str, "%H:%M") {
                Ok(time) => date.and_time(time),
                Err(e) => {
                    warn!(time = start_str, error = %e, "Skipping calendar event with invalid start time");
                    return None;
                }
            };
            let end = match end_time {
                Some(end_str) => match NaiveTime::parse_from_str(end_str, "%H:%M") {
                    Ok(time) => date.and_time(time),
                    Err(e) => {
                        warn!(time = end_str, error = %e, "Skipping calendar event with invalid end time");
                        return None;
                    }
                },
                // Default 1 hour duration
                None => start + Duration::hours(1),
            };

            lines.push(format!("DTSTART:{}", start.format("%Y%m%dT%H%M%S")));
            lines.push(format!("DTEND:{}", end.format("%Y%m%dT%H%M%S")));
        } else {
            // All-day event
            lines.push(format!("DTSTART;VALUE=DATE:{}", date.format("%Y%m%d")));
            lines.push(format!(
                "DTEND;VALUE=DATE:{}",
                (date + Duration::days(1)).format("%Y%m%d")
            ));
        }

        if let Some(location) = event["location"].as_str().map(str::trim).filter(|s| !s.is_empty()) {
            lines.push(format!("LOCATION:{}", escape_text(location)));
        }
        if let Some(notes) = event["notes"].as_str().map(str::trim).filter(|s| !s.is_empty()) {
            lines.push(format!("DESCRIPTION:{}", escape_text(notes)));
        }

        // Timed events get a reminder 30 minutes before
        if start_time.is_some() {
            lines.push("BEGIN:VALARM".to_string());
            lines.push("ACTION:DISPLAY".to_string());
            lines.push(format!("DESCRIPTION:Reminder: {}", escape_text(title)));
            lines.push("TRIGGER:-PT30M".to_string());
            lines.push("END:VALARM".to_string());
        }

        lines.push("END:VEVENT".to_string());
        Some(lines.join("\r\n"))
    }
}

#[async_trait]
impl Tool for CalendarTool {
    fn name(&self) -> &str {
        "generate_calendar_ics"
    }

    fn description(&self) -> &str {
        "Generate an .ics calendar file from a finalized itinerary. Pass an events \
         array where each event has title and date (YYYY-MM-DD), with optional \
         start_time/end_time (HH:MM), location, and notes. A single event may \
         instead be passed via the top-level title and date fields. Timed events \
         get a 30-minute reminder; events without times are all-day."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "events": {
                    "type": "array",
                    "description": "Itinerary events",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "date": { "type": "string", "format": "date" },
                            "start_time": { "type": "string", "description": "HH:MM" },
                            "end_time": { "type": "string", "description": "HH:MM" },
                            "location": { "type": "string" },
                            "notes": { "type": "string" }
                        },
                        "required": ["title", "date"]
                    }
                },
                "trip_name": { "type": "string", "description": "Calendar display name" },
                "title": { "type": "string", "description": "Single-event title" },
                "date": { "type": "string", "format": "date", "description": "Single-event date" },
                "start_time": { "type": "string" },
                "end_time": { "type": "string" },
                "location": { "type": "string" },
                "notes": { "type": "string" }
            },
            "required": []
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let events: Vec<serde_json::Value> = match arguments["events"].as_array() {
            Some(events) if !events.is_empty() => events.clone(),
            _ => {
                // Single-event form: top-level title + date
                if arguments["title"].as_str().is_some() && arguments["date"].as_str().is_some() {
                    let mut single = serde_json::Map::new();
                    for key in ["title", "date", "start_time", "end_time", "location", "notes"] {
                        if let Some(value) = arguments.get(key) {
                            if !value.is_null() {
                                single.insert(key.to_string(), value.clone());
                            }
                        }
                    }
                    vec![serde_json::Value::Object(single)]
                } else {
                    return Err(ToolError::InvalidArguments("No events provided".into()));
                }
            }
        };

        let trip_name = arguments["trip_name"].as_str().unwrap_or("Travel Itinerary");

        let rendered: Vec<String> = events.iter().filter_map(|e| self.render_event(e)).collect();
        if rendered.is_empty() {
            return Err(ToolError::InvalidArguments(
                "No valid events: each event needs a title and a YYYY-MM-DD date".into(),
            ));
        }
        let events_count = rendered.len();

        let calendar = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Wayfarer//Travel Itinerary//EN\r\nX-WR-CALNAME:{}\r\n{}\r\nEND:VCALENDAR\r\n",
            escape_text(trip_name),
            rendered.join("\r\n"),
        );

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let safe_name: String = arguments["trip_name"]
            .as_str()
            .unwrap_or("itinerary")
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .take(MAX_TRIP_NAME_LEN)
            .collect();
        let user_dir = self.base_dir.join(self.user.as_str());
        tokio::fs::create_dir_all(&user_dir)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("failed to create calendar directory: {e}"),
            })?;

        // Same trip name within the same second: suffix, never overwrite.
        let mut filename = format!("{timestamp}_{safe_name}.ics");
        let mut file_path = user_dir.join(&filename);
        let mut suffix = 1;
        while file_path.exists() {
            filename = format!("{timestamp}_{safe_name}_{suffix}.ics");
            file_path = user_dir.join(&filename);
            suffix += 1;
        }

        tokio::fs::write(&file_path, &calendar)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("failed to write calendar file: {e}"),
            })?;

        debug!(path = %file_path.display(), events = events_count, "Calendar file written");

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: format!("{events_count} events in {filename}"),
            data: Some(serde_json::json!({
                "file_path": file_path.to_string_lossy(),
                "filename": filename,
                "events_count": events_count,
            })),
        })
    }
}

fn hex_digest(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Escape text per RFC 5545 (commas, semicolons, backslashes, newlines).
fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(';', "\\;")
        .replace('\n', "\\n")
}
