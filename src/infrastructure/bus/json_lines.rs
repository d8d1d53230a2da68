//! Line-oriented event bus
//!
//! Accepts either a JSON object per line (`{"tag": "...", "data": {...}}`)
//! or the `tag<TAB>json` form printed by `salt-run state.event`.

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use crate::application::ports::{BusError, EventBus};
use crate::domain::event::Event;

/// Event bus reading one event per line
pub struct JsonLinesBus<R> {
    reader: R,
    source: String,
    line: String,
}

impl JsonLinesBus<BufReader<Stdin>> {
    /// Read events from the process's standard input
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin://")
    }
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesBus<R> {
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self {
            reader,
            source: source.into(),
            line: String::new(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventBus for JsonLinesBus<R> {
    fn uri(&self) -> String {
        self.source.clone()
    }

    async fn next_event(&mut self) -> Result<Option<Event>, BusError> {
        self.line.clear();
        let n = self
            .reader
            .read_line(&mut self.line)
            .await
            .map_err(|e| BusError::Io(e.to_string()))?;
        if n == 0 {
            return Err(BusError::Closed);
        }
        parse_line(&self.line)
    }
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Event>, BusError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if line.starts_with('{') {
        let value: Value =
            serde_json::from_str(line).map_err(|e| BusError::Malformed(e.to_string()))?;
        let tag = value
            .get("tag")
            .and_then(Value::as_str)
            .ok_or_else(|| BusError::Malformed("missing 'tag' field".to_string()))?
            .to_string();
        let data = value.get("data").cloned().unwrap_or(Value::Null);
        return Ok(Some(Event::from_value(tag, data)));
    }

    match line.split_once(char::is_whitespace) {
        Some((tag, json)) => {
            let data: Value = serde_json::from_str(json.trim())
                .map_err(|e| BusError::Malformed(format!("{}: {}", tag, e)))?;
            Ok(Some(Event::from_value(tag, data)))
        }
        None => Ok(Some(Event::from_value(line, Value::Null))),
    }
}
