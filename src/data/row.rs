use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::core::{ChronosTime, Event, EventId, EventLocation, LocationGranularity, SourceId};
use crate::error::{EngineError, EngineResult};

const DEFAULT_IMPORTANCE: f64 = 1.0;
const MIN_IMPORTANCE: f64 = 1.0;
const MAX_IMPORTANCE: f64 = 10.0;

/// Loosely typed event row as returned by the remote store.
///
/// Every field is optional here; `into_event` decides what is required.
/// A field of the wrong JSON type fails deserialization of the whole row,
/// which `decode_rows` records as a rejection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub importance: Option<Value>,
    #[serde(default, alias = "start")]
    pub start_time: Option<ChronosTime>,
    #[serde(default, alias = "end")]
    pub end_time: Option<ChronosTime>,
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "longitude")]
    pub lng: Option<f64>,
    #[serde(default, alias = "location_name")]
    pub place_name: Option<String>,
    #[serde(default, alias = "precision")]
    pub granularity: Option<LocationGranularity>,
    #[serde(default)]
    pub area_id: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<String>>,
    #[serde(default)]
    pub parent_id: Option<Value>,
    #[serde(default)]
    pub collections: Option<Vec<String>>,
}

impl EventRow {
    /// Validates the row into an immutable `Event`.
    pub fn into_event(self) -> EngineResult<Event> {
        let id = identity_from_value(self.id.as_ref())
            .ok_or_else(|| EngineError::InvalidData("row has no usable `id`".to_owned()))?;
        let title = self
            .title
            .filter(|title| !title.trim().is_empty())
            .ok_or_else(|| EngineError::InvalidData("row has no `title`".to_owned()))?;
        let start = self
            .start_time
            .ok_or_else(|| EngineError::InvalidData("row has no `start_time`".to_owned()))?
            .validate()?;
        let end = self.end_time.map(ChronosTime::validate).transpose()?;
        let (lat, lng) = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                return Err(EngineError::InvalidData(
                    "row has no `lat`/`lng` pair".to_owned(),
                ));
            }
        };
        let location = EventLocation {
            lat,
            lng,
            place_name: self.place_name,
            granularity: self.granularity.unwrap_or_default(),
            area_id: self.area_id,
        }
        .validate()?;

        let importance = importance_from_value(self.importance.as_ref());
        let mut event = Event::new(id, title, importance, start, location);
        if let Some(end) = end {
            if end.to_slider_value() < start.to_slider_value() {
                return Err(EngineError::InvalidData(
                    "row `end_time` precedes `start_time`".to_owned(),
                ));
            }
            event = event.with_end(end);
        }
        event.source_id = self
            .source_id
            .filter(|source| !source.is_empty())
            .map(SourceId::new);
        event.summary = self.summary.unwrap_or_default();
        event.children = self
            .children
            .unwrap_or_default()
            .into_iter()
            .filter(|child| !child.is_empty())
            .map(SourceId::new)
            .collect();
        event.parent_id = identity_from_value(self.parent_id.as_ref()).map(EventId::new);
        event.collections = self.collections.unwrap_or_default();
        Ok(event)
    }

    /// Serializes an event back into the remote row shape.
    #[must_use]
    pub fn from_event(event: &Event) -> Self {
        Self {
            id: Some(Value::String(event.id.0.clone())),
            source_id: event.source_id.as_ref().map(|source| source.0.clone()),
            title: Some(event.title.clone()),
            summary: Some(event.summary.clone()),
            importance: serde_json::Number::from_f64(event.importance).map(Value::Number),
            start_time: Some(event.start()),
            end_time: event.end(),
            lat: Some(event.location.lat),
            lng: Some(event.location.lng),
            place_name: event.location.place_name.clone(),
            granularity: Some(event.location.granularity),
            area_id: event.location.area_id.clone(),
            children: Some(event.children.iter().map(|child| child.0.clone()).collect()),
            parent_id: event.parent_id.as_ref().map(|id| Value::String(id.0.clone())),
            collections: Some(event.collections.clone()),
        }
    }
}

/// A row that failed validation, with its position in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRejection {
    pub index: usize,
    pub reason: String,
}

impl From<RowRejection> for EngineError {
    fn from(rejection: RowRejection) -> Self {
        EngineError::InvalidRow {
            index: rejection.index,
            reason: rejection.reason,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRows {
    pub events: Vec<Event>,
    pub rejected: Vec<RowRejection>,
}

/// Decodes a whole response. Malformed rows are dropped and reported; they
/// never abort the rest of the batch.
#[must_use]
pub fn decode_rows(rows: Vec<Value>) -> DecodedRows {
    let mut decoded = DecodedRows {
        events: Vec::with_capacity(rows.len()),
        rejected: Vec::new(),
    };
    for (index, value) in rows.into_iter().enumerate() {
        let result = serde_json::from_value::<EventRow>(value)
            .map_err(|e| e.to_string())
            .and_then(|row| row.into_event().map_err(|e| e.to_string()));
        match result {
            Ok(event) => decoded.events.push(event),
            Err(reason) => decoded.rejected.push(RowRejection { index, reason }),
        }
    }
    if !decoded.rejected.is_empty() {
        warn!(
            accepted = decoded.events.len(),
            rejected = decoded.rejected.len(),
            first_reason = %decoded.rejected[0].reason,
            "dropped malformed event rows"
        );
    }
    decoded
}

fn identity_from_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Numeric importance clamped to `[1, 10]`; missing or non-numeric values fall back to 1.
fn importance_from_value(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .map_or(DEFAULT_IMPORTANCE, |v| v.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn importance_parsing_matches_pipeline_rules() {
        assert_eq!(importance_from_value(Some(&json!(12.5))), 10.0);
        assert_eq!(importance_from_value(Some(&json!(-3))), 1.0);
        assert_eq!(importance_from_value(Some(&json!(0.4))), 1.0);
        assert_eq!(importance_from_value(Some(&json!("7.25"))), 7.25);
        assert_eq!(importance_from_value(Some(&json!("n/a"))), 1.0);
        assert_eq!(importance_from_value(None), 1.0);
    }

    #[test]
    fn numeric_ids_are_stringified() {
        assert_eq!(identity_from_value(Some(&json!(42))), Some("42".to_owned()));
        assert_eq!(identity_from_value(Some(&json!(""))), None);
        assert_eq!(identity_from_value(Some(&json!([1]))), None);
    }
}
