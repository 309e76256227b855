use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::ChronosTime;
use crate::error::{EngineError, EngineResult};

/// Storage identity of an event, as issued by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Business identity used for parent/child linkage (`children` lists these).
///
/// Kept as a distinct type so it is never compared against an `EventId`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationGranularity {
    Spot,
    Area,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub place_name: Option<String>,
    #[serde(default)]
    pub granularity: LocationGranularity,
    #[serde(default)]
    pub area_id: Option<String>,
}

impl EventLocation {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            place_name: None,
            granularity: LocationGranularity::Spot,
            area_id: None,
        }
    }

    #[must_use]
    pub fn with_place_name(mut self, place_name: impl Into<String>) -> Self {
        self.place_name = Some(place_name.into());
        self
    }

    pub fn validate(self) -> EngineResult<Self> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(EngineError::InvalidData(format!(
                "latitude must be finite and within [-90, 90], got {}",
                self.lat
            )));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(EngineError::InvalidData(format!(
                "longitude must be finite and within [-180, 180], got {}",
                self.lng
            )));
        }
        Ok(self)
    }
}

/// Immutable event snapshot.
///
/// Start/end slider values are computed once at construction so filters and
/// the density estimator never re-derive them per frame. They are never
/// serialized; deserialization recomputes them from `start`/`end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EventFields")]
pub struct Event {
    pub id: EventId,
    pub source_id: Option<SourceId>,
    pub title: String,
    pub summary: String,
    pub importance: f64,
    start: ChronosTime,
    end: Option<ChronosTime>,
    pub location: EventLocation,
    pub children: Vec<SourceId>,
    pub parent_id: Option<EventId>,
    pub collections: Vec<String>,
    #[serde(skip)]
    start_value: f64,
    #[serde(skip)]
    end_value: Option<f64>,
}

/// Wire shape of `Event` without the derived slider values.
#[derive(Deserialize)]
struct EventFields {
    id: EventId,
    #[serde(default)]
    source_id: Option<SourceId>,
    title: String,
    #[serde(default)]
    summary: String,
    importance: f64,
    start: ChronosTime,
    #[serde(default)]
    end: Option<ChronosTime>,
    location: EventLocation,
    #[serde(default)]
    children: Vec<SourceId>,
    #[serde(default)]
    parent_id: Option<EventId>,
    #[serde(default)]
    collections: Vec<String>,
}

impl From<EventFields> for Event {
    fn from(fields: EventFields) -> Self {
        let mut event = Event::new(
            fields.id.0,
            fields.title,
            fields.importance,
            fields.start,
            fields.location,
        );
        if let Some(end) = fields.end {
            event = event.with_end(end);
        }
        event.source_id = fields.source_id;
        event.summary = fields.summary;
        event.children = fields.children;
        event.parent_id = fields.parent_id;
        event.collections = fields.collections;
        event
    }
}

impl Event {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        importance: f64,
        start: ChronosTime,
        location: EventLocation,
    ) -> Self {
        Self {
            id: EventId::new(id),
            source_id: None,
            title: title.into(),
            summary: String::new(),
            importance,
            start,
            end: None,
            location,
            children: Vec::new(),
            parent_id: None,
            collections: Vec::new(),
            start_value: start.to_slider_value(),
            end_value: None,
        }
    }

    #[must_use]
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(SourceId::new(source_id));
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    #[must_use]
    pub fn with_end(mut self, end: ChronosTime) -> Self {
        self.end = Some(end);
        self.end_value = Some(end.to_slider_value());
        self
    }

    #[must_use]
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(SourceId::new).collect();
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(EventId::new(parent_id));
        self
    }

    #[must_use]
    pub fn with_collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collections = collections.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn start(&self) -> ChronosTime {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Option<ChronosTime> {
        self.end
    }

    #[must_use]
    pub fn start_value(&self) -> f64 {
        self.start_value
    }

    /// End slider value, defaulting to the start for instantaneous events.
    #[must_use]
    pub fn end_value(&self) -> f64 {
        self.end_value.unwrap_or(self.start_value)
    }

    /// `true` when the event carries an end in a later year than its start.
    #[must_use]
    pub fn has_meaningful_end(&self) -> bool {
        self.end.is_some_and(|end| end.year > self.start.year)
    }
}

/// Geographic map bounds in degrees.
///
/// `west`/`east` may lie outside `[-180, 180]` after the map is panned
/// across the antimeridian any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    #[must_use]
    pub fn world() -> Self {
        Self::new(90.0, -90.0, 180.0, -180.0)
    }

    #[must_use]
    pub fn center_lng(self) -> f64 {
        (self.west + self.east) * 0.5
    }

    #[must_use]
    pub fn shifted_lng(self, degrees: f64) -> Self {
        Self {
            east: self.east + degrees,
            west: self.west + degrees,
            ..self
        }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        [self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Visible time window in slider units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRange {
    pub min: f64,
    pub max: f64,
}

impl ViewRange {
    /// Creates a range, swapping bounds given in reverse order.
    pub fn new(min: f64, max: f64) -> EngineResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(EngineError::InvalidData(
                "view range bounds must be finite".to_owned(),
            ));
        }
        Ok(Self {
            min: min.min(max),
            max: min.max(max),
        })
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.max - self.min
    }

    #[must_use]
    pub fn is_degenerate(self) -> bool {
        !(self.span() > 0.0)
    }

    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Inclusive interval overlap test.
    #[must_use]
    pub fn overlaps(self, start: f64, end: f64) -> bool {
        start.min(end) <= self.max && start.max(end) >= self.min
    }
}
