use approx::assert_relative_eq;
use chronomap::EngineError;
use chronomap::core::{
    ChronosTime, Event, EventId, EventLocation, SourceId, ViewRange, Viewport,
};
use chronomap::data::{
    EventQuery, EventRow, EventSource, FetchSlot, IdentityQuery, QueryScope, RequestSlot,
    RequestTicket, StaticEventSource, TicketStatus, decode_rows,
};
use serde_json::json;

fn europe() -> Viewport {
    Viewport::new(60.0, 30.0, 40.0, -10.0)
}

#[test]
fn malformed_rows_are_dropped_without_aborting_the_batch() {
    let rows = vec![
        json!({
            "id": 42,
            "title": "Assassination in Sarajevo",
            "importance": "7",
            "start_time": {"year": 1914, "month": 6, "day": 28, "precision": "day"},
            "lat": 43.86,
            "lng": 18.41,
            "source_id": "WWI-SARAJEVO",
            "parent_id": "ww1"
        }),
        json!({"id": "no-title", "start_time": {"year": 1914}, "lat": 0.0, "lng": 0.0}),
        json!({"id": "year-zero", "title": "x", "start_time": {"year": 0}, "lat": 0.0, "lng": 0.0}),
        json!({"id": "polar", "title": "x", "start_time": {"year": 1}, "lat": 120.0, "lng": 0.0}),
        json!({
            "id": "typed",
            "title": "x",
            "start_time": {"year": 1},
            "lat": 0.0,
            "lng": 0.0,
            "children": 5
        }),
        json!({
            "id": "backwards",
            "title": "x",
            "start_time": {"year": 1918},
            "end_time": {"year": 1914},
            "lat": 0.0,
            "lng": 0.0
        }),
        json!({"id": "no-location", "title": "x", "start_time": {"year": 1}}),
    ];

    let decoded = decode_rows(rows);
    assert_eq!(decoded.events.len(), 1);
    let rejected: Vec<usize> = decoded.rejected.iter().map(|r| r.index).collect();
    assert_eq!(rejected, [1, 2, 3, 4, 5, 6]);

    let event = &decoded.events[0];
    assert_eq!(event.id, EventId::new("42"));
    assert_relative_eq!(event.importance, 7.0);
    assert_eq!(event.source_id, Some(SourceId::new("WWI-SARAJEVO")));
    assert_eq!(event.parent_id, Some(EventId::new("ww1")));
    assert_eq!(event.start().to_string(), "1914-06-28");

    let error: EngineError = decoded.rejected[0].clone().into();
    assert!(matches!(error, EngineError::InvalidRow { index: 1, .. }));
}

#[test]
fn store_column_aliases_are_accepted() {
    let rows = vec![json!({
        "id": "fall-of-rome",
        "title": "Fall of the Western Roman Empire",
        "start": {"year": 476},
        "end": {"year": 480},
        "latitude": 41.9,
        "longitude": 12.5,
        "location_name": "Rome",
        "precision": "area",
        "importance": 15
    })];
    let decoded = decode_rows(rows);
    assert!(decoded.rejected.is_empty());
    let event = &decoded.events[0];
    assert_relative_eq!(event.importance, 10.0);
    assert_eq!(event.location.place_name.as_deref(), Some("Rome"));
    assert!(event.has_meaningful_end());
}

#[test]
fn rows_round_trip_through_the_row_shape() {
    let event = Event::new(
        "moon",
        "Apollo 11",
        9.0,
        ChronosTime::from_ymd(1969, 7, 20),
        EventLocation::new(28.57, -80.65).with_place_name("Cape Canaveral"),
    )
    .with_source_id("APOLLO-11")
    .with_children(["EVA-1"])
    .with_collections(["space"]);

    let row = EventRow::from_event(&event);
    let back = row.into_event().expect("valid row");
    assert_eq!(back, event);
}

#[test]
fn deserialized_events_recompute_slider_positions() {
    let event = Event::new(
        "armistice",
        "Armistice",
        8.0,
        ChronosTime::from_ymd(1918, 11, 11),
        EventLocation::new(49.43, 2.91),
    )
    .with_end(ChronosTime::from_ymd(1918, 11, 12));

    let mut value = serde_json::to_value(&event).expect("event serializes");
    assert!(value.get("start_value").is_none());
    value["start_value"] = json!(-5000.0);
    value["end_value"] = json!(-5000.0);

    let back: Event = serde_json::from_value(value).expect("event deserializes");
    assert_eq!(back, event);
    assert_relative_eq!(back.start_value(), event.start().to_slider_value());
    assert!(back.end_value() > back.start_value());
}

#[test]
fn request_slots_keep_only_the_last_ticket() {
    let mut slot = RequestSlot::new(FetchSlot::Children);
    let (first, _) = slot.issue();
    let (second, superseded) = slot.issue();
    assert_eq!(superseded, Some(first));
    assert_eq!(slot.in_flight(), Some(second));

    assert_eq!(slot.complete(first).expect("issued"), TicketStatus::Stale);
    assert_eq!(slot.complete(second).expect("issued"), TicketStatus::Current);
    assert!(slot.in_flight().is_none());

    let (third, _) = slot.issue();
    assert_eq!(slot.cancel(), Some(third));
    assert_eq!(slot.complete(third).expect("issued"), TicketStatus::Stale);

    let foreign = RequestTicket {
        slot: FetchSlot::Base,
        generation: 1,
    };
    assert!(matches!(
        slot.complete(foreign),
        Err(EngineError::UnknownTicket { .. })
    ));
    let future = RequestTicket {
        slot: FetchSlot::Children,
        generation: 99,
    };
    assert!(slot.complete(future).is_err());
}

#[test]
fn tickets_order_by_slot_then_generation() {
    let mut base = RequestSlot::new(FetchSlot::Base);
    let mut children = RequestSlot::new(FetchSlot::Children);
    let (child, _) = children.issue();
    let (first, _) = base.issue();
    let (second, _) = base.issue();

    let mut tickets = vec![child, second, first];
    tickets.sort();
    assert_eq!(tickets, [first, second, child]);
    assert!(FetchSlot::Base < FetchSlot::Anchor);
}

fn catalog() -> Vec<Event> {
    let at = |id: &str, lat: f64, lng: f64, year: i32| {
        Event::new(
            id,
            id,
            5.0,
            ChronosTime::from_year(year),
            EventLocation::new(lat, lng),
        )
    };
    vec![
        at("war", 48.85, 2.35, 1914)
            .with_end(ChronosTime::from_year(1918))
            .with_source_id("S-WAR")
            .with_children(["S-VERDUN"]),
        at("verdun", 49.16, 5.38, 1916)
            .with_parent("war")
            .with_source_id("S-VERDUN"),
        at("trench-raid", 49.2, 5.4, 1916).with_parent("verdun"),
        at("rome", 41.9, 12.5, 1900).with_collections(["italy"]),
        at("new-york", 40.7, -74.0, 1916),
    ]
}

fn ids(rows: Vec<serde_json::Value>) -> Vec<String> {
    decode_rows(rows)
        .events
        .into_iter()
        .map(|event| event.id.0)
        .collect()
}

#[test]
fn static_source_filters_by_bounds_time_and_scope() {
    let source = StaticEventSource::new(catalog());
    let query = EventQuery {
        bounds: europe(),
        range: ViewRange::new(1910.0, 1920.0).expect("finite range"),
        zoom: 4.0,
        scope: QueryScope::new("history"),
    };
    let base = source.fetch_events(&query).expect("static source");
    assert_eq!(ids(base), ["war", "verdun", "trench-raid"]);

    let focused = EventQuery {
        scope: QueryScope::new("history").with_focus_root(EventId::new("war")),
        ..query.clone()
    };
    let descendants = source.fetch_events(&focused).expect("static source");
    assert_eq!(ids(descendants), ["verdun", "trench-raid"]);

    let collection = EventQuery {
        range: ViewRange::new(1800.0, 2000.0).expect("finite range"),
        scope: QueryScope::new("history").with_collection("italy"),
        ..query
    };
    assert_eq!(ids(source.fetch_events(&collection).expect("static source")), ["rome"]);
}

#[test]
fn static_source_looks_up_both_identity_spaces() {
    let source = StaticEventSource::new(catalog());
    let by_id = IdentityQuery::ByEventId(vec![EventId::new("war"), EventId::new("missing")]);
    assert_eq!(by_id.len(), 2);
    assert_eq!(ids(source.fetch_by_identity(&by_id).expect("static source")), ["war"]);

    let by_source = IdentityQuery::BySourceId(vec![SourceId::new("S-VERDUN")]);
    assert_eq!(
        ids(source.fetch_by_identity(&by_source).expect("static source")),
        ["verdun"]
    );
    assert!(IdentityQuery::BySourceId(Vec::new()).is_empty());
}
