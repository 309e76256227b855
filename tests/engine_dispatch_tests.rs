use chronomap::EngineError;
use chronomap::api::{EngineAction, EngineConfig, EngineEffect, ExplorerEngine, FetchQuery};
use chronomap::core::{ChronosTime, Event, EventId, EventLocation, ViewRange, Viewport};
use chronomap::data::{EventSource, FetchSlot, RequestTicket, StaticEventSource};
use chronomap::interaction::InteractionMode;
use chronomap::render::{EquirectangularProjection, NullRenderer};

fn europe() -> Viewport {
    Viewport::new(60.0, 30.0, 40.0, -10.0)
}

fn projection() -> EquirectangularProjection {
    EquirectangularProjection::new(europe(), 1_000.0, 600.0)
}

fn at(id: &str, lat: f64, lng: f64, importance: f64, year: i32) -> Event {
    Event::new(
        id,
        id,
        importance,
        ChronosTime::from_year(year),
        EventLocation::new(lat, lng),
    )
}

fn source() -> StaticEventSource {
    StaticEventSource::new(vec![
        at("rome", 41.9, 12.5, 9.0, 1900).with_source_id("S-ROME"),
        at("war", 48.85, 2.35, 9.0, 1914)
            .with_end(ChronosTime::from_year(1918))
            .with_source_id("S-WAR")
            .with_children(["S-B1", "S-B2"]),
        at("b1", 49.0, 2.0, 2.0, 1916)
            .with_parent("war")
            .with_source_id("S-B1"),
        at("b2", 40.7, -74.0, 2.0, 1917)
            .with_parent("war")
            .with_source_id("S-B2"),
        at("ny", 40.7, -74.0, 9.0, 1900),
    ])
}

fn config() -> EngineConfig {
    EngineConfig::new("history")
        .with_viewport(europe(), 6.0)
        .with_view_range(ViewRange::new(1850.0, 1950.0).expect("finite range"))
}

fn loaded_engine(source: &StaticEventSource) -> ExplorerEngine<NullRenderer> {
    let mut engine = ExplorerEngine::new(NullRenderer::default(), config()).expect("engine init");
    let effects = engine.dispatch(EngineAction::Refresh).expect("refresh");
    engine
        .resolve_effects_with(source, effects)
        .expect("static source never fails");
    engine
}

fn merged_ids(engine: &ExplorerEngine<NullRenderer>) -> Vec<String> {
    engine
        .merged_events()
        .ids()
        .map(|id| id.0.clone())
        .collect()
}

fn fetches(effects: &[EngineEffect]) -> Vec<FetchSlot> {
    effects
        .iter()
        .filter_map(EngineEffect::as_fetch)
        .map(|request| request.ticket.slot)
        .collect()
}

fn superseded(effects: &[EngineEffect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, EngineEffect::Superseded(_)))
        .count()
}

#[test]
fn refresh_issues_one_base_fetch_for_the_view() {
    let mut engine = ExplorerEngine::new(NullRenderer::default(), config()).expect("engine init");
    let effects = engine.dispatch(EngineAction::Refresh).expect("refresh");
    assert_eq!(fetches(&effects), [FetchSlot::Base]);

    let Some(FetchQuery::Events(query)) = effects[0].as_fetch().map(|r| &r.query) else {
        panic!("expected an events query");
    };
    assert_eq!(query.bounds, europe());
    assert_eq!(query.scope.dataset, "history");
    assert!(query.scope.focus_root.is_none());
}

#[test]
fn exploration_frame_renders_important_events_in_view() {
    let source = source();
    let mut engine = loaded_engine(&source);
    assert_eq!(merged_ids(&engine), ["rome", "war", "b1"]);
    assert_eq!(engine.lod_threshold(), 4);

    let frame = engine.frame(0.0, &projection()).expect("frame");
    let ids: Vec<&str> = frame
        .renderable
        .iter()
        .map(|item| item.event.id.as_str())
        .collect();
    assert_eq!(ids, ["rome", "war"]);
    assert_eq!(frame.mode, InteractionMode::Exploration);
    assert_eq!(frame.lod_threshold, 4);
    assert_eq!(frame.track_histogram.len(), 400);
    assert_eq!(frame.overview_histogram.len(), 300);
    assert!(frame.track_histogram.iter().any(|value| *value > 0.0));
    frame.validate().expect("frame is well formed");
}

#[test]
fn selection_highlights_and_overrides_lod() {
    let source = source();
    let mut engine = loaded_engine(&source);
    engine
        .dispatch(EngineAction::Select(Some(EventId::new("b1"))))
        .expect("select");
    let frame = engine.frame(0.0, &projection()).expect("frame");
    let b1 = frame
        .renderable
        .iter()
        .find(|item| item.event.id.as_str() == "b1")
        .expect("selected event renders");
    assert!(b1.highlighted);
    assert_eq!(engine.selected(), Some(&EventId::new("b1")));
}

#[test]
fn focus_drill_down_loads_anchor_and_children() {
    let source = source();
    let mut engine = loaded_engine(&source);

    let effects = engine
        .dispatch(EngineAction::Focus(EventId::new("war")))
        .expect("focus");
    assert_eq!(fetches(&effects), [FetchSlot::Base, FetchSlot::Anchor]);
    // The scope changed, so the old base results are gone right away.
    assert!(engine.base_cache().is_empty());
    assert_eq!(engine.focus_stack().entries(), [EventId::new("war")]);

    engine
        .resolve_effects_with(&source, effects)
        .expect("static source never fails");
    // Base (descendants in view), then anchor, then the children not yet present.
    assert_eq!(merged_ids(&engine), ["b1", "war", "b2"]);
    assert_eq!(engine.merged_events().source_index_len(), 3);
    assert!(!engine.snapshot().can_go_up);

    let frame = engine.frame(0.0, &projection()).expect("frame");
    let rendered: Vec<(&str, bool)> = frame
        .renderable
        .iter()
        .map(|item| (item.event.id.as_str(), item.highlighted))
        .collect();
    // b1 is below the threshold but is a child of the focus root; b2 is out of view.
    assert_eq!(rendered, [("b1", false), ("war", true)]);
}

#[test]
fn focus_navigation_supersedes_in_flight_requests() {
    let source = source();
    let mut engine = loaded_engine(&source);
    let effects = engine
        .dispatch(EngineAction::Focus(EventId::new("war")))
        .expect("focus");
    engine
        .resolve_effects_with(&source, effects)
        .expect("static source never fails");

    let deeper = engine
        .dispatch(EngineAction::Focus(EventId::new("b1")))
        .expect("focus child");
    assert_eq!(fetches(&deeper), [FetchSlot::Base, FetchSlot::Anchor]);
    let snapshot = engine.snapshot();
    assert_eq!(
        snapshot.focus_stack,
        [EventId::new("war"), EventId::new("b1")]
    );
    assert!(snapshot.can_go_up);

    // Leaving before the deeper requests return cancels them.
    let up = engine.dispatch(EngineAction::FocusUp).expect("focus up");
    assert_eq!(superseded(&up), 2);
    assert_eq!(fetches(&up), [FetchSlot::Base, FetchSlot::Anchor]);
    assert_eq!(engine.focus_stack().entries(), [EventId::new("war")]);

    engine
        .resolve_effects_with(&source, up)
        .expect("static source never fails");
    assert_eq!(merged_ids(&engine), ["b1", "war", "b2"]);

    let exit = engine.dispatch(EngineAction::FocusExit).expect("exit");
    assert_eq!(fetches(&exit), [FetchSlot::Base]);
    engine
        .resolve_effects_with(&source, exit)
        .expect("static source never fails");
    assert!(engine.focus_stack().entries().is_empty());
    assert_eq!(merged_ids(&engine), ["rome", "war", "b1"]);

    assert!(
        engine
            .dispatch(EngineAction::FocusExit)
            .expect("exit again")
            .is_empty()
    );
}

#[test]
fn stale_base_results_are_ignored() {
    let source = source();
    let mut engine = loaded_engine(&source);

    let wide = engine
        .dispatch(EngineAction::SetViewport {
            viewport: Viewport::world(),
            map_zoom: 2.0,
        })
        .expect("pan out");
    let stale = wide[0].as_fetch().expect("base fetch").clone();

    let back = engine
        .dispatch(EngineAction::SetViewport {
            viewport: europe(),
            map_zoom: 6.0,
        })
        .expect("pan back");
    assert_eq!(superseded(&back), 1);

    let FetchQuery::Events(query) = &stale.query else {
        panic!("base fetch queries events");
    };
    let late_rows = source.fetch_events(query).expect("static source");
    let applied = engine
        .dispatch(EngineAction::FetchCompleted {
            ticket: stale.ticket,
            result: Ok(late_rows),
        })
        .expect("stale ticket is known");
    assert!(applied.is_empty());
    assert!(!engine.merged_events().contains(&EventId::new("ny")));

    engine
        .resolve_effects_with(&source, back)
        .expect("static source never fails");
    assert_eq!(merged_ids(&engine), ["rome", "war", "b1"]);
}

#[test]
fn unknown_tickets_are_rejected() {
    let source = source();
    let mut engine = loaded_engine(&source);
    let result = engine.dispatch(EngineAction::FetchCompleted {
        ticket: RequestTicket {
            slot: FetchSlot::Anchor,
            generation: 42,
        },
        result: Ok(Vec::new()),
    });
    assert!(matches!(result, Err(EngineError::UnknownTicket { .. })));
}

#[test]
fn failed_base_fetch_keeps_the_cache() {
    let source = source();
    let mut engine = loaded_engine(&source);
    let effects = engine.dispatch(EngineAction::Refresh).expect("refresh");
    let ticket = effects[0].as_fetch().expect("base fetch").ticket;
    engine
        .dispatch(EngineAction::FetchCompleted {
            ticket,
            result: Err(EngineError::Fetch("timeout".to_owned())),
        })
        .expect("failure is absorbed");
    assert_eq!(merged_ids(&engine), ["rome", "war", "b1"]);
}

#[test]
fn failed_anchor_fetch_leaves_base_results_only() {
    let source = source();
    let mut engine = loaded_engine(&source);
    let effects = engine
        .dispatch(EngineAction::Focus(EventId::new("war")))
        .expect("focus");
    for effect in effects {
        let EngineEffect::Fetch(request) = effect else {
            continue;
        };
        let result = match (&request.query, request.ticket.slot) {
            (_, FetchSlot::Anchor) => Err(EngineError::Fetch("anchor unavailable".to_owned())),
            (FetchQuery::Events(query), _) => source.fetch_events(query),
            (FetchQuery::Identity(query), _) => source.fetch_by_identity(query),
        };
        let follow_up = engine
            .dispatch(EngineAction::FetchCompleted {
                ticket: request.ticket,
                result,
            })
            .expect("completion");
        assert!(fetches(&follow_up).is_empty());
    }
    assert_eq!(merged_ids(&engine), ["b1"]);
    assert_eq!(engine.focus_stack().entries(), [EventId::new("war")]);
}

#[test]
fn scope_change_resets_data_and_navigation() {
    let source = source();
    let mut engine = loaded_engine(&source);
    engine
        .dispatch(EngineAction::Select(Some(EventId::new("rome"))))
        .expect("select");
    engine
        .dispatch(EngineAction::Focus(EventId::new("war")))
        .expect("focus");

    let effects = engine
        .dispatch(EngineAction::SetScope {
            dataset: "other".to_owned(),
            collection: None,
        })
        .expect("scope change");
    assert_eq!(fetches(&effects), [FetchSlot::Base]);
    assert!(engine.merged_events().is_empty());
    assert!(engine.base_cache().is_empty());
    assert!(engine.selected().is_none());
    assert!(engine.focus_stack().entries().is_empty());
    assert_eq!(engine.snapshot().dataset, "other");

    assert!(
        engine
            .dispatch(EngineAction::SetScope {
                dataset: "  ".to_owned(),
                collection: None,
            })
            .is_err()
    );
}

#[test]
fn invalid_numeric_input_leaves_state_untouched() {
    let source = source();
    let mut engine = loaded_engine(&source);
    let before = engine.snapshot();
    assert!(
        engine
            .dispatch(EngineAction::SetViewport {
                viewport: europe(),
                map_zoom: f64::NAN,
            })
            .is_err()
    );
    assert!(engine.dispatch(EngineAction::SetTimePointer(f64::INFINITY)).is_err());
    assert!(engine.dispatch(EngineAction::SetPlaybackSpeed(0.0)).is_err());
    assert!(engine.frame(f64::NAN, &projection()).is_err());
    assert_eq!(engine.snapshot(), before);
}

#[test]
fn playback_reveals_and_expands_events_through_frames() {
    let source = source();
    let mut engine = loaded_engine(&source);
    engine
        .dispatch(EngineAction::SetTimePointer(1899.5))
        .expect("seek");
    engine
        .dispatch(EngineAction::StartPlayback { now_ms: 0.0 })
        .expect("start");
    assert_eq!(engine.mode(), InteractionMode::Playback);
    assert!(engine.is_playing());

    let frame = engine.frame(500.0, &projection()).expect("frame");
    assert_eq!(frame.time_pointer, 1909.5);
    assert_eq!(frame.renderable.len(), 1);
    let rome = &frame.renderable[0];
    assert_eq!(rome.event.id.as_str(), "rome");
    assert!(rome.expanded && rome.played);
    let offset = rome.offset.expect("expanded card is placed");
    assert_eq!(offset.offset_x, 0.0);
    let lift = engine.config().card_layout.anchor_offset_y;
    assert!((offset.offset_y + lift).abs() <= 1e-9);

    // The war ends before the next pointer, so it is revealed but already folded.
    engine.render(1_000.0, &projection()).expect("render");
    let renderer = engine.renderer();
    assert_eq!(renderer.frames_rendered, 1);
    assert_eq!(renderer.last_event_count, 3);
    assert_eq!(renderer.last_expanded_count, 2);
    assert!(engine.played().contains(&EventId::new("war")));
    assert!(!engine.expanded().contains(&EventId::new("war")));

    engine
        .dispatch(EngineAction::SetMode(InteractionMode::Exploration))
        .expect("leave playback");
    assert!(!engine.is_playing());
}

#[test]
fn manual_expansion_places_a_card_outside_playback() {
    let source = source();
    let mut engine = loaded_engine(&source);
    engine
        .dispatch(EngineAction::ToggleExpanded(EventId::new("rome")))
        .expect("toggle");
    let frame = engine.frame(0.0, &projection()).expect("frame");
    assert_eq!(frame.expanded_count(), 1);
    let rome = frame
        .renderable
        .iter()
        .find(|item| item.expanded)
        .expect("expanded card");
    assert!(rome.offset.is_some());

    let renderer = {
        engine.render(16.0, &projection()).expect("render");
        engine.into_renderer()
    };
    assert_eq!(renderer.last_expanded_count, 1);
}
