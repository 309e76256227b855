use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::Event;
use crate::data::{
    BaseCache, EventQuery, EventSource, FetchSlot, IdentityQuery, RequestSlot, RequestTicket,
    TicketStatus, decode_rows, hybrid_merge,
};
use crate::error::EngineResult;
use crate::render::Renderer;

use super::{EngineAction, EngineEffect, ExplorerEngine, FetchQuery, FetchRequest};

impl<R: Renderer> ExplorerEngine<R> {
    /// Runs fetch effects against `source` inline, feeding every completion
    /// back through `dispatch` until no request is left.
    pub fn resolve_effects_with<S: EventSource>(
        &mut self,
        source: &S,
        effects: Vec<EngineEffect>,
    ) -> EngineResult<()> {
        let mut queue: VecDeque<EngineEffect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            let EngineEffect::Fetch(request) = effect else {
                continue;
            };
            let result = match &request.query {
                FetchQuery::Events(query) => source.fetch_events(query),
                FetchQuery::Identity(query) => source.fetch_by_identity(query),
            };
            let follow_up = self.dispatch(EngineAction::FetchCompleted {
                ticket: request.ticket,
                result,
            })?;
            queue.extend(follow_up);
        }
        Ok(())
    }

    /// Issues a base request for the current view and scope. A scope change
    /// empties the accumulated cache first.
    pub(super) fn issue_base_fetch(&mut self, effects: &mut Vec<EngineEffect>) {
        let scope = self.query_scope();
        if self.data.base.scope() != Some(&scope) {
            let mut fresh = BaseCache::new();
            fresh.bind_scope(&scope);
            self.data.base = Arc::new(fresh);
            debug!(dataset = %scope.dataset, focus_root = ?scope.focus_root, "base scope reset");
            self.remerge();
        }
        let query = FetchQuery::Events(EventQuery {
            bounds: self.view.viewport,
            range: self.view.view_range,
            zoom: self.view.map_zoom,
            scope,
        });
        issue(&mut self.data.base_slot, query, effects);
    }

    /// Requests the focus root by storage id, or cancels the anchor slot when
    /// nothing is focused.
    pub(super) fn issue_anchor_fetch(&mut self, effects: &mut Vec<EngineEffect>) {
        match self.focus.active_root().cloned() {
            Some(root) => issue(
                &mut self.data.anchor_slot,
                FetchQuery::Identity(IdentityQuery::ByEventId(vec![root])),
                effects,
            ),
            None => cancel(&mut self.data.anchor_slot, effects),
        }
    }

    /// Drops anchor and children state; their slots stop accepting results.
    pub(super) fn clear_focus_data(&mut self, effects: &mut Vec<EngineEffect>) {
        self.data.anchor = None;
        self.data.children = Arc::new(Vec::new());
        cancel(&mut self.data.anchor_slot, effects);
        cancel(&mut self.data.children_slot, effects);
    }

    pub(super) fn complete_fetch(
        &mut self,
        ticket: RequestTicket,
        result: EngineResult<Vec<Value>>,
    ) -> EngineResult<Vec<EngineEffect>> {
        let slot = match ticket.slot {
            FetchSlot::Base => &mut self.data.base_slot,
            FetchSlot::Anchor => &mut self.data.anchor_slot,
            FetchSlot::Children => &mut self.data.children_slot,
        };
        if slot.complete(ticket)? == TicketStatus::Stale {
            debug!(
                slot = %ticket.slot,
                generation = ticket.generation,
                "stale fetch result dropped"
            );
            return Ok(Vec::new());
        }

        let mut effects = Vec::new();
        match ticket.slot {
            FetchSlot::Base => self.apply_base(result),
            FetchSlot::Anchor => self.apply_anchor(result, &mut effects),
            FetchSlot::Children => self.apply_children(result),
        }
        self.remerge();
        Ok(effects)
    }

    fn apply_base(&mut self, result: EngineResult<Vec<Value>>) {
        match result {
            Ok(rows) => {
                let decoded = decode_rows(rows);
                let mut next = (*self.data.base).clone();
                next.absorb(decoded.events);
                self.data.base = Arc::new(next);
            }
            Err(err) => {
                warn!(
                    error = %err,
                    cached = self.data.base.len(),
                    "base fetch failed; keeping cache"
                );
            }
        }
    }

    fn apply_anchor(&mut self, result: EngineResult<Vec<Value>>, effects: &mut Vec<EngineEffect>) {
        let root = self.focus.active_root().cloned();
        let anchor = match result {
            Ok(rows) => decode_rows(rows)
                .events
                .into_iter()
                .find(|event| Some(&event.id) == root.as_ref()),
            Err(err) => {
                warn!(error = %err, "anchor fetch failed");
                None
            }
        };

        let Some(anchor) = anchor else {
            self.data.anchor = None;
            self.data.children = Arc::new(Vec::new());
            cancel(&mut self.data.children_slot, effects);
            return;
        };
        self.update_focus(|stack| stack.resolve(&anchor));
        if anchor.children.is_empty() {
            self.data.children = Arc::new(Vec::new());
            cancel(&mut self.data.children_slot, effects);
        } else {
            issue(
                &mut self.data.children_slot,
                FetchQuery::Identity(IdentityQuery::BySourceId(anchor.children.clone())),
                effects,
            );
        }
        self.data.anchor = Some(Arc::new(anchor));
    }

    fn apply_children(&mut self, result: EngineResult<Vec<Value>>) {
        let children: Vec<Event> = match (result, self.data.anchor.as_deref()) {
            (Ok(rows), Some(anchor)) => decode_rows(rows)
                .events
                .into_iter()
                .filter(|event| {
                    event
                        .source_id
                        .as_ref()
                        .is_some_and(|source| anchor.children.contains(source))
                })
                .collect(),
            (Ok(_), None) => Vec::new(),
            (Err(err), _) => {
                warn!(error = %err, "children fetch failed");
                Vec::new()
            }
        };
        self.data.children = Arc::new(children);
    }

    pub(super) fn remerge(&mut self) {
        let merged = hybrid_merge(
            self.data.base.events(),
            self.data.anchor.as_deref(),
            &self.data.children,
        );
        self.data.merged = Arc::new(merged);
        self.data.generation += 1;
    }
}

fn issue(slot: &mut RequestSlot, query: FetchQuery, effects: &mut Vec<EngineEffect>) {
    let (ticket, superseded) = slot.issue();
    if let Some(previous) = superseded {
        debug!(
            slot = %previous.slot,
            generation = previous.generation,
            "in-flight fetch superseded"
        );
        effects.push(EngineEffect::Superseded(previous));
    }
    effects.push(EngineEffect::Fetch(FetchRequest { ticket, query }));
}

fn cancel(slot: &mut RequestSlot, effects: &mut Vec<EngineEffect>) {
    if let Some(previous) = slot.cancel() {
        debug!(
            slot = %previous.slot,
            generation = previous.generation,
            "in-flight fetch cancelled"
        );
        effects.push(EngineEffect::Superseded(previous));
    }
}
