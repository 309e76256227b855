use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{EngineError, EngineResult};

/// Logical fetch slots. Each slot has at most one live request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchSlot {
    Base,
    Anchor,
    Children,
}

impl fmt::Display for FetchSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Base => "base",
            Self::Anchor => "anchor",
            Self::Children => "children",
        })
    }
}

/// Handle identifying one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestTicket {
    pub slot: FetchSlot,
    pub generation: u64,
}

/// Outcome of presenting a completed ticket to its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    /// The ticket is the latest one issued; its result should be applied.
    Current,
    /// A newer request was issued (or the slot was cancelled); drop the result.
    Stale,
}

/// "Last request wins" bookkeeping for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSlot {
    slot: FetchSlot,
    issued: u64,
    in_flight: Option<u64>,
}

impl RequestSlot {
    #[must_use]
    pub fn new(slot: FetchSlot) -> Self {
        Self {
            slot,
            issued: 0,
            in_flight: None,
        }
    }

    #[must_use]
    pub fn slot(&self) -> FetchSlot {
        self.slot
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<RequestTicket> {
        self.in_flight.map(|generation| self.ticket(generation))
    }

    /// Issues a new ticket. Returns it with the ticket it supersedes, if any.
    pub fn issue(&mut self) -> (RequestTicket, Option<RequestTicket>) {
        let superseded = self.in_flight();
        self.issued += 1;
        self.in_flight = Some(self.issued);
        trace!(slot = %self.slot, generation = self.issued, "request issued");
        (self.ticket(self.issued), superseded)
    }

    /// Drops the live request without issuing a new one.
    pub fn cancel(&mut self) -> Option<RequestTicket> {
        let cancelled = self.in_flight();
        self.in_flight = None;
        cancelled
    }

    /// Classifies a completed ticket. Current tickets are consumed.
    pub fn complete(&mut self, ticket: RequestTicket) -> EngineResult<TicketStatus> {
        if ticket.slot != self.slot || ticket.generation == 0 || ticket.generation > self.issued {
            return Err(EngineError::UnknownTicket {
                slot: self.slot.to_string(),
                generation: ticket.generation,
            });
        }
        if self.in_flight == Some(ticket.generation) {
            self.in_flight = None;
            return Ok(TicketStatus::Current);
        }
        Ok(TicketStatus::Stale)
    }

    fn ticket(&self, generation: u64) -> RequestTicket {
        RequestTicket {
            slot: self.slot,
            generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_makes_older_stale() {
        let mut slot = RequestSlot::new(FetchSlot::Base);
        let (first, superseded) = slot.issue();
        assert!(superseded.is_none());
        let (second, superseded) = slot.issue();
        assert_eq!(superseded, Some(first));

        assert_eq!(slot.complete(first).expect("known"), TicketStatus::Stale);
        assert_eq!(slot.complete(second).expect("known"), TicketStatus::Current);
        assert_eq!(slot.complete(second).expect("known"), TicketStatus::Stale);
    }

    #[test]
    fn foreign_ticket_is_rejected() {
        let mut slot = RequestSlot::new(FetchSlot::Anchor);
        let ticket = RequestTicket {
            slot: FetchSlot::Children,
            generation: 1,
        };
        assert!(slot.complete(ticket).is_err());
    }
}
