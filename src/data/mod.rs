//! Remote data boundary: row validation, query shapes, request tickets and
//! the hybrid merge of base, anchor and children results.

mod merge;
mod query;
mod request_slot;
mod row;
mod source;

pub use merge::{BaseCache, MergedEvents, hybrid_merge};
pub use query::{EventQuery, EventSource, IdentityQuery, QueryScope};
pub use request_slot::{FetchSlot, RequestSlot, RequestTicket, TicketStatus};
pub use row::{DecodedRows, EventRow, RowRejection, decode_rows};
pub use source::StaticEventSource;
