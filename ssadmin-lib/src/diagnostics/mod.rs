//! Diagnostic context for failed API calls.
//!
//! A failure coming out of the transport layer only says what went wrong.
//! [`enrich`] turns it into an [`EnrichedFailure`] that also says which
//! request failed ([`CallDescriptor`]) and which controller started the
//! call chain, found in the [`CallStack`] the call sites maintain
//! themselves.

mod descriptor;
mod enrich;
mod frame;

pub use descriptor::CallDescriptor;
pub use enrich::{EnrichedFailure, enrich};
pub use frame::{CONTROLLER_DIR, CallStack, Frame};
