use serde::Serialize;
use thiserror::Error;

use crate::ErrorKind;
use crate::diagnostics::{CallDescriptor, Frame};

/// A transport failure together with the request that caused it and,
/// when known, the controller which started the call chain.
#[derive(Error, Debug, Serialize)]
#[error("{source} ({method} {path})", method = .api_call.method, path = .api_call.resource_path)]
pub struct EnrichedFailure {
    /// The failure as reported by the transport
    #[serde(rename = "error")]
    source: ErrorKind,

    /// The request that failed
    api_call: CallDescriptor,

    /// `<file>:<function>` of the controller frame
    #[serde(skip_serializing_if = "Option::is_none")]
    controller_func: Option<String>,

    /// `<file>:<function>` of the frame the controller called into
    #[serde(skip_serializing_if = "Option::is_none")]
    module_func: Option<String>,
}

impl EnrichedFailure {
    /// The wrapped transport failure
    #[must_use]
    pub const fn error(&self) -> &ErrorKind {
        &self.source
    }

    /// The request that failed
    #[must_use]
    pub const fn api_call(&self) -> &CallDescriptor {
        &self.api_call
    }

    /// The controller frame, if one was on the call stack
    #[must_use]
    pub fn controller_func(&self) -> Option<&str> {
        self.controller_func.as_deref()
    }

    /// The frame right inside the controller, if there was one
    #[must_use]
    pub fn module_func(&self) -> Option<&str> {
        self.module_func.as_deref()
    }

    /// Unwrap the original transport failure
    #[must_use]
    pub fn into_inner(self) -> ErrorKind {
        self.source
    }
}

/// Attach request context and caller provenance to a failure.
///
/// `api_call` is always attached. `frames` must be ordered innermost first.
/// The first frame that belongs to the controller layer (see
/// [`Frame::is_controller`]) becomes `controller_func` and the frame before
/// it, one step closer to the failure, becomes `module_func`. Without a
/// controller frame both stay empty.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use ssadmin_lib::ErrorKind;
/// use ssadmin_lib::diagnostics::{CallDescriptor, Frame, enrich};
///
/// let frames = [
///     Frame::new("src/api.rs", "add_member"),
///     Frame::new("src/controllers/members.rs", "add"),
///     Frame::new("src/main.rs", "main"),
/// ];
/// let call = CallDescriptor::new(Method::POST, "/clients");
/// let failure = enrich(ErrorKind::InvalidUrlHost, call, &frames);
///
/// assert_eq!(failure.controller_func(), Some("members.rs:add"));
/// assert_eq!(failure.module_func(), Some("api.rs:add_member"));
/// ```
#[must_use]
pub fn enrich(failure: ErrorKind, api_call: CallDescriptor, frames: &[Frame]) -> EnrichedFailure {
    let mut enriched = EnrichedFailure {
        source: failure,
        api_call,
        controller_func: None,
        module_func: None,
    };

    if let Some((index, controller)) = frames
        .iter()
        .enumerate()
        .find(|(_, frame)| frame.is_controller())
    {
        enriched.controller_func = Some(controller.identifier());
        enriched.module_func = index
            .checked_sub(1)
            .and_then(|inner| frames.get(inner))
            .map(Frame::identifier);
    }

    enriched
}
