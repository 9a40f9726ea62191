//! Thin layer between the controllers and the API client.
//!
//! Every helper records its own frame before handing the call to the
//! client, so a failure names the helper as well as the controller.

use log::debug;
use ssadmin_lib::diagnostics::{CallDescriptor, CallStack, EnrichedFailure};
use ssadmin_lib::{ApiClient, ApiResponse, frame};

/// Send a single call described on the command line
pub(crate) async fn send_request(
    client: &ApiClient,
    call: CallDescriptor,
    body: Option<&serde_json::Value>,
    stack: &CallStack,
) -> Result<ApiResponse, EnrichedFailure> {
    let stack = stack.enter(frame!("send_request"));
    let response = client.call(call, stack.frames(), body).await?;
    debug!("Security server answered with {}", response.status);
    Ok(response)
}
