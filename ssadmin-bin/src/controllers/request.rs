use anyhow::Result;
use futures::StreamExt;
use log::{error, info};
use ssadmin_lib::diagnostics::{CallDescriptor, CallStack};
use ssadmin_lib::frame;

use super::ControllerParams;
use crate::{ExitCode, api};

/// Send the call given on the command line `repeat` times, with at most
/// `concurrency` calls in flight, and print every outcome in order.
pub(crate) async fn request(
    params: &ControllerParams,
    call: CallDescriptor,
    body: Option<serde_json::Value>,
    stack: &CallStack,
) -> Result<ExitCode> {
    let stack = stack.enter(frame!("request"));
    let repeat = params.cfg.repeat.max(1);
    let concurrency = params.cfg.concurrency.max(1);

    let client = &params.client;
    let body = body.as_ref();
    let stack = &stack;
    let mut outcomes = futures::stream::iter(0..repeat)
        .map(move |_| api::send_request(client, call.clone(), body, stack))
        .buffered(concurrency);

    let mut failed = 0;
    while let Some(outcome) = outcomes.next().await {
        match outcome {
            Ok(response) => println!("{}", params.formatter.format_response(&response)?),
            Err(failure) => {
                failed += 1;
                error!("{failure}");
                println!("{}", params.formatter.format_failure(&failure)?);
            }
        }
    }

    info!("{} of {repeat} calls succeeded", repeat - failed);

    if failed == 0 {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::ApiFailure)
    }
}
