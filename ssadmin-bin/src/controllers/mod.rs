//! Controllers start the call chains of one command.
//!
//! Everything defined below this directory counts as controller layer when
//! a failure is enriched, so a failed call reports which controller issued it.

pub(crate) mod request;

pub(crate) use request::request;

use ssadmin_lib::ApiClient;

use crate::formatters::response::ResponseFormatter;
use crate::options::Config;

/// Parameters passed to every controller
pub(crate) struct ControllerParams {
    pub(crate) client: ApiClient,
    pub(crate) formatter: Box<dyn ResponseFormatter>,
    pub(crate) cfg: Config,
}
