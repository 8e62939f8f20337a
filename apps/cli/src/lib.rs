//! Client side of the resume service: a typed HTTP client and the status
//! poller that follows an upload to its terminal state.

pub mod api_client;
pub mod poller;
