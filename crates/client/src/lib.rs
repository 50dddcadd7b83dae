//! Client-side polling for the generation pipeline.
//!
//! [`ApiClient`](api::ApiClient) talks to the REST surface;
//! [`TitlePoller`](poller::TitlePoller) is the explicit state machine
//! that submits a batch, renders placeholders, polls status on a fixed
//! interval, diffs each response against the last snapshot, and stops on
//! terminal completion, auth failure, or cancellation.

pub mod api;
pub mod poller;

pub use api::{ApiClient, ClientError};
pub use poller::{PollState, StatusSink, StatusSource, TitlePoller};
