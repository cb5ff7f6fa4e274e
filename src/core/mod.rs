pub mod backoff;
pub mod dispatcher;
pub mod retry;

pub use dispatcher::{Dispatcher, ProcessingTally};
pub use retry::{RetryPolicy, RetryingSender};
