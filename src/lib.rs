pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::ApiClient;
pub use config::{Config, Environment};
pub use core::{Dispatcher, ProcessingTally, RetryPolicy, RetryingSender};
pub use domain::{OutboundUser, User, UserSink, UserSource};
pub use utils::error::{DispatchError, Result};
