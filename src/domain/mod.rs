pub mod model;
pub mod ports;

pub use model::{Address, Company, Geo, OutboundUser, User};
pub use ports::{UserSink, UserSource};
