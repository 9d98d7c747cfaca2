pub mod errors;
pub mod poller;

pub use errors::ServiceError;
pub use poller::PollingService;
