pub mod service;

pub use service::HostRequestService;
