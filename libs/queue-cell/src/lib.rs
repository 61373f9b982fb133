pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::AssignmentError;
pub use models::*;
pub use services::assignment::AssignmentService;
pub use services::queue::QueueService;
pub use services::requests::RequestService;
