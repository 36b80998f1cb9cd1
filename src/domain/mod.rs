//! Domain layer - Core business logic and entities

pub mod clock;
pub mod error;
pub mod notification;
pub mod session;
pub mod todo;
pub mod user;
pub mod verification;

pub use clock::{Clock, SystemClock};
pub use error::DomainError;
pub use notification::NotificationSink;
pub use session::{Principal, RequestContext};
