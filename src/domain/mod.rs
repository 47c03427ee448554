pub mod payment;
pub mod reference;

pub use payment::{EventKind, PaymentEvent, PaymentRecord, PaymentStatus, UnknownStatus};
pub use reference::ReferenceGenerator;
