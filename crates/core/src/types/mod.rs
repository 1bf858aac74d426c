//! Newtype wrappers shared by every Round Again component.

pub mod email;
pub mod id;

pub use email::{EmailAddress, EmailAddressError};
pub use id::{ContactId, InteractionId};
