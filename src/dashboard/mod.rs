//! Client-side dashboard state.
//!
//! [`Session`] is driven by [`Command`]s and publishes [`Notification`]s;
//! rendering is left to whoever holds the notification receiver.

mod events;
mod list;
mod session;

pub use events::*;
pub use list::*;
pub use session::*;
