//! Update dispatch: file/directory classification and routing

mod dispatcher;
mod outcome;
mod request;

pub use dispatcher::{Dispatcher, UpdateError};
pub use outcome::{PropertyNode, UpdateOutcome};
pub use request::{UpdateRequest, ValidationError};
