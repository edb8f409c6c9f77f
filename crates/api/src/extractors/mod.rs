//! Request extractors.

pub mod device_key;
pub mod operator;

pub use device_key::KeyQuery;
pub use operator::{OperatorAuth, OptionalOperator};
