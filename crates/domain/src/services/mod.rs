//! Pure business services.

pub mod access;
pub mod consistency;
pub mod scope;
