//! Network path discovery and interface-bound HTTP transports

pub mod selector;
pub mod transport;

pub use selector::{require, select};
pub use transport::{Transport, TransportFactory};
