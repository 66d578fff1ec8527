pub mod connection_gate;

pub use connection_gate::require_connection;
