//! Serial link to the panel

pub mod transport;

pub use transport::{HandshakeOutcome, LinkState, LinkStats, LinkTransport, READ_CHUNK};
