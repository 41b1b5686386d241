//! Network configuration
//!
//! Peer-to-peer transport is out of scope; this module only carries the
//! static parameters the codec and address encoders consume.

pub mod params;

pub use params::{NetworkParams, ANCHOR_FIX_FLAG, DEFAULT_PORT, PACKET_MAGIC};
