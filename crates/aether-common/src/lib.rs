//! # Aether Common
//!
//! Common types and shared abstractions for the Aether environment system.
//!
//! This crate provides foundational types used across all Aether crates:
//! - ID types (ListenerId, CallbackId, EffectHandle, ...)
//! - The environment error taxonomy
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_ids_order_by_sequence() {
        let first = CallbackId::new(1);
        let second = CallbackId::new(2);
        assert!(first < second);
    }

    #[test]
    fn test_effect_handle_serde() {
        let handle = EffectHandle::new("vfx/snowfall");
        let json = serde_json::to_string(&handle).expect("serialize");
        assert_eq!(json, "\"vfx/snowfall\"");
        let back: EffectHandle = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, handle);
        assert_eq!(back.to_string(), "vfx/snowfall");
    }
}
