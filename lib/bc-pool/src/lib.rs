//! Versioned slot storage, active sets and cut buffers for the
//! branch-and-cut core (§4.1, §4.2, §4.4).
//!
//! Layered strictly on top of `bc-model`: everything here is generic over
//! any `T: HasConVarCore` and knows nothing about LPs, subproblems, or the
//! master program.

pub mod active;
pub mod cutbuffer;
mod error;
pub mod pool;
pub mod slot;

pub use active::Active;
pub use cutbuffer::CutBuffer;
pub use error::{Error, Result};
pub use pool::{separate, DuplicateKey, Inserted, NonDuplPool, PoolStore, StandardPool};
pub use slot::{PoolSlot, PoolSlotRef, SlotHandle};
