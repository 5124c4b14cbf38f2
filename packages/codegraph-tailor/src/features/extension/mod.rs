//! Extension Discovery
//!
//! A partial match headed by a call site `h` may only be extended by call
//! sites that can lead execution into `h`'s method: callers of static
//! methods, and for instance methods the constructor calls of the receiver
//! objects (resolved through points-to information).
//!
//! The relation is then pruned to "interesting" points (branches and
//! polymorphic dispatch), cross-linking around the removed ones.

mod alloc;
mod finder;

pub use alloc::{receiver_local, AllocResolver};
pub use finder::ExtensionFinder;
