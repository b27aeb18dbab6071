//! Execution phase enums
//!
//! Loop frames alternate between binding the next item and running the body.

use serde::{Deserialize, Serialize};

/// Execution phase for loop frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LoopPhase {
    /// Bind the next item (or finish the loop)
    Bind = 0,
    /// Running the body with the current item bound
    Body = 1,
}
