//! Protocol return codes
//!
//! Every Response and Acknowledge carries one of these. 0 is success;
//! non-zero codes are operation-specific and always accompanied by a
//! notification comment.

/// Operation succeeded
pub const RC_SUCCESS: i32 = 0;
/// Functionality intentionally not implemented (distinct from refusal)
pub const RC_NOT_SUPPORTED: i32 = 5;
/// Malformed or missing required parameter
pub const RC_INVALID_PARAMETER: i32 = 6;
/// Referenced queue entry does not exist
pub const RC_ENTRY_NOT_FOUND: i32 = 105;
/// Entry is Running or Suspended and cannot be removed
pub const RC_ENTRY_ACTIVE: i32 = 106;
/// Queue is Closed, Held, Blocked or Full
pub const RC_QUEUE_REJECTED: i32 = 112;
/// Entry is already Aborted
pub const RC_ALREADY_ABORTED: i32 = 113;
/// Entry is already Completed
pub const RC_ALREADY_COMPLETED: i32 = 114;
