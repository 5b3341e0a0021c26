//! exit codes for lifecourse commands
//!
//! these follow Unix conventions where 0 = success and non-zero = error
//! specific codes help scripts distinguish between failure types

/// command completed successfully
pub const SUCCESS: i32 = 0;

/// general or unknown error
pub const ERROR: i32 = 1;

/// invalid command-line arguments
pub const INVALID_ARGS: i32 = 2;

/// a condition definition failed to build
pub const CONFIG_ERROR: i32 = 3;

/// subject file missing or malformed
pub const SUBJECT_ERROR: i32 = 4;

/// requested definition name not in the file
pub const NOT_FOUND: i32 = 5;
