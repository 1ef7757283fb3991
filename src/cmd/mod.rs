//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `bounds`  | `Bounds`         |
//! | `sync`    | `Move`           |
//! | `replay`  | `Replay`         |
//! | `config`  | `Config`         |

pub mod bounds;
pub mod config;
pub mod replay;
pub mod sync;

pub use bounds::cmd_bounds;
pub use config::cmd_config;
pub use replay::cmd_replay;
pub use sync::cmd_move;
