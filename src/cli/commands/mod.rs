//! One module per subcommand.

pub mod completions;
pub mod list;
pub mod lock;
pub mod unlock;
