pub mod summary;

pub use summary::{print_pass_summary, print_run_summary, print_sandbox_summary};
