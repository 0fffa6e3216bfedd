pub mod icons;
pub mod progress;
pub mod report;

pub use progress::PassSpinner;
pub use report::{TerminalSink, print_cleanup, print_signatures};
