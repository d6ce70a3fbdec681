pub mod app;
pub mod console;
pub mod input;
pub mod log_panel;
pub mod output;
pub mod proposal_view;

pub use app::App;
pub use console::Console;
pub use input::{InputMode, InputWidget};
pub use log_panel::{LogPanel, PanelState};
pub use output::{CommandOutput, OutputDisplay};
pub use proposal_view::ProposalView;
