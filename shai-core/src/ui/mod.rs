//! Terminal interaction: spinner, colours and the confirmation gate.

pub mod spinner;
pub mod styled;
pub mod user_confirmation;

pub use spinner::Spinner;
pub use styled::{Styles, print_error, risk_label};
pub use user_confirmation::{
    Prompter, ScriptedPrompter, TerminalPrompter, UserConfirmation, accepts, render_command,
};
