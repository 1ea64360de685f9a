//! CLI prompts using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is enabled.

#[cfg(feature = "tui")]
mod prompts;

#[cfg(feature = "tui")]
pub use prompts::{run, ApplyArgs};

/// Exit code used when the user interrupts with Ctrl+C
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Keep the terminal usable if a prompt is interrupted: the cursor comes
/// back on panic, and Ctrl+C exits with [`INTERRUPTED_EXIT_CODE`].
pub fn install_terminal_guards() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_cursor();
        default_panic(info);
    }));

    // A second call finds a handler already set; the first one stays.
    ctrlc::set_handler(move || {
        restore_cursor();
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
    .ok();
}

/// Show the cursor again; spinners hide it while running
pub fn restore_cursor() {
    let _ = console::Term::stderr().show_cursor();
}
