use colored::Colorize;

/// Sink for user-facing progress output
pub trait Reporter {
    /// Progress notice (start/finish of a plan)
    fn info(&self, message: &str);

    /// Warnings and closing remarks
    fn comment(&self, message: &str);

    /// One line of streamed child-process output, passed through verbatim
    fn line(&self, line: &str);
}

/// Reporter that prints to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn info(&self, message: &str) {
        println!("{}", message.green());
    }

    fn comment(&self, message: &str) {
        println!("{}", message.yellow());
    }

    fn line(&self, line: &str) {
        println!("{line}");
    }
}

/// Disable colouring for this process (`--no-ansi`)
pub fn disable_colors() {
    colored::control::set_override(false);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}
