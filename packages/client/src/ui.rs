//! Prompt helpers.

use std::io::Write;

pub fn prompt(me: &str) -> String {
    format!("{}> ", me)
}

/// Print asynchronous output, then redraw the prompt the line editor printed before it.
pub fn print_above_prompt(output: &str, prompt: &str) {
    print!("{}", output);
    print!("{}", prompt);
    std::io::stdout().flush().ok();
}
