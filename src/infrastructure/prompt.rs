use std::io::{self, BufRead, Write};

use crate::application::ports::Confirmation;

/// Asks on stderr and reads the answer from stdin.
///
/// Only the literal answer `yes` approves; anything else, including a closed
/// stdin, declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirmation;

impl Confirmation for StdinConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        let mut stderr = io::stderr();
        if write!(stderr, "{} ", prompt).and_then(|_| stderr.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_approval(&answer),
            Err(_) => false,
        }
    }
}

fn is_approval(answer: &str) -> bool {
    answer.trim() == "yes"
}
