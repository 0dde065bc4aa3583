/// Capability asking an operator to approve a destructive step.
///
/// Injected so that the deletion path is testable without a terminal.
/// Closures returning `bool` implement it directly.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirmation that always answers the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmation(pub bool);

impl Confirmation for FixedConfirmation {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
