//! Status reporting at well-defined checkpoints.

/// Receives status text and progress percentages while a pass runs.
///
/// Purely informational: nothing an observer does affects the result.
pub trait StatusObserver {
    /// Report a status message, a progress percentage, or both.
    fn status(&self, message: Option<&str>, percent: Option<u32>);
}

impl<F> StatusObserver for F
where
    F: Fn(Option<&str>, Option<u32>),
{
    fn status(&self, message: Option<&str>, percent: Option<u32>) {
        self(message, percent);
    }
}

/// An observer that ignores every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl StatusObserver for Silent {
    fn status(&self, _message: Option<&str>, _percent: Option<u32>) {}
}

/// Integer percentage of `done` out of `total`, clamped to 100.
pub(crate) fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u32
}
