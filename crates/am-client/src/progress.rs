//! Simulation progress reporting.

use crate::connection::OperationMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgressState {
    /// Created and not yet queued.
    New,
    /// Queued, waiting to start.
    Waiting,
    Running,
    Completed,
    Error,
    Cancelled,
    /// Completed with warnings.
    Warning,
}

impl ProgressState {
    pub fn label(self) -> &'static str {
        match self {
            ProgressState::New => "NEW",
            ProgressState::Waiting => "WAITING",
            ProgressState::Running => "RUNNING",
            ProgressState::Completed => "COMPLETED",
            ProgressState::Error => "ERROR",
            ProgressState::Cancelled => "CANCELLED",
            ProgressState::Warning => "WARNING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub sim_id: String,
    pub state: ProgressState,
    pub percent_complete: u32,
    pub message: String,
    pub context: String,
}

impl Progress {
    pub fn from_metadata(metadata: &OperationMetadata) -> Self {
        Self {
            sim_id: metadata.simulation_id.clone(),
            state: metadata.state,
            percent_complete: metadata.percent_complete,
            message: metadata.message.clone(),
            context: metadata.context.clone(),
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} - {}% - {} - {}",
            self.sim_id,
            self.state.label(),
            self.percent_complete,
            self.context,
            self.message
        )
    }
}

/// Receives progress updates while simulations run.
pub trait ProgressHandler {
    fn update(&mut self, progress: &Progress);
}

impl<F> ProgressHandler for F
where
    F: FnMut(&Progress),
{
    fn update(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Reborrow an optional handler for a nested call.
pub(crate) fn reborrow<'a>(
    handler: &'a mut Option<&mut dyn ProgressHandler>,
) -> Option<&'a mut dyn ProgressHandler> {
    match handler {
        Some(h) => Some(&mut **h),
        None => None,
    }
}

/// Text progress bar for a single simulation.
///
/// The bar restarts whenever the solver context changes, except between
/// layers after the first so a multi-layer solve reads as one pass.
pub struct DefaultSingleSimulationProgressHandler {
    last_percent_complete: u32,
    last_context: String,
    description: String,
    position: u32,
    out: Box<dyn Write + Send>,
}

impl Default for DefaultSingleSimulationProgressHandler {
    fn default() -> Self {
        Self::with_writer(Box::new(io::stderr()))
    }
}

impl DefaultSingleSimulationProgressHandler {
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            last_percent_complete: 0,
            last_context: "Initializing".to_string(),
            description: "Initializing".to_string(),
            position: 0,
            out,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Bar position out of 100.
    pub fn position(&self) -> u32 {
        self.position
    }

    fn render(&mut self) {
        let width = 28usize;
        let filled = ((self.position.min(100) as usize) * width) / 100;
        let bar = format!("{}{}", "#".repeat(filled), "-".repeat(width - filled));
        let _ = write!(
            self.out,
            "\r{} [{}] {:>3}%",
            self.description,
            bar,
            self.position.min(100)
        );
        let _ = self.out.flush();
    }
}

impl ProgressHandler for DefaultSingleSimulationProgressHandler {
    fn update(&mut self, progress: &Progress) {
        if progress.message.contains("SOLVERINFO") {
            return;
        }

        if progress.state == ProgressState::Error {
            let _ = writeln!(self.out, "\n{}", progress.message);
            return;
        }

        if !progress.context.is_empty() && progress.context != self.last_context {
            if !progress.context.contains("Solving Layer") || progress.context == "Solving Layer 1"
            {
                self.position = 0;
                self.description = progress.context.clone();
                self.last_context = progress.context.clone();
                self.last_percent_complete = 0;
            } else {
                self.description = progress.context.clone();
            }
        }

        if progress.percent_complete > self.last_percent_complete {
            self.position += progress.percent_complete - self.last_percent_complete;
        }
        self.last_percent_complete = progress.percent_complete;
        self.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(state: ProgressState, pct: u32, context: &str, message: &str) -> Progress {
        Progress {
            sim_id: "sim".to_string(),
            state,
            percent_complete: pct,
            message: message.to_string(),
            context: context.to_string(),
        }
    }

    #[test]
    fn display_format() {
        let p = progress(ProgressState::Running, 40, "Solving Layer 2", "ok");
        assert_eq!(p.to_string(), "sim: RUNNING - 40% - Solving Layer 2 - ok");
    }

    #[test]
    fn closures_are_handlers() {
        let mut seen = Vec::new();
        {
            let mut handler = |p: &Progress| seen.push(p.percent_complete);
            handler.update(&progress(ProgressState::Running, 10, "", ""));
            handler.update(&progress(ProgressState::Running, 20, "", ""));
        }
        assert_eq!(seen, vec![10, 20]);
    }

    #[test]
    fn bar_resets_on_new_context_but_not_between_layers() {
        let mut h = DefaultSingleSimulationProgressHandler::with_writer(Box::new(io::sink()));
        h.update(&progress(ProgressState::Running, 50, "Meshing", ""));
        assert_eq!(h.description(), "Meshing");
        assert_eq!(h.position(), 50);

        h.update(&progress(ProgressState::Running, 10, "Solving Layer 1", ""));
        assert_eq!(h.position(), 10);

        h.update(&progress(ProgressState::Running, 30, "Solving Layer 2", ""));
        assert_eq!(h.description(), "Solving Layer 2");
        assert_eq!(h.position(), 30);
    }

    #[test]
    fn solver_info_and_errors_do_not_move_the_bar() {
        let mut h = DefaultSingleSimulationProgressHandler::with_writer(Box::new(io::sink()));
        h.update(&progress(ProgressState::Running, 40, "", "SOLVERINFO: step"));
        assert_eq!(h.position(), 0);
        h.update(&progress(ProgressState::Error, 90, "", "failed"));
        assert_eq!(h.position(), 0);
    }
}
