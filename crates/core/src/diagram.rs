//! Diagram collaborator interface.
//!
//! The engine only emits [`PlacementCommand`]s. A [`DiagramSink`] resolves
//! the symbolic shape names against its own template library and draws them.

use crate::error::CoreError;
use crate::layout::{LayoutResult, PlacementCommand};

/// Receiver of placement commands for one or more pages.
pub trait DiagramSink {
    /// Drop one shape on `page`. Failures should be reported as
    /// [`CoreError::Diagram`].
    fn place(&mut self, page: &str, command: &PlacementCommand) -> Result<(), CoreError>;
}

/// Forward every command of `result` to `sink`, stopping at the first error.
///
/// Returns the number of commands delivered.
pub fn render(result: &LayoutResult, sink: &mut dyn DiagramSink) -> Result<usize, CoreError> {
    for command in &result.commands {
        sink.place(&result.page, command)?;
    }
    Ok(result.commands.len())
}

/// Sink that keeps every command in memory, in delivery order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub placed: Vec<(String, PlacementCommand)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands delivered for `page`.
    pub fn page(&self, page: &str) -> Vec<&PlacementCommand> {
        self.placed
            .iter()
            .filter(|(p, _)| p == page)
            .map(|(_, c)| c)
            .collect()
    }
}

impl DiagramSink for RecordingSink {
    fn place(&mut self, page: &str, command: &PlacementCommand) -> Result<(), CoreError> {
        self.placed.push((page.to_string(), command.clone()));
        Ok(())
    }
}
