//! Report generation port trait.

use crate::domain::error::TradesimError;
use crate::domain::simulation::SimulationResult;
use std::path::Path;

/// Port for writing simulation reports.
pub trait ReportPort {
    fn render(&self, result: &SimulationResult) -> String;

    fn write(&self, result: &SimulationResult, output_path: &Path) -> Result<(), TradesimError> {
        std::fs::write(output_path, self.render(result))?;
        Ok(())
    }
}
