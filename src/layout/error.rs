use super::simulation::FactoryError;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
	#[error("layout is already active, deactivate it first")]
	AlreadyActive,
	#[error("custom simulation factory failed: {0}")]
	CreateSimulation(#[source] FactoryError),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
