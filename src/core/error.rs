use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("simulation cancelled after {completed} of {requested} trials")]
    Cancelled { completed: u32, requested: u32 },
}
