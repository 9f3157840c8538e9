use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("program did not reach a stopped state after {0} ticks")]
    DidNotConverge(u64),
}
