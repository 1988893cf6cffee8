mod outcome;
mod state;

pub use outcome::{ExchangeOutcome, ExchangeStatus};
pub use state::ExchangeState;
