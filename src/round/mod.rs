mod manager;

pub use manager::{PollTick, RoundManager, RoundState, POLL_INTERVAL};
