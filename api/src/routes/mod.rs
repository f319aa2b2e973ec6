pub mod finalize;
pub mod health;
pub mod next_step;
pub mod start_session;
