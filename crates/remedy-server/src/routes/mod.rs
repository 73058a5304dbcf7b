pub mod health;
pub mod remediate;
