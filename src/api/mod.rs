pub mod attendance;
pub mod bulk;
pub mod health;
