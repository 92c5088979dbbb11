pub mod health;
pub mod logs;
pub mod retention;
