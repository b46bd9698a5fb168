pub mod interactive;
pub mod reply;
