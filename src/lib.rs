pub mod config;
pub mod dispatcher;
pub mod identity;
pub mod intake;
pub mod messages;
pub mod motion;
pub mod motor;
pub mod runtime;
