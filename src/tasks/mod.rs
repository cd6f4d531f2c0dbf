//! Periodic background tasks: keepalive, persistence, station refresh

pub mod keepalive;
pub mod persistence;
pub mod stations;
