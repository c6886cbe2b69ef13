#![allow(dead_code)]

pub mod config;
pub mod session;
pub mod upstream;
