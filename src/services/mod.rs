//! Bundled procedure services

pub mod demo;
