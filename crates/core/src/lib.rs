#![deny(warnings)]

pub mod aggregate;
pub mod asr;
pub mod audio;
pub mod config;
pub mod db;
pub mod emotion;
pub mod pipeline;
pub mod scoring;
pub mod tone;
