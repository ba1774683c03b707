mod client;
mod dto;

pub use client::{WindGuruClient, DEFAULT_ENDPOINT};
