mod client;
mod packet;

pub use client::{NtpClient, DEFAULT_SERVERS};
