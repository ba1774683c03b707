mod memory;

pub use memory::InMemorySettings;
