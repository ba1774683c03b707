pub mod ntp;
pub mod settings;
pub mod system_clock;
pub mod windguru;

pub use ntp::NtpClient;
pub use settings::InMemorySettings;
pub use system_clock::SystemDeviceClock;
pub use windguru::WindGuruClient;
