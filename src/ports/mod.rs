pub mod clock_source;
pub mod device_clock;
pub mod settings_source;
pub mod station_client;

pub use clock_source::{ClockError, ClockSource};
pub use device_clock::DeviceClock;
pub use settings_source::SettingsSource;
pub use station_client::{FetchRequest, StationClient};
