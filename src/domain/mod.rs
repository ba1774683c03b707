pub mod credential;
pub mod measurement;
pub mod sample;
pub mod time;

pub use credential::{CredentialError, SettingsInput, StationCredential, StationSettings};
pub use measurement::{MeasurementSet, StationError, StationErrorKind};
pub use sample::Sample;
pub use time::{TimeSnapshot, TimeStatus};
