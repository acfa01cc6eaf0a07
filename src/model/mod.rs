pub mod label;
pub mod record;
pub mod volume;

pub use label::Label;
pub use record::{MetricRecord, SubjectResult};
pub use volume::{BinaryMask, Volume, VolumeError};
