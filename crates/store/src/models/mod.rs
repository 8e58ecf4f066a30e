//! Job record model and status/priority lookup enums.
//!
//! `job` contains the `FromRow` + `Serialize` entity matching the database
//! row plus the create DTO; `status` contains the SMALLINT lookup enums.

pub mod job;
pub mod status;

pub use job::{JobRecord, NewJob};
pub use status::{JobPriority, JobStatus, StatusId};
