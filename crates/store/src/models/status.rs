//! Status and priority enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `job_*` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl TryFrom<StatusId> for $name {
            type Error = StatusId;

            /// Map a raw ID back to the enum; the unknown ID is the error.
            fn try_from(value: StatusId) -> Result<Self, Self::Error> {
                match value {
                    $( $val => Ok($name::$variant), )+
                    other => Err(other),
                }
            }
        }
    };
}

define_status_enum! {
    /// Job lifecycle status.
    ///
    /// There is no stored "Failed" status: a failure is recorded as
    /// `last_error` while the record is Processing, after which the
    /// attempt-count decision routes it back to Pending or to Dead.
    JobStatus {
        /// Waiting to be claimed (due when `scheduled_at` has passed or is unset).
        Pending = 1,
        /// Claimed by exactly one worker and currently executing.
        Processing = 2,
        /// Finished successfully. Terminal.
        Completed = 3,
        /// All attempts exhausted or failure is permanent. Terminal.
        Dead = 4,
    }
}

define_status_enum! {
    /// Job claim priority. Higher values are claimed first.
    JobPriority {
        Low = 1,
        Normal = 2,
        High = 3,
    }
}

impl Default for JobPriority {
    fn default() -> Self {
        JobPriority::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_ids_match_seed_data() {
        assert_eq!(JobStatus::Pending.id(), 1);
        assert_eq!(JobStatus::Processing.id(), 2);
        assert_eq!(JobStatus::Completed.id(), 3);
        assert_eq!(JobStatus::Dead.id(), 4);
    }

    #[test]
    fn job_priority_ids_match_seed_data() {
        assert_eq!(JobPriority::Low.id(), 1);
        assert_eq!(JobPriority::Normal.id(), 2);
        assert_eq!(JobPriority::High.id(), 3);
    }

    #[test]
    fn priority_orders_low_to_high() {
        assert!(JobPriority::Low < JobPriority::Normal);
        assert!(JobPriority::Normal < JobPriority::High);
    }

    #[test]
    fn status_into_status_id() {
        let id: StatusId = JobStatus::Pending.into();
        assert_eq!(id, 1);
    }

    #[test]
    fn status_round_trips_through_raw_id() {
        assert_eq!(JobStatus::try_from(2), Ok(JobStatus::Processing));
        assert_eq!(JobPriority::try_from(3), Ok(JobPriority::High));
    }

    #[test]
    fn unknown_status_id_is_rejected() {
        assert_eq!(JobStatus::try_from(99), Err(99));
    }

    #[test]
    fn default_priority_is_normal() {
        assert_eq!(JobPriority::default(), JobPriority::Normal);
    }
}
