pub mod asatidz;
pub mod attendance;
pub mod payment;
pub mod progress;
pub mod student;
pub mod user;

pub use asatidz::{Asatidz, AsatidzProfile, EmploymentStatus};
pub use attendance::{AsatidzAttendanceRecord, AttendanceStatus, AttendanceRecord, MarkAttendanceRequest};
pub use payment::{BulkSettleRequest, PaymentRecord, PaymentStatus, TogglePaymentRequest};
pub use progress::{
    FluencyLevel, MemorizationItem, MemorizationStatus, NewProgressRequest, ProgressRecord,
    ReadingTrack, ReadingType,
};
pub use student::{Student, StudentProfile};
pub use user::{LoginRequest, User, UserRole};
