pub mod course;
pub mod enrollment;
pub mod user;

pub use course::{Course, NewCourseRequest, UpdateCourseRequest};
pub use enrollment::{
    Enrollment, EnrollmentStatus, EnrollmentView, EnrollmentWithCourse, UpdateProgressRequest,
};
pub use user::{NewUserRequest, Role, User, UserSummary};
