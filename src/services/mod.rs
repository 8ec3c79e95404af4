pub mod capacity;
pub mod directory;
pub mod enrollment;
pub mod txn;

pub use directory::{DbUserDirectory, NoopUserDirectory, UserDirectory};
pub use enrollment::EnrollmentService;
pub use txn::{RetryPolicy, TxnExecutor};
