pub mod company;
pub mod job;
pub mod user;

pub use company::{Company, CompanyInput, CompanyUpdate, CompanyWithJobs};
pub use job::{Job, JobInput, JobUpdate};
pub use user::{User, UserInput, UserUpdate, UserWithJobs};
