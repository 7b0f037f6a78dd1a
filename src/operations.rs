pub mod laplace;
pub mod mass;
pub mod updown;
