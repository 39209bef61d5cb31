pub mod cookies;
pub mod password;
pub mod policy;
pub mod session;
pub mod token;
