pub mod contact;
pub mod gear;
pub mod location;
pub mod member;
pub mod schedule;
pub mod session;
pub mod trip;
pub mod user;
pub mod vehicle;
