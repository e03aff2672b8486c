//! Fixed-size kernel structures for rtnetlink messages.

pub mod addr;
pub mod route;
