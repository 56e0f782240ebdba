pub mod handlers;
pub mod server;

pub use server::{router, with_middleware, TaskServer};
