//! Web service operations on connections. SDH links carry a privilege of their own.

mod connections;
mod sdh;

pub use connections::ConnectionsCall;
pub use sdh::SdhCall;
