//! Direct3D 11 后端

mod backend;

pub use backend::Direct3D11;
