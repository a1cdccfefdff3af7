pub mod backend;
pub mod export;
#[cfg(not(target_arch = "wasm32"))]
pub mod session;
#[cfg(not(target_arch = "wasm32"))]
pub mod setup;
pub mod workflow;
