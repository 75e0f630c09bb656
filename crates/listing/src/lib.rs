pub mod error;
mod local;
pub mod remote;

pub use crate::local::{LocalTree, PathStream};
pub use crate::remote::RemoteLister;
use std::sync::Arc;

pub type ListerHandle = Arc<dyn RemoteLister + Send + Sync>;
