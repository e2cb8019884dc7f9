//! Carto Engine
//!
//! Compiles annotated carto style trees into cascaded stylesheets ready for a
//! map rendering backend.
//!
//! # Example
//! ```rust,ignore
//! use carto_engine::{Compiler, Config};
//!
//! let compiler = Compiler::new(Config::default());
//! let stylesheet = compiler.compile(&tree)?;
//! println!("{}", carto_engine::style::Dumper::dump(&stylesheet));
//! ```

mod compiler;
mod config;

pub use compiler::{Compiler, EngineError};
pub use config::Config;

// Re-export sub-crates for advanced usage
pub use carto_style as style;
pub use carto_tree as tree;

pub use carto_style::{CascadeMode, Rule, Stylesheet};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
