//! Compiler - Main entry point

use carto_style::{BuiltinFn, FunctionRegistry, StyleEnv, StyleError, Stylesheet, StylesheetBuilder};
use carto_tree::{Node, Value};

use crate::Config;

/// The carto style compiler
#[derive(Debug, Clone)]
pub struct Compiler {
    config: Config,
    functions: FunctionRegistry,
}

impl Compiler {
    /// Create a new compiler with the given configuration
    pub fn new(config: Config) -> Self {
        tracing::info!(
            "Carto compiler {} initialized (strict: {}, cascade: {:?})",
            crate::VERSION,
            config.strict,
            config.cascade
        );
        Self {
            config,
            functions: FunctionRegistry::with_builtins(),
        }
    }

    /// Make a custom function callable from expressions
    pub fn register_function(&mut self, name: impl Into<String>, function: BuiltinFn) {
        self.functions.register(name, function);
    }

    /// Compile a stylesheet tree
    pub fn compile(&self, tree: &Node) -> Result<Stylesheet, EngineError> {
        self.compile_with_env(tree, StyleEnv::new())
    }

    /// Compile with predefined variables, e.g. from the command line
    pub fn compile_with_variables<'a, I>(&self, tree: &Node, variables: I) -> Result<Stylesheet, EngineError>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut env = StyleEnv::new();
        for (name, value) in variables {
            env.define_value(name, value);
        }
        self.compile_with_env(tree, env)
    }

    /// Compile using `env` as the root scope
    pub fn compile_with_env(&self, tree: &Node, env: StyleEnv) -> Result<Stylesheet, EngineError> {
        let builder = StylesheetBuilder::new()
            .strict(self.config.strict)
            .cascade_mode(self.config.cascade)
            .functions(self.functions.clone());

        let stylesheet = builder.parse_stylesheet(tree, env)?;
        Ok(stylesheet)
    }

    /// Get compiler configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Style error: {0}")]
    Style(#[from] StyleError),
}

impl EngineError {
    /// Location of the node that failed, when known
    pub fn location(&self) -> Option<&carto_tree::SourceLocation> {
        match self {
            Self::Style(err) => Some(err.location()),
        }
    }
}
