//! Error types for the runtime.

use thiserror::Error;

use crate::compiler::CompileError;

/// Errors reported by mounting and rendering.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The component has neither a render function nor a template.
    #[error("component `{component}` has no render function and no template")]
    MissingRender { component: String },

    /// The component has a template but no compiler is registered.
    #[error("component `{component}` has a template but no template compiler is registered")]
    CompilerMissing { component: String },

    /// The component template failed to compile.
    #[error("failed to compile template of component `{component}`")]
    Compile {
        component: String,
        #[source]
        source: CompileError,
    },

    /// A mount selector did not resolve to a host node.
    #[error("mount container `{0}` not found")]
    ContainerNotFound(String),

    /// The application was mounted twice.
    #[error("application is already mounted")]
    AlreadyMounted,
}

/// Result type with [`RuntimeError`] as the default error.
pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
