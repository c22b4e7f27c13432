mod runtime;

pub use runtime::RuntimeConfig;
