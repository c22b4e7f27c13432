mod adapter;

pub use adapter::MgtvAdapter;
