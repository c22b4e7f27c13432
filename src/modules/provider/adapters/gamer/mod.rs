mod adapter;

pub use adapter::GamerAdapter;
