mod adapter;

pub use adapter::TencentAdapter;
