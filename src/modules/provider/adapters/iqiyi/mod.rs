mod adapter;

pub use adapter::IqiyiAdapter;
