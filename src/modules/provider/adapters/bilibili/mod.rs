mod adapter;
mod pb;
mod signing;

pub use adapter::BilibiliAdapter;
