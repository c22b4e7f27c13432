pub mod bilibili;
pub mod gamer;
pub mod iqiyi;
pub mod mgtv;
pub mod tencent;
pub mod youku;

pub use bilibili::BilibiliAdapter;
pub use gamer::GamerAdapter;
pub use iqiyi::IqiyiAdapter;
pub use mgtv::MgtvAdapter;
pub use tencent::TencentAdapter;
pub use youku::YoukuAdapter;
