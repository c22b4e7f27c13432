//! Generated from `proto/bilibili_dm.proto` by `build.rs` — the
//! `DmSegMobileReply`/`DanmakuElem` wire format returned by `seg.so`
//! (§4.1.1).
include!(concat!(env!("OUT_DIR"), "/bilibili_dm.rs"));
