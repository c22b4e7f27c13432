fn main() {
    prost_build::compile_protos(&["proto/bilibili_dm.proto"], &["proto/"])
        .expect("failed to compile bilibili danmaku protobuf schema");
}
