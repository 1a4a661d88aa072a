// src/main.rs
fn main() -> anyhow::Result<()> {
    // 调用 lib.rs 里的 run 函数
    kb_admin_lib::run()
}
