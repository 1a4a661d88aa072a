//! 状态容器：用户会话与知识库列表。
//!
//! 两个容器都是显式创建、显式传递的普通值，通过 `Arc` 在调用方之间共享。

mod knowledge_base;
mod user;

pub use knowledge_base::{KnowledgeBaseState, KnowledgeBaseStore, KNOWLEDGE_BASE_STORE_KEY};
pub use user::{UserState, UserStore, USER_STORE_KEY};
