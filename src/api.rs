//! 带类型的请求参数
//!
//! 每个结构体通过 `Operation` 绑定到唯一的接口，序列化后与默认参数浅合并。
//! 可选字段为 `None` 时不会出现在请求里，默认值因此得以保留。

use crate::dispatcher::Operation;
use crate::registry::EndpointKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;

macro_rules! operation {
    ($($ty:ident => $key:ident),* $(,)?) => {
        $(impl Operation for $ty {
            const KEY: EndpointKey = EndpointKey::$key;
        })*
    };
}

/// 授权主体类型
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    User,
    Department,
    Group,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Admin,
}

// --- 登录 ---

#[derive(Serialize, Clone, Debug)]
pub struct Login {
    pub username: String,
    pub password: String,
}

// --- 知识库与文件 ---

#[derive(Serialize, Clone, Debug, Default)]
pub struct ListKnowledgeBases {}

#[derive(Serialize, Clone, Debug)]
pub struct CreateKnowledgeBase {
    pub kb_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_id: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct DeleteKnowledgeBases {
    pub kb_ids: Vec<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct RenameKnowledgeBase {
    pub kb_id: String,
    pub new_kb_name: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct ListFiles {
    pub kb_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<u32>,
}

#[derive(Serialize, Clone, Debug)]
pub struct DeleteFiles {
    pub kb_id: String,
    pub file_ids: Vec<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct UploadWeblink {
    pub kb_id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct GetFile {
    pub file_id: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct GetDocCompleted {
    pub file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<u32>,
}

#[derive(Serialize, Clone, Debug)]
pub struct ClearUpload {
    pub kb_id: String,
    pub status: String,
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct KnowledgeBaseStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_ids: Option<Vec<String>>,
}

#[derive(Serialize, Clone, Debug)]
pub struct GetTags {
    pub kb_ids: Vec<String>,
}

// --- 问答 ---

#[derive(Serialize, Clone, Debug)]
pub struct SendQuestion {
    pub kb_ids: Vec<String>,
    pub question: String,
    pub history: Vec<Value>,
    pub streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct GetQaInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

// --- Bot ---

#[derive(Serialize, Clone, Debug)]
pub struct CreateBot {
    pub bot_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_setting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
    pub kb_ids: Vec<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct UpdateBot {
    pub bot_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_setting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kb_ids: Option<Vec<String>>,
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct QueryBotInfo {
    /// 为空时返回全部 bot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct DeleteBot {
    pub bot_id: String,
}

// --- 用户、部门、用户组 ---

#[derive(Serialize, Clone, Debug, Default)]
pub struct ListUsers {}

#[derive(Serialize, Clone, Debug)]
pub struct CreateUser {
    pub user_name: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dept_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct DeleteUser {
    pub target_user_id: String,
}

/// 调整用户所属部门。`target_user_id` 是被修改的用户，`user_id` 仍是操作人；
/// `dept_id` 为 `None` 表示移出部门
#[derive(Serialize, Clone, Debug)]
pub struct UpdateUser {
    pub target_user_id: String,
    pub dept_id: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct UpdateUserRole {
    pub target_user_id: String,
    pub role: String,
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct ListDepartments {}

#[derive(Serialize, Clone, Debug)]
pub struct CreateDepartment {
    pub dept_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_dept_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct UpdateDepartment {
    pub dept_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dept_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_dept_id: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct DeleteDepartment {
    pub dept_id: String,
}

#[derive(Serialize, Clone, Debug, Default)]
pub struct ListGroups {}

#[derive(Serialize, Clone, Debug)]
pub struct CreateGroup {
    pub group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct DeleteGroup {
    pub group_id: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct AddUserToGroup {
    pub target_user_id: String,
    pub group_id: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct RemoveUserFromGroup {
    pub target_user_id: String,
    pub group_id: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct GroupMembers {
    pub group_id: String,
}

// --- 知识库权限 ---

#[derive(Serialize, Clone, Debug)]
pub struct GrantKbAccess {
    pub kb_id: String,
    pub subject_type: SubjectType,
    pub subject_id: String,
    pub permission_type: Permission,
}

#[derive(Serialize, Clone, Debug)]
pub struct RevokeKbAccess {
    pub kb_id: String,
    pub subject_type: SubjectType,
    pub subject_id: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct KbAccessList {
    pub kb_id: String,
}

operation! {
    Login => Login,
    ListKnowledgeBases => KbList,
    CreateKnowledgeBase => CreateKb,
    DeleteKnowledgeBases => DeleteKb,
    RenameKnowledgeBase => KbConfig,
    ListFiles => FileList,
    DeleteFiles => DeleteFile,
    UploadWeblink => UploadUrl,
    GetFile => GetFile,
    GetDocCompleted => GetDocCompleted,
    ClearUpload => ClearUpload,
    KnowledgeBaseStatus => GetKbInfo,
    GetTags => GetTags,
    SendQuestion => SendQuestion,
    GetQaInfo => GetQaInfo,
    CreateBot => CreateBot,
    UpdateBot => UpdateBot,
    QueryBotInfo => QueryBotInfo,
    DeleteBot => DeleteBot,
    ListUsers => UserList,
    CreateUser => CreateUser,
    DeleteUser => DeleteUser,
    UpdateUser => UpdateUser,
    UpdateUserRole => UpdateUserRole,
    ListDepartments => DepartmentList,
    CreateDepartment => CreateDepartment,
    UpdateDepartment => UpdateDepartment,
    DeleteDepartment => DeleteDepartment,
    ListGroups => GroupList,
    CreateGroup => CreateGroup,
    DeleteGroup => DeleteGroup,
    AddUserToGroup => AddUserToGroup,
    RemoveUserFromGroup => RemoveUserFromGroup,
    GroupMembers => GroupMembers,
    GrantKbAccess => GrantKbAccess,
    RevokeKbAccess => RevokeKbAccess,
    KbAccessList => KbAccessList,
}
