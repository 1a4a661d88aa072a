//! # 接口注册表
//!
//! 把每个后端操作声明为一个 `EndpointKey` 枚举值，并给出它的
//! 请求方法、路径、默认参数和附加选项。新增接口只需要在这里加一个
//! 枚举值和一行表项，派发逻辑不需要改动。

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// HTTP 请求方法。后端只用到 GET 和 POST。
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! endpoint_keys {
    ($($variant:ident => $name:literal,)*) => {
        /// 所有已声明的后端操作。字符串名与前端保持一致（camelCase）。
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum EndpointKey {
            $($variant,)*
        }

        impl EndpointKey {
            pub const ALL: &'static [EndpointKey] = &[$(EndpointKey::$variant,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(EndpointKey::$variant => $name,)*
                }
            }
        }

        impl FromStr for EndpointKey {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(EndpointKey::$variant),)*
                    other => Err(AppError::UnknownEndpoint(other.to_string())),
                }
            }
        }
    };
}

endpoint_keys! {
    CheckLogin => "checkLogin",
    GetLoginInfo => "getLoginInfo",
    Login => "login",
    KbList => "kbList",
    CreateKb => "createKb",
    UploadFile => "uploadFile",
    DeleteKb => "deleteKB",
    DeleteFile => "deleteFile",
    UploadUrl => "uploadUrl",
    KbConfig => "kbConfig",
    FileList => "fileList",
    CreateBot => "createBot",
    UpdateBot => "updateBot",
    QueryBotInfo => "queryBotInfo",
    DeleteBot => "deleteBot",
    UploadFaqs => "uploadFaqs",
    GetFile => "getFile",
    GetDocCompleted => "getDocCompleted",
    UpdateDocCompleted => "updateDocCompleted",
    ClearUpload => "clearUpload",
    SendQuestion => "sendQuestion",
    GetQaInfo => "getQAInfo",
    GetKbInfo => "getKbInfo",
    GetTags => "getTags",
    UpdateTags => "updateTags",
    UserList => "userList",
    DepartmentList => "departmentList",
    CreateDepartment => "createDepartment",
    GroupList => "groupList",
    CreateUser => "createUser",
    DeleteUser => "deleteUser",
    UpdateDepartment => "updateDepartment",
    DeleteDepartment => "deleteDepartment",
    UpdateUser => "updateUser",
    CreateGroup => "createGroup",
    DeleteGroup => "deleteGroup",
    GrantKbAccess => "grantKbAccess",
    RevokeKbAccess => "revokeKbAccess",
    AddUserToGroup => "addUserToGroup",
    RemoveUserFromGroup => "removeUserFromGroup",
    UpdateUserRole => "updateUserRole",
    GroupMembers => "groupMembers",
    KbAccessList => "kbAccessList",
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 生成默认参数时需要的会话信息。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamContext {
    pub user_id: String,
    /// 用户手机号，后端字段名为 `user_info`
    pub user_info: String,
}

/// 单个接口的完整描述。
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointSpec {
    pub key: EndpointKey,
    pub method: Method,
    pub path: &'static str,
    pub default_params: Map<String, Value>,
    pub options: Map<String, Value>,
}

impl EndpointKey {
    pub fn method(&self) -> Method {
        route(*self).0
    }

    pub fn path(&self) -> &'static str {
        route(*self).1
    }

    /// 按当前会话生成完整的接口描述。
    pub fn spec(&self, ctx: &ParamContext) -> EndpointSpec {
        let (method, path) = route(*self);
        EndpointSpec {
            key: *self,
            method,
            path,
            default_params: default_params(*self, ctx),
            options: default_options(*self),
        }
    }
}

fn route(key: EndpointKey) -> (Method, &'static str) {
    use EndpointKey::*;
    use Method::*;

    match key {
        CheckLogin => (Get, "/checkLogin.s"),
        GetLoginInfo => (Post, "/j_spring_security_check"),
        Login => (Post, "/auth/login"),
        KbList => (Post, "/user/list_knowledge_base"),
        CreateKb => (Post, "/local_doc_qa/new_knowledge_base"),
        UploadFile => (Post, "/local_doc_qa/upload_files"),
        DeleteKb => (Post, "/local_doc_qa/delete_knowledge_base"),
        DeleteFile => (Post, "/local_doc_qa/delete_files"),
        UploadUrl => (Post, "/local_doc_qa/upload_weblink"),
        KbConfig => (Post, "/local_doc_qa/rename_knowledge_base"),
        FileList => (Post, "/local_doc_qa/list_files"),
        CreateBot => (Post, "/local_doc_qa/new_bot"),
        UpdateBot => (Post, "/local_doc_qa/update_bot"),
        QueryBotInfo => (Post, "/local_doc_qa/get_bot_info"),
        DeleteBot => (Post, "/local_doc_qa/delete_bot"),
        UploadFaqs => (Post, "/local_doc_qa/upload_faqs"),
        GetFile => (Post, "/local_doc_qa/get_file_base64"),
        GetDocCompleted => (Post, "/local_doc_qa/get_doc_completed"),
        UpdateDocCompleted => (Post, "/local_doc_qa/update_chunks"),
        ClearUpload => (Post, "/local_doc_qa/clean_files_by_status"),
        SendQuestion => (Post, "/local_doc_qa/local_doc_chat"),
        GetQaInfo => (Post, "/local_doc_qa/get_qa_info"),
        GetKbInfo => (Post, "/local_doc_qa/get_total_status"),
        GetTags => (Post, "/local_doc_qa/get_tags"),
        UpdateTags => (Post, "/local_doc_qa/update_tags"),
        UserList => (Get, "/user/list"),
        DepartmentList => (Get, "/department/list"),
        CreateDepartment => (Post, "/department/create"),
        GroupList => (Get, "/group/list"),
        CreateUser => (Post, "/user/create"),
        DeleteUser => (Post, "/user/delete"),
        UpdateDepartment => (Post, "/department/update"),
        DeleteDepartment => (Post, "/department/delete"),
        UpdateUser => (Post, "/user/update"),
        CreateGroup => (Post, "/group/create"),
        DeleteGroup => (Post, "/group/delete"),
        GrantKbAccess => (Post, "/kb/grant_access"),
        RevokeKbAccess => (Post, "/kb/revoke_access"),
        AddUserToGroup => (Post, "/group/add_user"),
        RemoveUserFromGroup => (Post, "/group/remove_user"),
        UpdateUserRole => (Post, "/user/update"),
        GroupMembers => (Get, "/group/members"),
        KbAccessList => (Get, "/kb/access_list"),
    }
}

fn default_params(key: EndpointKey, ctx: &ParamContext) -> Map<String, Value> {
    use EndpointKey::*;

    let user_id = ctx.user_id.as_str();
    let user_info = ctx.user_info.as_str();

    let value = match key {
        CheckLogin | GetLoginInfo => json!({}),
        Login => json!({ "username": "", "password": "" }),
        // 上传文件只带 user_id
        UploadFile => json!({ "user_id": user_id }),
        DeleteFile => json!({
            "user_id": user_id,
            "user_info": user_info,
            "kb_id": "",
            "file_ids": [],
        }),
        KbConfig => json!({
            "user_id": user_id,
            "user_info": user_info,
            "kb_id": "",
            "new_kb_name": "",
        }),
        FileList => json!({ "user_id": user_id, "user_info": user_info, "kb_id": "" }),
        KbList | CreateKb | DeleteKb | UploadUrl | CreateBot | UpdateBot | QueryBotInfo
        | DeleteBot | UploadFaqs | GetFile | GetDocCompleted | UpdateDocCompleted
        | ClearUpload | SendQuestion | GetQaInfo | GetKbInfo | GetTags | UpdateTags
        | CreateUser => json!({ "user_id": user_id, "user_info": user_info }),
        UserList | DepartmentList | GroupList | DeleteUser => json!({ "user_id": user_id }),
        CreateDepartment => json!({ "name": "", "description": "", "parent_id": "" }),
        UpdateDepartment => json!({ "dept_id": "", "parent_dept_id": "", "user_id": user_id }),
        DeleteDepartment => json!({ "dept_id": "", "user_id": user_id }),
        // 目标用户由调用方填写，默认值为空
        UpdateUser => json!({ "user_id": "", "dept_id": null }),
        CreateGroup => json!({ "name": "", "description": "", "user_id": user_id }),
        DeleteGroup => json!({ "group_id": "", "user_id": user_id }),
        GrantKbAccess => json!({
            "kb_id": "",
            "user_id": user_id,
            "subject_type": "",
            "subject_id": "",
            "permission_type": "",
        }),
        RevokeKbAccess => json!({
            "kb_id": "",
            "user_id": user_id,
            "subject_type": "",
            "subject_id": "",
        }),
        AddUserToGroup | RemoveUserFromGroup => json!({
            "user_id": user_id,
            "target_user_id": "",
            "group_id": "",
        }),
        UpdateUserRole => json!({ "user_id": user_id, "target_user_id": "", "role": "" }),
        GroupMembers => json!({ "user_id": user_id, "group_id": "" }),
        KbAccessList => json!({ "user_id": user_id, "kb_id": "" }),
    };

    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn default_options(key: EndpointKey) -> Map<String, Value> {
    use EndpointKey::*;

    let show_loading = match key {
        Login | KbList | CreateKb | DeleteFile | KbConfig | GrantKbAccess | RevokeKbAccess
        | UpdateUserRole => Some(true),
        UserList | DepartmentList | CreateDepartment | GroupList | UpdateDepartment
        | DeleteDepartment | UpdateUser | CreateGroup | DeleteGroup | AddUserToGroup
        | RemoveUserFromGroup => Some(false),
        _ => None,
    };

    let mut options = Map::new();
    if let Some(flag) = show_loading {
        options.insert("showLoading".to_string(), Value::Bool(flag));
    }
    options
}

/// 启动时校验注册表：路径合法、名称唯一且能反向解析。
pub fn validate_registry() -> AppResult<()> {
    let ctx = ParamContext::default();
    let mut names = HashSet::new();

    for key in EndpointKey::ALL {
        let spec = key.spec(&ctx);
        if spec.path.is_empty() || !spec.path.starts_with('/') {
            return Err(AppError::Registry(format!(
                "{} 的路径不合法: {:?}",
                key, spec.path
            )));
        }
        if !names.insert(key.as_str()) {
            return Err(AppError::Registry(format!("接口名重复: {}", key)));
        }
        let parsed: EndpointKey = key.as_str().parse()?;
        if parsed != *key {
            return Err(AppError::Registry(format!(
                "接口名 {} 解析为 {:?}",
                key, parsed
            )));
        }
    }
    Ok(())
}
