//! # 身份验证模块
//!
//! ## 功能描述
//! 负责登录和退出登录：调用后端 `/auth/login`，把令牌、用户 ID、角色写入
//! `UserStore`，同时写入登录态 cookie 供导航守卫判断。
//!
//! ## 数据流向
//! 1. 调用方 -> `login` -> `Dispatcher` -> 后端
//! 2. 后端返回 `{code, data: {access_token, user_id, role, ...}, msg}`
//! 3. 成功时更新会话；失败时返回 `AppError::Api`，会话保持不变

use crate::api::Login;
use crate::dispatcher::Dispatcher;
use crate::error::AppResult;
use crate::models::{LoginData, SessionUpdate};
use crate::router::{CookieJar, TOKEN_COOKIE};
use crate::stores::UserStore;
use tracing::info;

/// 调用后端登录接口并更新会话
pub async fn login(
    dispatcher: &Dispatcher,
    user: &UserStore,
    cookies: &dyn CookieJar,
    username: &str,
    password: &str,
) -> AppResult<LoginData> {
    let request = Login {
        username: username.to_string(),
        password: password.to_string(),
    };
    let data = dispatcher.send(&request, None).await?.into_result()?;
    let login: LoginData = serde_json::from_value(data)?;

    user.set_user_info(SessionUpdate::from(login.clone()));
    cookies.set(TOKEN_COOKIE, &login.access_token);
    info!(user_id = %login.user_id, role = %login.role, "logged in");
    Ok(login)
}

/// 清空会话和登录态 cookie
pub fn logout(user: &UserStore, cookies: &dyn CookieJar) {
    user.clear_session();
    cookies.remove(TOKEN_COOKIE);
    info!("logged out");
}
