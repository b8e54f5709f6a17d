//! Localized user-facing messages.
//!
//! Errors carry a [`MessageKey`] instead of guessing the language of whatever
//! text the server sent. The server's own `message` is still preferred when it
//! sends one; the catalog covers everything else.

use serde::Deserialize;

/// Display language for client-generated messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "zh-CN", alias = "zh")]
    ZhCn,
    #[serde(rename = "en", alias = "en-US")]
    En,
}

/// Catalog entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    /// Generic failure, used when nothing more specific is known.
    RequestFailed,
    Network,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    ServerError,
    LoginRequired,
    EmptyMessage,
    ThreadNotFound,
    Cancelled,
    StreamInterrupted,
    InvalidConfig,
}

impl MessageKey {
    /// Map a backend error code (`{"code": "..."}`) to a catalog entry.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        let key = match code {
            "UNAUTHORIZED" | "TOKEN_EXPIRED" | "INVALID_TOKEN" => Self::Unauthorized,
            "FORBIDDEN" => Self::Forbidden,
            "NOT_FOUND" | "PET_NOT_FOUND" | "USER_NOT_FOUND" => Self::NotFound,
            "THREAD_NOT_FOUND" => Self::ThreadNotFound,
            "CONFLICT" | "ALREADY_EXISTS" => Self::Conflict,
            "INTERNAL_ERROR" => Self::ServerError,
            _ => return None,
        };
        Some(key)
    }

    /// Localized text for this entry.
    #[must_use]
    pub fn text(self, locale: Locale) -> &'static str {
        match locale {
            Locale::ZhCn => match self {
                Self::RequestFailed => "请求失败",
                Self::Network => "网络连接失败，请稍后重试",
                Self::Unauthorized => "登录已失效，请重新登录",
                Self::Forbidden => "没有权限执行该操作",
                Self::NotFound => "未找到",
                Self::Conflict => "数据已存在",
                Self::ServerError => "服务器开小差了",
                Self::LoginRequired => "请先登录",
                Self::EmptyMessage => "消息不能为空",
                Self::ThreadNotFound => "对话不存在",
                Self::Cancelled => "请求已取消",
                Self::StreamInterrupted => "回复中断，请重试",
                Self::InvalidConfig => "配置错误",
            },
            Locale::En => match self {
                Self::RequestFailed => "Request failed",
                Self::Network => "Network unavailable, please try again",
                Self::Unauthorized => "Your session has expired, please sign in again",
                Self::Forbidden => "You are not allowed to do that",
                Self::NotFound => "Not found",
                Self::Conflict => "Already exists",
                Self::ServerError => "Something went wrong on our side",
                Self::LoginRequired => "Please sign in first",
                Self::EmptyMessage => "Message cannot be empty",
                Self::ThreadNotFound => "Conversation not found",
                Self::Cancelled => "Request cancelled",
                Self::StreamInterrupted => "The reply was interrupted, please retry",
                Self::InvalidConfig => "Configuration error",
            },
        }
    }
}
