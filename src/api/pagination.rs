// limit/offset 分页（不带 limit 时不分页）

use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

pub const MAX_LIMIT: i64 = 100;

/// 分页查询参数；非法值按未提供处理
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitOffsetQuery {
    /// 每页条数（1..=100），省略时返回完整列表
    pub limit: Option<String>,
    /// 起始偏移
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOffset {
    pub limit: i64,
    pub offset: i64,
}

impl LimitOffsetQuery {
    /// 解析分页参数；没有合法的 limit 时返回 None
    pub fn resolve(&self) -> Option<LimitOffset> {
        let limit = positive_int(self.limit.as_deref()).filter(|l| *l > 0)?;
        let offset = positive_int(self.offset.as_deref()).unwrap_or(0);
        Some(LimitOffset {
            limit: limit.min(MAX_LIMIT),
            offset,
        })
    }
}

fn positive_int(raw: Option<&str>) -> Option<i64> {
    raw?.trim().parse::<i64>().ok().filter(|v| *v >= 0)
}

/// 分页响应结构
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    /// `path` 为当前请求路径，用于生成前后页链接
    pub fn new(results: Vec<T>, count: i64, path: &str, page: LimitOffset) -> Self {
        let LimitOffset { limit, offset } = page;

        let next_offset = offset.saturating_add(limit);
        let next = (next_offset < count)
            .then(|| format!("{}?limit={}&offset={}", path, limit, next_offset));

        let previous_offset = offset.saturating_sub(limit);
        let previous = if offset <= 0 {
            None
        } else if previous_offset <= 0 {
            Some(format!("{}?limit={}", path, limit))
        } else {
            Some(format!("{}?limit={}&offset={}", path, limit, previous_offset))
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}
