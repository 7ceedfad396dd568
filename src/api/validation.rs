//! 请求字段校验
//!
//! 错误格式与 DRF 序列化器保持一致：`{"field": ["message", ...]}`

use std::str::FromStr;

use axum::{extract::rejection::JsonRejection, Json};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::{AppError, FieldErrors};

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_NULL: &str = "This field may not be null.";
pub const MSG_BLANK: &str = "This field may not be blank.";
pub const MSG_NOT_STRING: &str = "Not a valid string.";
pub const MSG_NOT_NUMBER: &str = "A valid number is required.";

/// JSON 解析失败统一转为 400
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

/// 请求体必须是 JSON 对象
pub fn expect_object(value: &Value) -> Result<&Map<String, Value>, AppError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::field(
            "non_field_errors",
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(other)
            ),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// 字段校验器：收集全部字段错误后一次性返回
pub struct Validator<'a> {
    data: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> Validator<'a> {
    pub fn new(data: &'a Map<String, Value>) -> Self {
        Self {
            data,
            errors: FieldErrors::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, msg: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(msg.into());
    }

    fn present(&mut self, field: &str) -> Option<&'a Value> {
        match self.data.get(field) {
            None => {
                self.add_error(field, MSG_REQUIRED);
                None
            }
            Some(Value::Null) => {
                self.add_error(field, MSG_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    /// 必填字符串字段（去除首尾空白，不允许空串）
    pub fn char_field(
        &mut self,
        field: &str,
        min_length: Option<usize>,
        max_length: usize,
    ) -> Option<String> {
        let value = match self.present(field)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => {
                self.add_error(field, MSG_NOT_STRING);
                return None;
            }
        };

        if value.is_empty() {
            self.add_error(field, MSG_BLANK);
            return None;
        }

        let len = value.chars().count();
        let mut ok = true;
        if len > max_length {
            self.add_error(
                field,
                format!("Ensure this field has no more than {} characters.", max_length),
            );
            ok = false;
        }
        if let Some(min) = min_length {
            if len < min {
                self.add_error(
                    field,
                    format!("Ensure this field has at least {} characters.", min),
                );
                ok = false;
            }
        }
        ok.then_some(value)
    }

    /// 必填十进制字段：接受 JSON 数字或数字字符串
    pub fn decimal_field(
        &mut self,
        field: &str,
        max_digits: u32,
        decimal_places: u32,
    ) -> Option<Decimal> {
        let raw = match self.present(field)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => {
                self.add_error(field, MSG_NOT_NUMBER);
                return None;
            }
        };

        let Some(value) = parse_decimal(&raw) else {
            self.add_error(field, MSG_NOT_NUMBER);
            return None;
        };

        let (digits, decimals) = digit_counts(&value);
        let whole_digits = digits.saturating_sub(decimals);
        let mut ok = true;
        if digits > max_digits {
            self.add_error(
                field,
                format!(
                    "Ensure that there are no more than {} digits in total.",
                    max_digits
                ),
            );
            ok = false;
        }
        if decimals > decimal_places {
            self.add_error(
                field,
                format!(
                    "Ensure that there are no more than {} decimal places.",
                    decimal_places
                ),
            );
            ok = false;
        }
        if whole_digits > max_digits - decimal_places {
            self.add_error(
                field,
                format!(
                    "Ensure that there are no more than {} digits before the decimal point.",
                    max_digits - decimal_places
                ),
            );
            ok = false;
        }
        ok.then_some(value)
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(self.errors))
        }
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// (总位数, 小数位数)，忽略末尾多余的 0
fn digit_counts(value: &Decimal) -> (u32, u32) {
    let normalized = value.normalize();
    let decimals = normalized.scale();
    let mantissa = normalized.mantissa().unsigned_abs();
    let len = if mantissa == 0 {
        1
    } else {
        mantissa.to_string().len() as u32
    };
    (len.max(decimals), decimals)
}
