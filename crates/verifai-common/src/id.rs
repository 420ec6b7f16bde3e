use uuid::Uuid;

/// 新记录主键：UUID v4 字符串
pub fn next_id() -> String {
    Uuid::new_v4().to_string()
}
