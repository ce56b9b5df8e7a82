use rand::Rng;

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Order confirmation code: `ORD` + 8 upper-case hex digits
pub fn order_code() -> String {
    let n: u32 = rand::thread_rng().r#gen();
    format!("ORD{:08X}", n)
}

/// Reservation confirmation code: 10 upper-case alphanumerics
pub fn reservation_code() -> String {
    let mut rng = rand::thread_rng();
    (0..10)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
