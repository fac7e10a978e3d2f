use time::OffsetDateTime;

/// 現在時刻の取得元
///
/// トークンの発行時刻・有効期限判定はすべてここを経由する
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
