//! # Clock（時刻プロバイダ）と学年度
//!
//! スコープ解決で `Utc::now()` を直接呼ばず、テストで固定時刻を注入するための抽象化。
//! 学年度は 8 月始まりで、ラベルは `"{開始年}-{開始年+1}"` 形式。

use chrono::{DateTime, Datelike, Utc};
use derive_more::Display;

/// 学年度が切り替わる月（1 始まり）
const ACADEMIC_YEAR_START_MONTH: u32 = 8;

/// 現在時刻を提供するトレイト
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 実際のシステム時刻を返す実装
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定時刻を返すテスト用実装
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

/// 学年度
///
/// 8 月 1 日以降はその年、7 月 31 日までは前年が開始年になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("{}-{}", start_year, start_year + 1)]
pub struct AcademicYear {
    start_year: i32,
}

impl AcademicYear {
    /// 指定日時を含む学年度を返す
    pub fn containing(at: DateTime<Utc>) -> Self {
        let start_year = if at.month() >= ACADEMIC_YEAR_START_MONTH {
            at.year()
        } else {
            at.year() - 1
        };
        Self { start_year }
    }

    /// 時刻プロバイダの現在時刻を含む学年度を返す
    pub fn current(clock: &dyn Clock) -> Self {
        Self::containing(clock.now())
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// パス・ラベルに使う文字列（例: `"2024-2025"`）
    pub fn label(&self) -> String {
        self.to_string()
    }
}
