//! 配额跟踪器 - 业务能力层
//!
//! 维护滚动 60 秒窗口内的 token 预算与调用频率预算，决定一次调用
//! 需要等待多久才能发出。该组件从不失败，只会延迟。
//!
//! ## 设计要点
//!
//! - 显式组合：代理持有跟踪器实例并在调用前主动询问，不做装饰器包装
//! - token 门用上一次调用的真实用量作为下一次的估计值（调用前无法得知
//!   真实消耗，这是沿用的启发式）
//! - 频率门为标准滑动窗口：窗口内最多 `rpm_limit` 次调用起始
//! - 窗口推进逻辑是接收显式 `now` 的纯函数，异步封装只负责真正休眠

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

/// 配额窗口长度：60 秒
const WINDOW: Duration = Duration::from_secs(60);

/// 配额跟踪器
///
/// 由单个代理实例独占持有，顺序执行下无需加锁。
#[derive(Debug)]
pub struct QuotaTracker {
    /// 每分钟最大调用次数
    rpm_limit: usize,
    /// 每分钟最大 token 用量
    tpm_limit: u64,
    /// 当前 token 窗口起点
    window_start: Instant,
    /// 当前窗口内已消耗的 token
    tokens_in_window: u64,
    /// 整个运行周期累计消耗的 token
    lifetime_tokens: u64,
    /// 上一次调用的真实 token 用量（下一次调用的估计值）
    last_call_tokens: u64,
    /// 窗口内各次调用的起始时刻
    call_starts: VecDeque<Instant>,
}

impl QuotaTracker {
    pub fn new(rpm_limit: usize, tpm_limit: u64) -> Self {
        Self {
            // 上限为 0 时窗口永远无法放行，钳到每分钟至少 1 次
            rpm_limit: rpm_limit.max(1),
            tpm_limit,
            window_start: Instant::now(),
            tokens_in_window: 0,
            lifetime_tokens: 0,
            last_call_tokens: 0,
            call_starts: VecDeque::new(),
        }
    }

    /// 频率门：阻塞到本次调用可以起始为止
    ///
    /// 契约：任意滚动 60 秒区间内起始的调用不超过 `rpm_limit` 次。
    pub async fn admit_call(&mut self) {
        loop {
            let now = Instant::now();
            self.purge_expired(now);

            if self.call_starts.len() < self.rpm_limit {
                self.call_starts.push_back(now);
                return;
            }

            // 等最早的一次调用滑出窗口后重新检查
            if let Some(&oldest) = self.call_starts.front() {
                let wait = (oldest + WINDOW).saturating_duration_since(now);
                debug!("调用频率达到上限，等待 {:?}", wait);
                sleep(wait).await;
            }
        }
    }

    /// token 门：按上一次调用的用量估计本次消耗，必要时阻塞到窗口重置
    pub async fn admit_tokens(&mut self) {
        let estimate = self.last_call_tokens;
        let now = Instant::now();
        let wait = self.token_wait_at(estimate, now);

        if !wait.is_zero() {
            debug!("token 配额不足，等待 {:?} 后重置窗口", wait);
            sleep(wait).await;
            // 休眠结束即进入新窗口
            self.tokens_in_window = 0;
            self.window_start = Instant::now();
        }
    }

    /// 记录一次已完成调用的真实 token 用量
    pub fn record_usage(&mut self, tokens: u64) {
        self.tokens_in_window += tokens;
        self.lifetime_tokens += tokens;
        self.last_call_tokens = tokens;
    }

    /// 累计 token 用量
    pub fn lifetime_tokens(&self) -> u64 {
        self.lifetime_tokens
    }

    // ========== 窗口推进（纯逻辑，接收显式 now） ==========

    /// 计算 token 门需要等待的时长
    ///
    /// 步骤：窗口过期先重置；预估用量超限则等到窗口结束；否则立即放行。
    fn token_wait_at(&mut self, estimate: u64, now: Instant) -> Duration {
        if now.duration_since(self.window_start) >= WINDOW {
            self.tokens_in_window = 0;
            self.window_start = now;
        }

        if self.tokens_in_window + estimate > self.tpm_limit {
            let elapsed = now.duration_since(self.window_start);
            WINDOW.saturating_sub(elapsed)
        } else {
            Duration::ZERO
        }
    }

    /// 清除已滑出窗口的调用记录
    fn purge_expired(&mut self, now: Instant) {
        while let Some(&front) = self.call_starts.front() {
            if now.duration_since(front) >= WINDOW {
                self.call_starts.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_token_window_resets_after_sixty_seconds() {
        let mut tracker = QuotaTracker::new(15, 1_000_000);
        tracker.record_usage(999_999);

        // 窗口未过期且预估超限 -> 需要等待
        let now = Instant::now();
        assert!(!tracker.token_wait_at(2, now).is_zero());

        // 60 秒后窗口重置 -> 立即放行
        advance(Duration::from_secs(60)).await;
        let later = Instant::now();
        assert_eq!(tracker.token_wait_at(2, later), Duration::ZERO);
        assert_eq!(tracker.tokens_in_window, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_wait_is_window_remainder() {
        let mut tracker = QuotaTracker::new(15, 1_000);
        tracker.record_usage(900);

        advance(Duration::from_secs(20)).await;
        let now = Instant::now();
        // 已过 20 秒，还需等 40 秒到窗口结束
        assert_eq!(tracker.token_wait_at(200, now), Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_admit_tokens_blocks_then_resets() {
        let mut tracker = QuotaTracker::new(15, 1_000);
        tracker.record_usage(1_000);

        let before = Instant::now();
        tracker.admit_tokens().await;
        let blocked = Instant::now().duration_since(before);

        // 应当恰好等满一个窗口，且窗口状态已重置
        assert_eq!(blocked, Duration::from_secs(60));
        assert_eq!(tracker.tokens_in_window, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_gate_never_exceeds_rpm_in_any_window() {
        const RPM: usize = 15;
        let mut tracker = QuotaTracker::new(RPM, u64::MAX);
        let base = Instant::now();

        // 以不规则间隔发起远超限额的调用
        let mut starts = Vec::new();
        for i in 0..45u64 {
            tracker.admit_call().await;
            starts.push(Instant::now().duration_since(base));
            advance(Duration::from_millis(317 * (i % 7))).await;
        }

        // 任意滚动 60 秒区间内的起始次数不得超过 RPM
        for (i, &t0) in starts.iter().enumerate() {
            let in_window = starts[i..]
                .iter()
                .filter(|&&t| t < t0 + Duration::from_secs(60))
                .count();
            assert!(
                in_window <= RPM,
                "从 {:?} 起的窗口内有 {} 次调用",
                t0,
                in_window
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_gate_blocks_sixteenth_call() {
        let mut tracker = QuotaTracker::new(15, u64::MAX);
        let base = Instant::now();

        for _ in 0..15 {
            tracker.admit_call().await;
        }
        // 第 16 次必须等到第 1 次滑出窗口
        tracker.admit_call().await;
        assert_eq!(
            Instant::now().duration_since(base),
            Duration::from_secs(60)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_quota_never_exceeded_in_any_window() {
        const TPM: u64 = 10_000;
        const COST: u64 = 3_000;
        let mut tracker = QuotaTracker::new(usize::MAX, TPM);
        let base = Instant::now();

        // 等量消耗下模拟一批调用，记录每次入账的时刻与数额
        let mut usage = Vec::new();
        for _ in 0..12 {
            tracker.admit_tokens().await;
            tracker.record_usage(COST);
            usage.push((Instant::now().duration_since(base), COST));
            advance(Duration::from_secs(5)).await;
        }

        // 任意滚动 60 秒区间内入账的 token 总量不超过 TPM
        for (i, &(t0, _)) in usage.iter().enumerate() {
            let total: u64 = usage[i..]
                .iter()
                .filter(|&&(t, _)| t < t0 + Duration::from_secs(60))
                .map(|&(_, c)| c)
                .sum();
            assert!(total <= TPM, "从 {:?} 起的窗口内消耗 {} token", t0, total);
        }
        assert_eq!(tracker.lifetime_tokens(), 12 * COST);
    }
}
