use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, instrument};

use super::ChapterFetcher;
use crate::config::BatchPolicy;
use crate::error::FetchError;

/// 批次之间的等待
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchProgress {
    pub batches_left: usize,
    /// 按固定批次间隔估算, 不考虑实际请求耗时
    pub seconds_left: f64,
}

pub fn batch_count(chapters: usize, policy: &BatchPolicy) -> usize {
    chapters.div_ceil(policy.size.get())
}

pub fn estimate_seconds(chapters: usize, policy: &BatchPolicy) -> f64 {
    batch_count(chapters, policy) as f64 * policy.delay.as_secs_f64()
}

/// 按批次抓取全部章节, 结果顺序与 `urls` 一致
///
/// 同一批次内并发请求, 任意一章失败立即返回该错误, 后续批次不再开始。
#[instrument(skip_all, fields(chapters = urls.len()))]
pub async fn download_all<C, K, F>(
    fetcher: &C,
    clock: &K,
    urls: &[String],
    policy: &BatchPolicy,
    mut on_progress: F,
) -> Result<Vec<String>, FetchError>
where
    C: ChapterFetcher + ?Sized,
    K: Clock + ?Sized,
    F: FnMut(BatchProgress),
{
    let total = batch_count(urls.len(), policy);
    let mut chapters = Vec::with_capacity(urls.len());

    for (index, batch) in urls.chunks(policy.size.get()).enumerate() {
        if index > 0 {
            clock.sleep(policy.delay).await;
        }
        debug!("开始第 {}/{} 批, {} 章", index + 1, total, batch.len());

        let results = try_join_all(batch.iter().map(|url| fetcher.fetch_chapter(url))).await?;
        chapters.extend(results);

        let batches_left = total - index - 1;
        on_progress(BatchProgress {
            batches_left,
            seconds_left: batches_left as f64 * policy.delay.as_secs_f64(),
        });
    }

    Ok(chapters)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::num::NonZeroUsize;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FakeFetcher {
        calls: AtomicUsize,
        failing: HashSet<String>,
        latency: Option<Duration>,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failing: HashSet::new(),
                latency: None,
            }
        }

        fn failing_on(url: &str) -> Self {
            Self {
                failing: HashSet::from([url.to_owned()]),
                ..Self::new()
            }
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChapterFetcher for FakeFetcher {
        async fn fetch_chapter(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(url) {
                tokio::time::sleep(Duration::from_millis(10)).await;
                return Err(FetchError::ContentShape);
            }
            let latency = self.latency.unwrap_or_else(|| {
                // 编号越小完成得越晚, 打乱批次内的完成顺序
                let n: u64 = url.trim_start_matches("ch").parse().unwrap_or(0);
                Duration::from_millis(100 - n % 100)
            });
            tokio::time::sleep(latency).await;
            Ok(format!("{}\n\n", url))
        }
    }

    #[derive(Default)]
    struct RecordingClock {
        sleeps: Mutex<Vec<Duration>>,
    }

    impl RecordingClock {
        fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Clock for RecordingClock {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    fn urls(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("ch{}", i)).collect()
    }

    fn policy(size: usize) -> BatchPolicy {
        BatchPolicy::new(NonZeroUsize::new(size).unwrap(), Duration::from_millis(2500))
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_input_order_despite_jitter() {
        for size in 1..=8 {
            let fetcher = FakeFetcher::new();
            let clock = RecordingClock::default();
            let urls = urls(7);

            let chapters = download_all(&fetcher, &clock, &urls, &policy(size), |_| {})
                .await
                .unwrap();

            let expected: Vec<String> = urls.iter().map(|u| format!("{}\n\n", u)).collect();
            assert_eq!(chapters, expected, "batch size {}", size);
            assert_eq!(fetcher.calls(), 7);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_only_between_batches() {
        let fetcher = FakeFetcher::new();
        let clock = RecordingClock::default();
        let mut events = Vec::new();

        download_all(&fetcher, &clock, &urls(7), &policy(3), |p| events.push(p))
            .await
            .unwrap();

        assert_eq!(batch_count(7, &policy(3)), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(2500); 2]);
        assert_eq!(
            events,
            vec![
                BatchProgress { batches_left: 2, seconds_left: 5.0 },
                BatchProgress { batches_left: 1, seconds_left: 2.5 },
                BatchProgress { batches_left: 0, seconds_left: 0.0 },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failure_stops_later_batches() {
        // ch4 在第二批 (ch3..ch5)
        let fetcher = FakeFetcher::failing_on("ch4");
        let clock = RecordingClock::default();
        let mut progress_calls = 0;

        let err = download_all(&fetcher, &clock, &urls(9), &policy(3), |_| progress_calls += 1)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::ContentShape));
        // 失败批次里的三章都已发出, 第三批一章也没有
        assert_eq!(fetcher.calls(), 6);
        assert_eq!(progress_calls, 1);
        assert_eq!(clock.sleeps().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_members_are_fetched_concurrently() {
        let fetcher = FakeFetcher::new().with_latency(Duration::from_millis(100));
        let clock = RecordingClock::default();

        let start = tokio::time::Instant::now();
        let chapters = download_all(&fetcher, &clock, &urls(4), &policy(4), |_| {})
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(chapters.len(), 4);
        assert!(elapsed >= Duration::from_millis(100), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(200), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_returns_before_slow_siblings_finish() {
        let fetcher = FakeFetcher::failing_on("ch1").with_latency(Duration::from_secs(1));
        let clock = RecordingClock::default();

        let start = tokio::time::Instant::now();
        let err = download_all(&fetcher, &clock, &urls(3), &policy(3), |_| {})
            .await
            .unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(err, FetchError::ContentShape));
        assert_eq!(fetcher.calls(), 3);
        assert!(elapsed < Duration::from_secs(1), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_does_nothing() {
        let fetcher = FakeFetcher::new();
        let clock = RecordingClock::default();
        let mut progress_calls = 0;

        let chapters = download_all(&fetcher, &clock, &[], &policy(3), |_| progress_calls += 1)
            .await
            .unwrap();

        assert!(chapters.is_empty());
        assert_eq!(fetcher.calls(), 0);
        assert!(clock.sleeps().is_empty());
        assert_eq!(progress_calls, 0);
    }

    #[test]
    fn estimate_rounds_batches_up() {
        assert_eq!(estimate_seconds(7, &policy(3)), 7.5);
        assert_eq!(estimate_seconds(6, &policy(3)), 5.0);
        assert_eq!(estimate_seconds(0, &policy(3)), 0.0);
        assert_eq!(estimate_seconds(1, &policy(3)), 2.5);
    }
}
