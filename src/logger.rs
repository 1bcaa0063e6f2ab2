use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// 下载过程日志使用的固定 target
pub const LOGS_TAG: &str = "NOBLEMTL-UTILITIES";

pub fn init() {
    let tracing_subscriber = tracing_subscriber::registry();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt::layer()
        .with_timer(ChronoLocal::new("%H:%M:%S%.3f".to_owned()))
        .with_target(true);
    tracing_subscriber.with(filter).with(fmt).init();
}
