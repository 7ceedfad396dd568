use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, OnceLock},
};

static METRICS: OnceLock<Mutex<MetricsState>> = OnceLock::new();

#[derive(Default)]
struct MetricsState {
    total: u64,
    errors: u64,
    per_endpoint: HashMap<&'static str, u64>,
    per_endpoint_err: HashMap<&'static str, u64>,
    // 链客户端调用成功/失败与时延统计（毫秒）
    upstream_ok: u64,
    upstream_err: u64,
    upstream_latency_sum_ms: u128,
    // 简易直方图分桶（毫秒）：<50, <100, <250, <500, <1000, >=1000
    upstream_hist_buckets: [u64; 6],
    wallets_created: u64,
}

const LATENCY_BOUNDS_MS: [u128; 5] = [50, 100, 250, 500, 1000];

fn state() -> MutexGuard<'static, MetricsState> {
    let lock = METRICS.get_or_init(|| Mutex::new(MetricsState::default()));
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(), // 避免因锁污染导致 panic
    }
}

pub fn count_ok(endpoint: &'static str) {
    let mut s = state();
    s.total += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
}

pub fn count_err(endpoint: &'static str) {
    let mut s = state();
    s.total += 1;
    s.errors += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
    *s.per_endpoint_err.entry(endpoint).or_insert(0) += 1;
}

/// 按处理结果计数
pub fn count(endpoint: &'static str, ok: bool) {
    if ok {
        count_ok(endpoint);
    } else {
        count_err(endpoint);
    }
}

pub fn inc_wallet_created() {
    state().wallets_created += 1;
}

/// 记录一次链客户端调用
pub fn record_upstream(ok: bool, latency_ms: u128) {
    let mut s = state();
    if ok {
        s.upstream_ok += 1;
    } else {
        s.upstream_err += 1;
    }
    s.upstream_latency_sum_ms += latency_ms;
    let bucket = LATENCY_BOUNDS_MS
        .iter()
        .position(|bound| latency_ms < *bound)
        .unwrap_or(LATENCY_BOUNDS_MS.len());
    s.upstream_hist_buckets[bucket] += 1;
}

pub fn render_prometheus() -> String {
    let s = state();
    let mut out = String::new();
    out.push_str("# HELP wallet_manager_requests_total Total requests\n");
    out.push_str("# TYPE wallet_manager_requests_total counter\n");
    out.push_str(&format!("wallet_manager_requests_total {}\n", s.total));

    out.push_str("# HELP wallet_manager_errors_total Total error responses\n");
    out.push_str("# TYPE wallet_manager_errors_total counter\n");
    out.push_str(&format!("wallet_manager_errors_total {}\n", s.errors));

    let mut endpoints: Vec<_> = s.per_endpoint.iter().collect();
    endpoints.sort();
    out.push_str("# HELP wallet_manager_endpoint_requests_total Requests per endpoint\n");
    out.push_str("# TYPE wallet_manager_endpoint_requests_total counter\n");
    for (k, v) in endpoints {
        out.push_str(&format!(
            "wallet_manager_endpoint_requests_total{{endpoint=\"{}\"}} {}\n",
            k, v
        ));
    }

    let mut endpoint_errors: Vec<_> = s.per_endpoint_err.iter().collect();
    endpoint_errors.sort();
    out.push_str("# HELP wallet_manager_endpoint_errors_total Errors per endpoint\n");
    out.push_str("# TYPE wallet_manager_endpoint_errors_total counter\n");
    for (k, v) in endpoint_errors {
        out.push_str(&format!(
            "wallet_manager_endpoint_errors_total{{endpoint=\"{}\"}} {}\n",
            k, v
        ));
    }

    out.push_str("# HELP wallet_manager_wallets_created_total Wallets created\n");
    out.push_str("# TYPE wallet_manager_wallets_created_total counter\n");
    out.push_str(&format!(
        "wallet_manager_wallets_created_total {}\n",
        s.wallets_created
    ));

    // 链客户端统计
    out.push_str("# HELP wallet_manager_upstream_requests_total Chain client calls\n");
    out.push_str("# TYPE wallet_manager_upstream_requests_total counter\n");
    out.push_str(&format!(
        "wallet_manager_upstream_requests_total{{result=\"ok\"}} {}\n",
        s.upstream_ok
    ));
    out.push_str(&format!(
        "wallet_manager_upstream_requests_total{{result=\"err\"}} {}\n",
        s.upstream_err
    ));

    out.push_str("# HELP wallet_manager_upstream_latency_ms_sum Sum of chain client latency in ms\n");
    out.push_str("# TYPE wallet_manager_upstream_latency_ms_sum counter\n");
    out.push_str(&format!(
        "wallet_manager_upstream_latency_ms_sum {}\n",
        s.upstream_latency_sum_ms
    ));

    out.push_str(
        "# HELP wallet_manager_upstream_latency_ms_bucket Chain client latency histogram buckets\n",
    );
    out.push_str("# TYPE wallet_manager_upstream_latency_ms_bucket histogram\n");
    // 累积桶
    let mut cumulative = 0;
    for (i, bound) in LATENCY_BOUNDS_MS.iter().enumerate() {
        cumulative += s.upstream_hist_buckets[i];
        out.push_str(&format!(
            "wallet_manager_upstream_latency_ms_bucket{{le=\"{}\"}} {}\n",
            bound, cumulative
        ));
    }
    out.push_str(&format!(
        "wallet_manager_upstream_latency_ms_bucket{{le=\"+Inf\"}} {}\n",
        s.upstream_hist_buckets.iter().sum::<u64>()
    ));

    out
}
