use anyhow::{Context, Result, bail};

/// Split `total` writes across `concurrency` workers.
///
/// Every worker gets `total / concurrency`; the last one also takes the
/// remainder, so the plan always sums to `total`.
pub fn partition(total: u64, concurrency: u64) -> Result<Vec<u64>> {
    if concurrency == 0 {
        bail!("cannot partition {total} writes across 0 workers");
    }

    let workers = usize::try_from(concurrency)
        .with_context(|| format!("concurrency {concurrency} does not fit in memory"))?;
    let per_worker = total / concurrency;

    let mut plan = vec![per_worker; workers];
    if let Some(last) = plan.last_mut() {
        *last = total - (concurrency - 1) * per_worker;
    }

    Ok(plan)
}
