//! Real-time thread setup.
//!
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)` once per process.
//! 2. `sched_setaffinity` per worker thread.
//! 3. `sched_setscheduler(SCHED_FIFO, prio)` per worker thread.
//!
//! Without the `rt` feature every call is a no-op so the vehicle runs
//! unprivileged against the simulation driver.

use crate::error::RtError;
use tracing::debug;

/// Lock all current and future pages into RAM.
#[cfg(feature = "rt")]
pub fn rt_mlockall() -> Result<(), RtError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| RtError::Setup(format!("mlockall failed: {e}")))?;
    debug!("Memory locked");
    Ok(())
}

#[cfg(not(feature = "rt"))]
pub fn rt_mlockall() -> Result<(), RtError> {
    debug!("mlockall skipped (rt feature disabled)");
    Ok(())
}

/// Pin the calling thread to `cpu`.
#[cfg(feature = "rt")]
pub fn rt_set_affinity(cpu: usize) -> Result<(), RtError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| RtError::Setup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| RtError::Setup(format!("sched_setaffinity failed: {e}")))?;
    Ok(())
}

#[cfg(not(feature = "rt"))]
pub fn rt_set_affinity(cpu: usize) -> Result<(), RtError> {
    debug!("CPU {cpu} pinning skipped (rt feature disabled)");
    Ok(())
}

/// Switch the calling thread to `SCHED_FIFO` at `priority`.
#[cfg(feature = "rt")]
pub fn rt_set_scheduler(priority: i32) -> Result<(), RtError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(RtError::Setup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
pub fn rt_set_scheduler(priority: i32) -> Result<(), RtError> {
    debug!("SCHED_FIFO {priority} skipped (rt feature disabled)");
    Ok(())
}

/// Apply the optional pinning and priority of one worker thread.
pub fn rt_setup_worker(name: &str, cpu: Option<usize>, priority: Option<i32>) -> Result<(), RtError> {
    if let Some(cpu) = cpu {
        rt_set_affinity(cpu)?;
    }
    if let Some(priority) = priority {
        rt_set_scheduler(priority)?;
    }
    debug!(worker = name, ?cpu, ?priority, "RT setup complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_without_pinning_is_noop() {
        assert!(rt_setup_worker("timer", None, None).is_ok());
    }

    #[test]
    fn setup_without_rt_feature_is_noop() {
        #[cfg(not(feature = "rt"))]
        {
            assert!(rt_mlockall().is_ok());
            assert!(rt_setup_worker("control", Some(3), Some(80)).is_ok());
        }
    }
}
