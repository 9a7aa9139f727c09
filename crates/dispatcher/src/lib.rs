//! # Dispatcher
//!
//! 限速批量分发模块。
//!
//! 负责：
//! - 按处理器容量切分提交的批次
//! - 按处理器声明的周期节流投递给 [`Processor`]
//! - 两种投递方式：[`BlockingDispatcher`]（同步等待，超出周期立即失败）
//!   与 [`QueuedDispatcher`]（入队即返回，每个批次一个节流 worker）

pub mod batching;
pub mod blocking;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod processors;
pub mod queued;
mod worker;

pub use batching::{slices, BatchPlan};
pub use blocking::{BlockingDispatcher, DispatchOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use contracts::{Batch, CancellationToken, Item, Limits, ProcessError, Processor};
pub use dispatch::{Dispatch, DispatchMode, LocalDispatch};
pub use error::{BatchingError, DispatchError, OVERLOAD_MESSAGE};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use processors::DemoProcessor;
pub use queued::{QueueConfig, QueuedDispatcher, RunReport, ShutdownPolicy, Submitter};
pub use worker::WorkerReport;
