//! # Dispatcher
//!
//! 出站消息分发模块。
//!
//! 负责：
//! - 基于内容指纹的去重 (FIFO 有界缓存)
//! - HIGH 优先级立即发送，MEDIUM/LOW 按 destination 批量缓冲
//! - 达到 batch_size 同步 flush，否则由共享定时器 flush
//! - 定时 flush 失败通过广播通道上报，不重新入队

pub mod batch;
pub mod dedup;
pub mod dispatcher;
pub mod error;
pub mod fingerprint;
pub mod metrics;
pub mod transports;

pub use contracts::{Message, Priority, Transport};
pub use dispatcher::{Dispatcher, DispatcherBuilder, FlushFailure, SubmitOutcome};
pub use error::DispatchError;
pub use fingerprint::fingerprint;
pub use metrics::{DispatcherMetrics, MetricsSnapshot};
pub use transports::{
    create_transport, AnyTransport, FileTransport, HttpTransport, LogTransport, MemoryTransport,
    SentCall,
};
